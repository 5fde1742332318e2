//! Graph traversal.
//!
//! [`Validator`] is the entry point of the engine. For each call it builds
//! the validation order from the requested groups, then walks the object
//! graph: constraints of the current object first, cascaded objects after,
//! with group sequences evaluated step by step and stopped at the first
//! step that produces violations.

use crate::core::error::{EngineError, EngineResult, PathError, ViolationReport};
use crate::core::group::{Group, GroupCatalog};
use crate::core::path::{ElementKind, ElementPosition, Path, PathNode};
use crate::core::types::Value;
use crate::core::violation::ViolationSet;
use crate::engine::context::{ValidationContext, ValidationContextBuilder};
use crate::engine::interpolator::{MessageInterpolator, ParameterMessageInterpolator};
use crate::engine::options::ValidatorOptions;
use crate::engine::resolver::{TraversableResolver, TraverseAll};
use crate::engine::validator::{ConstraintValidatorFactory, DefaultConstraintValidatorFactory};
use crate::engine::value_context::ValueContext;
use crate::groups::{ValidationOrder, ValidationOrderGenerator};
use crate::metadata::bean::{BeanMetadata, Cascadable};
use crate::metadata::constraint::{ConstraintKind, MetaConstraint};
use crate::metadata::registry::MetadataProvider;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Validates objects, properties, values and executable calls.
///
/// A validator is immutable once built and can be shared across threads;
/// every call gets its own [`ValidationContext`].
pub struct Validator {
    pub(super) metadata: Arc<dyn MetadataProvider>,
    pub(super) generator: ValidationOrderGenerator,
    pub(super) interpolator: Arc<dyn MessageInterpolator>,
    pub(super) resolver: Arc<dyn TraversableResolver>,
    pub(super) factory: Arc<dyn ConstraintValidatorFactory>,
    pub(super) options: ValidatorOptions,
}

impl Validator {
    /// Create a validator over the given metadata and group definitions.
    pub fn new(metadata: Arc<dyn MetadataProvider>, groups: Arc<GroupCatalog>) -> Self {
        Self {
            metadata,
            generator: ValidationOrderGenerator::new(groups),
            interpolator: Arc::new(ParameterMessageInterpolator),
            resolver: Arc::new(TraverseAll),
            factory: Arc::new(DefaultConstraintValidatorFactory),
            options: ValidatorOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Set fail-fast mode.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.options.fail_fast = fail_fast;
        self
    }

    /// Use a custom message interpolator.
    pub fn with_message_interpolator(mut self, interpolator: Arc<dyn MessageInterpolator>) -> Self {
        self.interpolator = interpolator;
        self
    }

    /// Use a custom traversable resolver.
    pub fn with_traversable_resolver(mut self, resolver: Arc<dyn TraversableResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Use a custom validator factory.
    pub fn with_validator_factory(mut self, factory: Arc<dyn ConstraintValidatorFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Current options.
    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    pub(super) fn context_builder(&self) -> ValidationContextBuilder<'_> {
        ValidationContextBuilder::new(
            self.interpolator.as_ref(),
            &self.factory,
            self.resolver.as_ref(),
            &self.options,
        )
    }

    // ========================================================================
    // Entry Points
    // ========================================================================

    /// Validate an object and everything reachable through cascades.
    ///
    /// Values that are not objects, and objects of unknown or unconstrained
    /// types, have nothing to validate.
    pub fn validate(&self, object: &Value, groups: &[Group]) -> EngineResult<ViolationSet> {
        let order = self.generator.validation_order(groups)?;

        let Some(bean) = object.as_bean() else {
            return Ok(ViolationSet::new());
        };
        let Some(metadata) = self.metadata.bean_metadata(bean.type_name()) else {
            log::debug!("No metadata for type {}, nothing to validate", bean.type_name());
            return Ok(ViolationSet::new());
        };
        if !metadata.is_constrained() {
            return Ok(ViolationSet::new());
        }

        log::debug!("Validating {} in groups {:?}", bean.type_name(), groups);
        let mut ctx = self.context_builder().for_validate(object);
        let mut vc = ValueContext::for_bean(object.clone(), metadata, Path::root());
        self.validate_in_context(&mut ctx, &mut vc, &order)?;
        Ok(ctx.into_violations())
    }

    /// [`Self::validate`] with a serializable summary and timing.
    pub fn validate_with_report(
        &self,
        object: &Value,
        groups: &[Group],
    ) -> EngineResult<ViolationReport> {
        let start = Instant::now();
        let violations = self.validate(object, groups)?;
        Ok(ViolationReport::new(&violations, start.elapsed()))
    }

    /// Validate the constraints of the property at `property_path`.
    ///
    /// The path is resolved against the object; cascades below the property
    /// are not followed.
    pub fn validate_property(
        &self,
        object: &Value,
        property_path: &str,
        groups: &[Group],
    ) -> EngineResult<ViolationSet> {
        let order = self.generator.validation_order(groups)?;
        let path = Path::parse(property_path)?;

        let Some(bean) = object.as_bean() else {
            return Ok(ViolationSet::new());
        };
        let Some(metadata) = self.metadata.bean_metadata(bean.type_name()) else {
            return Ok(ViolationSet::new());
        };
        if !metadata.is_constrained() {
            return Ok(ViolationSet::new());
        }

        let (host, host_metadata, constraints) =
            self.resolve_property_path(object.clone(), metadata, &path)?;
        log::debug!(
            "Validating property '{}' of {} in groups {:?}",
            path,
            bean.type_name(),
            groups
        );

        let mut ctx = self.context_builder().for_validate_property(object);
        let mut vc = ValueContext::for_bean(host, host_metadata, path);
        self.validate_property_in_context(&mut ctx, &mut vc, &constraints, &order)?;
        Ok(ctx.into_violations())
    }

    /// Validate `value` as if it were the property at `property_path` of
    /// an instance of `type_name`.
    pub fn validate_value(
        &self,
        type_name: &str,
        property_path: &str,
        value: Value,
        groups: &[Group],
    ) -> EngineResult<ViolationSet> {
        let order = self.generator.validation_order(groups)?;
        let path = Path::parse(property_path)?;

        let Some(metadata) = self.metadata.bean_metadata(type_name) else {
            return Ok(ViolationSet::new());
        };
        if !metadata.is_constrained() {
            return Ok(ViolationSet::new());
        }

        let (host_metadata, constraints) = self.resolve_value_path(metadata, &path)?;
        log::debug!(
            "Validating value for '{}' of {} in groups {:?}",
            path,
            type_name,
            groups
        );

        let mut ctx = self.context_builder().for_validate_value(type_name);
        let mut vc = ValueContext::for_value(host_metadata, path, value);
        self.validate_property_in_context(&mut ctx, &mut vc, &constraints, &order)?;
        Ok(ctx.into_violations())
    }

    // ========================================================================
    // Object Graph
    // ========================================================================

    fn validate_in_context(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &mut ValueContext,
        order: &ValidationOrder,
    ) -> EngineResult<()> {
        let Some(metadata) = vc.bean_metadata().cloned() else {
            return Ok(());
        };
        if vc.current_bean().map_or(true, Value::is_null) {
            return Ok(());
        }
        if let Some(max_depth) = self.options.max_depth {
            if vc.depth() > max_depth {
                return Err(EngineError::MaxDepthExceeded {
                    depth: vc.depth(),
                    path: vc.path().to_string(),
                });
            }
        }
        self.assert_default_sequence_expandable(&metadata, vc.current_bean(), order)?;

        for group in order.groups() {
            vc.set_group(group.clone());
            self.validate_constraints_for_current_group(ctx, vc)?;
            if ctx.should_fail_fast() {
                return Ok(());
            }
        }
        for group in order.groups() {
            vc.set_group(group.clone());
            self.validate_cascaded_constraints(ctx, vc)?;
            if ctx.should_fail_fast() {
                return Ok(());
            }
        }

        for sequence in order.sequences() {
            for step in sequence.iter() {
                let before = ctx.violation_count();
                for group in step.groups() {
                    vc.set_group(group.clone());
                    self.validate_constraints_for_current_group(ctx, vc)?;
                    if ctx.should_fail_fast() {
                        return Ok(());
                    }
                    vc.set_group(group.clone());
                    self.validate_cascaded_constraints(ctx, vc)?;
                    if ctx.should_fail_fast() {
                        return Ok(());
                    }
                }
                if ctx.violation_count() > before {
                    break;
                }
            }
        }
        Ok(())
    }

    pub(super) fn assert_default_sequence_expandable(
        &self,
        metadata: &BeanMetadata,
        bean: Option<&Value>,
        order: &ValidationOrder,
    ) -> EngineResult<()> {
        if metadata.is_default_group_sequence_redefined() {
            let default_sequence = metadata.default_group_sequence(bean)?;
            order.assert_default_group_sequence_is_expandable(&default_sequence)?;
        }
        Ok(())
    }

    fn validate_constraints_for_current_group(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &mut ValueContext,
    ) -> EngineResult<()> {
        if vc.validating_default() {
            self.validate_constraints_for_default_group(ctx, vc)
        } else {
            self.validate_constraints_for_non_default_group(ctx, vc)
        }
    }

    /// Walk the type hierarchy, replacing `Default` with each type's own
    /// default sequence.
    fn validate_constraints_for_default_group(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &mut ValueContext,
    ) -> EngineResult<()> {
        let Some(metadata) = vc.bean_metadata().cloned() else {
            return Ok(());
        };
        let bean = vc.current_bean().cloned();
        // interface -> type it was validated for
        let mut validated_interfaces: HashMap<String, String> = HashMap::new();

        for type_name in metadata.class_hierarchy() {
            let Some(hosting) = self.metadata.bean_metadata(type_name) else {
                continue;
            };
            let redefined = hosting.is_default_group_sequence_redefined();
            let sequence = hosting.default_group_sequence(bean.as_ref())?;
            let constraints = if redefined {
                hosting.meta_constraints()
            } else {
                hosting.direct_meta_constraints()
            };

            for group in sequence {
                vc.set_group(group);
                let mut valid = true;
                for constraint in constraints {
                    let declaring = &constraint.location().declaring_type;
                    if self.is_interface(declaring) {
                        match validated_interfaces.get(declaring) {
                            Some(validated_for) if validated_for != type_name => continue,
                            Some(_) => {}
                            None => {
                                validated_interfaces.insert(declaring.clone(), type_name.clone());
                            }
                        }
                    }

                    valid &= self.validate_meta_constraint(ctx, vc, constraint, false)?;
                    if ctx.should_fail_fast() {
                        return Ok(());
                    }
                }
                if !valid {
                    break;
                }
            }

            vc.set_group(Group::default_group());
            ctx.mark_current_bean_processed(vc);
            if redefined {
                break;
            }
        }
        Ok(())
    }

    fn validate_constraints_for_non_default_group(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &mut ValueContext,
    ) -> EngineResult<()> {
        let Some(metadata) = vc.bean_metadata().cloned() else {
            return Ok(());
        };
        for constraint in metadata.meta_constraints() {
            self.validate_meta_constraint(ctx, vc, constraint, false)?;
            if ctx.should_fail_fast() {
                return Ok(());
            }
        }
        ctx.mark_current_bean_processed(vc);
        Ok(())
    }

    fn is_interface(&self, type_name: &str) -> bool {
        self.metadata
            .bean_metadata(type_name)
            .map_or(false, |metadata| metadata.is_interface())
    }

    /// Evaluate one placed constraint at the cursor.
    ///
    /// Unless `path_complete`, the node the constraint is placed on is
    /// appended to the cursor's path for the duration of the evaluation.
    fn validate_meta_constraint(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &mut ValueContext,
        constraint: &MetaConstraint,
        path_complete: bool,
    ) -> EngineResult<bool> {
        let original_path = vc.path().clone();
        if !path_complete {
            match constraint.kind() {
                ConstraintKind::Type => vc.append_node(PathNode::bean()),
                ConstraintKind::Field | ConstraintKind::Property => {
                    let member = constraint.location().member.clone().unwrap_or_default();
                    vc.append_node(PathNode::property(member));
                }
                _ => {}
            }
        }

        let result = self.validate_placed_constraint(ctx, vc, constraint);
        vc.set_path(original_path);
        result
    }

    /// Evaluate a constraint at the cursor's current path.
    pub(super) fn validate_placed_constraint(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &mut ValueContext,
        constraint: &MetaConstraint,
    ) -> EngineResult<bool> {
        if !self.is_validation_required(ctx, vc, constraint)? {
            return Ok(true);
        }

        let value = match constraint.kind() {
            ConstraintKind::Type => vc.current_bean().cloned().unwrap_or(Value::Null),
            ConstraintKind::Field | ConstraintKind::Property => {
                let member = constraint.location().member.as_deref().unwrap_or_default();
                match vc.current_bean().and_then(Value::as_bean) {
                    Some(bean) => bean.get(member),
                    None => vc.validated_value().clone(),
                }
            }
            _ => vc.validated_value().clone(),
        };
        vc.set_validated_value(value);
        vc.set_element_kind(constraint.kind().element_kind());

        let valid = constraint.tree().validate_constraints(ctx, vc)?;
        ctx.mark_constraint_processed(vc.current_bean(), vc.path(), constraint.id());
        Ok(valid)
    }

    fn is_validation_required(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &ValueContext,
        constraint: &MetaConstraint,
    ) -> EngineResult<bool> {
        if ctx.has_constraint_been_processed(vc.current_bean(), vc.path(), constraint.id()) {
            return Ok(false);
        }
        if !constraint.applies_to(vc.group()) {
            return Ok(false);
        }
        self.is_reachable(ctx, vc, constraint.kind().element_kind())
    }

    fn is_reachable(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &ValueContext,
        kind: ElementKind,
    ) -> EngineResult<bool> {
        if !matches!(kind, ElementKind::Property) {
            return Ok(true);
        }
        let (Some(traversable), Some(leaf)) = (vc.current_bean(), vc.path().leaf()) else {
            return Ok(true);
        };
        ctx.is_reachable(traversable, leaf, &vc.path().parent(), kind)
    }

    // ========================================================================
    // Cascades
    // ========================================================================

    /// Follow every cascaded relation of the cursor's validatable.
    ///
    /// Element constraints of a relation are checked here too, whether or
    /// not the relation cascades.
    pub(super) fn validate_cascaded_constraints(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &mut ValueContext,
    ) -> EngineResult<()> {
        let validatable = vc.validatable().clone();
        let original_path = vc.path().clone();
        let original_group = vc.group().clone();

        for cascadable in validatable.cascadables() {
            vc.append_node(cascadable.path_node());
            let group = cascadable.convert_group(&original_group);
            vc.set_group(group.clone());

            if self.is_relation_reachable(ctx, vc, cascadable)? {
                let host = vc.current_bean().cloned().unwrap_or(Value::Null);
                let value = cascadable.value(&host);
                if !value.is_null() {
                    let order = if cascadable.is_cascading()
                        && self.is_relation_cascadable(ctx, vc, cascadable)?
                    {
                        let converted = group != original_group;
                        Some(self.generator.validation_order_for_group(&group, converted)?)
                    } else {
                        None
                    };
                    self.cascade_into(ctx, vc, cascadable, &value, order.as_ref())?;
                    if ctx.should_fail_fast() {
                        return Ok(());
                    }
                }
            }

            vc.set_path(original_path.clone());
            vc.set_group(original_group.clone());
        }
        Ok(())
    }

    fn is_relation_reachable(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &ValueContext,
        cascadable: &Cascadable,
    ) -> EngineResult<bool> {
        let kind = cascadable.element_kind();
        if kind != ElementKind::Property {
            return Ok(true);
        }
        let (Some(traversable), Some(leaf)) = (vc.current_bean(), vc.path().leaf()) else {
            return Ok(true);
        };
        ctx.is_reachable(traversable, leaf, &vc.path().parent(), kind)
    }

    fn is_relation_cascadable(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &ValueContext,
        cascadable: &Cascadable,
    ) -> EngineResult<bool> {
        let kind = cascadable.element_kind();
        if kind != ElementKind::Property {
            return Ok(true);
        }
        let (Some(traversable), Some(leaf)) = (vc.current_bean(), vc.path().leaf()) else {
            return Ok(true);
        };
        ctx.is_cascadable(traversable, leaf, &vc.path().parent(), kind)
    }

    /// Check each element of a container value, then validate the nested
    /// objects when an order is given.
    ///
    /// A value that is not a container is only cascaded into.
    fn cascade_into(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &mut ValueContext,
        cascadable: &Cascadable,
        value: &Value,
        order: Option<&ValidationOrder>,
    ) -> EngineResult<()> {
        let container_path = vc.path().clone();
        let leaf = container_path.leaf().cloned();

        let elements: Vec<(Option<ElementPosition>, &Value)> = match value {
            Value::List(items) | Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (Some(ElementPosition::Index(i)), item))
                .collect(),
            Value::Set(items) => items
                .iter()
                .map(|item| (Some(ElementPosition::Unindexed), item))
                .collect(),
            Value::Map(entries) => entries
                .iter()
                .map(|(key, item)| (Some(ElementPosition::Key(key.clone())), item))
                .collect(),
            single => vec![(None, single)],
        };

        for (position, element) in elements {
            let element_path = match (&position, &leaf) {
                (Some(position), Some(leaf)) => {
                    container_path.with_leaf(leaf.clone().at_position(position))
                }
                _ => container_path.clone(),
            };
            if element.as_bean().is_some()
                && ctx.is_already_validated(element, vc.group(), &element_path)
            {
                log::trace!("Skipping {} at '{}', already validated", element, element_path);
                continue;
            }

            if position.is_some() && !cascadable.element_constraints().is_empty() {
                vc.set_path(element_path.clone());
                let constraints = cascadable.element_constraints();
                let result = self.validate_element_constraints(ctx, vc, constraints, element);
                vc.set_path(container_path.clone());
                result?;
                if ctx.should_fail_fast() {
                    return Ok(());
                }
            }

            let (Some(order), Some(bean)) = (order, element.as_bean()) else {
                continue;
            };
            let Some(metadata) = self.metadata.bean_metadata(bean.type_name()) else {
                continue;
            };

            let mut nested = ValueContext::for_bean(element.clone(), metadata, element_path.clone())
                .at_depth(vc.depth() + 1);
            self.validate_in_context(ctx, &mut nested, order)?;
            ctx.mark_processed(element, vc.group(), &element_path);
            if ctx.should_fail_fast() {
                return Ok(());
            }
        }
        Ok(())
    }

    // Elements of a set share one path, so these skip the processed-constraint
    // bookkeeping.
    fn validate_element_constraints(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &mut ValueContext,
        constraints: &[Arc<MetaConstraint>],
        element: &Value,
    ) -> EngineResult<()> {
        for constraint in constraints {
            if !constraint.applies_to(vc.group()) {
                continue;
            }
            vc.set_validated_value(element.clone());
            vc.set_element_kind(constraint.kind().element_kind());
            constraint.tree().validate_constraints(ctx, vc)?;
            if ctx.should_fail_fast() {
                return Ok(());
            }
        }
        Ok(())
    }

    // ========================================================================
    // Single Property
    // ========================================================================

    fn validate_property_in_context(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &mut ValueContext,
        constraints: &[Arc<MetaConstraint>],
        order: &ValidationOrder,
    ) -> EngineResult<()> {
        if let Some(metadata) = vc.bean_metadata().cloned() {
            self.assert_default_sequence_expandable(&metadata, vc.current_bean(), order)?;
        }

        for group in order.groups() {
            vc.set_group(group.clone());
            self.validate_property_for_current_group(ctx, vc, constraints)?;
            if ctx.should_fail_fast() {
                return Ok(());
            }
        }

        for sequence in order.sequences() {
            for step in sequence.iter() {
                let before = ctx.violation_count();
                for group in step.groups() {
                    vc.set_group(group.clone());
                    self.validate_property_for_current_group(ctx, vc, constraints)?;
                    if ctx.should_fail_fast() {
                        return Ok(());
                    }
                }
                if ctx.violation_count() > before {
                    break;
                }
            }
        }
        Ok(())
    }

    fn validate_property_for_current_group(
        &self,
        ctx: &mut ValidationContext<'_>,
        vc: &mut ValueContext,
        constraints: &[Arc<MetaConstraint>],
    ) -> EngineResult<()> {
        if !vc.validating_default() {
            for constraint in constraints {
                self.validate_meta_constraint(ctx, vc, constraint, true)?;
                if ctx.should_fail_fast() {
                    return Ok(());
                }
            }
            return Ok(());
        }

        let Some(metadata) = vc.bean_metadata().cloned() else {
            return Ok(());
        };
        let bean = vc.current_bean().cloned();
        for type_name in metadata.class_hierarchy() {
            let Some(hosting) = self.metadata.bean_metadata(type_name) else {
                continue;
            };
            let redefined = hosting.is_default_group_sequence_redefined();
            let sequence = hosting.default_group_sequence(bean.as_ref())?;
            let hosted = if redefined {
                hosting.meta_constraints()
            } else {
                hosting.direct_meta_constraints()
            };

            for group in sequence {
                vc.set_group(group);
                let mut valid = true;
                for constraint in constraints {
                    if !hosted.iter().any(|c| c.id() == constraint.id()) {
                        continue;
                    }
                    valid &= self.validate_meta_constraint(ctx, vc, constraint, true)?;
                    if ctx.should_fail_fast() {
                        return Ok(());
                    }
                }
                if !valid {
                    break;
                }
            }
            if redefined {
                break;
            }
        }
        vc.set_group(Group::default_group());
        Ok(())
    }

    /// Resolve a property path against an instance.
    ///
    /// Returns the object hosting the last property, its metadata and the
    /// constraints placed on the last property.
    fn resolve_property_path(
        &self,
        root: Value,
        root_metadata: Arc<BeanMetadata>,
        path: &Path,
    ) -> EngineResult<(Value, Arc<BeanMetadata>, Vec<Arc<MetaConstraint>>)> {
        let nodes = path.nodes();
        let last = nodes.len().saturating_sub(1);
        let mut host = root;
        let mut metadata = root_metadata;

        for (i, node) in nodes.iter().enumerate() {
            let name = node.name.as_deref().unwrap_or_default();
            let property = metadata.property(name).ok_or_else(|| PathError::UnknownProperty {
                property: name.to_string(),
                type_name: metadata.type_name().to_string(),
            })?;
            if i == last {
                let constraints = property.constraints().to_vec();
                return Ok((host, metadata, constraints));
            }
            if !property.cascadable().map_or(false, Cascadable::is_cascading) {
                return Err(PathError::NotCascaded {
                    property: name.to_string(),
                    type_name: metadata.type_name().to_string(),
                }
                .into());
            }

            let container = host.as_bean().map_or(Value::Null, |bean| bean.get(name));
            if container.is_null() {
                return Err(PathError::NullIntermediate {
                    property: name.to_string(),
                }
                .into());
            }
            let next = select_element(container, node.position(), name)?;
            if next.is_null() {
                return Err(PathError::NullIntermediate {
                    property: node.to_string(),
                }
                .into());
            }

            let next_metadata = next
                .as_bean()
                .and_then(|bean| self.metadata.bean_metadata(bean.type_name()))
                .ok_or_else(|| PathError::UnresolvableType {
                    property: name.to_string(),
                    type_name: metadata.type_name().to_string(),
                })?;
            host = next;
            metadata = next_metadata;
        }

        Err(PathError::Empty.into())
    }

    /// Resolve a property path against a type, following declared types.
    fn resolve_value_path(
        &self,
        root_metadata: Arc<BeanMetadata>,
        path: &Path,
    ) -> EngineResult<(Arc<BeanMetadata>, Vec<Arc<MetaConstraint>>)> {
        let nodes = path.nodes();
        let last = nodes.len().saturating_sub(1);
        let mut metadata = root_metadata;

        for (i, node) in nodes.iter().enumerate() {
            let name = node.name.as_deref().unwrap_or_default();
            let property = metadata.property(name).ok_or_else(|| PathError::UnknownProperty {
                property: name.to_string(),
                type_name: metadata.type_name().to_string(),
            })?;
            if i == last {
                let constraints = property.constraints().to_vec();
                return Ok((metadata, constraints));
            }

            let Some(cascadable) = property.cascadable().filter(|c| c.is_cascading()) else {
                return Err(PathError::NotCascaded {
                    property: name.to_string(),
                    type_name: metadata.type_name().to_string(),
                }
                .into());
            };
            let unresolvable = || PathError::UnresolvableType {
                property: name.to_string(),
                type_name: metadata.type_name().to_string(),
            };
            let next = cascadable
                .declared_type()
                .and_then(|declared| self.metadata.bean_metadata(declared))
                .ok_or_else(unresolvable)?;
            metadata = next;
        }

        Err(PathError::Empty.into())
    }
}

/// Pick the element a path node selects from a container value.
fn select_element(
    container: Value,
    position: Option<ElementPosition>,
    property: &str,
) -> EngineResult<Value> {
    let missing = || PathError::MissingIndexOrKey {
        property: property.to_string(),
    };
    let is_container = matches!(
        container,
        Value::List(_) | Value::Set(_) | Value::Array(_) | Value::Map(_)
    );

    match position {
        None if is_container => Err(missing().into()),
        None => Ok(container),
        Some(ElementPosition::Unindexed) => Err(missing().into()),
        Some(ElementPosition::Index(index)) => {
            Ok(container.element_at(index).cloned().unwrap_or(Value::Null))
        }
        Some(ElementPosition::Key(key)) => {
            Ok(container.entry(&key).cloned().unwrap_or(Value::Null))
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("generator", &self.generator)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
