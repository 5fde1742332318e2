//! Per-call validation state.
//!
//! A [`ValidationContext`] lives for exactly one validation call. It carries
//! the call's collaborators, accumulates violations and remembers what has
//! already been processed so that shared objects are validated once per
//! group and cyclic graphs terminate.

use crate::core::error::{EngineError, EngineResult};
use crate::core::group::Group;
use crate::core::path::{ElementKind, Path, PathNode};
use crate::core::types::{BeanId, Value};
use crate::core::violation::{ConstraintViolation, ViolationSet};
use crate::engine::interpolator::{InterpolationContext, MessageInterpolator};
use crate::engine::options::ValidatorOptions;
use crate::engine::resolver::{CachingTraversableResolver, TraversableResolver};
use crate::engine::validator::{ConstraintValidatorContext, ConstraintValidatorFactory};
use crate::engine::value_context::ValueContext;
use crate::metadata::constraint::{ConstraintDescriptor, ConstraintId};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Creates a [`ValidationContext`] for each kind of validation call.
pub struct ValidationContextBuilder<'a> {
    interpolator: &'a dyn MessageInterpolator,
    validator_factory: &'a Arc<dyn ConstraintValidatorFactory>,
    resolver: &'a dyn TraversableResolver,
    options: &'a ValidatorOptions,
}

impl<'a> ValidationContextBuilder<'a> {
    /// Create a builder over the validator's collaborators.
    pub fn new(
        interpolator: &'a dyn MessageInterpolator,
        validator_factory: &'a Arc<dyn ConstraintValidatorFactory>,
        resolver: &'a dyn TraversableResolver,
        options: &'a ValidatorOptions,
    ) -> Self {
        Self {
            interpolator,
            validator_factory,
            resolver,
            options,
        }
    }

    /// Context for validating a whole object.
    pub fn for_validate(self, root: &Value) -> ValidationContext<'a> {
        let root_type = type_of(root);
        self.build(Some(root.clone()), root_type, None, None)
    }

    /// Context for validating one property of an object.
    pub fn for_validate_property(self, root: &Value) -> ValidationContext<'a> {
        self.for_validate(root)
    }

    /// Context for validating a value against a property of a type.
    pub fn for_validate_value(self, type_name: &str) -> ValidationContext<'a> {
        self.build(None, type_name.to_string(), None, None)
    }

    /// Context for validating executable arguments.
    pub fn for_validate_parameters(
        self,
        root: Option<Value>,
        type_name: &str,
        parameters: Vec<Value>,
    ) -> ValidationContext<'a> {
        self.build(root, type_name.to_string(), Some(parameters), None)
    }

    /// Context for validating an executable's return value.
    pub fn for_validate_return_value(
        self,
        root: Option<Value>,
        type_name: &str,
        return_value: Value,
    ) -> ValidationContext<'a> {
        self.build(root, type_name.to_string(), None, Some(return_value))
    }

    fn build(
        self,
        root_bean: Option<Value>,
        root_type: String,
        executable_parameters: Option<Vec<Value>>,
        executable_return_value: Option<Value>,
    ) -> ValidationContext<'a> {
        ValidationContext {
            root_bean,
            root_type,
            executable_parameters,
            executable_return_value,
            fail_fast: self.options.fail_fast,
            interpolator: self.interpolator,
            validator_factory: self.validator_factory,
            resolver: CachingTraversableResolver::new(
                self.resolver,
                self.options.cache_traversable_resolution,
            ),
            violations: ViolationSet::new(),
            processed_beans_per_group: HashMap::new(),
            processed_paths_per_bean: HashMap::new(),
            processed_constraints: HashMap::new(),
        }
    }
}

fn type_of(value: &Value) -> String {
    match value.as_bean() {
        Some(bean) => bean.type_name().to_string(),
        None => value.kind().to_string(),
    }
}

/// State of a single validation call.
pub struct ValidationContext<'a> {
    root_bean: Option<Value>,
    root_type: String,
    executable_parameters: Option<Vec<Value>>,
    executable_return_value: Option<Value>,
    fail_fast: bool,
    interpolator: &'a dyn MessageInterpolator,
    validator_factory: &'a Arc<dyn ConstraintValidatorFactory>,
    resolver: CachingTraversableResolver<'a>,
    violations: ViolationSet,
    /// Objects fully validated, per group.
    processed_beans_per_group: HashMap<Group, HashSet<BeanId>>,
    /// Paths at which each object has been validated.
    processed_paths_per_bean: HashMap<BeanId, HashSet<Path>>,
    /// Constraints already evaluated, per (object, path).
    processed_constraints: HashMap<(Option<BeanId>, Path), HashSet<ConstraintId>>,
}

impl<'a> ValidationContext<'a> {
    /// The object the call started from.
    pub fn root_bean(&self) -> Option<&Value> {
        self.root_bean.as_ref()
    }

    /// Type of the root object.
    pub fn root_type(&self) -> &str {
        &self.root_type
    }

    /// Whether the call stops at the first violation.
    pub fn is_fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// Whether fail-fast mode is on and a violation has been recorded.
    pub fn should_fail_fast(&self) -> bool {
        self.fail_fast && !self.violations.is_empty()
    }

    /// Number of distinct violations so far.
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// The factory validators are obtained from.
    pub fn validator_factory(&self) -> &'a Arc<dyn ConstraintValidatorFactory> {
        self.validator_factory
    }

    /// Record violations; exact duplicates collapse.
    pub fn add_violations(&mut self, violations: impl IntoIterator<Item = ConstraintViolation>) {
        self.violations.extend(violations);
    }

    /// Finish the call.
    pub fn into_violations(self) -> ViolationSet {
        self.violations
    }

    // ========================================================================
    // Processed Tracking
    // ========================================================================

    /// Whether `value` has already been validated for `group` at a path
    /// that is a prefix of `path`, or that `path` is a prefix of.
    ///
    /// Non-object values have no identity and are never considered
    /// validated.
    pub fn is_already_validated(&self, value: &Value, group: &Group, path: &Path) -> bool {
        let Some(id) = value.identity() else {
            return false;
        };
        let in_group = self
            .processed_beans_per_group
            .get(group)
            .map_or(false, |beans| beans.contains(&id));
        in_group && self.is_subpath_processed(id, path)
    }

    fn is_subpath_processed(&self, id: BeanId, path: &Path) -> bool {
        self.processed_paths_per_bean
            .get(&id)
            .map_or(false, |paths| {
                paths
                    .iter()
                    .any(|p| p.is_prefix_of(path) || path.is_prefix_of(p))
            })
    }

    /// Mark `value` as validated for `group` at `path`.
    pub fn mark_processed(&mut self, value: &Value, group: &Group, path: &Path) {
        let Some(id) = value.identity() else {
            return;
        };
        self.processed_beans_per_group
            .entry(group.clone())
            .or_default()
            .insert(id);
        self.processed_paths_per_bean
            .entry(id)
            .or_default()
            .insert(path.clone());
    }

    /// Mark the cursor's bean as validated for the cursor's group and path.
    pub fn mark_current_bean_processed(&mut self, vc: &ValueContext) {
        if let Some(bean) = vc.current_bean() {
            self.mark_processed(bean, vc.group(), vc.path());
        }
    }

    /// Whether `constraint` has already been evaluated for `bean` at `path`.
    pub fn has_constraint_been_processed(
        &self,
        bean: Option<&Value>,
        path: &Path,
        constraint: ConstraintId,
    ) -> bool {
        let key = (bean.and_then(Value::identity), path.clone());
        self.processed_constraints
            .get(&key)
            .map_or(false, |ids| ids.contains(&constraint))
    }

    /// Remember that `constraint` has been evaluated for `bean` at `path`.
    pub fn mark_constraint_processed(
        &mut self,
        bean: Option<&Value>,
        path: &Path,
        constraint: ConstraintId,
    ) {
        let key = (bean.and_then(Value::identity), path.clone());
        self.processed_constraints
            .entry(key)
            .or_default()
            .insert(constraint);
    }

    // ========================================================================
    // Traversability
    // ========================================================================

    /// Ask the traversable resolver whether `node` of `traversable` is reachable.
    pub fn is_reachable(
        &mut self,
        traversable: &Value,
        node: &PathNode,
        path_to_owner: &Path,
        kind: ElementKind,
    ) -> EngineResult<bool> {
        self.resolver
            .is_reachable(traversable, node, &self.root_type, path_to_owner, kind)
    }

    /// Ask the traversable resolver whether `node` of `traversable` is cascadable.
    pub fn is_cascadable(
        &mut self,
        traversable: &Value,
        node: &PathNode,
        path_to_owner: &Path,
        kind: ElementKind,
    ) -> EngineResult<bool> {
        self.resolver
            .is_cascadable(traversable, node, &self.root_type, path_to_owner, kind)
    }

    // ========================================================================
    // Violation Construction
    // ========================================================================

    /// Materialize the violations a failed validator requested.
    pub fn create_violations(
        &self,
        vc: &ValueContext,
        reporting: &ConstraintValidatorContext,
        descriptor: &Arc<ConstraintDescriptor>,
    ) -> EngineResult<Vec<ConstraintViolation>> {
        let drafts = reporting.drafts();
        if drafts.is_empty() {
            return Err(EngineError::NoViolationReported {
                constraint: descriptor.name().to_string(),
            });
        }

        drafts
            .into_iter()
            .map(|draft| {
                self.create_violation(
                    vc,
                    &draft.template,
                    draft.path,
                    descriptor,
                    reporting.message_parameters(),
                )
            })
            .collect()
    }

    /// Build one violation from a template, interpolating its message.
    pub fn create_violation(
        &self,
        vc: &ValueContext,
        template: &str,
        path: Path,
        descriptor: &Arc<ConstraintDescriptor>,
        message_parameters: &IndexMap<String, Value>,
    ) -> EngineResult<ConstraintViolation> {
        let interpolation = InterpolationContext {
            descriptor,
            validated_value: vc.validated_value(),
            message_parameters,
        };
        let message = self
            .interpolator
            .interpolate(template, &interpolation)
            .map_err(|reason| EngineError::Interpolation {
                template: template.to_string(),
                reason,
            })?;

        Ok(ConstraintViolation {
            message,
            message_template: template.to_string(),
            root_bean: self.root_bean.clone(),
            root_type: self.root_type.clone(),
            leaf_bean: vc.current_bean().cloned(),
            invalid_value: vc.validated_value().clone(),
            property_path: path,
            constraint: Arc::clone(descriptor),
            element_kind: vc.element_kind(),
            executable_parameters: self.executable_parameters.clone(),
            executable_return_value: self.executable_return_value.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Bean;
    use crate::engine::interpolator::ParameterMessageInterpolator;
    use crate::engine::resolver::TraverseAll;
    use crate::engine::validator::DefaultConstraintValidatorFactory;
    use crate::engine::value_context::Validatable;

    struct Fixture {
        interpolator: ParameterMessageInterpolator,
        factory: Arc<dyn ConstraintValidatorFactory>,
        resolver: TraverseAll,
        options: ValidatorOptions,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                interpolator: ParameterMessageInterpolator,
                factory: Arc::new(DefaultConstraintValidatorFactory),
                resolver: TraverseAll,
                options: ValidatorOptions::default(),
            }
        }

        fn builder(&self) -> ValidationContextBuilder<'_> {
            ValidationContextBuilder::new(
                &self.interpolator,
                &self.factory,
                &self.resolver,
                &self.options,
            )
        }
    }

    #[test]
    fn test_already_validated_requires_group_and_related_path() {
        let fixture = Fixture::new();
        let root = Value::Object(Bean::new("Order"));
        let mut ctx = fixture.builder().for_validate(&root);
        let customer = Value::Object(Bean::new("Customer"));
        let default = Group::default_group();

        let path = Path::parse("customer").unwrap();
        assert!(!ctx.is_already_validated(&customer, &default, &path));

        ctx.mark_processed(&customer, &default, &path);
        assert!(ctx.is_already_validated(&customer, &default, &path));
        let nested = Path::parse("customer.friend").unwrap();
        assert!(ctx.is_already_validated(&customer, &default, &nested));
        let unrelated = Path::parse("billing").unwrap();
        assert!(!ctx.is_already_validated(&customer, &default, &unrelated));
        assert!(!ctx.is_already_validated(&customer, &Group::new("Strict"), &path));
    }

    #[test]
    fn test_values_without_identity_are_never_validated() {
        let fixture = Fixture::new();
        let mut ctx = fixture.builder().for_validate_value("Order");
        let value = Value::string("x");
        ctx.mark_processed(&value, &Group::default_group(), &Path::root());
        assert!(!ctx.is_already_validated(&value, &Group::default_group(), &Path::root()));
        assert_eq!(ctx.root_type(), "Order");
        assert!(ctx.root_bean().is_none());
    }

    #[test]
    fn test_processed_constraints() {
        let fixture = Fixture::new();
        let root = Value::Object(Bean::new("Order"));
        let mut ctx = fixture.builder().for_validate(&root);
        let id = ConstraintId::new();
        let path = Path::parse("total").unwrap();

        assert!(!ctx.has_constraint_been_processed(Some(&root), &path, id));
        ctx.mark_constraint_processed(Some(&root), &path, id);
        assert!(ctx.has_constraint_been_processed(Some(&root), &path, id));
        assert!(!ctx.has_constraint_been_processed(None, &path, id));
        assert!(!ctx.has_constraint_been_processed(Some(&root), &Path::root(), id));
    }

    #[test]
    fn test_disabled_default_without_custom_violation_is_an_error() {
        let fixture = Fixture::new();
        let root = Value::Object(Bean::new("Order"));
        let ctx = fixture.builder().for_validate(&root);
        let descriptor = Arc::new(ConstraintDescriptor::builder("Custom").build());
        let mut reporting = ConstraintValidatorContext::new(Path::root(), &descriptor);
        reporting.disable_default_constraint_violation();

        let vc = ValueContext::for_executable(
            Some(root.clone()),
            "Order",
            Validatable::Unconstrained,
            Path::root(),
        );
        let err = ctx.create_violations(&vc, &reporting, &descriptor).unwrap_err();
        assert!(matches!(err, EngineError::NoViolationReported { .. }));
    }

    #[test]
    fn test_violation_carries_call_state() {
        let fixture = Fixture::new();
        let root = Value::Object(Bean::new("Order"));
        let mut ctx = fixture.builder().for_validate(&root);
        let descriptor = Arc::new(
            ConstraintDescriptor::builder("Min")
                .message("must be at least {value}")
                .attribute("value", 3i64)
                .build(),
        );
        let mut vc = ValueContext::for_executable(
            Some(root.clone()),
            "Order",
            Validatable::Unconstrained,
            Path::parse("quantity").unwrap(),
        );
        vc.set_validated_value(Value::Integer(1));
        vc.set_element_kind(ElementKind::Property);

        let reporting = ConstraintValidatorContext::new(vc.path().clone(), &descriptor);
        let violations = ctx.create_violations(&vc, &reporting, &descriptor).unwrap();
        assert_eq!(violations.len(), 1);
        let violation = &violations[0];
        assert_eq!(violation.message(), "must be at least 3");
        assert_eq!(violation.root_type(), "Order");
        assert_eq!(violation.property_path().to_string(), "quantity");
        assert_eq!(violation.invalid_value(), &Value::Integer(1));

        ctx.add_violations(violations.clone());
        ctx.add_violations(violations);
        assert_eq!(ctx.violation_count(), 1);
    }
}
