//! Constraint descriptors and their placement on graph elements.
//!
//! A [`ConstraintDescriptor`] says *what* is checked: its name, message,
//! groups, attributes, how composing constraints combine, and which
//! validator implementations can check it. A [`MetaConstraint`] says
//! *where*: it places a descriptor's evaluation tree on a property, a type,
//! a parameter or a return value of some declaring type.

use crate::core::group::Group;
use crate::core::path::ElementKind;
use crate::core::types::{Value, ValueKind};
use crate::engine::constraint_tree::ConstraintTree;
use crate::engine::validator::{
    ConstraintValidator, ConstraintValidatorContext, FnValidator, ValidatorFault,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// How the results of composing constraints combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompositionType {
    /// Every part must hold.
    #[default]
    And,
    /// At least one part must hold.
    Or,
    /// No part may hold.
    AllFalse,
}

/// Value types a validator implementation accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Any value at all
    Any,
    Boolean,
    Integer,
    Float,
    /// Integers and floats
    Number,
    String,
    List,
    Set,
    Array,
    Map,
    /// Lists, sets, arrays and maps
    Collection,
    /// Any object
    Object,
    /// Objects of the named type
    Type(String),
}

impl ValueType {
    /// Whether values of the given kind are accepted.
    pub fn accepts(&self, kind: &ValueKind) -> bool {
        match (self, kind) {
            (ValueType::Any, _) => true,
            (ValueType::Boolean, ValueKind::Boolean)
            | (ValueType::Integer, ValueKind::Integer)
            | (ValueType::Float, ValueKind::Float)
            | (ValueType::String, ValueKind::String)
            | (ValueType::List, ValueKind::List)
            | (ValueType::Set, ValueKind::Set)
            | (ValueType::Array, ValueKind::Array)
            | (ValueType::Map, ValueKind::Map)
            | (ValueType::Object, ValueKind::Object(_)) => true,
            (ValueType::Number, ValueKind::Integer | ValueKind::Float) => true,
            (
                ValueType::Collection,
                ValueKind::List | ValueKind::Set | ValueKind::Array | ValueKind::Map,
            ) => true,
            (ValueType::Type(expected), ValueKind::Object(actual)) => expected == actual,
            _ => false,
        }
    }

    /// Higher is more specific; the most specific accepting validator wins.
    pub fn specificity(&self) -> u8 {
        match self {
            ValueType::Any => 0,
            ValueType::Number | ValueType::Collection | ValueType::Object => 1,
            _ => 2,
        }
    }
}

/// Creates an initialized validator for a descriptor.
pub type ValidatorInit =
    Arc<dyn Fn(&ConstraintDescriptor) -> Result<Arc<dyn ConstraintValidator>, String> + Send + Sync>;

/// A validator implementation that can check a constraint.
#[derive(Clone)]
pub struct ValidatorClass {
    name: String,
    target: ValueType,
    init: ValidatorInit,
}

impl ValidatorClass {
    /// Declare a validator implementation with its initializer.
    pub fn new<F>(name: impl Into<String>, target: ValueType, init: F) -> Self
    where
        F: Fn(&ConstraintDescriptor) -> Result<Arc<dyn ConstraintValidator>, String>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            target,
            init: Arc::new(init),
        }
    }

    /// Declare a validator from a plain predicate.
    pub fn from_fn<F>(name: impl Into<String>, target: ValueType, check: F) -> Self
    where
        F: Fn(&Value, &mut ConstraintValidatorContext) -> Result<bool, ValidatorFault>
            + Send
            + Sync
            + 'static,
    {
        let check = Arc::new(check);
        Self::new(name, target, move |_| {
            let check = Arc::clone(&check);
            Ok(Arc::new(FnValidator::new(move |value, ctx| check(value, ctx)))
                as Arc<dyn ConstraintValidator>)
        })
    }

    /// Name of the implementation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value types it accepts.
    pub fn target(&self) -> &ValueType {
        &self.target
    }

    /// Create and initialize an instance for `descriptor`.
    pub fn instantiate(
        &self,
        descriptor: &ConstraintDescriptor,
    ) -> Result<Arc<dyn ConstraintValidator>, String> {
        (self.init)(descriptor)
    }
}

impl fmt::Debug for ValidatorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorClass")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("init", &"<closure>")
            .finish()
    }
}

/// Static description of a constraint.
#[derive(Debug)]
pub struct ConstraintDescriptor {
    name: String,
    message_template: String,
    groups: Vec<Group>,
    attributes: IndexMap<String, Value>,
    composition: CompositionType,
    report_as_single_violation: bool,
    validators: Vec<ValidatorClass>,
    composing: Vec<Arc<ConstraintDescriptor>>,
}

impl ConstraintDescriptor {
    /// Start building a descriptor.
    pub fn builder(name: impl Into<String>) -> ConstraintDescriptorBuilder {
        ConstraintDescriptorBuilder::new(name)
    }

    /// Constraint name, e.g. `NotBlank`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message template used for the default violation.
    pub fn message_template(&self) -> &str {
        &self.message_template
    }

    /// Groups the constraint belongs to; never empty.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Attribute values, available to validators and message templates.
    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    /// Look up one attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// How composing constraints combine.
    pub fn composition(&self) -> CompositionType {
        self.composition
    }

    /// Whether a failure is reported as one violation of this constraint.
    pub fn report_as_single_violation(&self) -> bool {
        self.report_as_single_violation
    }

    /// Validator implementations declared for this constraint.
    pub fn validators(&self) -> &[ValidatorClass] {
        &self.validators
    }

    /// Constraints this one is composed of.
    pub fn composing_constraints(&self) -> &[Arc<ConstraintDescriptor>] {
        &self.composing
    }
}

/// Builder for [`ConstraintDescriptor`].
pub struct ConstraintDescriptorBuilder {
    descriptor: ConstraintDescriptor,
}

impl ConstraintDescriptorBuilder {
    /// Create a builder for a constraint named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            descriptor: ConstraintDescriptor {
                message_template: format!("{{{}.message}}", name),
                name,
                groups: Vec::new(),
                attributes: IndexMap::new(),
                composition: CompositionType::And,
                report_as_single_violation: false,
                validators: Vec::new(),
                composing: Vec::new(),
            },
        }
    }

    /// Set the message template.
    pub fn message(mut self, template: impl Into<String>) -> Self {
        self.descriptor.message_template = template.into();
        self
    }

    /// Add a group.
    pub fn group(mut self, group: impl Into<Group>) -> Self {
        self.descriptor.groups.push(group.into());
        self
    }

    /// Replace the groups.
    pub fn groups<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<Group>,
    {
        self.descriptor.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Set an attribute.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.descriptor.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the composition operator.
    pub fn composition(mut self, composition: CompositionType) -> Self {
        self.descriptor.composition = composition;
        self
    }

    /// Report any failure as a single violation of this constraint.
    pub fn report_as_single_violation(mut self) -> Self {
        self.descriptor.report_as_single_violation = true;
        self
    }

    /// Add a validator implementation.
    pub fn validator(mut self, validator: ValidatorClass) -> Self {
        self.descriptor.validators.push(validator);
        self
    }

    /// Add a validator implementation from a predicate.
    pub fn validated_by<F>(self, name: impl Into<String>, target: ValueType, check: F) -> Self
    where
        F: Fn(&Value, &mut ConstraintValidatorContext) -> Result<bool, ValidatorFault>
            + Send
            + Sync
            + 'static,
    {
        self.validator(ValidatorClass::from_fn(name, target, check))
    }

    /// Add a composing constraint.
    pub fn composed_of(mut self, part: ConstraintDescriptorBuilder) -> Self {
        self.descriptor.composing.push(Arc::new(part.build()));
        self
    }

    /// Finish building.
    pub fn build(mut self) -> ConstraintDescriptor {
        if self.descriptor.groups.is_empty() {
            self.descriptor.groups.push(Group::default_group());
        }
        self.descriptor
    }
}

// ============================================================================
// Placement
// ============================================================================

/// Kind of element a constraint is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Field,
    Property,
    /// The type itself (class-level)
    Type,
    Parameter,
    CrossParameter,
    ReturnValue,
    /// Each element of a container-valued property, parameter or return value
    ContainerElement,
}

impl ConstraintKind {
    /// Element kind reported on violations of constraints of this kind.
    pub fn element_kind(self) -> ElementKind {
        match self {
            ConstraintKind::Field | ConstraintKind::Property => ElementKind::Property,
            ConstraintKind::Type => ElementKind::Bean,
            ConstraintKind::Parameter => ElementKind::Parameter,
            ConstraintKind::CrossParameter => ElementKind::CrossParameter,
            ConstraintKind::ReturnValue => ElementKind::ReturnValue,
            ConstraintKind::ContainerElement => ElementKind::ContainerElement,
        }
    }
}

/// Where a constraint is placed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintLocation {
    /// Kind of element.
    pub kind: ConstraintKind,
    /// Type that declares the constraint.
    pub declaring_type: String,
    /// Property or executable name.
    pub member: Option<String>,
    /// Parameter position, for parameter constraints.
    pub parameter_index: Option<usize>,
}

impl ConstraintLocation {
    /// A class-level location.
    pub fn for_type(declaring_type: impl Into<String>) -> Self {
        Self {
            kind: ConstraintKind::Type,
            declaring_type: declaring_type.into(),
            member: None,
            parameter_index: None,
        }
    }

    /// A property location.
    pub fn for_property(
        declaring_type: impl Into<String>,
        property: impl Into<String>,
        kind: ConstraintKind,
    ) -> Self {
        Self {
            kind,
            declaring_type: declaring_type.into(),
            member: Some(property.into()),
            parameter_index: None,
        }
    }

    /// An executable location (parameter, cross-parameter or return value).
    pub fn for_executable(
        declaring_type: impl Into<String>,
        executable: impl Into<String>,
        kind: ConstraintKind,
        parameter_index: Option<usize>,
    ) -> Self {
        Self {
            kind,
            declaring_type: declaring_type.into(),
            member: Some(executable.into()),
            parameter_index,
        }
    }
}

/// Unique identifier of a placed constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintId(pub Uuid);

impl ConstraintId {
    /// Create a new random constraint ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConstraintId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// A constraint evaluation tree placed on a graph element.
#[derive(Debug)]
pub struct MetaConstraint {
    id: ConstraintId,
    location: ConstraintLocation,
    tree: ConstraintTree,
}

impl MetaConstraint {
    /// Place `descriptor` at `location`.
    pub fn new(location: ConstraintLocation, descriptor: Arc<ConstraintDescriptor>) -> Self {
        Self {
            id: ConstraintId::new(),
            location,
            tree: ConstraintTree::new(descriptor),
        }
    }

    /// Identity of this placement.
    pub fn id(&self) -> ConstraintId {
        self.id
    }

    /// Where the constraint is placed.
    pub fn location(&self) -> &ConstraintLocation {
        &self.location
    }

    /// Kind of element the constraint is placed on.
    pub fn kind(&self) -> ConstraintKind {
        self.location.kind
    }

    /// The evaluation tree.
    pub fn tree(&self) -> &ConstraintTree {
        &self.tree
    }

    /// The root descriptor.
    pub fn descriptor(&self) -> &Arc<ConstraintDescriptor> {
        self.tree.descriptor()
    }

    /// Whether the constraint takes part in validating `group`.
    ///
    /// `Default` constraints also belong to the group named after their
    /// declaring type.
    pub fn applies_to(&self, group: &Group) -> bool {
        let groups = self.descriptor().groups();
        groups.contains(group)
            || (group.name() == self.location.declaring_type
                && groups.iter().any(Group::is_default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let descriptor = ConstraintDescriptor::builder("NotNull").build();
        assert_eq!(descriptor.name(), "NotNull");
        assert_eq!(descriptor.groups(), &[Group::default_group()]);
        assert_eq!(descriptor.message_template(), "{NotNull.message}");
        assert_eq!(descriptor.composition(), CompositionType::And);
        assert!(!descriptor.report_as_single_violation());
    }

    #[test]
    fn test_value_type_matching() {
        assert!(ValueType::Number.accepts(&ValueKind::Integer));
        assert!(ValueType::Number.accepts(&ValueKind::Float));
        assert!(!ValueType::Number.accepts(&ValueKind::String));
        assert!(ValueType::Collection.accepts(&ValueKind::Map));
        assert!(ValueType::Type("Car".to_string()).accepts(&ValueKind::Object("Car".to_string())));
        assert!(!ValueType::Type("Car".to_string()).accepts(&ValueKind::Object("Bus".to_string())));
        assert!(ValueType::Integer.specificity() > ValueType::Number.specificity());
        assert!(ValueType::Number.specificity() > ValueType::Any.specificity());
    }

    #[test]
    fn test_applies_to_implicit_type_group() {
        let descriptor = Arc::new(ConstraintDescriptor::builder("NotNull").build());
        let constraint = MetaConstraint::new(
            ConstraintLocation::for_property("Person", "name", ConstraintKind::Field),
            descriptor,
        );

        assert!(constraint.applies_to(&Group::default_group()));
        assert!(constraint.applies_to(&Group::new("Person")));
        assert!(!constraint.applies_to(&Group::new("Strict")));
    }
}
