//! Resolved per-type metadata.
//!
//! A [`BeanMetadata`] merges a type's own declaration with everything it
//! inherits: constraints from all supertypes, merged property metadata,
//! cascading relations and executables.

use crate::core::error::{GroupError, GroupResult};
use crate::core::group::Group;
use crate::core::path::{ElementKind, PathNode};
use crate::core::types::{BeanRef, Value};
use crate::metadata::constraint::MetaConstraint;
use crate::metadata::executable::ExecutableMetadata;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// What a cascading relation points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeTarget {
    /// A bean property
    Property(String),
    /// A parameter of an executable
    Parameter { index: usize, name: String },
    /// The return value of an executable
    ReturnValue,
}

/// A relation the engine follows into nested objects.
///
/// A relation may also carry constraints on the elements of a container
/// value. Those are checked even when the relation does not cascade.
#[derive(Debug, Clone)]
pub struct Cascadable {
    target: CascadeTarget,
    group_conversions: IndexMap<Group, Group>,
    declared_type: Option<String>,
    cascading: bool,
    element_constraints: Vec<Arc<MetaConstraint>>,
}

impl Cascadable {
    /// Create a cascading relation.
    pub fn new(
        target: CascadeTarget,
        group_conversions: IndexMap<Group, Group>,
        declared_type: Option<String>,
    ) -> Self {
        Self {
            target,
            group_conversions,
            declared_type,
            cascading: true,
            element_constraints: Vec::new(),
        }
    }

    /// Constrain each element of a container value.
    pub fn with_element_constraints(mut self, constraints: Vec<Arc<MetaConstraint>>) -> Self {
        self.element_constraints = constraints;
        self
    }

    /// Set whether nested objects are validated.
    pub fn with_cascading(mut self, cascading: bool) -> Self {
        self.cascading = cascading;
        self
    }

    /// Whether nested objects are validated.
    pub fn is_cascading(&self) -> bool {
        self.cascading
    }

    /// Constraints checked against each element of a container value.
    pub fn element_constraints(&self) -> &[Arc<MetaConstraint>] {
        &self.element_constraints
    }

    /// What the relation points at.
    pub fn target(&self) -> &CascadeTarget {
        &self.target
    }

    /// Declared type of the related object, when known.
    pub fn declared_type(&self) -> Option<&str> {
        self.declared_type.as_deref()
    }

    /// Group to validate the related object with, given the current group.
    pub fn convert_group(&self, group: &Group) -> Group {
        self.group_conversions
            .get(group)
            .cloned()
            .unwrap_or_else(|| group.clone())
    }

    /// Path node designating the relation.
    pub fn path_node(&self) -> PathNode {
        match &self.target {
            CascadeTarget::Property(name) => PathNode::property(name.clone()),
            CascadeTarget::Parameter { index, name } => PathNode::parameter(name.clone(), *index),
            CascadeTarget::ReturnValue => PathNode::return_value(),
        }
    }

    /// Element kind of the relation.
    pub fn element_kind(&self) -> ElementKind {
        match &self.target {
            CascadeTarget::Property(_) => ElementKind::Property,
            CascadeTarget::Parameter { .. } => ElementKind::Parameter,
            CascadeTarget::ReturnValue => ElementKind::ReturnValue,
        }
    }

    /// Read the related value from its host.
    ///
    /// The host is a bean for properties, the argument list for parameters
    /// and the return value itself for return values.
    pub fn value(&self, host: &Value) -> Value {
        match &self.target {
            CascadeTarget::Property(name) => host
                .as_bean()
                .map(|bean| bean.get(name))
                .unwrap_or(Value::Null),
            CascadeTarget::Parameter { index, .. } => {
                host.element_at(*index).cloned().unwrap_or(Value::Null)
            }
            CascadeTarget::ReturnValue => host.clone(),
        }
    }
}

/// Computes a type's default group sequence from the instance at hand.
pub trait DefaultGroupSequenceProvider: Send + Sync {
    /// The sequence to use for `bean` (absent when validating a bare value).
    ///
    /// Like a static redefinition it must name the type itself, standing for
    /// the type's `Default` constraints.
    fn default_group_sequence(&self, bean: Option<&BeanRef>) -> Vec<Group>;
}

/// A redefinition of a type's `Default` group.
#[derive(Clone)]
pub enum DefaultGroupSequence {
    /// A fixed sequence.
    Static(Vec<Group>),
    /// A sequence computed per instance.
    Dynamic(Arc<dyn DefaultGroupSequenceProvider>),
}

impl fmt::Debug for DefaultGroupSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultGroupSequence::Static(groups) => f.debug_tuple("Static").field(groups).finish(),
            DefaultGroupSequence::Dynamic(_) => f.debug_tuple("Dynamic").field(&"<provider>").finish(),
        }
    }
}

/// Merged metadata of one property across the type hierarchy.
#[derive(Debug, Clone)]
pub struct PropertyMetadata {
    pub(crate) name: String,
    pub(crate) constraints: Vec<Arc<MetaConstraint>>,
    pub(crate) cascadable: Option<Cascadable>,
}

impl PropertyMetadata {
    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constraints on the property, inherited ones included.
    pub fn constraints(&self) -> &[Arc<MetaConstraint>] {
        &self.constraints
    }

    /// The cascading relation, if the property is cascaded or constrains
    /// its elements.
    pub fn cascadable(&self) -> Option<&Cascadable> {
        self.cascadable.as_ref()
    }
}

/// Resolved metadata of a type.
#[derive(Debug)]
pub struct BeanMetadata {
    pub(crate) type_name: String,
    pub(crate) is_interface: bool,
    pub(crate) class_hierarchy: Vec<String>,
    pub(crate) direct_constraints: Vec<Arc<MetaConstraint>>,
    pub(crate) constraints: Vec<Arc<MetaConstraint>>,
    pub(crate) properties: IndexMap<String, PropertyMetadata>,
    pub(crate) cascadables: Vec<Cascadable>,
    pub(crate) default_sequence: Option<DefaultGroupSequence>,
    pub(crate) executables: IndexMap<String, Arc<ExecutableMetadata>>,
}

impl BeanMetadata {
    /// Type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether the type is an interface.
    pub fn is_interface(&self) -> bool {
        self.is_interface
    }

    /// The type followed by its registered supertypes, depth-first.
    pub fn class_hierarchy(&self) -> &[String] {
        &self.class_hierarchy
    }

    /// Constraints declared by this type itself.
    pub fn direct_meta_constraints(&self) -> &[Arc<MetaConstraint>] {
        &self.direct_constraints
    }

    /// All constraints, inherited ones included.
    pub fn meta_constraints(&self) -> &[Arc<MetaConstraint>] {
        &self.constraints
    }

    /// Merged metadata of a property.
    pub fn property(&self, name: &str) -> Option<&PropertyMetadata> {
        self.properties.get(name)
    }

    /// All properties with metadata.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyMetadata> {
        self.properties.values()
    }

    /// Cascading relations.
    pub fn cascadables(&self) -> &[Cascadable] {
        &self.cascadables
    }

    /// Metadata of an executable, own or inherited.
    pub fn executable(&self, name: &str) -> Option<&Arc<ExecutableMetadata>> {
        self.executables.get(name)
    }

    /// Whether validating an instance can produce violations at all.
    pub fn is_constrained(&self) -> bool {
        !self.constraints.is_empty() || !self.cascadables.is_empty()
    }

    /// Whether this type redefines its `Default` group.
    pub fn is_default_group_sequence_redefined(&self) -> bool {
        self.default_sequence.is_some()
    }

    /// The groups `Default` stands for on this type.
    ///
    /// In a redefinition the type's own name is replaced by `Default`, so the
    /// result can be validated group by group. Without a redefinition this
    /// is just `[Default]`.
    pub fn default_group_sequence(&self, bean: Option<&Value>) -> GroupResult<Vec<Group>> {
        let declared = match &self.default_sequence {
            None => return Ok(vec![Group::default_group()]),
            Some(DefaultGroupSequence::Static(groups)) => groups.clone(),
            Some(DefaultGroupSequence::Dynamic(provider)) => {
                provider.default_group_sequence(bean.and_then(Value::as_bean))
            }
        };

        let mut sequence = Vec::with_capacity(declared.len());
        let mut contains_type = false;
        for group in declared {
            if group.name() == self.type_name {
                contains_type = true;
                sequence.push(Group::default_group());
            } else if group.is_default() {
                return Err(GroupError::DefaultSequenceContainsDefault {
                    type_name: self.type_name.clone(),
                });
            } else {
                sequence.push(group);
            }
        }

        if !contains_type {
            return Err(GroupError::DefaultSequenceMissingType {
                type_name: self.type_name.clone(),
            });
        }
        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Bean;

    fn metadata(default_sequence: Option<DefaultGroupSequence>) -> BeanMetadata {
        BeanMetadata {
            type_name: "User".to_string(),
            is_interface: false,
            class_hierarchy: vec!["User".to_string()],
            direct_constraints: Vec::new(),
            constraints: Vec::new(),
            properties: IndexMap::new(),
            cascadables: Vec::new(),
            default_sequence,
            executables: IndexMap::new(),
        }
    }

    fn groups(names: &[&str]) -> Vec<Group> {
        names.iter().map(|n| Group::new(n)).collect()
    }

    #[test]
    fn test_default_sequence_not_redefined() {
        let meta = metadata(None);
        assert!(!meta.is_default_group_sequence_redefined());
        assert_eq!(meta.default_group_sequence(None).unwrap(), groups(&["Default"]));
    }

    #[test]
    fn test_static_default_sequence_replaces_type_name() {
        let meta = metadata(Some(DefaultGroupSequence::Static(groups(&["User", "Strict"]))));
        assert_eq!(
            meta.default_group_sequence(None).unwrap(),
            groups(&["Default", "Strict"])
        );
    }

    #[test]
    fn test_invalid_default_sequences() {
        let missing = metadata(Some(DefaultGroupSequence::Static(groups(&["Strict"]))));
        assert!(matches!(
            missing.default_group_sequence(None),
            Err(GroupError::DefaultSequenceMissingType { .. })
        ));

        let explicit = metadata(Some(DefaultGroupSequence::Static(groups(&["User", "Default"]))));
        assert!(matches!(
            explicit.default_group_sequence(None),
            Err(GroupError::DefaultSequenceContainsDefault { .. })
        ));
    }

    struct ByRole;

    impl DefaultGroupSequenceProvider for ByRole {
        fn default_group_sequence(&self, bean: Option<&BeanRef>) -> Vec<Group> {
            let admin = bean
                .map(|b| b.get("role") == Value::string("admin"))
                .unwrap_or(false);
            if admin {
                groups(&["User", "Admin"])
            } else {
                groups(&["User"])
            }
        }
    }

    #[test]
    fn test_dynamic_default_sequence() {
        let meta = metadata(Some(DefaultGroupSequence::Dynamic(Arc::new(ByRole))));
        let admin = Value::Object(Bean::with_properties("User", [("role", Value::string("admin"))]));
        assert_eq!(
            meta.default_group_sequence(Some(&admin)).unwrap(),
            groups(&["Default", "Admin"])
        );
        assert_eq!(meta.default_group_sequence(None).unwrap(), groups(&["Default"]));
    }

    #[test]
    fn test_cascadable_value_and_conversion() {
        let mut conversions = IndexMap::new();
        conversions.insert(Group::default_group(), Group::new("Shipping"));
        let cascadable = Cascadable::new(
            CascadeTarget::Property("address".to_string()),
            conversions,
            Some("Address".to_string()),
        );

        let address = Bean::new("Address");
        let person = Value::Object(Bean::with_properties(
            "Person",
            [("address", Value::Object(address.clone()))],
        ));

        assert_eq!(cascadable.value(&person), Value::Object(address));
        assert_eq!(cascadable.convert_group(&Group::default_group()), Group::new("Shipping"));
        assert_eq!(cascadable.convert_group(&Group::new("Other")), Group::new("Other"));
        assert_eq!(cascadable.path_node(), PathNode::property("address"));

        let parameter = Cascadable::new(
            CascadeTarget::Parameter { index: 1, name: "arg1".to_string() },
            IndexMap::new(),
            None,
        );
        let args = Value::List(vec![Value::Integer(1), Value::string("x")]);
        assert_eq!(parameter.value(&args), Value::string("x"));
        assert_eq!(parameter.element_kind(), ElementKind::Parameter);
    }
}
