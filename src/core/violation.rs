//! Constraint violation records.

use crate::core::path::{ElementKind, Path};
use crate::core::types::Value;
use crate::metadata::constraint::ConstraintDescriptor;
use indexmap::IndexSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Set of violations produced by one validation call, in discovery order.
pub type ViolationSet = IndexSet<ConstraintViolation>;

/// A single failed constraint.
///
/// Two violations are equal when every field is equal; objects compare by
/// identity and descriptors by reference. Violations therefore collapse in a
/// [`ViolationSet`] only when they describe exactly the same failure.
#[derive(Debug, Clone)]
pub struct ConstraintViolation {
    pub(crate) message: String,
    pub(crate) message_template: String,
    pub(crate) root_bean: Option<Value>,
    pub(crate) root_type: String,
    pub(crate) leaf_bean: Option<Value>,
    pub(crate) invalid_value: Value,
    pub(crate) property_path: Path,
    pub(crate) constraint: Arc<ConstraintDescriptor>,
    pub(crate) element_kind: ElementKind,
    pub(crate) executable_parameters: Option<Vec<Value>>,
    pub(crate) executable_return_value: Option<Value>,
}

impl ConstraintViolation {
    /// Interpolated message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Message template before interpolation.
    pub fn message_template(&self) -> &str {
        &self.message_template
    }

    /// The object the validation call started from, if any.
    pub fn root_bean(&self) -> Option<&Value> {
        self.root_bean.as_ref()
    }

    /// Type of the root object.
    pub fn root_type(&self) -> &str {
        &self.root_type
    }

    /// The object hosting the failing element, if any.
    pub fn leaf_bean(&self) -> Option<&Value> {
        self.leaf_bean.as_ref()
    }

    /// The value that failed the constraint.
    pub fn invalid_value(&self) -> &Value {
        &self.invalid_value
    }

    /// Location of the failing element, relative to the root.
    pub fn property_path(&self) -> &Path {
        &self.property_path
    }

    /// Descriptor of the violated constraint.
    pub fn constraint(&self) -> &ConstraintDescriptor {
        &self.constraint
    }

    /// Kind of element the violated constraint was placed on.
    pub fn element_kind(&self) -> ElementKind {
        self.element_kind
    }

    /// Arguments of the validated executable call.
    pub fn executable_parameters(&self) -> Option<&[Value]> {
        self.executable_parameters.as_deref()
    }

    /// Return value of the validated executable call.
    pub fn executable_return_value(&self) -> Option<&Value> {
        self.executable_return_value.as_ref()
    }
}

impl PartialEq for ConstraintViolation {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
            && self.message_template == other.message_template
            && self.root_type == other.root_type
            && self.property_path == other.property_path
            && self.element_kind == other.element_kind
            && Arc::ptr_eq(&self.constraint, &other.constraint)
            && self.invalid_value == other.invalid_value
            && self.root_bean == other.root_bean
            && self.leaf_bean == other.leaf_bean
            && self.executable_parameters == other.executable_parameters
            && self.executable_return_value == other.executable_return_value
    }
}

impl Eq for ConstraintViolation {}

impl Hash for ConstraintViolation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.message.hash(state);
        self.root_type.hash(state);
        self.property_path.hash(state);
        self.invalid_value.hash(state);
        Arc::as_ptr(&self.constraint).hash(state);
    }
}
