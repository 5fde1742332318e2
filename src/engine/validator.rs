//! Validator implementations and the context they report through.
//!
//! A [`ConstraintValidator`] checks one value against one constraint. It
//! gets a [`ConstraintValidatorContext`] through which it can replace the
//! default violation with custom ones, each with its own message template
//! and a sub-path below the validated element.

use crate::core::path::{ElementPosition, Path, PathNode};
use crate::core::types::Value;
use crate::metadata::constraint::{ConstraintDescriptor, ValidatorClass};
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

/// Failure raised by a validator while checking a value.
///
/// This is not a violation: it aborts the whole validation call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidatorFault(pub String);

impl From<String> for ValidatorFault {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for ValidatorFault {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Checks a single value against a constraint.
///
/// Implementations are created and initialized once per descriptor and
/// value kind, then shared across threads and validation calls.
pub trait ConstraintValidator: Send + Sync {
    /// Return whether `value` satisfies the constraint.
    fn is_valid(
        &self,
        value: &Value,
        context: &mut ConstraintValidatorContext,
    ) -> Result<bool, ValidatorFault>;
}

/// A validator backed by a closure.
pub struct FnValidator<F> {
    check: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&Value, &mut ConstraintValidatorContext) -> Result<bool, ValidatorFault> + Send + Sync,
{
    /// Wrap a predicate.
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

impl<F> ConstraintValidator for FnValidator<F>
where
    F: Fn(&Value, &mut ConstraintValidatorContext) -> Result<bool, ValidatorFault> + Send + Sync,
{
    fn is_valid(
        &self,
        value: &Value,
        context: &mut ConstraintValidatorContext,
    ) -> Result<bool, ValidatorFault> {
        (self.check)(value, context)
    }
}

/// Produces validator instances.
///
/// Instances are cached per factory, so a custom factory sees each
/// (validator, value kind) pair at most once per constraint.
pub trait ConstraintValidatorFactory: Send + Sync {
    /// Create and initialize a validator of `class` for `descriptor`.
    fn instance(
        &self,
        class: &ValidatorClass,
        descriptor: &ConstraintDescriptor,
    ) -> Result<Arc<dyn ConstraintValidator>, String>;
}

/// Factory that runs the initializer declared with each validator class.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConstraintValidatorFactory;

impl ConstraintValidatorFactory for DefaultConstraintValidatorFactory {
    fn instance(
        &self,
        class: &ValidatorClass,
        descriptor: &ConstraintDescriptor,
    ) -> Result<Arc<dyn ConstraintValidator>, String> {
        class.instantiate(descriptor)
    }
}

// ============================================================================
// Reporting Context
// ============================================================================

/// A violation requested by a validator, not yet interpolated.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationDraft {
    /// Message template.
    pub template: String,
    /// Full path of the failing element.
    pub path: Path,
}

/// Context handed to [`ConstraintValidator::is_valid`].
#[derive(Debug)]
pub struct ConstraintValidatorContext {
    base_path: Path,
    default_template: String,
    default_disabled: bool,
    custom: Vec<ViolationDraft>,
    message_parameters: IndexMap<String, Value>,
}

impl ConstraintValidatorContext {
    /// Create a context for a constraint evaluated at `base_path`.
    pub fn new(base_path: Path, descriptor: &ConstraintDescriptor) -> Self {
        Self {
            base_path,
            default_template: descriptor.message_template().to_string(),
            default_disabled: false,
            custom: Vec::new(),
            message_parameters: IndexMap::new(),
        }
    }

    /// Suppress the violation built from the constraint's own template.
    pub fn disable_default_constraint_violation(&mut self) {
        self.default_disabled = true;
    }

    /// The constraint's own message template.
    pub fn default_constraint_message_template(&self) -> &str {
        &self.default_template
    }

    /// Path of the element being validated.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Make a named value available to message interpolation.
    pub fn add_message_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.message_parameters.insert(name.into(), value.into());
    }

    /// Parameters added through [`Self::add_message_parameter`].
    pub fn message_parameters(&self) -> &IndexMap<String, Value> {
        &self.message_parameters
    }

    /// Start building a custom violation.
    pub fn build_constraint_violation_with_template(
        &mut self,
        template: impl Into<String>,
    ) -> ViolationBuilder<'_> {
        let path = self.base_path.clone();
        ViolationBuilder {
            context: self,
            template: template.into(),
            path,
        }
    }

    /// Whether the default violation has been disabled.
    pub fn is_default_disabled(&self) -> bool {
        self.default_disabled
    }

    /// Violations to materialize after a failed check, default first.
    pub fn drafts(&self) -> Vec<ViolationDraft> {
        let mut drafts = Vec::with_capacity(self.custom.len() + 1);
        if !self.default_disabled {
            drafts.push(ViolationDraft {
                template: self.default_template.clone(),
                path: self.base_path.clone(),
            });
        }
        drafts.extend(self.custom.iter().cloned());
        drafts
    }
}

/// Builder for a custom violation; finish with [`ViolationBuilder::add_constraint_violation`].
pub struct ViolationBuilder<'a> {
    context: &'a mut ConstraintValidatorContext,
    template: String,
    path: Path,
}

impl ViolationBuilder<'_> {
    /// Descend into a property of the validated element.
    pub fn add_property_node(mut self, name: impl Into<String>) -> Self {
        self.path = self.path.append(PathNode::property(name));
        self
    }

    /// Point at the validated bean itself.
    pub fn add_bean_node(mut self) -> Self {
        self.path = self.path.append(PathNode::bean());
        self
    }

    /// Mark the last node as an element of an iterable at `position`.
    pub fn in_iterable(mut self, position: ElementPosition) -> Self {
        if let Some(leaf) = self.path.leaf().cloned() {
            self.path = self.path.with_leaf(leaf.at_position(&position));
        }
        self
    }

    /// Record the violation.
    pub fn add_constraint_violation(self) {
        self.context.custom.push(ViolationDraft {
            template: self.template,
            path: self.path,
        });
    }
}
