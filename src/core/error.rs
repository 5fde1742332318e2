//! Error types for Pramana.
//!
//! Uses thiserror for structured errors with context. Errors are split by
//! concern:
//! - `GroupError`: invalid group or sequence definitions
//! - `PathError`: property paths that cannot be parsed or resolved
//! - `EngineError`: everything that aborts a validation call
//!
//! Constraint violations are not errors. They are the normal output of a
//! validation and are collected in a [`ViolationReport`] when a summary is
//! needed.

use crate::core::group::Group;
use crate::core::types::ValueKind;
use crate::core::violation::{ConstraintViolation, ViolationSet};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors in group and group sequence definitions.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupError {
    #[error("Validation groups must not contain a null or blank group")]
    NullGroup,

    #[error("Sequence {sequence} contains group {group}, which inherits from sequence {parent}; sequence definitions are not allowed here")]
    NestedSequence {
        sequence: Group,
        group: Group,
        parent: Group,
    },

    #[error("Cyclic dependency in group sequence definition involving {group}")]
    CyclicDefinition { group: Group },

    #[error("Unable to expand group sequence {sequence}: group {group} would be evaluated twice")]
    UnexpandableSequence { sequence: Group, group: Group },

    #[error("Unable to expand default group list {default_sequence:?} into sequence {sequence:?}")]
    UnexpandableDefaultSequence {
        default_sequence: Vec<Group>,
        sequence: Vec<Group>,
    },

    #[error("Redefined default group sequence of {type_name} must contain {type_name} itself")]
    DefaultSequenceMissingType { type_name: String },

    #[error("Redefined default group sequence of {type_name} must not contain the Default group")]
    DefaultSequenceContainsDefault { type_name: String },
}

/// Errors for property paths handed to single-property validation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathError {
    #[error("Property path must not be empty")]
    Empty,

    #[error("Unable to parse property path '{path}'")]
    Unparsable { path: String },

    #[error("Invalid property name '{identifier}' in path '{path}'")]
    InvalidIdentifier { identifier: String, path: String },

    #[error("Property '{property}' does not exist on type {type_name}")]
    UnknownProperty { property: String, type_name: String },

    #[error("Property '{property}' is a container; the path must select an index or a key")]
    MissingIndexOrKey { property: String },

    #[error("Cannot determine the type of property '{property}' on {type_name}")]
    UnresolvableType { property: String, type_name: String },

    #[error("Property '{property}' is null; the rest of the path cannot be resolved")]
    NullIntermediate { property: String },

    #[error("Property '{property}' of {type_name} is not cascaded; the path cannot continue past it")]
    NotCascaded { property: String, type_name: String },
}

/// Top-level error type for a validation call.
///
/// Any of these aborts the call; no partial violation set is returned.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Group definition error: {0}")]
    Group(#[from] GroupError),

    #[error("Invalid property path: {0}")]
    Path(#[from] PathError),

    #[error("Validator {validator} failed while checking constraint {constraint}: {reason}")]
    EvaluationFault {
        validator: String,
        constraint: String,
        reason: String,
    },

    #[error("No validator for constraint {constraint} accepts values of kind {value_kind}")]
    NoValidatorFound {
        constraint: String,
        value_kind: ValueKind,
    },

    #[error("Several validators for constraint {constraint} match values of kind {value_kind}: {candidates:?}")]
    AmbiguousValidator {
        constraint: String,
        value_kind: ValueKind,
        candidates: Vec<String>,
    },

    #[error("Unable to initialize validator {validator}: {reason}")]
    ValidatorInitialization { validator: String, reason: String },

    #[error("Constraint {constraint} failed but its validator disabled the default violation without reporting another")]
    NoViolationReported { constraint: String },

    #[error("Traversable resolver failed in {operation}: {reason}")]
    TraversableResolver { operation: String, reason: String },

    #[error("Unable to interpolate message '{template}': {reason}")]
    Interpolation { template: String, reason: String },

    #[error("Type {type_name} declares no executable '{executable}'")]
    ExecutableNotFound {
        type_name: String,
        executable: String,
    },

    #[error("Executable '{executable}' expects {expected} parameters, got {actual}")]
    ParameterCount {
        executable: String,
        expected: usize,
        actual: usize,
    },

    #[error("Cascade depth {depth} exceeded at path '{path}'")]
    MaxDepthExceeded { depth: usize, path: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Broad class of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Bad declarations or setup; fix the configuration.
    Configuration,
    /// Bad property path argument.
    Path,
    /// A validator or collaborator failed at runtime.
    Evaluation,
}

// ============================================================================
// Error Utilities
// ============================================================================

impl EngineError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::Path(_) => ErrorCategory::Path,
            EngineError::EvaluationFault { .. }
            | EngineError::NoViolationReported { .. }
            | EngineError::TraversableResolver { .. }
            | EngineError::Interpolation { .. }
            | EngineError::MaxDepthExceeded { .. } => ErrorCategory::Evaluation,
            EngineError::Group(_)
            | EngineError::NoValidatorFound { .. }
            | EngineError::AmbiguousValidator { .. }
            | EngineError::ValidatorInitialization { .. }
            | EngineError::ExecutableNotFound { .. }
            | EngineError::ParameterCount { .. }
            | EngineError::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// Get suggestion for fixing this error.
    pub fn suggested_fix(&self) -> Option<String> {
        match self {
            EngineError::NoValidatorFound { constraint, value_kind } => Some(format!(
                "Register a validator for {} that accepts {}",
                constraint, value_kind
            )),
            EngineError::AmbiguousValidator { constraint, .. } => Some(format!(
                "Narrow the target types of the validators declared for {}",
                constraint
            )),
            EngineError::Path(PathError::UnknownProperty { property, type_name }) => Some(
                format!("Declare '{}' on {} or fix the path", property, type_name),
            ),
            EngineError::Path(PathError::MissingIndexOrKey { property }) => Some(format!(
                "Select an element, e.g. '{}[0]' or '{}[key]'",
                property, property
            )),
            EngineError::MaxDepthExceeded { .. } => {
                Some("Raise max_depth in the validator options".to_string())
            }
            _ => None,
        }
    }
}

/// Result type alias for validation calls.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type alias for group ordering.
pub type GroupResult<T> = Result<T, GroupError>;

/// Result type alias for path handling.
pub type PathResult<T> = Result<T, PathError>;

// ============================================================================
// Violation Report
// ============================================================================

/// Serializable view of a single violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    /// Rendered property path.
    pub path: String,
    /// Interpolated message.
    pub message: String,
    /// Message template before interpolation.
    pub message_template: String,
    /// Name of the violated constraint.
    pub constraint: String,
    /// Type of the root object.
    pub root_type: String,
    /// The rejected value.
    pub invalid_value: serde_json::Value,
}

impl From<&ConstraintViolation> for ViolationRecord {
    fn from(violation: &ConstraintViolation) -> Self {
        Self {
            path: violation.property_path().to_string(),
            message: violation.message().to_string(),
            message_template: violation.message_template().to_string(),
            constraint: violation.constraint().name().to_string(),
            root_type: violation.root_type().to_string(),
            invalid_value: violation.invalid_value().to_json(),
        }
    }
}

/// Result of a validation call, ready to be logged or sent elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationReport {
    /// Whether validation passed (no violations).
    pub success: bool,
    /// All violations in discovery order.
    pub violations: Vec<ViolationRecord>,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

impl ViolationReport {
    /// Build a report from a violation set.
    pub fn new(violations: &ViolationSet, duration: Duration) -> Self {
        Self {
            success: violations.is_empty(),
            violations: violations.iter().map(ViolationRecord::from).collect(),
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Get a summary message.
    pub fn summary(&self) -> String {
        if self.success {
            format!("Validation passed ({}ms)", self.duration_ms)
        } else {
            format!(
                "Validation failed: {} violation(s) ({}ms)",
                self.violations.len(),
                self.duration_ms
            )
        }
    }

    /// Get one line per violation.
    pub fn detailed_violations(&self) -> Vec<String> {
        self.violations
            .iter()
            .map(|v| {
                if v.path.is_empty() {
                    format!("{}: {}", v.root_type, v.message)
                } else {
                    format!("{}: {}", v.path, v.message)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let err: EngineError = GroupError::NullGroup.into();
        assert_eq!(err.category(), ErrorCategory::Configuration);

        let err: EngineError = PathError::Empty.into();
        assert_eq!(err.category(), ErrorCategory::Path);

        let err = EngineError::EvaluationFault {
            validator: "Boom".to_string(),
            constraint: "NotNull".to_string(),
            reason: "exploded".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Evaluation);
        assert!(err.to_string().contains("exploded"));
    }

    #[test]
    fn test_suggested_fix() {
        let err: EngineError = PathError::MissingIndexOrKey {
            property: "items".to_string(),
        }
        .into();
        assert!(err.suggested_fix().unwrap().contains("items[0]"));
        assert!(EngineError::Config("x".to_string()).suggested_fix().is_none());
    }

    #[test]
    fn test_empty_report() {
        let report = ViolationReport::new(&ViolationSet::default(), Duration::from_millis(3));
        assert!(report.success);
        assert_eq!(report.summary(), "Validation passed (3ms)");
        assert!(report.detailed_violations().is_empty());
    }
}
