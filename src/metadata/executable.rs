//! Metadata of methods and constructors.

use crate::core::path::Path;
use crate::metadata::bean::Cascadable;
use crate::metadata::constraint::MetaConstraint;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Whether an executable is a method or a constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutableKind {
    /// A method called on an instance
    Method,
    /// A constructor creating an instance
    Constructor,
}

/// Metadata of one parameter.
#[derive(Debug, Clone)]
pub struct ParameterMetadata {
    pub(crate) index: usize,
    pub(crate) name: String,
    pub(crate) constraints: Vec<Arc<MetaConstraint>>,
    pub(crate) cascadable: Option<Cascadable>,
}

impl ParameterMetadata {
    /// Position in the parameter list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Parameter name as it appears in paths.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constraints on the parameter.
    pub fn constraints(&self) -> &[Arc<MetaConstraint>] {
        &self.constraints
    }

    /// Whether the argument is cascaded.
    pub fn is_cascading(&self) -> bool {
        self.cascadable.as_ref().map_or(false, Cascadable::is_cascading)
    }
}

/// Metadata of a method or constructor.
#[derive(Debug)]
pub struct ExecutableMetadata {
    pub(crate) name: String,
    pub(crate) kind: ExecutableKind,
    pub(crate) declaring_type: String,
    pub(crate) parameters: Vec<ParameterMetadata>,
    pub(crate) cross_parameter_constraints: Vec<Arc<MetaConstraint>>,
    pub(crate) return_value_constraints: Vec<Arc<MetaConstraint>>,
    pub(crate) parameter_cascadables: Vec<Cascadable>,
    pub(crate) return_value_cascadables: Vec<Cascadable>,
}

impl ExecutableMetadata {
    /// Executable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method or constructor.
    pub fn kind(&self) -> ExecutableKind {
        self.kind
    }

    /// Type that declares the executable.
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// Parameters in order.
    pub fn parameters(&self) -> &[ParameterMetadata] {
        &self.parameters
    }

    /// Constraints on the parameter list as a whole.
    pub fn cross_parameter_constraints(&self) -> &[Arc<MetaConstraint>] {
        &self.cross_parameter_constraints
    }

    /// Constraints on the return value.
    pub fn return_value_constraints(&self) -> &[Arc<MetaConstraint>] {
        &self.return_value_constraints
    }

    /// Cascaded parameters.
    pub fn parameter_cascadables(&self) -> &[Cascadable] {
        &self.parameter_cascadables
    }

    /// The cascaded return value, if any.
    pub fn return_value_cascadables(&self) -> &[Cascadable] {
        &self.return_value_cascadables
    }

    /// Path of the executable node all its violations start with.
    pub fn path(&self) -> Path {
        match self.kind {
            ExecutableKind::Method => Path::for_method(self.name.clone()),
            ExecutableKind::Constructor => Path::for_constructor(self.name.clone()),
        }
    }

    /// Whether any constraint or cascade applies to the executable.
    pub fn is_constrained(&self) -> bool {
        !self.cross_parameter_constraints.is_empty()
            || !self.return_value_constraints.is_empty()
            || !self.parameter_cascadables.is_empty()
            || !self.return_value_cascadables.is_empty()
            || self.parameters.iter().any(|p| !p.constraints.is_empty())
    }
}
