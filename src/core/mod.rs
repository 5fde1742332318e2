//! Core types for the Pramana validation engine.
//!
//! This module contains the foundational types every other module builds on:
//! - Graph values and beans
//! - Validation groups and the group catalog
//! - Property paths
//! - Constraint violations
//! - Error types

pub mod error;
pub mod group;
pub mod path;
pub mod types;
pub mod violation;

// Re-export commonly used types
pub use error::{EngineError, GroupError, PathError, ViolationReport};
pub use group::{Group, GroupCatalog};
pub use path::{ElementKind, ElementPosition, Path, PathNode};
pub use types::{Bean, BeanId, BeanRef, Value, ValueKind};
pub use violation::{ConstraintViolation, ViolationSet};
