//! # Pramana - Constraint Validation Engine
//!
//! Pramana checks object graphs against declarative constraints. Constraints
//! are declared per type, attached to properties, the type itself, method
//! and constructor parameters, or return values, and evaluated in groups.
//!
//! ## Features
//!
//! - **Groups and Sequences**: Validate subsets of constraints, in order,
//!   stopping at the first failing step of a sequence
//! - **Composed Constraints**: Build constraints from others with AND, OR
//!   and ALL_FALSE semantics
//! - **Cascading**: Follow properties, collection elements and map values
//!   into nested objects, safely across shared and cyclic references
//! - **Container Elements**: Constrain each element of a list, set, array
//!   or map value, with or without cascading into it
//! - **Executable Validation**: Check arguments before and results after a
//!   method or constructor call
//! - **Extensible**: Custom validators, message interpolators, traversable
//!   resolvers and validator factories
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pramana::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = MetadataRegistry::new()
//!     .with_type(
//!         TypeDeclaration::builder("Person")
//!             .property("name", |p| p.constraint(builtin::not_null()))
//!             .property("address", |p| p.valid().of_type("Address"))
//!             .build(),
//!     )
//!     .with_type(
//!         TypeDeclaration::builder("Address")
//!             .property("zip", |p| p.constraint(builtin::size(5, 5)))
//!             .build(),
//!     );
//!
//! let validator = Validator::new(Arc::new(registry), Arc::new(GroupCatalog::new()));
//!
//! let address = Bean::with_properties("Address", [("zip", Value::string("123"))]);
//! let person = Bean::with_properties("Person", [("address", Value::Object(address))]);
//!
//! let violations = validator.validate(&Value::Object(person), &[])?;
//! // "name": must not be null
//! // "address.zip": size must be between 5 and 5
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Values, groups, paths, violations and errors
//! - [`metadata`]: Constraint descriptors, type declarations and the registry
//! - [`groups`]: Validation order generation from groups and sequences
//! - [`engine`]: Constraint evaluation and graph traversal
//! - [`constraints`]: Built-in constraints

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constraints;
pub mod core;
pub mod engine;
pub mod groups;
pub mod metadata;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use pramana::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{Bean, BeanId, BeanRef, Value, ValueKind};
    pub use crate::core::group::{Group, GroupCatalog};
    pub use crate::core::path::{ElementKind, ElementPosition, Path, PathNode};
    pub use crate::core::violation::{ConstraintViolation, ViolationSet};

    // Errors
    pub use crate::core::error::{
        EngineError, EngineResult, ErrorCategory, GroupError, PathError, ViolationRecord,
        ViolationReport,
    };

    // Metadata
    pub use crate::metadata::constraint::{
        CompositionType, ConstraintDescriptor, ConstraintDescriptorBuilder, ValidatorClass,
        ValueType,
    };
    pub use crate::metadata::declaration::{ElementBuilder, ExecutableBuilder, TypeDeclaration};
    pub use crate::metadata::bean::DefaultGroupSequenceProvider;
    pub use crate::metadata::registry::{MetadataProvider, MetadataRegistry};

    // Engine
    pub use crate::engine::interpolator::{MessageInterpolator, ParameterMessageInterpolator};
    pub use crate::engine::options::ValidatorOptions;
    pub use crate::engine::resolver::{TraversableResolver, TraverseAll};
    pub use crate::engine::traversal::Validator;
    pub use crate::engine::validator::{
        ConstraintValidator, ConstraintValidatorContext, ConstraintValidatorFactory,
        DefaultConstraintValidatorFactory, ValidatorFault,
    };

    // Built-in constraints
    pub use crate::constraints::builtin;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
