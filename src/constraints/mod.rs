//! Constraint library.
//!
//! The built-in constraints cover presence, size, numeric bounds and boolean
//! assertions. Custom constraints are built the same way, with
//! [`ConstraintDescriptor::builder`](crate::metadata::ConstraintDescriptor::builder).

pub mod builtin;
