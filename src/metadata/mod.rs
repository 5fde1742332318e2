//! Constraint metadata: descriptors, declarations and the registry that
//! resolves them into per-type metadata.

pub mod bean;
pub mod constraint;
pub mod declaration;
pub mod executable;
pub mod registry;

pub use bean::{BeanMetadata, Cascadable, CascadeTarget, DefaultGroupSequenceProvider, PropertyMetadata};
pub use constraint::{
    CompositionType, ConstraintDescriptor, ConstraintDescriptorBuilder, ConstraintId,
    ConstraintKind, ConstraintLocation, MetaConstraint, ValidatorClass, ValueType,
};
pub use declaration::{ElementBuilder, ExecutableBuilder, TypeDeclaration, TypeDeclarationBuilder};
pub use executable::{ExecutableKind, ExecutableMetadata, ParameterMetadata};
pub use registry::{MetadataProvider, MetadataRegistry};
