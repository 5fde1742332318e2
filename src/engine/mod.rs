//! The validation engine.
//!
//! [`Validator`] drives a call: it builds the validation order, walks the
//! object graph with a [`ValueContext`] cursor, evaluates each
//! [`ConstraintTree`] and collects violations in a per-call
//! [`ValidationContext`].

pub mod constraint_tree;
pub mod context;
pub mod executable;
pub mod interpolator;
pub mod options;
pub mod resolver;
pub mod traversal;
pub mod validator;
pub mod value_context;

pub use constraint_tree::ConstraintTree;
pub use context::{ValidationContext, ValidationContextBuilder};
pub use interpolator::{InterpolationContext, MessageInterpolator, ParameterMessageInterpolator};
pub use options::ValidatorOptions;
pub use resolver::{CachingTraversableResolver, TraversableResolver, TraverseAll};
pub use traversal::Validator;
pub use validator::{
    ConstraintValidator, ConstraintValidatorContext, ConstraintValidatorFactory,
    DefaultConstraintValidatorFactory, FnValidator, ValidatorFault, ViolationBuilder,
    ViolationDraft,
};
pub use value_context::{Validatable, ValueContext};
