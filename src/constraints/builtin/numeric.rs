//! Numeric bounds.

use super::integer_attribute;
use crate::core::types::Value;
use crate::engine::validator::{ConstraintValidator, ConstraintValidatorContext, ValidatorFault};
use crate::metadata::constraint::{
    ConstraintDescriptor, ConstraintDescriptorBuilder, ValidatorClass, ValueType,
};
use std::cmp::Ordering;
use std::sync::Arc;

/// The number must be at least `value`; null is valid.
pub fn min(value: i64) -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("Min")
        .message("must be greater than or equal to {value}")
        .attribute("value", value)
        .validator(bound_validator("MinValidator", Bound::Lower))
}

/// The number must be at most `value`; null is valid.
pub fn max(value: i64) -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("Max")
        .message("must be less than or equal to {value}")
        .attribute("value", value)
        .validator(bound_validator("MaxValidator", Bound::Upper))
}

/// The number must lie within `min..=max`.
///
/// Composed of [`min`] and [`max`] and reported as a single violation.
pub fn range(min_value: i64, max_value: i64) -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("Range")
        .message("must be between {min} and {max}")
        .attribute("min", min_value)
        .attribute("max", max_value)
        .report_as_single_violation()
        .composed_of(min(min_value))
        .composed_of(max(max_value))
}

/// The number must be strictly greater than zero.
pub fn positive() -> ConstraintDescriptorBuilder {
    sign("Positive", "must be greater than 0", |ord| ord == Ordering::Greater)
}

/// The number must be zero or greater.
pub fn positive_or_zero() -> ConstraintDescriptorBuilder {
    sign("PositiveOrZero", "must be greater than or equal to 0", |ord| {
        ord != Ordering::Less
    })
}

/// The number must be strictly less than zero.
pub fn negative() -> ConstraintDescriptorBuilder {
    sign("Negative", "must be less than 0", |ord| ord == Ordering::Less)
}

fn sign(name: &str, message: &str, accept: fn(Ordering) -> bool) -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder(name)
        .message(message)
        .validated_by(format!("{}Validator", name), ValueType::Number, move |value, _| {
            match compare(value, 0) {
                Some(ordering) => Ok(accept(ordering)),
                None if value.is_null() => Ok(true),
                None => Ok(false),
            }
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Lower,
    Upper,
}

fn bound_validator(name: &str, bound: Bound) -> ValidatorClass {
    ValidatorClass::new(name, ValueType::Number, move |descriptor| {
        let limit = integer_attribute(descriptor, "value")?;
        Ok(Arc::new(BoundValidator { limit, bound }) as Arc<dyn ConstraintValidator>)
    })
}

/// Checks a number against an inclusive bound.
#[derive(Debug, Clone, Copy)]
struct BoundValidator {
    limit: i64,
    bound: Bound,
}

impl ConstraintValidator for BoundValidator {
    fn is_valid(
        &self,
        value: &Value,
        _context: &mut ConstraintValidatorContext,
    ) -> Result<bool, ValidatorFault> {
        if value.is_null() {
            return Ok(true);
        }
        // NaN compares to nothing and fails either bound
        let Some(ordering) = compare(value, self.limit) else {
            return Ok(false);
        };
        Ok(match self.bound {
            Bound::Lower => ordering != Ordering::Less,
            Bound::Upper => ordering != Ordering::Greater,
        })
    }
}

/// Compare a number with an integer limit; integers compare exactly.
fn compare(value: &Value, limit: i64) -> Option<Ordering> {
    match value {
        Value::Integer(i) => Some(i.cmp(&limit)),
        Value::Float(f) => f.partial_cmp(&(limit as f64)),
        _ => None,
    }
}
