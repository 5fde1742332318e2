//! Length bounds for strings and containers.

use super::integer_attribute;
use crate::core::types::Value;
use crate::engine::validator::{ConstraintValidator, ConstraintValidatorContext, ValidatorFault};
use crate::metadata::constraint::{
    ConstraintDescriptor, ConstraintDescriptorBuilder, ValidatorClass, ValueType,
};
use std::sync::Arc;

/// The length must lie within `min..=max`; null is valid.
pub fn size(min: i64, max: i64) -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("Size")
        .message("size must be between {min} and {max}")
        .attribute("min", min)
        .attribute("max", max)
        .validator(size_validator("SizeValidatorForString", ValueType::String))
        .validator(size_validator(
            "SizeValidatorForCollection",
            ValueType::Collection,
        ))
}

fn size_validator(name: &str, target: ValueType) -> ValidatorClass {
    ValidatorClass::new(name, target, |descriptor| {
        Ok(Arc::new(SizeValidator::from_descriptor(descriptor)?) as Arc<dyn ConstraintValidator>)
    })
}

/// Checks string length (in characters) or element count.
#[derive(Debug, Clone, Copy)]
struct SizeValidator {
    min: usize,
    max: usize,
}

impl SizeValidator {
    fn from_descriptor(descriptor: &ConstraintDescriptor) -> Result<Self, String> {
        let min = integer_attribute(descriptor, "min")?;
        let max = integer_attribute(descriptor, "max")?;
        if min < 0 {
            return Err(format!("min must not be negative, got {}", min));
        }
        if max < min {
            return Err(format!("max ({}) must not be below min ({})", max, min));
        }
        Ok(Self {
            min: min as usize,
            max: max as usize,
        })
    }
}

impl ConstraintValidator for SizeValidator {
    fn is_valid(
        &self,
        value: &Value,
        _context: &mut ConstraintValidatorContext,
    ) -> Result<bool, ValidatorFault> {
        if value.is_null() {
            return Ok(true);
        }
        let len = value
            .len()
            .ok_or_else(|| ValidatorFault(format!("{} has no size", value.kind())))?;
        Ok((self.min..=self.max).contains(&len))
    }
}
