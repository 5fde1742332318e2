//! Null and emptiness checks.

use crate::core::types::Value;
use crate::engine::validator::{ConstraintValidatorContext, ValidatorFault};
use crate::metadata::constraint::{ConstraintDescriptor, ConstraintDescriptorBuilder, ValueType};

/// The value must not be null.
pub fn not_null() -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("NotNull")
        .message("must not be null")
        .validated_by("NotNullValidator", ValueType::Any, |value, _| {
            Ok(!value.is_null())
        })
}

/// The value must be null.
pub fn null() -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("Null")
        .message("must be null")
        .validated_by("NullValidator", ValueType::Any, |value, _| Ok(value.is_null()))
}

/// The string or container must be present and hold at least one element.
pub fn not_empty() -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("NotEmpty")
        .message("must not be empty")
        .validated_by("NotEmptyValidatorForString", ValueType::String, has_elements)
        .validated_by(
            "NotEmptyValidatorForCollection",
            ValueType::Collection,
            has_elements,
        )
}

/// The string must be present and contain a non-whitespace character.
pub fn not_blank() -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("NotBlank")
        .message("must not be blank")
        .validated_by("NotBlankValidator", ValueType::String, |value, _| {
            Ok(value.as_string().map_or(false, |s| !s.trim().is_empty()))
        })
}

fn has_elements(value: &Value, _: &mut ConstraintValidatorContext) -> Result<bool, ValidatorFault> {
    Ok(value.len().map_or(false, |len| len > 0))
}
