//! Boolean assertions.

use crate::metadata::constraint::{ConstraintDescriptor, ConstraintDescriptorBuilder, ValueType};

/// The value must be `true`; null is valid.
pub fn assert_true() -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("AssertTrue")
        .message("must be true")
        .validated_by("AssertTrueValidator", ValueType::Boolean, |value, _| {
            Ok(value.as_bool().unwrap_or(value.is_null()))
        })
}

/// The value must be `false`; null is valid.
pub fn assert_false() -> ConstraintDescriptorBuilder {
    ConstraintDescriptor::builder("AssertFalse")
        .message("must be false")
        .validated_by("AssertFalseValidator", ValueType::Boolean, |value, _| {
            Ok(value.as_bool().map_or(value.is_null(), |b| !b))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path::Path;
    use crate::core::types::Value;
    use crate::engine::validator::ConstraintValidatorContext;

    fn check(builder: ConstraintDescriptorBuilder, value: Value) -> bool {
        let descriptor = builder.build();
        let validator = descriptor.validators()[0].instantiate(&descriptor).ok().unwrap();
        let mut ctx = ConstraintValidatorContext::new(Path::root(), &descriptor);
        validator.is_valid(&value, &mut ctx).unwrap()
    }

    #[test]
    fn test_assertions() {
        assert!(check(assert_true(), Value::Boolean(true)));
        assert!(!check(assert_true(), Value::Boolean(false)));
        assert!(check(assert_true(), Value::Null));
        assert!(check(assert_false(), Value::Boolean(false)));
        assert!(!check(assert_false(), Value::Boolean(true)));
        assert!(check(assert_false(), Value::Null));
    }
}
