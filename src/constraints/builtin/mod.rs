//! Built-in constraint definitions.
//!
//! Each function returns a [`ConstraintDescriptorBuilder`] preset with a
//! name, default message and validators, which can be refined (groups,
//! message, composition) before it is placed on an element.

mod boolean;
mod numeric;
mod presence;
mod size;

use crate::core::types::Value;
use crate::metadata::constraint::ConstraintDescriptor;

pub use boolean::{assert_false, assert_true};
pub use numeric::{max, min, negative, positive, positive_or_zero, range};
pub use presence::{not_blank, not_empty, not_null, null};
pub use size::size;

// Helper to read an integer attribute during validator initialization
fn integer_attribute(descriptor: &ConstraintDescriptor, name: &str) -> Result<i64, String> {
    match descriptor.attribute(name) {
        Some(Value::Integer(value)) => Ok(*value),
        Some(other) => Err(format!(
            "attribute '{}' of {} must be an integer, got {}",
            name,
            descriptor.name(),
            other.kind()
        )),
        None => Err(format!(
            "{} is missing attribute '{}'",
            descriptor.name(),
            name
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_attribute() {
        let descriptor = size(1, 3).build();
        assert_eq!(integer_attribute(&descriptor, "min"), Ok(1));
        assert!(integer_attribute(&descriptor, "other").is_err());

        let descriptor = ConstraintDescriptor::builder("Size").attribute("min", "one").build();
        let err = integer_attribute(&descriptor, "min").unwrap_err();
        assert!(err.contains("must be an integer"));
    }
}
