//! Message interpolation for violations.

use crate::core::types::Value;
use crate::metadata::constraint::ConstraintDescriptor;
use indexmap::IndexMap;

/// Everything an interpolator may draw from.
pub struct InterpolationContext<'a> {
    /// Descriptor of the violated constraint.
    pub descriptor: &'a ConstraintDescriptor,
    /// The rejected value.
    pub validated_value: &'a Value,
    /// Parameters added by the validator.
    pub message_parameters: &'a IndexMap<String, Value>,
}

/// Turns a message template into the final message.
pub trait MessageInterpolator: Send + Sync {
    /// Interpolate `template`. An `Err` aborts the validation call.
    fn interpolate(&self, template: &str, context: &InterpolationContext<'_>)
        -> Result<String, String>;
}

/// Replaces `{name}` placeholders and the `${validatedValue}` expression.
///
/// Placeholders resolve against validator message parameters first, then
/// constraint attributes. Unknown placeholders are kept verbatim. A
/// backslash escapes the next character.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterMessageInterpolator;

impl ParameterMessageInterpolator {
    fn resolve(name: &str, context: &InterpolationContext<'_>) -> Option<String> {
        context
            .message_parameters
            .get(name)
            .or_else(|| context.descriptor.attribute(name))
            .map(ToString::to_string)
    }
}

impl MessageInterpolator for ParameterMessageInterpolator {
    fn interpolate(
        &self,
        template: &str,
        context: &InterpolationContext<'_>,
    ) -> Result<String, String> {
        let mut out = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped) => out.push(escaped),
                    None => out.push('\\'),
                },
                '$' if chars.peek() == Some(&'{') => {
                    chars.next();
                    let expression = read_until_close(&mut chars)
                        .ok_or_else(|| "unterminated expression".to_string())?;
                    if expression.trim() == "validatedValue" {
                        out.push_str(&context.validated_value.to_string());
                    } else {
                        out.push_str("${");
                        out.push_str(&expression);
                        out.push('}');
                    }
                }
                '{' => {
                    let name = read_until_close(&mut chars)
                        .ok_or_else(|| "unterminated parameter".to_string())?;
                    match Self::resolve(name.trim(), context) {
                        Some(value) => out.push_str(&value),
                        None => {
                            out.push('{');
                            out.push_str(&name);
                            out.push('}');
                        }
                    }
                }
                other => out.push(other),
            }
        }

        Ok(out)
    }
}

fn read_until_close(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let mut name = String::new();
    for c in chars.by_ref() {
        if c == '}' {
            return Some(name);
        }
        name.push(c);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpolate(template: &str, value: Value) -> Result<String, String> {
        let descriptor = ConstraintDescriptor::builder("Size")
            .attribute("min", 2i64)
            .attribute("max", 8i64)
            .build();
        let mut params = IndexMap::new();
        params.insert("max".to_string(), Value::Integer(10));
        let context = InterpolationContext {
            descriptor: &descriptor,
            validated_value: &value,
            message_parameters: &params,
        };
        ParameterMessageInterpolator.interpolate(template, &context)
    }

    #[test]
    fn test_attribute_and_parameter_substitution() {
        let message = interpolate("size must be between {min} and {max}", Value::Null).unwrap();
        assert_eq!(message, "size must be between 2 and 10");
    }

    #[test]
    fn test_validated_value_and_escapes() {
        let message = interpolate("'${validatedValue}' is \\{min\\}", Value::string("x")).unwrap();
        assert_eq!(message, "'x' is {min}");
    }

    #[test]
    fn test_unknown_placeholder_kept() {
        let message = interpolate("{NotNull.message}", Value::Null).unwrap();
        assert_eq!(message, "{NotNull.message}");
    }

    #[test]
    fn test_unterminated_placeholder() {
        assert!(interpolate("oops {min", Value::Null).is_err());
    }
}
