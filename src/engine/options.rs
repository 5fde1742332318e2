//! Validator configuration.

use crate::core::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Options for validation calls.
///
/// Can be built in code or loaded from TOML:
///
/// ```toml
/// fail_fast = true
/// max_depth = 64
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    /// Stop at the first violation.
    pub fail_fast: bool,
    /// Maximum cascade depth; `None` means unbounded.
    pub max_depth: Option<usize>,
    /// Memoize traversable resolver answers within a call.
    pub cache_traversable_resolution: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_depth: None,
            cache_traversable_resolution: true,
        }
    }
}

impl ValidatorOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set fail-fast mode.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Cap the cascade depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Enable or disable the per-call resolver cache.
    pub fn with_traversable_cache(mut self, enabled: bool) -> Self {
        self.cache_traversable_resolution = enabled;
        self
    }

    /// Parse options from a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> EngineResult<Self> {
        toml::from_str(input).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Render the options as TOML.
    pub fn to_toml_string(&self) -> EngineResult<String> {
        toml::to_string(self).map_err(|e| EngineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ValidatorOptions::default();
        assert!(!options.fail_fast);
        assert_eq!(options.max_depth, None);
        assert!(options.cache_traversable_resolution);
    }

    #[test]
    fn test_from_toml() {
        let options = ValidatorOptions::from_toml_str("fail_fast = true\nmax_depth = 8\n").unwrap();
        assert_eq!(
            options,
            ValidatorOptions::new().with_fail_fast(true).with_max_depth(8)
        );
    }

    #[test]
    fn test_invalid_toml() {
        let err = ValidatorOptions::from_toml_str("fail_fast = \"yes\"").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let options = ValidatorOptions::new().with_traversable_cache(false);
        let rendered = options.to_toml_string().unwrap();
        assert_eq!(ValidatorOptions::from_toml_str(&rendered).unwrap(), options);
    }
}
