//! Codec configuration.
//!
//! A `CodecConfig` is built explicitly by the application and handed to the
//! [`Factory`](crate::registry::Factory); nothing here is process-global.
use serde::{Deserialize, Serialize};

pub const DEFAULT_DISCRIMINATOR_FIELD: &str = "type";

/// Recursion limits for decoding.
///
/// Depth counts nested arrays and objects. serde_json refuses documents nested
/// deeper than 128 levels on its own, so `lenient` stays at that bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Limits {
    pub max_depth: usize,
}

impl Limits {
    pub const fn strict() -> Self {
        Self { max_depth: 64 }
    }

    pub const fn lenient() -> Self {
        Self { max_depth: 128 }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::strict()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodecConfig {
    pub limits: Limits,
    /// Discriminator member used by registries created through the factory.
    pub discriminator_field: String,
    /// Pretty-print encoded bytes.
    pub pretty: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            discriminator_field: DEFAULT_DISCRIMINATOR_FIELD.to_owned(),
            pretty: false,
        }
    }
}

impl CodecConfig {
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_discriminator_field(mut self, field: impl Into<String>) -> Self {
        self.discriminator_field = field.into();
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.discriminator_field, "type");
        assert_eq!(config.limits.max_depth, 64);
        assert!(!config.pretty);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: CodecConfig =
            serde_json::from_str(r#"{"limits":{"maxDepth":16},"pretty":true}"#).unwrap();
        assert_eq!(config.limits.max_depth, 16);
        assert_eq!(config.discriminator_field, "type");
        assert!(config.pretty);
    }

    #[test]
    fn lenient_is_looser() {
        assert!(Limits::lenient().max_depth > Limits::strict().max_depth);
    }
}
