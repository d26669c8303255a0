//! Model configuration.
//!
//! Selects how field descriptors react to input that cannot be coerced
//! losslessly. Defaults to lenient coercion.
//!
//! Nothing reads the environment implicitly: `SchemaBuilder::new` starts
//! from `ModelConfig::default()`. To honor `TYPEBIND_COERCION`, build the
//! config with [`ModelConfig::from_env`] and pass it to the schema builder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable read by [`ModelConfig::from_env`].
pub const COERCION_ENV_VAR: &str = "TYPEBIND_COERCION";

/// What a field does with input it cannot coerce losslessly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionPolicy {
    /// Replace the input with the kind's fallback (null, or `false` for
    /// non-nullable booleans). Validation sees the fallback.
    #[default]
    Lenient,
    /// Keep the raw input so validation reports the type mismatch.
    Strict,
}

impl CoercionPolicy {
    /// Lowercase name used in configuration text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }

    /// Whether lossy input is kept for validation to reject.
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

impl fmt::Display for CoercionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoercionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(ConfigError::InvalidValue {
                var: COERCION_ENV_VAR.to_string(),
                value: s.to_string(),
                expected: "lenient, strict".to_string(),
            }),
        }
    }
}

/// Per-type model configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Coercion policy applied by every field of the type.
    pub coercion: CoercionPolicy,
}

impl ModelConfig {
    /// Configuration with strict coercion.
    pub fn strict() -> Self {
        Self {
            coercion: CoercionPolicy::Strict,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `TYPEBIND_COERCION` (`lenient` or `strict`, default: `lenient`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let coercion = match lookup(COERCION_ENV_VAR) {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => CoercionPolicy::default(),
        };
        Ok(Self { coercion })
    }
}
