use thiserror::Error;

use crate::types::LegId;

/// Top-level error type for strider-core.
#[derive(Debug, Error)]
pub enum StriderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rig error: {0}")]
    Rig(#[from] RigError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Invalid tick dt: {0} (must be > 0)")]
    InvalidTickDt(f32),

    #[error("min_distance ({min}) must not exceed max_distance ({max})")]
    DistanceBandInverted { min: f32, max: f32 },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_owned(),
            message: message.into(),
        }
    }
}

/// Rig construction errors.
///
/// Copy + static messages; these only surface while assembling a rig, never
/// from a per-tick update.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RigError {
    #[error("Bone chain has zero total length")]
    ZeroLengthChain,

    #[error("Bone {bone} offset is not finite")]
    NonFiniteBone { bone: usize },

    #[error("No ground below the {leg} leg within {max_distance} m")]
    NoGroundBelow { leg: LegId, max_distance: f32 },
}
