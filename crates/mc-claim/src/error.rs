//! Configuration error types.

use thiserror::Error;

/// Why a [`ClaimConfig`](crate::ClaimConfig) was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Malformed JSON.
    #[error("invalid claim config: {0}")]
    Json(#[from] serde_json::Error),

    /// Environment variable that doesn't parse as a number.
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },

    #[error("max_cells must be at least 1")]
    ZeroMaxCells,

    #[error("interval must be at least 1 tick")]
    ZeroInterval,

    #[error("expansion_rate must be at least 1 tick")]
    ZeroExpansionRate,

    #[error("max_radius {max_radius} is below initial_radius {initial_radius}")]
    RadiusCeilingBelowInitial { initial_radius: u32, max_radius: u32 },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
