//! Configuration error types.

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors fail fast at startup rather than being tolerated
/// and silently falling back to defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown unit resolver '{0}', expected one of: method, class, package, singleton")]
    UnknownResolver(String),

    #[error("malformed glob pattern '{pattern}' for analysis '{analysis}': {source}")]
    MalformedGlob {
        analysis: String,
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("malformed analysis option '{option}' for analysis '{analysis}': {reason}")]
    MalformedOption {
        analysis: String,
        option: String,
        reason: String,
    },

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
