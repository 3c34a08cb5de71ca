use thiserror::Error;

/// Unified error type for the docshield library.
#[derive(Debug, Error)]
pub enum ShieldError {
    /// The target matched a sensitive pattern; the real call was never issued.
    #[error("Access denied to protected resource")]
    AccessDenied,

    /// The document-retrieval ceiling for this load was exceeded.
    #[error("Access limit exceeded ({attempts}/{limit})")]
    RateLimited { attempts: u32, limit: u32 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Environment variable not set: {0}")]
    ConfigEnvVar(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure reported by a wrapped host primitive.
    #[error("Host error: {0}")]
    Host(String),
}

pub type Result<T> = std::result::Result<T, ShieldError>;
