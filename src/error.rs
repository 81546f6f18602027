//! Error types for mail-triage.

/// Top-level error type for the batch job.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailbox error: {0}")]
    Mail(#[from] MailError),

    #[error("Classifier error: {0}")]
    Llm(#[from] LlmError),

    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),
}

/// Configuration errors — fatal, raised before any work starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Gmail-side errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mailbox credential unusable at {path}: {reason}")]
    Auth { path: String, reason: String },

    #[error("Gmail request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gmail API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Groq-side errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Groq request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Groq API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Malformed stream event: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Classifier output that yields no usable record. The only per-item
/// recoverable error: the pipeline handles it inline (log and skip), so it
/// never surfaces through [`Error`].
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no extractable JSON object in classifier response")]
    NoJson,

    #[error("classifier JSON did not decode: {0}")]
    Json(#[from] serde_json::Error),
}

/// Google Sheets errors.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Sheets authentication failed: {0}")]
    Auth(String),

    #[error("Failed to append ticket to tab {tab}: {reason}")]
    Append { tab: String, reason: String },
}

/// Result type alias for the batch job.
pub type Result<T> = std::result::Result<T, Error>;
