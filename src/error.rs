use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("{context}: unexpected HTTP status {status}")]
    Status { context: String, status: u16 },

    #[error("{context}: still rate limited after {attempts} attempts")]
    RateLimited { context: String, attempts: u32 },

    #[error("field `{field}` is not an integer identifier: {value}")]
    TypeCoercion { field: String, value: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Histogram error: {0}")]
    Histogram(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// True when the server kept answering 429 until the retry budget ran out.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AppError::RateLimited { .. })
    }
}
