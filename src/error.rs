use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl AppError {
    /// Upstream failures a track should log and ride out with cached data.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::ExternalApi(_)
                | AppError::MalformedResponse(_)
                | AppError::Timeout(_)
                | AppError::Reqwest(_)
                | AppError::SerdeJson(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
