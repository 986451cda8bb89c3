use thiserror::Error;

/// Refusals raised by the record cache before any remote call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("row {0} already has a write in flight")]
    AlreadyPending(u32),

    #[error("row {0} is not in the loaded sheet")]
    UnknownRow(u32),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Remote(format!("request timed out: {e}"))
        } else {
            AppError::Remote(e.to_string())
        }
    }
}

impl AppError {
    /// Errors that should send the reviewer back to the sign-in screen.
    pub fn is_auth(&self) -> bool {
        matches!(self, AppError::Auth(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
