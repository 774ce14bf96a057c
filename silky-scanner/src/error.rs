use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Bundle encoding failed: {0}")]
    BundleEncode(String),

    #[error("Bundle decoding failed: {0}")]
    BundleDecode(String),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl ScanError {
    /// True for errors that are detected before any traversal starts.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ScanError::InvalidUrl(_) | ScanError::InvalidPattern { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
