use silky_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Crawl worker did not report within {0} seconds")]
    HandoffTimeout(u64),

    #[error("Crawl worker exited without sending results")]
    WorkerDisconnected,

    #[error("Failed to start crawl worker: {0}")]
    WorkerStart(String),

    #[error("Notification failed: {0}")]
    Notify(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Nothing to export: {0}")]
    NothingToExport(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
