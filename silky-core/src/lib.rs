pub mod crawl;
pub mod error;
pub mod export;
pub mod handoff;
pub mod notify;
pub mod report;
pub mod search;

pub use error::CoreError;
