pub mod budget;
pub mod bundle;
pub mod cookies;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod frontier;
pub mod lineage;
pub mod observer;
pub mod priority;
pub mod result;
pub mod scope;
pub mod stats;

pub use bundle::ResultBundle;
pub use engine::{
    CrawlOutcome, EngineConfig, EngineState, StopHandle, Termination, TraversalEngine,
    TraversalMode,
};
pub use error::ScanError;
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher};
pub use observer::{CrawlObserver, TracingObserver};
pub use result::{CollectedRecord, ImageKind, ImageRecord, PageRecord};
pub use scope::{ScopeConfig, ScopePolicy};
pub use stats::CrawlStats;
