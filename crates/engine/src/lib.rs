pub mod binance;
pub mod http;
pub mod job;
pub mod snapshot;
pub mod taapi;

pub use binance::FuturesClient;
pub use job::{build_document, FeedJob, JobConfig};
pub use snapshot::{build_snapshot, TimeframeReadings};
pub use taapi::TaapiClient;
