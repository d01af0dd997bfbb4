pub mod clients;
pub mod config;
pub mod error;
pub mod types;

pub use clients::{FeedStore, IndicatorSource, StoredFile};
pub use config::{Config, Secret};
pub use error::{excerpt, ConfigError, Error, Result};
pub use types::*;
