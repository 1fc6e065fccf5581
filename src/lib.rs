mod builder;
mod cache;
mod ds;
mod entry;
mod error;
mod metrics;
mod policy;
pub mod flight;
pub mod listener;
pub mod loader;
pub mod scorer;
pub mod weigher;

pub use builder::CacheBuilder;
pub use cache::Cache;
pub use error::{BoxError, CacheError, ConfigError};
pub use listener::EvictionCause;
pub use metrics::stats::Metrics;
