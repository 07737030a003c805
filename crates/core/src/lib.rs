pub mod error;
pub mod logging;

pub mod classpath;
pub mod config;
pub mod contributor;
pub mod merge;
pub mod registry;
pub mod resolver;
pub mod runtime;
pub mod storage;

pub use config::UpdaterConfig;
pub use error::{ClasspathError, Result};
pub use runtime::{UpdateHandle, UpdateScheduler, UpdateSchedulerBuilder, UpdateStatus};
