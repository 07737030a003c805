pub mod contributor;
pub mod error;
pub mod models;
pub mod registry;
pub mod storage;

pub use contributor::ClasspathContributor;
pub use error::{ApiError, ApiResult, StoreError, StoreResult};
pub use models::*;
pub use registry::{BundleRegistry, ProjectModelProvider};
pub use storage::ClasspathStore;
