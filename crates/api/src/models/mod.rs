pub mod bundle;
pub mod classpath;
pub mod project;
pub mod update;

pub use bundle::*;
pub use classpath::*;
pub use project::*;
pub use update::*;
