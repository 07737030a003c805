//! `ClasspathStore` implementations.

mod file;
mod memory;

pub use file::{CLASSPATH_FILE_SUFFIX, FileClasspathStore};
pub use memory::MemoryClasspathStore;
