//! Classpath computation: turns a resolved dependency closure into ordered
//! entries.

pub mod access;
pub mod builder;
pub mod entry;
pub mod environment;
pub mod source;

pub use builder::{BuildOutput, ClasspathBuilder};
pub use entry::EntryFactory;
pub use source::{SourceConvention, SourceLocator};
