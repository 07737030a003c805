//! Keyed background job runtime.
//!
//! Jobs are submitted under a key. Work for one key is strictly serialized,
//! payloads queued while a key is busy are coalesced into the next execution,
//! and cancellation is honored up to the commit point.

pub mod error;
pub mod runtime;
pub mod traits;
pub mod types;

pub use error::JobError;
pub use runtime::{
    DynCommitSink, DynExecutor, FlowControlConfig, JobHandle, JobRuntime, RuntimeComponents,
};
pub use traits::{Coalesce, CommitSink, Executor};
pub use types::{JobOutcome, RuntimeConfig, RuntimeStats, TicketId};
