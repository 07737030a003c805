use crate::error::JobError;

/// Payloads queued for the same key are folded into one before execution.
pub trait Coalesce {
    /// Folds `newer` into `self`; on conflict the newer payload wins.
    fn coalesce(&mut self, newer: Self);
}

/// Computes the result for one key. Runs on the blocking pool.
pub trait Executor<K, P, C>: Send + Sync {
    fn execute(&self, key: &K, payload: P) -> Result<C, JobError>;
}

/// Makes a computed result durable. Only called when no ticket of the batch
/// was cancelled before the commit point.
pub trait CommitSink<K, C, R>: Send + Sync {
    fn commit(&self, key: &K, computed: C) -> Result<R, JobError>;
}
