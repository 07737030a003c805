pub type TicketId = u64;

/// Terminal state of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome<R> {
    Completed(R),
    Failed(crate::JobError),
    Cancelled,
}

impl<R> JobOutcome<R> {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobOutcome::Cancelled)
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Upper bound on keys executing at the same time.
    pub max_in_flight: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_in_flight: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

/// Counters since the runtime was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub submitted: usize,
    pub coalesced: usize,
    pub executions: usize,
    pub commits: usize,
    pub cancelled: usize,
    /// Executions discarded at the commit point because newer work arrived.
    pub superseded: usize,
    pub failed: usize,
}
