use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::error::JobError;
use crate::traits::{Coalesce, CommitSink, Executor};
use crate::types::{JobOutcome, RuntimeConfig, RuntimeStats, TicketId};

pub mod flow_control;

pub use flow_control::{FlowControlConfig, FlowController};

pub type DynExecutor<K, P, C> = Arc<dyn Executor<K, P, C> + Send + Sync>;
pub type DynCommitSink<K, C, R> = Arc<dyn CommitSink<K, C, R> + Send + Sync>;

pub struct RuntimeComponents<K, P, C, R> {
    pub executor: DynExecutor<K, P, C>,
    pub commit_sink: DynCommitSink<K, C, R>,
}

/// Caller side of one submission.
pub struct JobHandle<K, R> {
    id: TicketId,
    key: K,
    cancel: CancellationToken,
    reply: oneshot::Receiver<JobOutcome<R>>,
}

impl<K, R> JobHandle<K, R> {
    pub fn id(&self) -> TicketId {
        self.id
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Waits for the terminal outcome.
    pub async fn join(self) -> JobOutcome<R> {
        self.reply
            .await
            .unwrap_or(JobOutcome::Failed(JobError::Shutdown))
    }
}

struct Ticket<P, R> {
    id: TicketId,
    payload: P,
    cancel: CancellationToken,
    reply: oneshot::Sender<JobOutcome<R>>,
}

impl<P, R> Ticket<P, R> {
    fn resolve(self, outcome: JobOutcome<R>) {
        // The caller may have dropped its handle; nothing to report then.
        let _ = self.reply.send(outcome);
    }
}

/// Per-key queue. `active` is true while a driver task owns the key,
/// `running` while a batch has not yet passed its commit point.
/// `superseded` marks a running batch that newer submissions must join.
struct Slot<P, R> {
    queue: VecDeque<Ticket<P, R>>,
    active: bool,
    running: bool,
    superseded: bool,
}

impl<P, R> Default for Slot<P, R> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            active: false,
            running: false,
            superseded: false,
        }
    }
}

#[derive(Default)]
struct Counters {
    submitted: AtomicUsize,
    coalesced: AtomicUsize,
    executions: AtomicUsize,
    commits: AtomicUsize,
    cancelled: AtomicUsize,
    superseded: AtomicUsize,
    failed: AtomicUsize,
}

struct Shared<K, P, C, R> {
    slots: DashMap<K, Slot<P, R>>,
    executor: DynExecutor<K, P, C>,
    commit_sink: DynCommitSink<K, C, R>,
    flow: FlowController,
    next_ticket: AtomicU64,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    handle: Handle,
    counters: Counters,
}

enum BatchOutcome<R> {
    Finished(JobOutcome<R>),
    /// A ticket was cancelled, or newer work arrived, before the commit
    /// point; nothing was written.
    Discarded,
}

/// Keyed job runtime.
///
/// - at most one execution per key is in flight
/// - everything pending for a key is folded into a single payload with
///   [`Coalesce`]; work submitted while a batch runs supersedes it, and the
///   batch is re-run together with the newer payloads instead of committing
/// - cancellation and supersession are checked once, right before commit
pub struct JobRuntime<K, P, C, R> {
    shared: Arc<Shared<K, P, C, R>>,
}

impl<K, P, C, R> JobRuntime<K, P, C, R>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    P: Coalesce + Clone + Send + Sync + 'static,
    C: Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Must be called from within a tokio runtime; jobs are spawned onto it.
    pub fn new(
        config: RuntimeConfig,
        components: RuntimeComponents<K, P, C, R>,
    ) -> Result<Self, JobError> {
        let handle = Handle::try_current().map_err(|e| JobError::NoRuntime(e.to_string()))?;
        let flow = FlowController::new(&FlowControlConfig::from(&config));

        Ok(Self {
            shared: Arc::new(Shared {
                slots: DashMap::new(),
                executor: components.executor,
                commit_sink: components.commit_sink,
                flow,
                next_ticket: AtomicU64::new(1),
                shutdown: CancellationToken::new(),
                tracker: TaskTracker::new(),
                handle,
                counters: Counters::default(),
            }),
        })
    }

    /// Queues `payload` for `key`. Returns immediately.
    pub fn submit(&self, key: K, payload: P) -> JobHandle<K, R> {
        let shared = &self.shared;
        let id = shared.next_ticket.fetch_add(1, Ordering::Relaxed);
        let cancel = shared.shutdown.child_token();
        let (reply, rx) = oneshot::channel();
        shared.counters.submitted.fetch_add(1, Ordering::Relaxed);

        let handle = JobHandle {
            id,
            key: key.clone(),
            cancel: cancel.clone(),
            reply: rx,
        };
        let ticket = Ticket {
            id,
            payload,
            cancel,
            reply,
        };

        if shared.shutdown.is_cancelled() {
            shared.counters.cancelled.fetch_add(1, Ordering::Relaxed);
            ticket.resolve(JobOutcome::Cancelled);
            return handle;
        }

        let start_driver = {
            let mut slot = shared.slots.entry(key.clone()).or_default();
            slot.queue.push_back(ticket);
            if slot.active {
                if slot.running {
                    slot.superseded = true;
                }
                debug!(?key, queued = slot.queue.len(), "job joins pending work");
                false
            } else {
                slot.active = true;
                true
            }
        };

        if start_driver {
            let driver = drive(Arc::clone(shared), key);
            shared.tracker.spawn_on(driver, &shared.handle);
        }

        handle
    }

    /// Requests cancellation. Returns `true` when the ticket was still queued
    /// and has been removed; a running ticket is discarded at the commit
    /// point instead, and a finished one is unaffected.
    pub fn cancel(&self, handle: &JobHandle<K, R>) -> bool {
        handle.cancel.cancel();

        let removed = self.shared.slots.get_mut(&handle.key).and_then(|mut slot| {
            let pos = slot.queue.iter().position(|t| t.id == handle.id)?;
            slot.queue.remove(pos)
        });

        match removed {
            Some(ticket) => {
                debug!(key = ?handle.key, ticket = handle.id, "cancelled queued job");
                self.shared.counters.cancelled.fetch_add(1, Ordering::Relaxed);
                ticket.resolve(JobOutcome::Cancelled);
                true
            }
            None => false,
        }
    }

    /// Number of tickets waiting for `key` (not counting a running batch).
    pub fn pending(&self, key: &K) -> usize {
        self.shared
            .slots
            .get(key)
            .map(|slot| slot.queue.len())
            .unwrap_or(0)
    }

    pub fn is_busy(&self, key: &K) -> bool {
        self.shared
            .slots
            .get(key)
            .is_some_and(|slot| slot.active)
    }

    pub fn stats(&self) -> RuntimeStats {
        let c = &self.shared.counters;
        RuntimeStats {
            submitted: c.submitted.load(Ordering::Relaxed),
            coalesced: c.coalesced.load(Ordering::Relaxed),
            executions: c.executions.load(Ordering::Relaxed),
            commits: c.commits.load(Ordering::Relaxed),
            cancelled: c.cancelled.load(Ordering::Relaxed),
            superseded: c.superseded.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
        }
    }

    /// Cancels all queued work and waits for running executions to finish.
    pub async fn shutdown(&self) {
        self.shared.shutdown.cancel();
        self.shared.tracker.close();
        self.shared.tracker.wait().await;
    }
}

async fn drive<K, P, C, R>(shared: Arc<Shared<K, P, C, R>>, key: K)
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    P: Coalesce + Clone + Send + Sync + 'static,
    C: Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    while let Some(batch) = take_batch(&shared, &key) {
        let (cancelled, live): (Vec<_>, Vec<_>) =
            batch.into_iter().partition(|t| t.cancel.is_cancelled());
        resolve_cancelled(&shared, cancelled);

        let Some(payload) = fold_payloads(&live) else {
            continue;
        };
        if live.len() > 1 {
            debug!(?key, tickets = live.len(), "coalesced queued jobs");
            shared
                .counters
                .coalesced
                .fetch_add(live.len() - 1, Ordering::Relaxed);
        }

        let outcome = run_batch(&shared, &key, payload, &live).await;
        if let Some(mut slot) = shared.slots.get_mut(&key) {
            slot.running = false;
        }
        match outcome {
            BatchOutcome::Finished(outcome) => {
                for ticket in live {
                    ticket.resolve(outcome.clone());
                }
            }
            BatchOutcome::Discarded => {
                let (cancelled, keep): (Vec<_>, Vec<_>) =
                    live.into_iter().partition(|t| t.cancel.is_cancelled());
                resolve_cancelled(&shared, cancelled);
                requeue_front(&shared, &key, keep);
            }
        }
    }
}

fn take_batch<K, P, C, R>(shared: &Shared<K, P, C, R>, key: &K) -> Option<Vec<Ticket<P, R>>>
where
    K: Eq + Hash + Clone,
{
    let mut slot = shared.slots.get_mut(key)?;
    if slot.queue.is_empty() {
        slot.active = false;
        drop(slot);
        // A submit may have re-activated the slot in between.
        shared
            .slots
            .remove_if(key, |_, s| !s.active && s.queue.is_empty());
        return None;
    }
    slot.running = true;
    slot.superseded = false;
    Some(slot.queue.drain(..).collect())
}

/// Closes the commit window for the running batch. Returns `false` when
/// newer submissions arrived and the batch must be re-run with them.
fn seal_batch<K, P, C, R>(shared: &Shared<K, P, C, R>, key: &K) -> bool
where
    K: Eq + Hash,
{
    let Some(mut slot) = shared.slots.get_mut(key) else {
        return true;
    };
    if slot.superseded {
        return false;
    }
    slot.running = false;
    true
}

fn fold_payloads<P: Coalesce + Clone, R>(tickets: &[Ticket<P, R>]) -> Option<P> {
    let mut iter = tickets.iter();
    let mut payload = iter.next()?.payload.clone();
    for ticket in iter {
        payload.coalesce(ticket.payload.clone());
    }
    Some(payload)
}

fn resolve_cancelled<K, P, C, R>(shared: &Shared<K, P, C, R>, tickets: Vec<Ticket<P, R>>) {
    if tickets.is_empty() {
        return;
    }
    shared
        .counters
        .cancelled
        .fetch_add(tickets.len(), Ordering::Relaxed);
    for ticket in tickets {
        ticket.resolve(JobOutcome::Cancelled);
    }
}

fn requeue_front<K, P, C, R>(shared: &Shared<K, P, C, R>, key: &K, tickets: Vec<Ticket<P, R>>)
where
    K: Eq + Hash + Clone + Debug,
{
    if tickets.is_empty() {
        return;
    }
    let Some(mut slot) = shared.slots.get_mut(key) else {
        for ticket in tickets {
            ticket.resolve(JobOutcome::Failed(JobError::Shutdown));
        }
        return;
    };
    debug!(?key, tickets = tickets.len(), "requeueing jobs of discarded batch");
    for ticket in tickets.into_iter().rev() {
        slot.queue.push_front(ticket);
    }
}

async fn run_batch<K, P, C, R>(
    shared: &Shared<K, P, C, R>,
    key: &K,
    payload: P,
    live: &[Ticket<P, R>],
) -> BatchOutcome<R>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    P: Send + 'static,
    C: Send + 'static,
    R: Send + 'static,
{
    let _permit = match shared.flow.acquire_in_flight().await {
        Ok(permit) => permit,
        Err(e) => return BatchOutcome::Finished(JobOutcome::Failed(e)),
    };

    shared.counters.executions.fetch_add(1, Ordering::Relaxed);
    let executor = Arc::clone(&shared.executor);
    let exec_key = key.clone();
    let computed = match tokio::task::spawn_blocking(move || executor.execute(&exec_key, payload)).await
    {
        Ok(Ok(computed)) => computed,
        Ok(Err(e)) => {
            warn!(?key, "job execution failed: {e}");
            shared.counters.failed.fetch_add(1, Ordering::Relaxed);
            return BatchOutcome::Finished(JobOutcome::Failed(e));
        }
        Err(e) => {
            shared.counters.failed.fetch_add(1, Ordering::Relaxed);
            return BatchOutcome::Finished(JobOutcome::Failed(JobError::Join(e.to_string())));
        }
    };

    // Commit point.
    if live.iter().any(|t| t.cancel.is_cancelled()) {
        debug!(?key, "discarding result cancelled before commit");
        return BatchOutcome::Discarded;
    }
    if !seal_batch(shared, key) {
        debug!(?key, "discarding result superseded by newer submissions");
        shared.counters.superseded.fetch_add(1, Ordering::Relaxed);
        return BatchOutcome::Discarded;
    }

    let sink = Arc::clone(&shared.commit_sink);
    let commit_key = key.clone();
    match tokio::task::spawn_blocking(move || sink.commit(&commit_key, computed)).await {
        Ok(Ok(receipt)) => {
            shared.counters.commits.fetch_add(1, Ordering::Relaxed);
            BatchOutcome::Finished(JobOutcome::Completed(receipt))
        }
        Ok(Err(e)) => {
            warn!(?key, "job commit failed: {e}");
            shared.counters.failed.fetch_add(1, Ordering::Relaxed);
            BatchOutcome::Finished(JobOutcome::Failed(e))
        }
        Err(e) => {
            shared.counters.failed.fetch_add(1, Ordering::Relaxed);
            BatchOutcome::Finished(JobOutcome::Failed(JobError::Join(e.to_string())))
        }
    }
}
