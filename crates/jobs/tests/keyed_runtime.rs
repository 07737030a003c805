use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bundlecp_jobs::{
    Coalesce, CommitSink, Executor, JobError, JobOutcome, JobRuntime, RuntimeComponents,
    RuntimeConfig,
};

#[derive(Debug, Clone, PartialEq)]
struct Batch(Vec<u32>);

impl Coalesce for Batch {
    fn coalesce(&mut self, newer: Self) {
        self.0.extend(newer.0);
    }
}

#[derive(Default)]
struct RecordingExecutor {
    seen: Mutex<Vec<(String, Vec<u32>)>>,
}

impl Executor<String, Batch, Vec<u32>> for RecordingExecutor {
    fn execute(&self, key: &String, payload: Batch) -> Result<Vec<u32>, JobError> {
        self.seen
            .lock()
            .expect("lock poisoned")
            .push((key.clone(), payload.0.clone()));
        Ok(payload.0)
    }
}

/// Blocks every execution until the test releases it.
struct GatedExecutor {
    started: Mutex<mpsc::Sender<(String, Vec<u32>)>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl Executor<String, Batch, Vec<u32>> for GatedExecutor {
    fn execute(&self, key: &String, payload: Batch) -> Result<Vec<u32>, JobError> {
        self.started
            .lock()
            .expect("lock poisoned")
            .send((key.clone(), payload.0.clone()))
            .map_err(|e| JobError::Execution(e.to_string()))?;
        self.release
            .lock()
            .expect("lock poisoned")
            .recv()
            .map_err(|e| JobError::Execution(e.to_string()))?;
        Ok(payload.0)
    }
}

#[derive(Default)]
struct RecordingSink {
    commits: Mutex<Vec<(String, Vec<u32>)>>,
    reject: bool,
}

impl CommitSink<String, Vec<u32>, Vec<u32>> for RecordingSink {
    fn commit(&self, key: &String, computed: Vec<u32>) -> Result<Vec<u32>, JobError> {
        if self.reject {
            return Err(JobError::Commit("disk full".to_string()));
        }
        self.commits
            .lock()
            .expect("lock poisoned")
            .push((key.clone(), computed.clone()));
        Ok(computed)
    }
}

type TestRuntime = JobRuntime<String, Batch, Vec<u32>, Vec<u32>>;

fn runtime_with(
    executor: Arc<dyn Executor<String, Batch, Vec<u32>> + Send + Sync>,
    sink: Arc<RecordingSink>,
    max_in_flight: usize,
) -> TestRuntime {
    JobRuntime::new(
        RuntimeConfig { max_in_flight },
        RuntimeComponents {
            executor,
            commit_sink: sink,
        },
    )
    .expect("runtime should start inside tokio")
}

struct Gate {
    started: mpsc::Receiver<(String, Vec<u32>)>,
    release: mpsc::Sender<()>,
}

fn gated() -> (Arc<GatedExecutor>, Gate) {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    (
        Arc::new(GatedExecutor {
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        }),
        Gate {
            started: started_rx,
            release: release_tx,
        },
    )
}

impl Gate {
    fn next_started(&self) -> (String, Vec<u32>) {
        self.started
            .recv_timeout(Duration::from_secs(5))
            .expect("execution should start")
    }

    fn release_one(&self) {
        self.release.send(()).expect("executor alive");
    }
}

#[test]
fn new_outside_tokio_is_an_error() {
    let result = JobRuntime::<String, Batch, Vec<u32>, Vec<u32>>::new(
        RuntimeConfig::default(),
        RuntimeComponents {
            executor: Arc::new(RecordingExecutor::default()),
            commit_sink: Arc::new(RecordingSink::default()),
        },
    );
    assert!(matches!(result, Err(JobError::NoRuntime(_))));
}

#[tokio::test]
async fn queued_payloads_coalesce_into_one_execution() {
    let executor = Arc::new(RecordingExecutor::default());
    let sink = Arc::new(RecordingSink::default());
    let runtime = runtime_with(executor.clone(), sink.clone(), 4);

    // current-thread runtime: the driver cannot start before we await
    let first = runtime.submit("p".to_string(), Batch(vec![1]));
    let second = runtime.submit("p".to_string(), Batch(vec![2]));
    assert_eq!(runtime.pending(&"p".to_string()), 2);

    assert_eq!(first.join().await, JobOutcome::Completed(vec![1, 2]));
    assert_eq!(second.join().await, JobOutcome::Completed(vec![1, 2]));

    let stats = runtime.stats();
    assert_eq!(stats.executions, 1);
    assert_eq!(stats.commits, 1);
    assert_eq!(stats.coalesced, 1);
    assert_eq!(sink.commits.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn cancelling_a_queued_job_has_no_side_effect() {
    let executor = Arc::new(RecordingExecutor::default());
    let sink = Arc::new(RecordingSink::default());
    let runtime = runtime_with(executor.clone(), sink.clone(), 4);

    let handle = runtime.submit("p".to_string(), Batch(vec![7]));
    assert!(runtime.cancel(&handle));
    assert!(handle.is_cancel_requested());
    assert_eq!(handle.join().await, JobOutcome::Cancelled);

    runtime.shutdown().await;
    assert!(executor.seen.lock().unwrap().is_empty());
    assert!(sink.commits.lock().unwrap().is_empty());
    assert_eq!(runtime.stats().cancelled, 1);
}

#[tokio::test]
async fn commit_failure_is_reported() {
    let sink = Arc::new(RecordingSink {
        reject: true,
        ..Default::default()
    });
    let runtime = runtime_with(Arc::new(RecordingExecutor::default()), sink, 4);

    let outcome = runtime.submit("p".to_string(), Batch(vec![1])).join().await;
    assert_eq!(
        outcome,
        JobOutcome::Failed(JobError::Commit("disk full".to_string()))
    );
    assert_eq!(runtime.stats().failed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submissions_during_a_run_are_folded_into_one_commit() {
    let (executor, gate) = gated();
    let sink = Arc::new(RecordingSink::default());
    let runtime = runtime_with(executor, sink.clone(), 4);
    let key = "p".to_string();

    let first = runtime.submit(key.clone(), Batch(vec![1]));
    let gate = tokio::task::spawn_blocking(move || {
        assert_eq!(gate.next_started().1, vec![1]);
        gate
    })
    .await
    .unwrap();

    let second = runtime.submit(key.clone(), Batch(vec![2]));
    let third = runtime.submit(key.clone(), Batch(vec![3]));
    assert!(runtime.is_busy(&key));
    assert_eq!(runtime.pending(&key), 2);

    // the first run is discarded at its commit point and re-run with the rest
    let gate = tokio::task::spawn_blocking(move || {
        gate.release_one();
        assert_eq!(gate.next_started().1, vec![1, 2, 3]);
        gate.release_one();
        gate
    })
    .await
    .unwrap();
    drop(gate);

    assert_eq!(first.join().await, JobOutcome::Completed(vec![1, 2, 3]));
    assert_eq!(second.join().await, JobOutcome::Completed(vec![1, 2, 3]));
    assert_eq!(third.join().await, JobOutcome::Completed(vec![1, 2, 3]));

    let stats = runtime.stats();
    assert_eq!(stats.commits, 1);
    assert_eq!(stats.superseded, 1);
    assert_eq!(
        sink.commits.lock().unwrap().clone(),
        vec![("p".to_string(), vec![1, 2, 3])]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_while_running_discards_result() {
    let (executor, gate) = gated();
    let sink = Arc::new(RecordingSink::default());
    let runtime = runtime_with(executor, sink.clone(), 4);

    let handle = runtime.submit("p".to_string(), Batch(vec![1]));
    let gate = tokio::task::spawn_blocking(move || {
        gate.next_started();
        gate
    })
    .await
    .unwrap();

    // already running: not removable, but flagged for the commit point
    assert!(!runtime.cancel(&handle));
    gate.release_one();

    assert_eq!(handle.join().await, JobOutcome::Cancelled);
    assert!(sink.commits.lock().unwrap().is_empty());
    assert_eq!(runtime.stats().commits, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_ticket_in_running_batch_requeues_the_rest() {
    let (executor, gate) = gated();
    let sink = Arc::new(RecordingSink::default());
    let runtime = runtime_with(executor, sink.clone(), 4);
    let key = "p".to_string();

    let first = runtime.submit(key.clone(), Batch(vec![0]));
    let gate = tokio::task::spawn_blocking(move || {
        gate.next_started();
        gate
    })
    .await
    .unwrap();

    let dropped = runtime.submit(key.clone(), Batch(vec![1]));
    let kept = runtime.submit(key.clone(), Batch(vec![2]));

    let gate = tokio::task::spawn_blocking(move || {
        gate.release_one();
        assert_eq!(gate.next_started().1, vec![0, 1, 2]);
        gate
    })
    .await
    .unwrap();

    assert!(!runtime.cancel(&dropped));

    let gate = tokio::task::spawn_blocking(move || {
        gate.release_one();
        assert_eq!(gate.next_started().1, vec![0, 2]);
        gate.release_one();
        gate
    })
    .await
    .unwrap();
    drop(gate);

    assert_eq!(first.join().await, JobOutcome::Completed(vec![0, 2]));
    assert_eq!(dropped.join().await, JobOutcome::Cancelled);
    assert_eq!(kept.join().await, JobOutcome::Completed(vec![0, 2]));

    let commits = sink.commits.lock().unwrap().clone();
    assert_eq!(commits, vec![("p".to_string(), vec![0, 2])]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn distinct_keys_run_concurrently() {
    let (executor, gate) = gated();
    let sink = Arc::new(RecordingSink::default());
    let runtime = runtime_with(executor, sink, 2);

    let a = runtime.submit("a".to_string(), Batch(vec![1]));
    let b = runtime.submit("b".to_string(), Batch(vec![2]));

    let gate = tokio::task::spawn_blocking(move || {
        let mut keys = vec![gate.next_started().0, gate.next_started().0];
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        gate.release_one();
        gate.release_one();
        gate
    })
    .await
    .unwrap();
    drop(gate);

    assert!(a.join().await.is_completed());
    assert!(b.join().await.is_completed());
}

#[tokio::test]
async fn submit_after_shutdown_is_cancelled() {
    let runtime = runtime_with(
        Arc::new(RecordingExecutor::default()),
        Arc::new(RecordingSink::default()),
        1,
    );
    runtime.shutdown().await;

    let handle = runtime.submit("p".to_string(), Batch(vec![1]));
    assert!(handle.join().await.is_cancelled());
}
