//! The status-polling state machine.
//!
//! A [`StatusPoller`] drives one `(task, image)` submission to a terminal
//! state: it polls the injected [`StatusProvider`] on a fixed interval,
//! retries "not found yet" responses up to a bound, and fails fast on every
//! other error. State changes are published on a watch channel.
//!
//! Staleness is enforced with a session generation number: a polling loop
//! may only write state while its generation is current. `start`, `refresh`
//! and `cancel` each bump the generation, so a late-arriving response from a
//! superseded session can never mutate observable state.

use std::sync::{Arc, Mutex, MutexGuard};

use strum::{AsRefStr, Display};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::models::StatusRecord;
use crate::poll::PollConfig;
use crate::{StatusProvider, TRACING_TARGET_POLL};

/// Observable state of one polling session.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// No session is active: never started, or cancelled.
    Idle,
    /// Automatic polling is active.
    Polling {
        /// Consecutive not-found responses observed so far.
        attempt: u32,
        /// Most recent successfully fetched record, if any.
        last: Option<StatusRecord>,
    },
    /// A record with a terminal status was observed; automatic polling has
    /// stopped. Manual [`refresh`](StatusPoller::refresh) remains available.
    Completed(StatusRecord),
    /// The session ended with an error (exhausted retries, unauthorized, or
    /// any other upstream failure).
    Failed(Error),
}

impl PollState {
    /// Check whether this state ends automatic polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollState::Completed(_) | PollState::Failed(_))
    }

    /// Short label for this state, used in logs.
    pub fn phase(&self) -> PollPhase {
        match self {
            PollState::Idle => PollPhase::Idle,
            PollState::Polling { .. } => PollPhase::Polling,
            PollState::Completed(_) => PollPhase::Completed,
            PollState::Failed(_) => PollPhase::Failed,
        }
    }
}

/// Coarse phase label for [`PollState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum PollPhase {
    /// No active session.
    Idle,
    /// Automatic polling in progress.
    Polling,
    /// Terminal success.
    Completed,
    /// Terminal error.
    Failed,
}

/// The `(task, image)` pair one session polls for.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PollTarget {
    task_uuid: String,
    image_id: String,
}

/// Session bookkeeping guarded by a single lock.
///
/// `generation` is the staleness fence: loops carry the generation they were
/// spawned with and may only write state while it is current.
#[derive(Debug, Default)]
struct Session {
    generation: u64,
    target: Option<PollTarget>,
    handle: Option<JoinHandle<()>>,
}

#[derive(Debug)]
struct Shared {
    session: Mutex<Session>,
    state: watch::Sender<PollState>,
}

impl Shared {
    fn lock_session(&self) -> MutexGuard<'_, Session> {
        // A panic while holding the lock leaves no inconsistent state worth
        // preserving; recover the guard instead of propagating the poison.
        self.session.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// Publish `state` iff `generation` is still current.
    ///
    /// Returns false when the session has been superseded; the caller must
    /// stop without further writes.
    fn apply(&self, generation: u64, state: PollState) -> bool {
        let session = self.lock_session();
        if session.generation != generation {
            tracing::debug!(
                target: TRACING_TARGET_POLL,
                generation,
                current = session.generation,
                "Discarding stale poll result"
            );
            return false;
        }

        tracing::trace!(
            target: TRACING_TARGET_POLL,
            generation,
            phase = state.phase().as_ref(),
            "Publishing poll state"
        );
        self.state.send_replace(state);
        true
    }
}

/// Polls the status of one submitted image until a terminal state.
///
/// One request is in flight at a time; the next poll is scheduled only after
/// the previous one resolves. All state is local to the poller instance.
///
/// # Examples
///
/// ```ignore
/// use std::sync::Arc;
/// use shelfscan_core::{PollConfig, StatusPoller};
///
/// let poller = StatusPoller::new(Arc::new(client), PollConfig::default());
/// let mut states = poller.subscribe();
/// poller.start("task-2", "img-123")?;
/// while states.changed().await.is_ok() {
///     if states.borrow().is_terminal() {
///         break;
///     }
/// }
/// ```
#[derive(Debug)]
pub struct StatusPoller<P> {
    provider: Arc<P>,
    config: PollConfig,
    shared: Arc<Shared>,
}

impl<P> StatusPoller<P>
where
    P: StatusProvider + 'static,
{
    /// Create a poller over the given status source.
    pub fn new(provider: Arc<P>, config: PollConfig) -> Self {
        let (state, _) = watch::channel(PollState::Idle);
        Self {
            provider,
            config,
            shared: Arc::new(Shared {
                session: Mutex::new(Session::default()),
                state,
            }),
        }
    }

    /// Get the poller configuration.
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Begin polling for the given `(task, image)` pair.
    ///
    /// Fails fast with [`Error::Validation`] if either identifier is empty;
    /// no request is issued in that case. A running session is superseded.
    ///
    /// Must be called within a Tokio runtime.
    pub fn start(&self, task_uuid: impl Into<String>, image_id: impl Into<String>) -> Result<()> {
        let task_uuid = task_uuid.into();
        let image_id = image_id.into();
        if task_uuid.trim().is_empty() {
            return Err(Error::validation("task uuid must not be empty"));
        }
        if image_id.trim().is_empty() {
            return Err(Error::validation("image id must not be empty"));
        }

        tracing::info!(
            target: TRACING_TARGET_POLL,
            task_uuid = %task_uuid,
            image_id = %image_id,
            "Starting status polling"
        );

        self.begin(
            self.shared.lock_session(),
            PollTarget {
                task_uuid,
                image_id,
            },
        );
        Ok(())
    }

    /// Restart polling for the current pair with a fresh attempt counter.
    ///
    /// Valid from a terminal state (to re-check a completed or failed
    /// session) and mid-flight (superseding the running session). Fails if
    /// no session was ever started, or after [`cancel`](Self::cancel).
    pub fn refresh(&self) -> Result<()> {
        // The target read and the restart must share one lock acquisition:
        // a cancel slipping in between would be silently overridden.
        let session = self.shared.lock_session();
        let target = session
            .target
            .clone()
            .ok_or_else(|| Error::validation("refresh requires a started session"))?;

        tracing::info!(
            target: TRACING_TARGET_POLL,
            task_uuid = %target.task_uuid,
            image_id = %target.image_id,
            "Refreshing status polling"
        );

        self.begin(session, target);
        Ok(())
    }

    /// Stop the session and return to `Idle`.
    ///
    /// Guarantees no further state mutation, even if a request is in flight.
    /// Idempotent and safe after termination. A new [`start`](Self::start)
    /// is required to resume.
    pub fn cancel(&self) {
        let mut session = self.shared.lock_session();
        session.generation += 1;
        session.target = None;
        if let Some(handle) = session.handle.take() {
            handle.abort();
        }
        self.shared.state.send_replace(PollState::Idle);

        tracing::debug!(
            target: TRACING_TARGET_POLL,
            generation = session.generation,
            "Polling cancelled"
        );
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.shared.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PollState {
        self.shared.state.borrow().clone()
    }

    /// Supersede any running session and spawn a new loop for `target`.
    ///
    /// Takes the session guard from the caller so the decision to restart
    /// and the restart itself are a single critical section.
    fn begin(&self, mut session: MutexGuard<'_, Session>, target: PollTarget) {
        session.generation += 1;
        let generation = session.generation;
        if let Some(handle) = session.handle.take() {
            handle.abort();
        }
        session.target = Some(target.clone());
        self.shared.state.send_replace(PollState::Polling {
            attempt: 0,
            last: None,
        });

        session.handle = Some(tokio::spawn(run_session(
            Arc::clone(&self.provider),
            self.config.clone(),
            target,
            generation,
            Arc::clone(&self.shared),
        )));
    }
}

impl<P> Drop for StatusPoller<P> {
    /// The session task holds its own `Arc` handles and would otherwise
    /// outlive the poller, polling until a terminal response.
    fn drop(&mut self) {
        let mut session = self.shared.lock_session();
        session.generation += 1;
        session.target = None;
        if let Some(handle) = session.handle.take() {
            handle.abort();
        }
    }
}

/// One polling session: fetch, classify, publish, sleep, repeat.
async fn run_session<P>(
    provider: Arc<P>,
    config: PollConfig,
    target: PollTarget,
    generation: u64,
    shared: Arc<Shared>,
) where
    P: StatusProvider,
{
    let max_not_found = config.effective_max_not_found();
    let mut missing = 0u32;
    let mut last: Option<StatusRecord> = None;

    loop {
        let outcome = provider
            .fetch_status(&target.task_uuid, &target.image_id)
            .await;

        match outcome {
            Ok(record) => {
                missing = 0;
                if record.is_terminal() {
                    tracing::info!(
                        target: TRACING_TARGET_POLL,
                        task_uuid = %target.task_uuid,
                        image_id = %target.image_id,
                        status = %record.status,
                        "Polling completed"
                    );
                    shared.apply(generation, PollState::Completed(record));
                    return;
                }

                tracing::debug!(
                    target: TRACING_TARGET_POLL,
                    task_uuid = %target.task_uuid,
                    image_id = %target.image_id,
                    status = %record.status,
                    "Status still pending"
                );
                last = Some(record);
                if !shared.apply(
                    generation,
                    PollState::Polling {
                        attempt: 0,
                        last: last.clone(),
                    },
                ) {
                    return;
                }
            }
            Err(err) if err.is_retryable() => {
                missing += 1;
                if missing >= max_not_found {
                    tracing::warn!(
                        target: TRACING_TARGET_POLL,
                        task_uuid = %target.task_uuid,
                        image_id = %target.image_id,
                        attempts = missing,
                        "Giving up: submission still not found"
                    );
                    shared.apply(
                        generation,
                        PollState::Failed(Error::retries_exhausted(missing)),
                    );
                    return;
                }

                tracing::debug!(
                    target: TRACING_TARGET_POLL,
                    task_uuid = %target.task_uuid,
                    image_id = %target.image_id,
                    attempt = missing,
                    max_attempts = max_not_found,
                    "Submission not registered yet, will retry"
                );
                if !shared.apply(
                    generation,
                    PollState::Polling {
                        attempt: missing,
                        last: last.clone(),
                    },
                ) {
                    return;
                }
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_POLL,
                    task_uuid = %target.task_uuid,
                    image_id = %target.image_id,
                    error = %err,
                    "Polling failed"
                );
                shared.apply(generation, PollState::Failed(err));
                return;
            }
        }

        tokio::time::sleep(config.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use tokio::sync::Notify;

    use super::*;
    use crate::models::{RecognitionResult, RecognizedItem, StatusPayload};

    fn record(status: &str) -> StatusRecord {
        StatusPayload {
            status: status.to_string(),
            result: None,
        }
        .into_record("task2", "img123")
    }

    fn not_found() -> Error {
        Error::not_found("image not registered")
    }

    /// Provider that replays a queue of canned responses.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<StatusRecord>>>,
        calls: AtomicU32,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<StatusRecord>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn push(&self, response: Result<StatusRecord>) {
            self.responses.lock().unwrap().push_back(response);
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl StatusProvider for ScriptedProvider {
        async fn fetch_status(&self, _task_uuid: &str, _image_id: &str) -> Result<StatusRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::api(500, "script exhausted")))
        }
    }

    /// Provider whose status never leaves pending.
    struct PendingProvider {
        calls: AtomicU32,
    }

    impl PendingProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl StatusProvider for PendingProvider {
        async fn fetch_status(&self, _task_uuid: &str, _image_id: &str) -> Result<StatusRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(record("pending"))
        }
    }

    /// Provider that signals when a request starts and blocks until released.
    struct BlockingProvider {
        started: Notify,
        release: Notify,
        calls: AtomicU32,
    }

    impl BlockingProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                started: Notify::new(),
                release: Notify::new(),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl StatusProvider for BlockingProvider {
        async fn fetch_status(&self, _task_uuid: &str, _image_id: &str) -> Result<StatusRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            self.release.notified().await;
            Ok(record("completed"))
        }
    }

    async fn wait_terminal(rx: &mut watch::Receiver<PollState>) -> PollState {
        loop {
            {
                let state = rx.borrow_and_update().clone();
                if state.is_terminal() {
                    return state;
                }
            }
            rx.changed().await.unwrap();
        }
    }

    fn fast_config(max_not_found: u32) -> PollConfig {
        PollConfig::default().with_max_not_found(max_not_found)
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_status_completes_with_exact_record() {
        let provider = ScriptedProvider::new(vec![Ok(record("COMPLETED"))]);
        let poller = StatusPoller::new(provider.clone(), fast_config(5));
        let mut rx = poller.subscribe();

        poller.start("task2", "img123").unwrap();
        let state = wait_terminal(&mut rx).await;

        assert_eq!(state, PollState::Completed(record("COMPLETED")));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_then_completed_carries_result() {
        let completed = StatusPayload {
            status: "completed".to_string(),
            result: Some(RecognitionResult {
                recognized_items: vec![RecognizedItem {
                    item_id: "sku-1".to_string(),
                    confidence: 0.87,
                }],
            }),
        }
        .into_record("task2", "img123");

        let provider =
            ScriptedProvider::new(vec![Ok(record("pending")), Ok(completed.clone())]);
        let poller = StatusPoller::new(provider.clone(), fast_config(5));
        let mut rx = poller.subscribe();

        poller.start("task2", "img123").unwrap();
        let state = wait_terminal(&mut rx).await;

        let PollState::Completed(final_record) = state else {
            panic!("expected completed state, got {state:?}");
        };
        assert_eq!(final_record.status, "completed");
        let result = final_record.result.unwrap();
        assert_eq!(result.recognized_items.len(), 1);
        assert_eq!(result.recognized_items[0].item_id, "sku-1");
        assert_eq!(result.recognized_items[0].confidence, 0.87);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_attempts_increase_until_bound() {
        let provider = ScriptedProvider::new(vec![
            Err(not_found()),
            Err(not_found()),
            Err(not_found()),
        ]);
        let poller = StatusPoller::new(provider.clone(), fast_config(3));
        let mut rx = poller.subscribe();

        poller.start("task2", "img123").unwrap();

        let mut attempts = Vec::new();
        let state = loop {
            let state = rx.borrow_and_update().clone();
            if state.is_terminal() {
                break state;
            }
            if let PollState::Polling { attempt, .. } = &state {
                attempts.push(*attempt);
            }
            rx.changed().await.unwrap();
        };

        assert_eq!(attempts, vec![0, 1, 2]);
        assert_eq!(state, PollState::Failed(Error::retries_exhausted(3)));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_consecutive_not_found_counter() {
        let provider = ScriptedProvider::new(vec![
            Err(not_found()),
            Err(not_found()),
            Ok(record("pending")),
            Err(not_found()),
            Ok(record("completed")),
        ]);
        // Bound of 3 would trip if the counter were cumulative.
        let poller = StatusPoller::new(provider.clone(), fast_config(3));
        let mut rx = poller.subscribe();

        poller.start("task2", "img123").unwrap();
        let state = wait_terminal(&mut rx).await;

        assert_eq!(state, PollState::Completed(record("completed")));
        assert_eq!(provider.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_is_immediately_fatal() {
        let provider = ScriptedProvider::new(vec![
            Err(not_found()),
            Err(Error::unauthorized("invalid API key")),
        ]);
        let poller = StatusPoller::new(provider.clone(), fast_config(10));
        let mut rx = poller.subscribe();

        poller.start("task2", "img123").unwrap();
        let state = wait_terminal(&mut rx).await;

        assert_eq!(
            state,
            PollState::Failed(Error::unauthorized("invalid API key"))
        );
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_are_immediately_fatal() {
        let provider = ScriptedProvider::new(vec![Err(Error::api(503, "maintenance"))]);
        let poller = StatusPoller::new(provider.clone(), fast_config(10));
        let mut rx = poller.subscribe();

        poller.start("task2", "img123").unwrap();
        let state = wait_terminal(&mut rx).await;

        assert_eq!(state, PollState::Failed(Error::api(503, "maintenance")));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_image_id_fails_without_any_request() {
        let provider = ScriptedProvider::new(vec![Ok(record("completed"))]);
        let poller = StatusPoller::new(provider.clone(), fast_config(5));

        let err = poller.start("t", "").unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let err = poller.start("", "img123").unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        assert_eq!(provider.calls(), 0);
        assert_eq!(poller.state(), PollState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_in_flight_request_freezes_state() {
        let provider = BlockingProvider::new();
        let poller = StatusPoller::new(provider.clone(), fast_config(5));

        poller.start("task2", "img123").unwrap();
        provider.started.notified().await;

        poller.cancel();
        assert_eq!(poller.state(), PollState::Idle);

        // Let the in-flight request resolve; it must not mutate state.
        provider.release.notify_one();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(poller.state(), PollState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent_and_safe_after_termination() {
        let provider = ScriptedProvider::new(vec![Ok(record("completed"))]);
        let poller = StatusPoller::new(provider.clone(), fast_config(5));
        let mut rx = poller.subscribe();

        poller.start("task2", "img123").unwrap();
        wait_terminal(&mut rx).await;

        poller.cancel();
        poller.cancel();
        assert_eq!(poller.state(), PollState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_after_exhaustion_resets_the_counter() {
        let provider = ScriptedProvider::new(vec![Err(not_found()), Err(not_found())]);
        let poller = StatusPoller::new(provider.clone(), fast_config(2));
        let mut rx = poller.subscribe();

        poller.start("task2", "img123").unwrap();
        let state = wait_terminal(&mut rx).await;
        assert_eq!(state, PollState::Failed(Error::retries_exhausted(2)));

        provider.push(Ok(record("pending")));
        provider.push(Ok(record("completed")));
        poller.refresh().unwrap();

        let state = wait_terminal(&mut rx).await;
        assert_eq!(state, PollState::Completed(record("completed")));
        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_after_completion_rechecks() {
        let provider = ScriptedProvider::new(vec![Ok(record("completed"))]);
        let poller = StatusPoller::new(provider.clone(), fast_config(5));
        let mut rx = poller.subscribe();

        poller.start("task2", "img123").unwrap();
        wait_terminal(&mut rx).await;

        provider.push(Ok(record("failed")));
        poller.refresh().unwrap();

        let state = wait_terminal(&mut rx).await;
        assert_eq!(state, PollState::Completed(record("failed")));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_requires_a_started_session() {
        let provider = ScriptedProvider::new(vec![]);
        let poller = StatusPoller::new(provider.clone(), fast_config(5));

        let err = poller.refresh().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_after_cancel_requires_a_new_start() {
        let provider = ScriptedProvider::new(vec![Ok(record("completed"))]);
        let poller = StatusPoller::new(provider.clone(), fast_config(5));
        let mut rx = poller.subscribe();

        poller.start("task2", "img123").unwrap();
        wait_terminal(&mut rx).await;
        poller.cancel();

        let err = poller.refresh().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        provider.push(Ok(record("completed")));
        poller.start("task2", "img123").unwrap();
        let state = wait_terminal(&mut rx).await;
        assert_eq!(state, PollState::Completed(record("completed")));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poller_stops_the_session_task() {
        let provider = PendingProvider::new();
        let poller = StatusPoller::new(provider.clone(), fast_config(5));

        poller.start("task2", "img123").unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        let calls_before_drop = provider.calls();
        assert!(calls_before_drop > 0);

        drop(poller);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(provider.calls(), calls_before_drop);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_racing_refresh_never_revives_the_session() {
        // In every serial ordering of the two calls the poller ends Idle:
        // refresh-then-cancel is cancelled, cancel-then-refresh errors out
        // because the target was cleared.
        for _ in 0..100 {
            let provider = ScriptedProvider::new(vec![]);
            let poller = Arc::new(StatusPoller::new(provider, fast_config(5)));
            poller.start("task2", "img123").unwrap();

            let refresher = {
                let poller = Arc::clone(&poller);
                tokio::spawn(async move {
                    let _ = poller.refresh();
                })
            };
            poller.cancel();
            refresher.await.unwrap();

            tokio::task::yield_now().await;
            assert_eq!(poller.state(), PollState::Idle);
        }
    }

    #[test]
    fn poll_phase_labels() {
        assert_eq!(PollState::Idle.phase().to_string(), "idle");
        assert_eq!(
            PollState::Polling {
                attempt: 0,
                last: None
            }
            .phase()
            .to_string(),
            "polling"
        );
        assert_eq!(
            PollState::Completed(record("done")).phase().to_string(),
            "completed"
        );
        assert_eq!(
            PollState::Failed(Error::retries_exhausted(1))
                .phase()
                .to_string(),
            "failed"
        );
    }
}
