//! Completion poller
//!
//! Fetches the status of one run on a fixed interval until the run reaches a
//! terminal state or the deadline passes.
//!
//! The loop is an explicit state machine over `Progress`. The first fetch
//! always happens; every later fetch is preceded by a deadline check, so a
//! zero timeout performs exactly one fetch. Both suspension points (the fetch
//! itself and the delay between fetches) race against the cancellation token.

use relay_core::domain::poll::PollConfig;
use relay_core::domain::run::{RunState, RunStatus};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::OrchestrationError;
use crate::status::StatusFetcher;

/// What the poller knows about the run so far
#[derive(Debug, Clone, PartialEq, Eq)]
enum Progress {
    /// Nothing fetched yet
    Unknown,
    /// Last fetch returned this non-terminal state
    InFlight(RunState),
}

/// Outcome of classifying one fetched status
enum Transition {
    Succeeded(RunStatus),
    Failed(RunState),
    Continue(RunState),
}

fn classify(status: RunStatus) -> Transition {
    match status.state {
        RunState::Done => Transition::Succeeded(status),
        state if state.is_failure() => Transition::Failed(state),
        state => Transition::Continue(state),
    }
}

/// Polls a single run to completion
///
/// A poller is cheap to build and is meant to be created per orchestration
/// call; it holds no state between calls.
pub struct CompletionPoller<'a> {
    fetcher: &'a dyn StatusFetcher,
    cancel: CancellationToken,
}

impl<'a> CompletionPoller<'a> {
    /// Creates a poller that can only be bounded by its deadline
    pub fn new(fetcher: &'a dyn StatusFetcher) -> Self {
        Self {
            fetcher,
            cancel: CancellationToken::new(),
        }
    }

    /// Makes fetches and delays abort as soon as `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Polls until the run is DONE
    ///
    /// # Errors
    /// - `RunFailed` when the run reaches FAILED or TERMINATED
    /// - `PollTimeout` when `config.timeout_ms` elapses while the run is in flight
    /// - `StatusFetch` as soon as one fetch fails (no further fetches are made)
    /// - `Cancelled` when the cancellation token fires
    pub async fn poll_until_done(
        &self,
        run_id: &str,
        auth_token: &str,
        user_id: Option<&str>,
        project_id: Option<&str>,
        config: &PollConfig,
    ) -> Result<RunStatus, OrchestrationError> {
        let started = Instant::now();
        let mut progress = Progress::Unknown;

        loop {
            if let Progress::InFlight(last_state) = &progress {
                if started.elapsed() >= config.timeout() {
                    warn!(
                        "Run {} still {} after {:?}, giving up",
                        run_id,
                        last_state,
                        started.elapsed()
                    );
                    return Err(OrchestrationError::PollTimeout {
                        run_id: run_id.to_string(),
                        timeout: config.timeout(),
                        last_state: last_state.clone(),
                    });
                }
            }

            let status = self
                .cancellable(
                    run_id,
                    self.fetcher
                        .fetch_status(run_id, auth_token, user_id, project_id),
                )
                .await??;

            match classify(status) {
                Transition::Succeeded(status) => {
                    info!("Run {} completed after {:?}", run_id, started.elapsed());
                    return Ok(status);
                }
                Transition::Failed(state) => {
                    info!("Run {} ended in state {}", run_id, state);
                    return Err(OrchestrationError::RunFailed {
                        run_id: run_id.to_string(),
                        state,
                    });
                }
                Transition::Continue(state) => {
                    if progress != Progress::InFlight(state.clone()) {
                        if let RunState::Other(raw) = &state {
                            warn!("Run {} reported unrecognized state '{}'", run_id, raw);
                        } else {
                            debug!("Run {} is {}", run_id, state);
                        }
                    }
                    progress = Progress::InFlight(state);
                }
            }

            self.cancellable(run_id, time::sleep(config.interval()))
                .await?;
        }
    }

    /// Awaits `fut` unless the cancellation token fires first
    async fn cancellable<T>(
        &self,
        run_id: &str,
        fut: impl Future<Output = T>,
    ) -> Result<T, OrchestrationError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                info!("Polling of run {} cancelled", run_id);
                Err(OrchestrationError::Cancelled {
                    run_id: Some(run_id.to_string()),
                })
            }
            output = fut => Ok(output),
        }
    }
}
