//! Background polling of a submission's verification status.
//!
//! The poller runs as its own task and publishes [`PollState`] through a
//! watch channel. It ends by itself once the submission is verified or
//! rejected, or when the API rejects the session. `stop` lets an in-flight
//! check finish before exiting; `cancel` and dropping the handle abort it.

use crate::{
    api::{
        ApiClient, roles,
        types::{VerificationState, VerificationStatus},
    },
    errors::AppError,
};
use std::{future::Future, pin::Pin, sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle, time::sleep};
use tracing::{info, warn};

use super::form::DEFAULT_POLL_INTERVAL_SECONDS;

pub trait StatusSource: Send + Sync + 'static {
    fn status<'a>(
        &'a self,
        submission_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<VerificationStatus, AppError>> + Send + 'a>>;
}

impl StatusSource for ApiClient {
    fn status<'a>(
        &'a self,
        submission_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<VerificationStatus, AppError>> + Send + 'a>> {
        Box::pin(roles::status(self, submission_id))
    }
}

#[derive(Clone, Debug)]
pub struct PollerConfig {
    interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PollerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECONDS),
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_interval_seconds(self, seconds: u64) -> Self {
        self.with_interval(Duration::from_secs(seconds))
    }

    #[must_use]
    pub fn normalize(mut self) -> Self {
        if self.interval.is_zero() {
            self.interval = Duration::from_secs(DEFAULT_POLL_INTERVAL_SECONDS);
        }
        self
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling {
        attempts: u32,
        last: Option<VerificationState>,
    },
    Verified {
        message: Option<String>,
    },
    Rejected {
        message: Option<String>,
    },
    /// The API no longer accepts the session; the user has to log in again.
    AuthFailed(String),
    Stopped,
    Cancelled,
}

impl PollState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Idle | PollState::Polling { .. })
    }
}

pub struct VerificationPoller {
    state: Arc<watch::Sender<PollState>>,
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl VerificationPoller {
    /// Spawns the polling task. The first check happens one interval after
    /// start.
    #[must_use]
    pub fn start<S: StatusSource>(source: S, submission_id: String, config: PollerConfig) -> Self {
        let config = config.normalize();
        let state = Arc::new(watch::channel(PollState::Idle).0);
        let (stop, stop_rx) = watch::channel(false);

        info!(submission_id = %submission_id, interval = ?config.interval(), "starting verification polling");
        let task = tokio::spawn(run(
            source,
            submission_id,
            config.interval(),
            state.clone(),
            stop_rx,
        ));

        Self {
            state,
            stop,
            task: Some(task),
        }
    }

    #[must_use]
    pub fn state(&self) -> PollState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Waits until polling ends on its own.
    pub async fn wait(&self) -> PollState {
        let mut receiver = self.state.subscribe();
        match receiver.wait_for(PollState::is_terminal).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Asks the task to exit after any in-flight check and waits for it.
    pub async fn stop(mut self) -> PollState {
        self.stop.send_replace(true);
        if let Some(task) = self.task.take()
            && let Err(err) = task.await
        {
            warn!("verification poller ended abnormally: {err}");
        }
        self.state()
    }

    /// Aborts the task immediately.
    pub fn cancel(mut self) -> PollState {
        self.abort();
        self.state()
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take()
            && !task.is_finished()
        {
            task.abort();
            self.state.send_replace(PollState::Cancelled);
        }
    }
}

impl Drop for VerificationPoller {
    fn drop(&mut self) {
        self.abort();
    }
}

async fn run<S: StatusSource>(
    source: S,
    submission_id: String,
    interval: Duration,
    state: Arc<watch::Sender<PollState>>,
    mut stop: watch::Receiver<bool>,
) {
    let mut attempts = 0_u32;
    let mut last = None;
    state.send_replace(PollState::Polling { attempts, last });

    loop {
        tokio::select! {
            () = sleep(interval) => {}
            _ = stop.changed() => {
                info!(submission_id = %submission_id, "verification polling stopped");
                state.send_replace(PollState::Stopped);
                return;
            }
        }

        attempts += 1;
        match source.status(&submission_id).await {
            Ok(status) => match status.status {
                VerificationState::Verified => {
                    info!(submission_id = %submission_id, "submission verified");
                    state.send_replace(PollState::Verified {
                        message: status.message,
                    });
                    return;
                }
                VerificationState::Rejected => {
                    info!(submission_id = %submission_id, "submission rejected");
                    state.send_replace(PollState::Rejected {
                        message: status.message,
                    });
                    return;
                }
                other => last = Some(other),
            },
            Err(err) if err.is_auth_failure() => {
                warn!(submission_id = %submission_id, "verification polling unauthorized: {err}");
                state.send_replace(PollState::AuthFailed(err.to_string()));
                return;
            }
            Err(err) => {
                warn!(submission_id = %submission_id, attempts, "verification status check failed, retrying: {err}");
            }
        }
        state.send_replace(PollState::Polling { attempts, last });
    }
}
