//! Single-flight coordination for token refresh.
//!
//! When several requests discover an expired token at the same moment only
//! the first one talks to the refresh endpoint. The others subscribe to its
//! outcome and are released together, success or failure.

use crate::{api::types::TokenPair, errors::AppError};
use std::{
    future::Future,
    sync::{Mutex, MutexGuard},
};
use tokio::sync::watch;
use tracing::debug;

pub type RefreshOutcome = Result<TokenPair, AppError>;

type Slot = Option<watch::Receiver<Option<RefreshOutcome>>>;

#[derive(Debug, Default)]
pub struct RefreshGate {
    in_flight: Mutex<Slot>,
}

enum Role {
    Leader(watch::Sender<Option<RefreshOutcome>>),
    Follower(watch::Receiver<Option<RefreshOutcome>>),
}

/// Frees the slot even if the leader's future is dropped mid-refresh.
struct LeaderGuard<'a> {
    gate: &'a RefreshGate,
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.gate.in_flight.lock() {
            *slot = None;
        }
    }
}

impl RefreshGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        // The slot only ever holds a receiver; a poisoned lock leaves it usable.
        self.in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Whether a refresh is currently running.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.slot().is_some()
    }

    /// Runs `refresh` unless one is already in flight, in which case the
    /// caller waits for and shares that outcome.
    pub async fn run<F, Fut>(&self, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome>,
    {
        let role = {
            let mut slot = self.slot();
            match slot.as_ref() {
                Some(receiver) => Role::Follower(receiver.clone()),
                None => {
                    let (sender, receiver) = watch::channel(None);
                    *slot = Some(receiver);
                    Role::Leader(sender)
                }
            }
        };

        match role {
            Role::Leader(sender) => {
                let _guard = LeaderGuard { gate: self };
                let outcome = refresh().await;
                sender.send_replace(Some(outcome.clone()));
                outcome
            }
            Role::Follower(mut receiver) => {
                debug!("token refresh already in flight, waiting");
                match receiver.wait_for(Option::is_some).await {
                    Ok(outcome) => outcome.clone().unwrap_or_else(|| {
                        Err(AppError::Network("token refresh was interrupted".to_string()))
                    }),
                    Err(_) => Err(AppError::Network(
                        "token refresh was interrupted".to_string(),
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Duration;
    use tokio::task::JoinSet;

    fn pair(access: &str) -> TokenPair {
        TokenPair {
            access: access.to_string(),
            refresh: None,
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let gate = Arc::new(RefreshGate::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut tasks = JoinSet::new();

        for _ in 0..8 {
            let gate = gate.clone();
            let calls = calls.clone();
            tasks.spawn(async move {
                gate.run(|| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(pair("fresh"))
                })
                .await
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined.map_err(|err| err.to_string()));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcomes.len(), 8);
        for outcome in outcomes {
            assert_eq!(outcome, Ok(Ok(pair("fresh"))));
        }
        assert!(!gate.is_refreshing());
    }

    #[tokio::test]
    async fn failures_are_shared_too() {
        let gate = Arc::new(RefreshGate::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut tasks = JoinSet::new();

        for _ in 0..4 {
            let gate = gate.clone();
            let calls = calls.clone();
            tasks.spawn(async move {
                gate.run(|| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Err(AppError::Http {
                        status: 401,
                        message: "refresh rejected".to_string(),
                    })
                })
                .await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(|err| err.to_string());
            assert!(matches!(outcome, Ok(Err(AppError::Http { status: 401, .. }))));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sequential_calls_refresh_again() {
        let gate = RefreshGate::new();
        let calls = AtomicUsize::new(0);

        for expected in 1..=2 {
            let outcome = gate
                .run(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(pair("fresh"))
                })
                .await;
            assert!(outcome.is_ok());
            assert_eq!(calls.load(Ordering::SeqCst), expected);
        }
    }

    #[tokio::test]
    async fn dropped_leader_releases_followers() {
        let gate = Arc::new(RefreshGate::new());

        let leader = tokio::spawn({
            let gate = gate.clone();
            async move {
                gate.run(|| async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(pair("never"))
                })
                .await
            }
        });

        while !gate.is_refreshing() {
            tokio::task::yield_now().await;
        }

        let follower = tokio::spawn({
            let gate = gate.clone();
            async move { gate.run(|| async { Ok(pair("unused")) }).await }
        });
        tokio::task::yield_now().await;

        leader.abort();
        let outcome = follower.await.map_err(|err| err.to_string());
        assert!(matches!(outcome, Ok(Err(AppError::Network(_)))) || outcome == Ok(Ok(pair("unused"))));
        assert!(!gate.is_refreshing());
    }
}
