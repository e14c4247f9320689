//! Transient notices: validation and failure messages that hide themselves
//! after a short while.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::time::sleep;

pub const DEFAULT_NOTICE_TTL_SECONDS: u64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Default)]
struct Board {
    next_id: u64,
    items: Vec<Notice>,
}

#[derive(Clone, Debug)]
pub struct Notices {
    board: Arc<Mutex<Board>>,
    ttl: Duration,
}

impl Default for Notices {
    fn default() -> Self {
        Self::new()
    }
}

impl Notices {
    #[must_use]
    pub fn new() -> Self {
        Self {
            board: Arc::new(Mutex::new(Board::default())),
            ttl: Duration::from_secs(DEFAULT_NOTICE_TTL_SECONDS),
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn board(&self) -> MutexGuard<'_, Board> {
        self.board.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Shows a notice and schedules its removal. Must be called from within a
    /// tokio runtime.
    pub fn push(&self, kind: NoticeKind, message: impl Into<String>) -> u64 {
        let id = {
            let mut board = self.board();
            board.next_id += 1;
            let id = board.next_id;
            board.items.push(Notice {
                id,
                kind,
                message: message.into(),
            });
            id
        };

        let notices = self.clone();
        tokio::spawn(async move {
            sleep(notices.ttl).await;
            notices.dismiss(id);
        });
        id
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push(NoticeKind::Error, message)
    }

    pub fn dismiss(&self, id: u64) {
        self.board().items.retain(|notice| notice.id != id);
    }

    #[must_use]
    pub fn active(&self) -> Vec<Notice> {
        self.board().items.clone()
    }
}
