//! Out-of-band user notifications ("toasts"). The auth controller pushes, the
//! UI drains.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

const DEFAULT_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel { Success, Error, Info }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Bounded queue; the oldest notice is dropped once full.
pub struct NoticeBoard {
    queue: Mutex<VecDeque<Notice>>,
    capacity: usize,
}

impl Default for NoticeBoard {
    fn default() -> Self { Self::with_capacity(DEFAULT_CAPACITY) }
}

impl NoticeBoard {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { queue: Mutex::new(VecDeque::with_capacity(capacity)), capacity: capacity.max(1) }
    }

    pub fn push(&self, level: NoticeLevel, message: impl Into<String>) {
        let mut q = self.queue.lock();
        if q.len() >= self.capacity { q.pop_front(); }
        q.push_back(Notice { level, message: message.into(), at: Utc::now() });
    }

    pub fn success(&self, message: impl Into<String>) { self.push(NoticeLevel::Success, message) }
    pub fn error(&self, message: impl Into<String>) { self.push(NoticeLevel::Error, message) }
    pub fn info(&self, message: impl Into<String>) { self.push(NoticeLevel::Info, message) }

    pub fn drain(&self) -> Vec<Notice> { self.queue.lock().drain(..).collect() }

    pub fn peek_last(&self) -> Option<Notice> { self.queue.lock().back().cloned() }

    pub fn len(&self) -> usize { self.queue.lock().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}
