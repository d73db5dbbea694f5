//! Transient status-bar messages with an expiry.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    expires_at: Instant,
}

impl Notice {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

pub struct Notifier {
    ttl: Duration,
    notices: VecDeque<Notice>,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            notices: VecDeque::new(),
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push_at(NoticeKind::Info, text.into(), Instant::now());
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push_at(NoticeKind::Success, text.into(), Instant::now());
    }

    /// Show an error. A newer error replaces any error still on screen.
    pub fn error(&mut self, text: impl Into<String>) {
        self.push_at(NoticeKind::Error, text.into(), Instant::now());
    }

    pub fn push_at(&mut self, kind: NoticeKind, text: String, now: Instant) {
        if kind == NoticeKind::Error {
            self.notices.retain(|n| n.kind != NoticeKind::Error);
        }
        self.notices.push_back(Notice {
            kind,
            text,
            expires_at: now + self.ttl,
        });
    }

    /// Drop expired notices. Returns true when something was removed.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| !n.is_expired(now));
        before != self.notices.len()
    }

    /// Newest notice still on screen.
    pub fn latest(&self) -> Option<&Notice> {
        self.notices.back()
    }

    /// Cancel every pending notice, e.g. when the view that raised them
    /// closes.
    pub fn cancel_all(&mut self) {
        self.notices.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}
