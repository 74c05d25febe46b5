#![forbid(unsafe_code)]

//! Transient notifications shown over the content area.
//!
//! Every toast expires a fixed duration after it was pushed, measured on the
//! host-driven clock.

use core::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// One visible toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub text: String,
    /// Clock time (ms) at which the toast disappears.
    pub expires_at_ms: u64,
}

/// Toasts currently on screen, oldest first.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    duration: Duration,
    next_id: u64,
    active: Vec<Toast>,
}

impl ToastQueue {
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self {
            duration,
            next_id: 0,
            active: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: ToastKind, text: impl Into<String>, now: Duration) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let expires = now.saturating_add(self.duration);
        let toast = Toast {
            id,
            kind,
            text: text.into(),
            expires_at_ms: u64::try_from(expires.as_millis()).unwrap_or(u64::MAX),
        };
        tracing::debug!(id, kind = ?toast.kind, text = %toast.text, "toast shown");
        self.active.push(toast);
        id
    }

    /// Drop expired toasts. Returns how many were removed.
    pub fn expire(&mut self, now: Duration) -> usize {
        let now_ms = u64::try_from(now.as_millis()).unwrap_or(u64::MAX);
        let before = self.active.len();
        self.active.retain(|t| t.expires_at_ms > now_ms);
        before - self.active.len()
    }

    #[must_use]
    pub fn active(&self) -> &[Toast] {
        &self.active
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn toast_expires_after_duration() {
        let mut queue = ToastQueue::new(Duration::from_millis(2000));
        queue.push(ToastKind::Success, "copied", Duration::from_millis(500));
        assert_eq!(queue.expire(Duration::from_millis(2499)), 0);
        assert_eq!(queue.active().len(), 1);
        assert_eq!(queue.expire(Duration::from_millis(2500)), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn toasts_expire_independently() {
        let mut queue = ToastQueue::new(Duration::from_millis(1000));
        queue.push(ToastKind::Info, "a", Duration::ZERO);
        queue.push(ToastKind::Error, "b", Duration::from_millis(600));
        queue.expire(Duration::from_millis(1200));
        let texts: Vec<_> = queue.active().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["b"]);
    }

    #[test]
    fn ids_are_sequential() {
        let mut queue = ToastQueue::new(Duration::from_millis(1000));
        assert_eq!(queue.push(ToastKind::Info, "a", Duration::ZERO), 0);
        assert_eq!(queue.push(ToastKind::Info, "b", Duration::ZERO), 1);
    }
}
