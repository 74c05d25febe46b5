#![forbid(unsafe_code)]

//! `plaza-web` is the browser-facing layer of Plaza.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding page (JS) pushes hash changes, clicks,
//!   login state and fetch results, and performs the requested fetches.
//! - **Deterministic time**: the host advances a monotonic clock explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! The [`step_program::StepNavigator`] owns the view store and the content
//! area; [`runner_core::RunnerCore`] wraps it with a JSON-in/JSON-out API
//! that the `wasm-bindgen` export (`PlazaWeb`) forwards to.

pub mod chat;
pub mod content;
pub mod protocol;
pub mod runner_core;
pub mod step_program;
pub mod toast;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::PlazaWeb;

use core::time::Duration;

use plaza_runtime::HashLocation;
use serde::Serialize;

use crate::content::ContentView;
use crate::protocol::FetchRequest;
use crate::toast::Toast;

/// Web layer error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebError {
    /// A host event could not be decoded.
    MalformedEvent(String),
    /// Generic unsupported operation.
    Unsupported(&'static str),
}

impl core::fmt::Display for WebError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MalformedEvent(msg) => write!(f, "malformed host event: {msg}"),
            Self::Unsupported(msg) => write!(f, "unsupported: {msg}"),
        }
    }
}

impl std::error::Error for WebError {}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }
}

/// Page location mirrored from the host.
///
/// Writes made by the store are queued in order for the host to apply to
/// `window.location.hash`; changes reported by the host replace the
/// fragment without being queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebLocation {
    origin: String,
    path: String,
    hash: String,
    pending_writes: Vec<String>,
}

impl WebLocation {
    #[must_use]
    pub fn new(origin: impl Into<String>, path: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            path: path.into(),
            hash: hash.into(),
            pending_writes: Vec::new(),
        }
    }

    /// Record a fragment the browser reported.
    pub fn host_changed(&mut self, hash: impl Into<String>) {
        self.hash = hash.into();
    }

    /// Drain the writes the host has not applied yet.
    pub fn take_writes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_writes)
    }
}

impl HashLocation for WebLocation {
    fn hash(&self) -> &str {
        &self.hash
    }

    fn set_hash(&mut self, hash: &str) {
        self.hash = hash.to_owned();
        self.pending_writes.push(hash.to_owned());
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn path(&self) -> &str {
        &self.path
    }
}

/// Captured outputs for host consumption.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct WebOutputs {
    /// Fragments to assign to `window.location.hash`, in order.
    pub hash_writes: Vec<String>,
    /// Fetches to perform; answer each with a `fetch_resolved` event.
    pub fetches: Vec<FetchRequest>,
    /// What the content area shows now.
    pub view: ContentView,
    /// Toasts visible now.
    pub toasts: Vec<Toast>,
    /// Text to copy to the clipboard.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clipboard: Option<String>,
    /// Log lines written by the runner.
    pub logs: Vec<String>,
}
