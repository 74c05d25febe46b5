#![forbid(unsafe_code)]

//! Plaza Runtime
//!
//! The hash-synchronized view-state store and the pieces it is built from.
//!
//! # Key Components
//!
//! - [`ViewStore`] - Per-section view state kept in sync with the URL hash
//! - [`NavState`] / [`Action`] - The pure transition function behind the store
//! - [`NotificationBus`] - Ordered, panic-isolated listener fan-out
//! - [`HashLocation`] - The page URL as the store sees it
//! - [`ViewTicket`] - Stamp that lets async consumers drop stale results
//! - [`PollTimer`] - Fixed-interval timer on an external clock
//! - [`PlazaConfig`] - Defaults and `PLAZA_*` environment overrides
//!
//! # Role in Plaza
//! `plaza-runtime` sits between the vocabulary in `plaza-core` and the
//! host-facing layer in `plaza-web`. Everything here is single-threaded and
//! synchronous; the host supplies time and delivers network results.

pub mod bus;
pub mod config;
pub mod location;
pub mod poll;
pub mod store;
pub mod transition;

pub use bus::{Disposer, Notification, NotificationBus, RenderDispatcher, SubId};
pub use config::{ConfigError, PlazaConfig};
pub use location::{HashLocation, MemoryLocation};
pub use poll::PollTimer;
pub use store::{SyncOutcome, SyncPhase, ViewStore, ViewTicket};
pub use transition::{Action, NavState, Outcome};
