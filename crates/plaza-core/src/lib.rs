#![forbid(unsafe_code)]

//! Core: sections, view states, and the hash-route codec.
//!
//! # Role in Plaza
//! `plaza-core` holds the vocabulary every other crate speaks: which
//! sections exist ([`SectionId`]), what a section can show ([`ViewState`]),
//! and how that maps to a bookmarkable URL hash ([`route`]). It performs no
//! I/O and owns no mutable state; the view store lives in `plaza-runtime`.

pub mod logging;
pub mod route;
pub mod section;
pub mod view;

use core::fmt;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};

pub use route::{EMPTY_HASH, Route, RouteError, decode, encode};
pub use section::{SECTION_REGISTRY, SectionId, SectionMeta, SectionRegistry};
pub use view::{ItemId, SpecialView, ViewKind, ViewState};

/// Error parsing one of the core vocabulary types from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Not a known (or enabled) section name.
    UnknownSection(String),
    /// Not a known view name.
    UnknownView(String),
    /// Item ids must be non-empty.
    EmptyItemId,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSection(name) => write!(f, "unknown section: {name:?}"),
            Self::UnknownView(name) => write!(f, "unknown view: {name:?}"),
            Self::EmptyItemId => f.write_str("item id must not be empty"),
        }
    }
}

impl std::error::Error for ParseError {}
