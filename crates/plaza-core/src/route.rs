#![forbid(unsafe_code)]

//! Bidirectional mapping between navigable state and the URL hash.
//!
//! # Grammar
//!
//! | state                         | hash                              |
//! |-------------------------------|-----------------------------------|
//! | nothing shown                 | `#/`                              |
//! | `list`                        | `#/{section}/list`                |
//! | `detail` + id                 | `#/{section}/detail/{id}`         |
//! | `chat`                        | `#/chat`                          |
//! | `my` / `upload` / `edit`      | `#/{section}/{view}[/{id}]`       |
//!
//! The grammar is a public, bookmarkable contract. Item ids are
//! percent-encoded so that ids containing `/`, `#`, `%` or whitespace still
//! round-trip.
//!
//! # Invariants
//!
//! 1. `decode(encode(s)) == s` for every normalized state `s`.
//! 2. `encode(decode(h)) == h` for every hash `h` produced by [`encode`].
//! 3. Decoding never panics; unknown sections are rejected, not coerced.

use core::fmt;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::section::{SectionId, SectionRegistry};
use crate::view::{ItemId, ViewKind, ViewState};

/// Hash written for the empty state.
pub const EMPTY_HASH: &str = "#/";

/// Characters escaped inside an item-id segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Error returned when a hash cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The first segment is not a registered section.
    UnknownSection(String),
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSection(name) => write!(f, "unknown section in hash: {name:?}"),
        }
    }
}

impl std::error::Error for RouteError {}

/// A decoded hash route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Route {
    /// Nothing shown.
    Empty,
    /// `section` showing `state`.
    Section { section: SectionId, state: ViewState },
}

impl Route {
    /// Build a route, normalizing `(view, item_id)` for `section`.
    #[must_use]
    pub fn new(section: SectionId, view: ViewKind, item_id: Option<ItemId>) -> Self {
        match ViewState::normalized(section, view, item_id) {
            Some(state) => Self::Section { section, state },
            None => Self::Empty,
        }
    }

    #[must_use]
    pub fn section(&self) -> Option<SectionId> {
        match self {
            Self::Empty => None,
            Self::Section { section, .. } => Some(*section),
        }
    }

    /// Encode this route as a hash string.
    #[must_use]
    pub fn to_hash(&self) -> String {
        match self {
            Self::Empty => EMPTY_HASH.to_owned(),
            Self::Section { section, state } => {
                encode(*section, state.view, state.item_id.as_ref())
            }
        }
    }
}

/// Encode `(section, view, item_id)` as a hash string.
///
/// Combinations outside the grammar (including `detail` without an id and
/// the `empty` view) encode to [`EMPTY_HASH`].
#[must_use]
pub fn encode(section: SectionId, view: ViewKind, item_id: Option<&ItemId>) -> String {
    match (view, item_id) {
        (ViewKind::List, _) => format!("#/{section}/list"),
        (ViewKind::Detail, Some(id)) => format!("#/{section}/detail/{}", encode_segment(id)),
        (ViewKind::Chat, _) => "#/chat".to_owned(),
        (ViewKind::My | ViewKind::Upload | ViewKind::Edit, id) => match id {
            Some(id) => format!("#/{section}/{view}/{}", encode_segment(id)),
            None => format!("#/{section}/{view}"),
        },
        (ViewKind::Detail, None) | (ViewKind::Empty, _) => EMPTY_HASH.to_owned(),
    }
}

/// Decode a hash string against `registry`.
///
/// Accepts the hash with or without its leading `#`. A missing view defaults
/// to `list`, as does a view word outside the grammar. Segments after the
/// item id are ignored.
pub fn decode(hash: &str, registry: &SectionRegistry) -> Result<Route, RouteError> {
    let body = hash.strip_prefix('#').unwrap_or(hash);
    let mut parts = body.split('/').filter(|part| !part.is_empty());

    let Some(first) = parts.next() else {
        return Ok(Route::Empty);
    };
    let section = registry
        .resolve(first)
        .map_err(|_| RouteError::UnknownSection(first.to_owned()))?;

    let view = parts
        .next()
        .map_or(ViewKind::List, |word| word.parse().unwrap_or(ViewKind::List));
    let item_id = parts.next().and_then(|raw| ItemId::new(decode_segment(raw)).ok());

    Ok(Route::new(section, view, item_id))
}

fn encode_segment(id: &ItemId) -> String {
    utf8_percent_encode(id.as_str(), SEGMENT).to_string()
}

fn decode_segment(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
