#![forbid(unsafe_code)]

//! Top-level content sections and the registry of sections a host enables.
//!
//! [`SectionId`] is the closed set of sections the client knows how to route.
//! A [`SectionRegistry`] is the subset a particular host page enables; the
//! route decoder and the view store only accept registered sections.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Identifies a top-level content section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    /// Announcements / bulletins.
    Announcement,
    /// User-uploaded game gallery.
    Game,
    /// Polling chat board. Has a single item-less view.
    Chat,
}

impl SectionId {
    /// All sections in navigation order.
    pub const ALL: &'static [SectionId] = &[Self::Announcement, Self::Game, Self::Chat];

    /// Wire name used in hash routes and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Announcement => "announcement",
            Self::Game => "game",
            Self::Chat => "chat",
        }
    }

    /// Whether this is the chat section, whose only view is `chat`.
    #[must_use]
    pub const fn is_chat(self) -> bool {
        matches!(self, Self::Chat)
    }

    /// Registry metadata for this section.
    #[must_use]
    pub fn meta(self) -> &'static SectionMeta {
        // SECTION_REGISTRY has exactly one entry per variant, in ALL order.
        &SECTION_REGISTRY[self.index()]
    }

    /// 0-based index in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Announcement => 0,
            Self::Game => 1,
            Self::Chat => 2,
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "announcement" => Ok(Self::Announcement),
            "game" => Ok(Self::Game),
            "chat" => Ok(Self::Chat),
            other => Err(ParseError::UnknownSection(other.to_owned())),
        }
    }
}

/// Static metadata describing a section.
#[derive(Debug, Clone, Copy)]
pub struct SectionMeta {
    pub id: SectionId,
    /// Heading shown above the section's content.
    pub title: &'static str,
    /// Short label for the navigation bar.
    pub nav_label: &'static str,
    /// Title of the empty state shown when a list has no entries.
    pub empty_title: &'static str,
}

/// Section registry: single source of truth for section ordering + metadata.
pub const SECTION_REGISTRY: &[SectionMeta] = &[
    SectionMeta {
        id: SectionId::Announcement,
        title: "Announcements",
        nav_label: "News",
        empty_title: "No announcements yet",
    },
    SectionMeta {
        id: SectionId::Game,
        title: "Game Gallery",
        nav_label: "Games",
        empty_title: "No games yet",
    },
    SectionMeta {
        id: SectionId::Chat,
        title: "Chat Board",
        nav_label: "Chat",
        empty_title: "No messages yet",
    },
];

/// The closed set of sections a host page enables.
///
/// Order is preserved as given and duplicates are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRegistry {
    sections: Vec<SectionId>,
}

impl SectionRegistry {
    /// Registry containing the given sections.
    #[must_use]
    pub fn new(sections: impl IntoIterator<Item = SectionId>) -> Self {
        let mut out: Vec<SectionId> = Vec::new();
        for section in sections {
            if !out.contains(&section) {
                out.push(section);
            }
        }
        Self { sections: out }
    }

    /// Registry containing every known section.
    #[must_use]
    pub fn all() -> Self {
        Self::new(SectionId::ALL.iter().copied())
    }

    /// Parse a comma-separated list such as `announcement,game`.
    ///
    /// Unknown names are skipped with a warning; blank entries are ignored.
    #[must_use]
    pub fn from_names(list: &str) -> Self {
        let sections = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .filter_map(|name| match name.parse::<SectionId>() {
                Ok(section) => Some(section),
                Err(err) => {
                    crate::warn!(name, error = %err, "ignoring unknown section in registry list");
                    let _ = err;
                    None
                }
            });
        Self::new(sections)
    }

    /// Whether `section` is enabled.
    #[must_use]
    pub fn contains(&self, section: SectionId) -> bool {
        self.sections.contains(&section)
    }

    /// Look up an enabled section by wire name.
    pub fn resolve(&self, name: &str) -> Result<SectionId, ParseError> {
        let section: SectionId = name.parse()?;
        if self.contains(section) {
            Ok(section)
        } else {
            Err(ParseError::UnknownSection(name.to_owned()))
        }
    }

    /// Enabled sections in registry order.
    pub fn iter(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.sections.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl Default for SectionRegistry {
    fn default() -> Self {
        Self::all()
    }
}
