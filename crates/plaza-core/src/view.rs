#![forbid(unsafe_code)]

//! View kinds, item ids, and the per-section view state.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseError;
use crate::section::SectionId;

/// The sub-mode shown within a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// Sentinel for "nothing is shown". Never stored for a section.
    Empty,
    List,
    Detail,
    Chat,
    /// The signed-in user's own items.
    My,
    Upload,
    Edit,
}

impl ViewKind {
    /// Wire name used in hash routes and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::List => "list",
            Self::Detail => "detail",
            Self::Chat => "chat",
            Self::My => "my",
            Self::Upload => "upload",
            Self::Edit => "edit",
        }
    }

    /// The section-specific extra view this kind corresponds to, if any.
    #[must_use]
    pub const fn as_special(self) -> Option<SpecialView> {
        match self {
            Self::My => Some(SpecialView::My),
            Self::Upload => Some(SpecialView::Upload),
            Self::Edit => Some(SpecialView::Edit),
            _ => None,
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "empty" => Ok(Self::Empty),
            "list" => Ok(Self::List),
            "detail" => Ok(Self::Detail),
            "chat" => Ok(Self::Chat),
            "my" => Ok(Self::My),
            "upload" => Ok(Self::Upload),
            "edit" => Ok(Self::Edit),
            other => Err(ParseError::UnknownView(other.to_owned())),
        }
    }
}

/// Section-specific extra views accepted by `show_special`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialView {
    My,
    Upload,
    Edit,
}

impl SpecialView {
    pub const ALL: &'static [SpecialView] = &[Self::My, Self::Upload, Self::Edit];

    #[must_use]
    pub const fn kind(self) -> ViewKind {
        match self {
            Self::My => ViewKind::My,
            Self::Upload => ViewKind::Upload,
            Self::Edit => ViewKind::Edit,
        }
    }
}

/// Opaque, non-empty identifier of a content item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Wrap `id`, rejecting the empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, ParseError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ParseError::EmptyItemId);
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ItemId {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ItemId {
    type Error = ParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// What a section is showing: `{ view, item_id }`.
///
/// Stored states are always [normalized](Self::normalized): `item_id` is set
/// only for `Detail` and the item-scoped extra views, and the chat section
/// only ever shows `{ Chat, None }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewState {
    pub view: ViewKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<ItemId>,
}

impl ViewState {
    /// The "nothing shown" sentinel.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            view: ViewKind::Empty,
            item_id: None,
        }
    }

    #[must_use]
    pub const fn list() -> Self {
        Self {
            view: ViewKind::List,
            item_id: None,
        }
    }

    #[must_use]
    pub fn detail(item_id: ItemId) -> Self {
        Self {
            view: ViewKind::Detail,
            item_id: Some(item_id),
        }
    }

    #[must_use]
    pub const fn chat() -> Self {
        Self {
            view: ViewKind::Chat,
            item_id: None,
        }
    }

    #[must_use]
    pub fn special(view: SpecialView, item_id: Option<ItemId>) -> Self {
        Self {
            view: view.kind(),
            item_id,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.view == ViewKind::Empty
    }

    /// Coerce `(view, item_id)` into the state `section` can actually hold.
    ///
    /// Returns `None` only for [`ViewKind::Empty`], which is never stored.
    #[must_use]
    pub fn normalized(section: SectionId, view: ViewKind, item_id: Option<ItemId>) -> Option<Self> {
        if section.is_chat() {
            return match view {
                ViewKind::Empty => None,
                _ => Some(Self::chat()),
            };
        }
        match view {
            ViewKind::Empty => None,
            ViewKind::List | ViewKind::Chat => Some(Self::list()),
            ViewKind::Detail => Some(item_id.map_or_else(Self::list, Self::detail)),
            ViewKind::My | ViewKind::Upload | ViewKind::Edit => Some(Self { view, item_id }),
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    #[test]
    fn item_id_rejects_empty() {
        assert_eq!(ItemId::new(""), Err(ParseError::EmptyItemId));
        assert_eq!(id("42").as_str(), "42");
    }

    #[test]
    fn view_kind_wire_names_round_trip() {
        for kind in [
            ViewKind::Empty,
            ViewKind::List,
            ViewKind::Detail,
            ViewKind::Chat,
            ViewKind::My,
            ViewKind::Upload,
            ViewKind::Edit,
        ] {
            assert_eq!(kind.as_str().parse::<ViewKind>().unwrap(), kind);
        }
        assert_eq!(
            "gallery".parse::<ViewKind>(),
            Err(ParseError::UnknownView("gallery".into()))
        );
    }

    #[test]
    fn normalized_detail_without_id_falls_back_to_list() {
        assert_eq!(
            ViewState::normalized(SectionId::Game, ViewKind::Detail, None),
            Some(ViewState::list())
        );
    }

    #[test]
    fn normalized_list_drops_item_id() {
        assert_eq!(
            ViewState::normalized(SectionId::Announcement, ViewKind::List, Some(id("1"))),
            Some(ViewState::list())
        );
    }

    #[test]
    fn normalized_chat_section_is_always_chat() {
        for view in [ViewKind::List, ViewKind::Detail, ViewKind::My, ViewKind::Chat] {
            assert_eq!(
                ViewState::normalized(SectionId::Chat, view, Some(id("9"))),
                Some(ViewState::chat())
            );
        }
    }

    #[test]
    fn normalized_chat_view_elsewhere_is_list() {
        assert_eq!(
            ViewState::normalized(SectionId::Game, ViewKind::Chat, None),
            Some(ViewState::list())
        );
    }

    #[test]
    fn normalized_special_keeps_optional_id() {
        assert_eq!(
            ViewState::normalized(SectionId::Game, ViewKind::Edit, Some(id("g1"))),
            Some(ViewState::special(SpecialView::Edit, Some(id("g1"))))
        );
        assert_eq!(
            ViewState::normalized(SectionId::Game, ViewKind::My, None),
            Some(ViewState::special(SpecialView::My, None))
        );
    }

    #[test]
    fn normalized_empty_is_never_stored() {
        assert_eq!(ViewState::normalized(SectionId::Game, ViewKind::Empty, None), None);
        assert_eq!(ViewState::normalized(SectionId::Chat, ViewKind::Empty, None), None);
    }

    #[test]
    fn serde_shape_matches_host_protocol() {
        let json = serde_json::to_string(&ViewState::detail(id("42"))).unwrap();
        assert_eq!(json, r#"{"view":"detail","item_id":"42"}"#);
        let json = serde_json::to_string(&ViewState::empty()).unwrap();
        assert_eq!(json, r#"{"view":"empty"}"#);
        assert!(serde_json::from_str::<ViewState>(r#"{"view":"detail","item_id":""}"#).is_err());
    }
}
