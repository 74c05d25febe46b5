#![forbid(unsafe_code)]

//! JSON protocol between the JavaScript host and the step runner.
//!
//! The host pushes [`HostEvent`]s and answers [`FetchRequest`]s; everything
//! else flows back through [`WebOutputs`](crate::WebOutputs). Every type
//! here has a small, stable encoding: a tag field plus the minimum semantic
//! fields, so recorded sessions can be replayed byte for byte.
//!
//! ```json
//! {"type":"navigate","intent":{"intent":"detail","section":"game","item_id":"42"}}
//! {"type":"fetch_resolved","ticket":{...},"kind":{"op":"list","section":"game"},
//!  "result":{"status":"items","items":[{"id":"42","title":"Snake"}]}}
//! ```

use plaza_core::{ItemId, SectionId, SpecialView};
use plaza_runtime::ViewTicket;
use serde::{Deserialize, Serialize};

use crate::WebError;
use crate::chat::ChatMessage;
use crate::content::{ContentItem, UserProfile};

/// A user-level navigation request, as bound to page controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum NavIntent {
    /// Top navigation button: chat opens the board, other sections their list.
    Nav { section: SectionId },
    List { section: SectionId },
    Detail { section: SectionId, item_id: String },
    Chat,
    Special {
        section: SectionId,
        view: SpecialView,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_id: Option<ItemId>,
    },
    Back,
    Close,
    /// The upload form's cancel link: back to the section's own items.
    CancelUpload { section: SectionId },
}

/// An action on one of the user's own games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameAction {
    Publish,
    Delete,
}

/// What the host should fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FetchKind {
    List { section: SectionId },
    Detail { section: SectionId, item_id: ItemId },
    MyItems { section: SectionId },
    ChatMessages,
    PostChat { text: String },
    PublishGame { item_id: ItemId },
    DeleteGame { item_id: ItemId },
}

/// A fetch the host should perform, stamped with the view it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub ticket: ViewTicket,
    pub kind: FetchKind,
}

/// The host's answer to a [`FetchRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchResult {
    Items { items: Vec<ContentItem> },
    /// `item: null` means the server has no such item.
    Item {
        #[serde(default)]
        item: Option<ContentItem>,
    },
    Messages { messages: Vec<ChatMessage> },
    Posted,
    Failed { error: String },
}

/// Input pushed by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// The browser fired `hashchange`.
    HashChanged { hash: String },
    Navigate { intent: NavIntent },
    /// The share button was pressed.
    Share,
    /// Writing the last clipboard output failed.
    ClipboardFailed,
    FetchResolved {
        ticket: ViewTicket,
        kind: FetchKind,
        result: FetchResult,
    },
    /// Login state changed. `null` logs out.
    Session {
        #[serde(default)]
        user: Option<UserProfile>,
    },
    SendChat { text: String },
    /// Publish or delete one of the user's games.
    GameAction { action: GameAction, item_id: ItemId },
}

impl HostEvent {
    /// Decode one event from its JSON encoding.
    pub fn from_json_str(json: &str) -> Result<Self, WebError> {
        serde_json::from_str(json).map_err(|err| WebError::MalformedEvent(err.to_string()))
    }

    /// Encode this event as JSON.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
