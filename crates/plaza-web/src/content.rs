#![forbid(unsafe_code)]

//! The content area: the render dispatcher behind the view store.
//!
//! [`ContentArea::render`] turns a notified view state into a
//! [`ContentView`] plus a list of [`Effect`]s for the runner to carry out
//! (fetches, toasts, follow-up navigation, poll arming). Fetch results come
//! back through [`ContentArea::accept_result`], which drops anything issued
//! for a view that has since been replaced.
//!
//! The area never calls the store itself. Follow-up navigation (the login
//! redirect, `edit` without an id, a missing game) is returned as
//! [`Effect::Navigate`] so the store is never re-entered from inside a
//! notification.

use std::collections::BTreeMap;

use plaza_core::{ItemId, SectionId, SpecialView, ViewKind, ViewState};
use plaza_runtime::{HashLocation, PlazaConfig, ViewStore, ViewTicket};
use serde::{Deserialize, Serialize};

use crate::chat::{ChatBoard, ChatLine};
use crate::protocol::{FetchKind, FetchResult, GameAction, NavIntent};
use crate::toast::ToastKind;

pub const LOGIN_REQUIRED: &str = "please log in first";
pub const EMPTY_CHAT_MESSAGE: &str = "please enter a message";
pub const LOAD_FAILED: &str = "load failed";
pub const RETRY_HINT: &str = "refresh to retry";
pub const NOT_FOUND: &str = "not found";
pub const NOT_FOUND_HINT: &str = "the item may have been removed";
pub const GAME_NOT_FOUND: &str = "game not found or removed";
pub const GAME_PUBLISHED: &str = "game published";
pub const GAME_DELETED: &str = "game deleted";

/// One announcement or game as served by the backend.
///
/// Only `id` and `title` are interpreted; everything else is passed through
/// to the host untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ContentItem {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// The logged-in user, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// What the content area currently shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentView {
    #[default]
    Hidden,
    Loading {
        section: SectionId,
    },
    Empty {
        section: SectionId,
        title: String,
    },
    Error {
        title: String,
        message: String,
    },
    List {
        section: SectionId,
        items: Vec<ContentItem>,
    },
    Detail {
        section: SectionId,
        item: ContentItem,
    },
    MyItems {
        section: SectionId,
        items: Vec<ContentItem>,
    },
    UploadForm {
        section: SectionId,
    },
    EditForm {
        section: SectionId,
        item: ContentItem,
    },
    Chat {
        lines: Vec<ChatLine>,
    },
}

impl ContentView {
    fn error(title: &str, message: &str) -> Self {
        Self::Error {
            title: title.to_owned(),
            message: message.to_owned(),
        }
    }
}

/// Work the runner performs on behalf of the content area.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(FetchKind),
    Toast(ToastKind, String),
    Navigate(NavIntent),
    ArmPoll,
    DisarmPoll,
}

#[derive(Debug, Clone)]
pub struct ContentArea {
    view: ContentView,
    lists: BTreeMap<SectionId, Vec<ContentItem>>,
    chat: ChatBoard,
    session: Option<UserProfile>,
}

impl ContentArea {
    #[must_use]
    pub fn new(config: &PlazaConfig) -> Self {
        Self {
            view: ContentView::Hidden,
            lists: BTreeMap::new(),
            chat: ChatBoard::new(config.utc_offset_minutes),
            session: None,
        }
    }

    #[must_use]
    pub fn view(&self) -> &ContentView {
        &self.view
    }

    #[must_use]
    pub fn session(&self) -> Option<&UserProfile> {
        self.session.as_ref()
    }

    pub fn set_session(&mut self, user: Option<UserProfile>) {
        tracing::info!(user = ?user.as_ref().map(|u| u.username.as_str()), "session changed");
        self.session = user;
    }

    #[must_use]
    pub fn chat(&self) -> &ChatBoard {
        &self.chat
    }

    /// React to a view-state notification.
    pub fn render(&mut self, state: &ViewState, section: Option<SectionId>) -> Vec<Effect> {
        let Some(section) = section.filter(|_| !state.is_empty()) else {
            self.view = ContentView::Hidden;
            return vec![Effect::DisarmPoll];
        };

        if state.view == ViewKind::Chat {
            self.view = ContentView::Chat {
                lines: self.chat.lines().to_vec(),
            };
            return vec![Effect::Fetch(FetchKind::ChatMessages), Effect::ArmPoll];
        }

        let mut effects = vec![Effect::DisarmPoll];
        if state.view.as_special().is_some() && self.session.is_none() {
            tracing::info!(section = %section, view = %state.view, "login required; redirecting to list");
            effects.push(Effect::Toast(ToastKind::Error, LOGIN_REQUIRED.to_owned()));
            effects.push(Effect::Navigate(NavIntent::List { section }));
            return effects;
        }

        match (state.view, state.item_id.as_ref()) {
            (ViewKind::Detail, Some(id)) => {
                if let Some(item) = self.cached(section, id) {
                    tracing::trace!(section = %section, item_id = %id, "detail served from list");
                    self.view = ContentView::Detail { section, item };
                } else {
                    self.view = ContentView::Loading { section };
                    effects.push(Effect::Fetch(FetchKind::Detail {
                        section,
                        item_id: id.clone(),
                    }));
                }
            }
            (ViewKind::My, _) => {
                self.view = ContentView::Loading { section };
                effects.push(Effect::Fetch(FetchKind::MyItems { section }));
            }
            (ViewKind::Upload, _) => {
                self.view = ContentView::UploadForm { section };
            }
            (ViewKind::Edit, Some(id)) => {
                self.view = ContentView::Loading { section };
                effects.push(Effect::Fetch(FetchKind::Detail {
                    section,
                    item_id: id.clone(),
                }));
            }
            (ViewKind::Edit, None) => {
                effects.push(Effect::Navigate(NavIntent::Special {
                    section,
                    view: SpecialView::My,
                    item_id: None,
                }));
            }
            // List, plus anything normalization already folded into a list.
            _ => {
                self.view = ContentView::Loading { section };
                effects.push(Effect::Fetch(FetchKind::List { section }));
            }
        }
        effects
    }

    /// Apply a fetch result if `ticket` still describes the shown view.
    pub fn accept_result<L: HashLocation>(
        &mut self,
        store: &ViewStore<L>,
        ticket: &ViewTicket,
        kind: &FetchKind,
        result: FetchResult,
    ) -> Vec<Effect> {
        if !store.is_current(ticket) {
            tracing::debug!(
                ticket = ticket.generation,
                latest = store.generation(),
                ?kind,
                "discarding stale fetch result"
            );
            return Vec::new();
        }
        self.apply_result(ticket, kind, result)
    }

    fn apply_result(
        &mut self,
        ticket: &ViewTicket,
        kind: &FetchKind,
        result: FetchResult,
    ) -> Vec<Effect> {
        match (kind, result) {
            (FetchKind::PostChat { .. }, FetchResult::Posted) => {
                vec![Effect::Fetch(FetchKind::ChatMessages)]
            }
            (FetchKind::PostChat { .. }, FetchResult::Failed { error }) => {
                tracing::warn!(%error, "chat send failed");
                vec![Effect::Toast(ToastKind::Error, format!("send failed: {error}"))]
            }
            (FetchKind::ChatMessages, FetchResult::Failed { error }) => {
                tracing::error!(%error, "loading chat messages failed");
                Vec::new()
            }
            (FetchKind::PublishGame { item_id }, FetchResult::Posted) => {
                tracing::info!(item_id = %item_id, "game published");
                Self::back_to_my_games(GAME_PUBLISHED)
            }
            (FetchKind::DeleteGame { item_id }, FetchResult::Posted) => {
                tracing::info!(item_id = %item_id, "game deleted");
                if let Some(items) = self.lists.get_mut(&SectionId::Game) {
                    items.retain(|item| item.id != item_id.as_str());
                }
                Self::back_to_my_games(GAME_DELETED)
            }
            (FetchKind::PublishGame { .. }, FetchResult::Failed { error }) => {
                tracing::warn!(%error, "publishing game failed");
                vec![Effect::Toast(ToastKind::Error, format!("publish failed: {error}"))]
            }
            (FetchKind::DeleteGame { .. }, FetchResult::Failed { error }) => {
                tracing::warn!(%error, "deleting game failed");
                vec![Effect::Toast(ToastKind::Error, format!("delete failed: {error}"))]
            }
            (
                FetchKind::Detail {
                    section: SectionId::Game,
                    item_id,
                },
                FetchResult::Item { item: None } | FetchResult::Failed { .. },
            ) if ticket.state.view == ViewKind::Detail => {
                tracing::warn!(item_id = %item_id, "game unavailable; back to list");
                vec![
                    Effect::Toast(ToastKind::Error, GAME_NOT_FOUND.to_owned()),
                    Effect::Navigate(NavIntent::List {
                        section: SectionId::Game,
                    }),
                ]
            }
            (_, FetchResult::Failed { error }) => {
                tracing::error!(?kind, %error, "fetch failed");
                self.view = ContentView::error(LOAD_FAILED, RETRY_HINT);
                Vec::new()
            }
            (FetchKind::List { section }, FetchResult::Items { items }) => {
                self.lists.insert(*section, items.clone());
                self.view = if items.is_empty() {
                    ContentView::Empty {
                        section: *section,
                        title: section.meta().empty_title.to_owned(),
                    }
                } else {
                    ContentView::List {
                        section: *section,
                        items,
                    }
                };
                Vec::new()
            }
            (FetchKind::MyItems { section }, FetchResult::Items { items }) => {
                self.view = ContentView::MyItems {
                    section: *section,
                    items,
                };
                Vec::new()
            }
            (FetchKind::Detail { section, .. }, FetchResult::Item { item }) => {
                self.view = match (item, ticket.state.view) {
                    (None, _) => ContentView::error(NOT_FOUND, NOT_FOUND_HINT),
                    (Some(item), ViewKind::Edit) => ContentView::EditForm {
                        section: *section,
                        item,
                    },
                    (Some(item), _) => ContentView::Detail {
                        section: *section,
                        item,
                    },
                };
                Vec::new()
            }
            (FetchKind::ChatMessages, FetchResult::Messages { messages }) => {
                if self.chat.replace(messages) && matches!(self.view, ContentView::Chat { .. }) {
                    self.view = ContentView::Chat {
                        lines: self.chat.lines().to_vec(),
                    };
                }
                Vec::new()
            }
            (kind, result) => {
                tracing::warn!(?kind, ?result, "fetch result does not match request");
                Vec::new()
            }
        }
    }

    /// Publish or delete one of the user's games.
    pub fn game_action(&mut self, action: GameAction, item_id: ItemId) -> Vec<Effect> {
        if self.session.is_none() {
            return vec![Effect::Toast(ToastKind::Error, LOGIN_REQUIRED.to_owned())];
        }
        let kind = match action {
            GameAction::Publish => FetchKind::PublishGame { item_id },
            GameAction::Delete => FetchKind::DeleteGame { item_id },
        };
        vec![Effect::Fetch(kind)]
    }

    fn back_to_my_games(message: &str) -> Vec<Effect> {
        vec![
            Effect::Toast(ToastKind::Success, message.to_owned()),
            Effect::Navigate(NavIntent::Special {
                section: SectionId::Game,
                view: SpecialView::My,
                item_id: None,
            }),
        ]
    }

    /// Validate and post a chat message typed while `current` is shown.
    pub fn send_chat(&mut self, text: &str, current: Option<SectionId>) -> Vec<Effect> {
        if current != Some(SectionId::Chat) {
            tracing::warn!(?current, "chat send outside the chat board");
            return Vec::new();
        }
        let text = text.trim();
        if text.is_empty() {
            return vec![Effect::Toast(ToastKind::Info, EMPTY_CHAT_MESSAGE.to_owned())];
        }
        if self.session.is_none() {
            return vec![Effect::Toast(ToastKind::Error, LOGIN_REQUIRED.to_owned())];
        }
        vec![Effect::Fetch(FetchKind::PostChat {
            text: text.to_owned(),
        })]
    }

    fn cached(&self, section: SectionId, id: &ItemId) -> Option<ContentItem> {
        self.lists
            .get(&section)?
            .iter()
            .find(|item| item.id == id.as_str())
            .cloned()
    }
}
