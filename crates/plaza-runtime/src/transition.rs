#![forbid(unsafe_code)]

//! Pure navigation state transitions.
//!
//! [`NavState::apply`] is the whole state machine: old state + [`Action`] →
//! new state. It performs no I/O, writes no hash, and notifies nobody, which
//! keeps it testable without a location. The effectful wrapper is
//! [`ViewStore`](crate::store::ViewStore).
//!
//! # Invariants
//!
//! 1. At most one section is current.
//! 2. Switching sections never clears another section's remembered state.
//! 3. Every stored [`ViewState`] is normalized for its section.
//! 4. `Close` removes only the current section's entry.

use std::collections::BTreeMap;

use plaza_core::{ItemId, Route, SectionId, SpecialView, ViewKind, ViewState};

/// A navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ShowList(SectionId),
    ShowDetail(SectionId, ItemId),
    ShowChat,
    ShowSpecial(SectionId, SpecialView, Option<ItemId>),
    /// Return the current section to its list view.
    BackToList,
    /// Forget the current section's state and show nothing.
    Close,
    /// Apply a route decoded from the location (inbound edge).
    Restore(Route),
}

/// Result of [`NavState::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The action had nothing to act on; state is untouched.
    Ignored,
    /// The action was applied. `changed` is false when the resulting state
    /// equals the prior one (re-navigation to the same view).
    Applied { changed: bool },
}

impl Outcome {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Which section is current, plus each visited section's last view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavState {
    current: Option<SectionId>,
    per_section: BTreeMap<SectionId, ViewState>,
}

impl NavState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn current_section(&self) -> Option<SectionId> {
        self.current
    }

    /// State of the current section, or the empty sentinel.
    #[must_use]
    pub fn current_state(&self) -> ViewState {
        self.current
            .and_then(|section| self.per_section.get(&section))
            .cloned()
            .unwrap_or_else(ViewState::empty)
    }

    /// The route describing what is currently shown.
    #[must_use]
    pub fn route(&self) -> Route {
        match self.current {
            Some(section) => match self.per_section.get(&section) {
                Some(state) => Route::Section {
                    section,
                    state: state.clone(),
                },
                None => Route::Empty,
            },
            None => Route::Empty,
        }
    }

    /// Remembered state for `section`, current or not.
    #[must_use]
    pub fn remembered(&self, section: SectionId) -> Option<&ViewState> {
        self.per_section.get(&section)
    }

    /// Sections that have a remembered state, in section order.
    pub fn remembered_sections(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.per_section.keys().copied()
    }

    /// Apply `action`. Last write wins when actions target different sections.
    pub fn apply(&mut self, action: Action) -> Outcome {
        let before = self.route();
        match action {
            Action::ShowList(section) => self.show(section, ViewKind::List, None),
            Action::ShowDetail(section, id) => self.show(section, ViewKind::Detail, Some(id)),
            Action::ShowChat => self.show(SectionId::Chat, ViewKind::Chat, None),
            Action::ShowSpecial(section, view, id) => self.show(section, view.kind(), id),
            Action::BackToList => {
                let Some(section) = self.current else {
                    return Outcome::Ignored;
                };
                self.show(section, ViewKind::List, None);
            }
            Action::Close => self.close(),
            Action::Restore(Route::Empty) => self.close(),
            Action::Restore(Route::Section { section, state }) => {
                self.show(section, state.view, state.item_id);
            }
        }
        Outcome::Applied {
            changed: self.route() != before,
        }
    }

    fn show(&mut self, section: SectionId, view: ViewKind, item_id: Option<ItemId>) {
        match ViewState::normalized(section, view, item_id) {
            Some(state) => {
                self.current = Some(section);
                self.per_section.insert(section, state);
            }
            None => self.close(),
        }
    }

    fn close(&mut self) {
        if let Some(section) = self.current.take() {
            self.per_section.remove(&section);
        }
    }
}
