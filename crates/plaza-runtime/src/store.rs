#![forbid(unsafe_code)]

//! The view-state store: single source of truth for what the page shows.
//!
//! [`ViewStore`] wraps the pure [`NavState`] transition with the two side
//! effects every navigation has: writing the location hash and notifying
//! subscribers. The inbound edge ([`ViewStore::sync_from_location`]) runs
//! the same transition with hash writes suppressed.
//!
//! # Invariants
//!
//! 1. Each internal mutation writes the hash at most once, and not at all
//!    when the computed hash already equals the location's hash.
//! 2. Every accepted mutation notifies exactly once; a rejected one never
//!    notifies.
//! 3. No hash is written while [`SyncPhase::ApplyingExternal`] is active.
//! 4. A host-reported hash equal to one the store wrote, or to the canonical
//!    hash of the current view, is an echo and is consumed without
//!    re-applying or re-notifying.
//! 5. The generation increases by one per notification, so a
//!    [`ViewTicket`] is current iff no notification happened since it was
//!    taken.

use std::collections::VecDeque;

use plaza_core::{
    ItemId, Route, SectionId, SectionRegistry, SpecialView, ViewState, route::decode,
};
use serde::{Deserialize, Serialize};

use crate::bus::{Disposer, Notification, NotificationBus, RenderDispatcher};
use crate::config::{DEFAULT_MAX_PENDING_ECHOES, PlazaConfig};
use crate::location::{HashLocation, MemoryLocation};
use crate::transition::{Action, NavState, Outcome};

/// What the store is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    /// A navigation operation is running; it may write the hash.
    ApplyingInternal,
    /// A location change is being applied; hash writes are suppressed.
    ApplyingExternal,
}

/// Result of [`ViewStore::sync_from_location`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The hash was decoded and applied; subscribers were notified.
    Applied { changed: bool },
    /// The hash was one the store wrote itself, or restates the current view.
    Echo,
    /// The hash named an unknown section. State is untouched.
    Rejected,
}

/// Stamp identifying the view an asynchronous request was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewTicket {
    pub generation: u64,
    pub section: Option<SectionId>,
    pub state: ViewState,
}

impl From<&Notification> for ViewTicket {
    fn from(note: &Notification) -> Self {
        Self {
            generation: note.generation,
            section: note.section,
            state: note.state.clone(),
        }
    }
}

/// Hash-synchronized per-section view state.
#[derive(Debug)]
pub struct ViewStore<L: HashLocation = MemoryLocation> {
    registry: SectionRegistry,
    location: L,
    nav: NavState,
    bus: NotificationBus,
    phase: SyncPhase,
    generation: u64,
    pending_echoes: VecDeque<String>,
    max_pending_echoes: usize,
}

impl<L: HashLocation> ViewStore<L> {
    /// Store over `location` accepting only `registry`'s sections.
    ///
    /// Nothing is current until a navigation or [`Self::init_from_location`].
    pub fn new(registry: SectionRegistry, location: L) -> Self {
        Self {
            registry,
            location,
            nav: NavState::new(),
            bus: NotificationBus::new(),
            phase: SyncPhase::Idle,
            generation: 0,
            pending_echoes: VecDeque::new(),
            max_pending_echoes: DEFAULT_MAX_PENDING_ECHOES,
        }
    }

    pub fn from_config(config: &PlazaConfig, location: L) -> Self {
        let mut store = Self::new(config.sections.clone(), location);
        store.max_pending_echoes = config.max_pending_echoes.max(1);
        store
    }

    // ── Navigation ──────────────────────────────────────────────────────

    pub fn show_list(&mut self, section: SectionId) -> Outcome {
        self.mutate(section, Action::ShowList(section))
    }

    /// Show one item. An empty `item_id` shows the list instead.
    pub fn show_detail(&mut self, section: SectionId, item_id: &str) -> Outcome {
        match ItemId::new(item_id) {
            Ok(id) => self.mutate(section, Action::ShowDetail(section, id)),
            Err(_) => {
                tracing::debug!(section = %section, "empty item id; showing list");
                self.mutate(section, Action::ShowList(section))
            }
        }
    }

    pub fn show_chat(&mut self) -> Outcome {
        self.mutate(SectionId::Chat, Action::ShowChat)
    }

    pub fn show_special(
        &mut self,
        section: SectionId,
        view: SpecialView,
        item_id: Option<ItemId>,
    ) -> Outcome {
        self.mutate(section, Action::ShowSpecial(section, view, item_id))
    }

    /// Return the current section to its list. No-op when nothing is current.
    pub fn back_to_list(&mut self) -> Outcome {
        if self.nav.current_section().is_none() {
            tracing::debug!("back_to_list with no current section");
            return Outcome::Ignored;
        }
        self.run_internal(Action::BackToList)
    }

    /// Forget the current section and show nothing. Idempotent.
    pub fn close(&mut self) -> Outcome {
        self.run_internal(Action::Close)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn current_state(&self) -> ViewState {
        self.nav.current_state()
    }

    #[must_use]
    pub fn current_section(&self) -> Option<SectionId> {
        self.nav.current_section()
    }

    #[must_use]
    pub fn current_route(&self) -> Route {
        self.nav.route()
    }

    /// Remembered state of `section`, whether or not it is current.
    #[must_use]
    pub fn remembered(&self, section: SectionId) -> Option<&ViewState> {
        self.nav.remembered(section)
    }

    /// Sections with a stored entry, in section order.
    #[must_use]
    pub fn sections_remembered(&self) -> Vec<SectionId> {
        self.nav.remembered_sections().collect()
    }

    #[must_use]
    pub fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn phase(&self) -> SyncPhase {
        self.phase
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Absolute URL of the current page, read from the location now.
    #[must_use]
    pub fn share_url(&self) -> String {
        self.location.href()
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    pub fn location_mut(&mut self) -> &mut L {
        &mut self.location
    }

    // ── Subscriptions ───────────────────────────────────────────────────

    /// Register a render listener called with `(state, section)`.
    pub fn subscribe(&self, listener: impl RenderDispatcher + 'static) -> Disposer {
        self.bus.subscribe_dispatcher(listener)
    }

    /// Register a listener that also receives the notification generation.
    pub fn subscribe_stamped(&self, listener: impl FnMut(&Notification) + 'static) -> Disposer {
        self.bus.subscribe(listener)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.bus.len()
    }

    // ── Tickets ─────────────────────────────────────────────────────────

    /// Stamp for a request issued for the view shown right now.
    #[must_use]
    pub fn ticket(&self) -> ViewTicket {
        ViewTicket {
            generation: self.generation,
            section: self.nav.current_section(),
            state: self.nav.current_state(),
        }
    }

    /// Whether no notification happened since `ticket` was taken.
    #[must_use]
    pub fn is_current(&self, ticket: &ViewTicket) -> bool {
        ticket.generation == self.generation
    }

    // ── Inbound edge ────────────────────────────────────────────────────

    /// Apply the location's hash after the host reported a change.
    pub fn sync_from_location(&mut self) -> SyncOutcome {
        let hash = self.location.hash().to_owned();
        if let Some(pos) = self.pending_echoes.iter().position(|h| *h == hash) {
            self.pending_echoes.drain(..=pos);
            tracing::trace!(hash = %hash, "hash change is our own echo");
            return SyncOutcome::Echo;
        }
        // Browsers fire one hashchange per write, and a handler reading
        // `location.hash` reports the latest hash each time.
        if hash == self.nav.route().to_hash() {
            tracing::trace!(hash = %hash, "hash change restates the current view");
            return SyncOutcome::Echo;
        }
        self.apply_external(&hash)
    }

    /// Restore state from the deep link the page was opened with.
    pub fn init_from_location(&mut self) -> SyncOutcome {
        self.pending_echoes.clear();
        let hash = self.location.hash().to_owned();
        tracing::info!(hash = %hash, "restoring initial location");
        self.apply_external(&hash)
    }

    fn apply_external(&mut self, hash: &str) -> SyncOutcome {
        self.phase = SyncPhase::ApplyingExternal;
        let route = match decode(hash, &self.registry) {
            Ok(route) => route,
            Err(err) => {
                tracing::warn!(hash = %hash, error = %err, "ignoring hash");
                self.phase = SyncPhase::Idle;
                return SyncOutcome::Rejected;
            }
        };
        let outcome = self.nav.apply(Action::Restore(route));
        self.write_hash();
        self.notify();
        self.phase = SyncPhase::Idle;
        match outcome {
            Outcome::Applied { changed } => SyncOutcome::Applied { changed },
            Outcome::Ignored => SyncOutcome::Applied { changed: false },
        }
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn mutate(&mut self, section: SectionId, action: Action) -> Outcome {
        if !self.registry.contains(section) {
            tracing::warn!(section = %section, "section not registered; ignoring");
            return Outcome::Ignored;
        }
        self.run_internal(action)
    }

    fn run_internal(&mut self, action: Action) -> Outcome {
        self.phase = SyncPhase::ApplyingInternal;
        let outcome = self.nav.apply(action);
        if outcome.is_applied() {
            self.write_hash();
            self.notify();
        }
        self.phase = SyncPhase::Idle;
        outcome
    }

    fn write_hash(&mut self) {
        if self.phase == SyncPhase::ApplyingExternal {
            return;
        }
        let hash = self.nav.route().to_hash();
        if hash == self.location.hash() {
            return;
        }
        tracing::debug!(hash = %hash, "writing location hash");
        self.location.set_hash(&hash);
        self.pending_echoes.push_back(hash);
        while self.pending_echoes.len() > self.max_pending_echoes {
            self.pending_echoes.pop_front();
        }
    }

    fn notify(&mut self) {
        self.generation += 1;
        let note = Notification {
            generation: self.generation,
            section: self.nav.current_section(),
            state: self.nav.current_state(),
        };
        let failures = self.bus.notify(&note);
        if failures > 0 {
            tracing::warn!(failures, generation = note.generation, "listeners failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plaza_core::ViewKind;
    use pretty_assertions::assert_eq;

    fn store() -> ViewStore {
        ViewStore::new(SectionRegistry::all(), MemoryLocation::default())
    }

    #[test]
    fn show_list_writes_hash() {
        let mut s = store();
        s.show_list(SectionId::Announcement);
        assert_eq!(s.location().hash(), "#/announcement/list");
        assert_eq!(s.location().writes(), 1);
    }

    #[test]
    fn phase_returns_to_idle() {
        let mut s = store();
        s.show_chat();
        assert_eq!(s.phase(), SyncPhase::Idle);
        s.location_mut().navigate_externally("#/game/list");
        s.sync_from_location();
        assert_eq!(s.phase(), SyncPhase::Idle);
    }

    #[test]
    fn empty_detail_id_shows_list() {
        let mut s = store();
        s.show_detail(SectionId::Game, "");
        assert_eq!(s.current_state(), ViewState::list());
        assert_eq!(s.location().hash(), "#/game/list");
    }

    #[test]
    fn unregistered_section_is_ignored() {
        let mut s = ViewStore::new(
            SectionRegistry::new([SectionId::Announcement]),
            MemoryLocation::default(),
        );
        assert_eq!(s.show_chat(), Outcome::Ignored);
        assert_eq!(s.generation(), 0);
        assert_eq!(s.location().writes(), 0);
    }

    #[test]
    fn back_to_list_writes_list_hash() {
        let mut s = store();
        s.show_detail(SectionId::Game, "g7");
        s.back_to_list();
        assert_eq!(s.location().hash(), "#/game/list");
    }

    #[test]
    fn close_writes_empty_hash_once() {
        let mut s = store();
        s.show_chat();
        s.close();
        s.close();
        assert_eq!(s.location().hash(), "#/");
        assert_eq!(s.location().writes(), 2);
        assert_eq!(s.current_state(), ViewState::empty());
    }

    #[test]
    fn echo_is_consumed_without_notify() {
        let mut s = store();
        s.show_list(SectionId::Game);
        let generation = s.generation();
        assert_eq!(s.sync_from_location(), SyncOutcome::Echo);
        assert_eq!(s.generation(), generation);
    }

    #[test]
    fn repeated_report_of_latest_hash_is_an_echo() {
        let mut s = store();
        s.show_special(SectionId::Game, SpecialView::My, None);
        s.show_list(SectionId::Game);
        let generation = s.generation();
        // One report per write, both carrying the latest hash.
        assert_eq!(s.sync_from_location(), SyncOutcome::Echo);
        assert_eq!(s.sync_from_location(), SyncOutcome::Echo);
        assert_eq!(s.generation(), generation);
        assert_eq!(s.current_state(), ViewState::list());
    }

    #[test]
    fn external_change_does_not_write_hash() {
        let mut s = store();
        s.location_mut().navigate_externally("#/game/detail/9");
        let outcome = s.sync_from_location();
        assert_eq!(outcome, SyncOutcome::Applied { changed: true });
        assert_eq!(s.location().writes(), 0);
        assert_eq!(
            s.current_state(),
            ViewState::detail(ItemId::new("9").unwrap())
        );
    }

    #[test]
    fn ticket_goes_stale_after_notify() {
        let mut s = store();
        s.show_list(SectionId::Game);
        let ticket = s.ticket();
        assert!(s.is_current(&ticket));
        assert_eq!(ticket.state.view, ViewKind::List);
        s.show_detail(SectionId::Game, "1");
        assert!(!s.is_current(&ticket));
    }

    #[test]
    fn share_url_reads_location() {
        let mut s = ViewStore::new(
            SectionRegistry::all(),
            MemoryLocation::new("https://plaza.example", "/index.html"),
        );
        s.show_detail(SectionId::Announcement, "5");
        assert_eq!(
            s.share_url(),
            "https://plaza.example/index.html#/announcement/detail/5"
        );
    }

    #[test]
    fn pending_echoes_are_bounded() {
        let mut s = ViewStore::from_config(
            &PlazaConfig::default().with_max_pending_echoes(2),
            MemoryLocation::default(),
        );
        for id in ["1", "2", "3"] {
            s.show_detail(SectionId::Game, id);
        }
        assert_eq!(s.pending_echoes.len(), 2);
        assert_eq!(s.pending_echoes.front().map(String::as_str), Some("#/game/detail/2"));
    }
}
