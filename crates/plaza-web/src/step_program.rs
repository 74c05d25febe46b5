#![forbid(unsafe_code)]

//! Step-based runner tying the view store to the content area.
//!
//! [`StepNavigator`] owns the [`ViewStore`], the [`ContentArea`], the toast
//! queue and the chat poll timer. The host (JavaScript) controls the loop:
//!
//! 1. Push events via [`StepNavigator::push_event`] (or the JSON variant).
//! 2. Advance time via [`StepNavigator::advance_time`].
//! 3. Call [`StepNavigator::step`] to process the queued events.
//! 4. Read hash writes, fetches, toasts and the view via
//!    [`StepNavigator::take_outputs`].
//!
//! Store notifications are queued into an inbox by the subscription and
//! drained after each event, so the content area only ever sees a settled
//! store and may request follow-up navigation freely.

use core::time::Duration;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use plaza_core::SpecialView;
use plaza_runtime::{
    Disposer, HashLocation, Notification, Outcome, PlazaConfig, PollTimer, SyncOutcome,
    ViewStore, ViewTicket,
};
use serde::Serialize;

use crate::content::{ContentArea, Effect};
use crate::protocol::{FetchKind, FetchRequest, HostEvent, NavIntent};
use crate::toast::{ToastKind, ToastQueue};
use crate::{DeterministicClock, WebError, WebLocation, WebOutputs};

pub const SHARE_COPIED: &str = "share link copied";
pub const COPY_FAILED: &str = "copy failed, copy the URL manually";

/// Upper bound on notifications drained per event; a redirect cycle stops here.
const MAX_NOTIFICATIONS_PER_EVENT: u32 = 16;

/// Result of a single [`StepNavigator::step`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepResult {
    /// Number of host events processed during this step.
    pub events_processed: u32,
    /// Store notifications delivered to the content area.
    pub notifications: u32,
    /// Fetch requests emitted.
    pub fetches_issued: u32,
    /// Navigation requests the store had nothing to act on.
    pub ignored_navigations: u32,
    /// Whether the chat poll fired.
    pub polled: bool,
    /// Whether the content view differs from the previous step's.
    pub view_changed: bool,
    /// Monotonically increasing step index.
    pub step_idx: u64,
}

/// Host-driven, non-blocking navigation runner.
pub struct StepNavigator {
    store: ViewStore<WebLocation>,
    content: ContentArea,
    inbox: Rc<RefCell<VecDeque<Notification>>>,
    subscription: Option<Disposer>,
    clock: DeterministicClock,
    events: VecDeque<HostEvent>,
    toasts: ToastQueue,
    poll: PollTimer,
    outputs: WebOutputs,
    counters: StepResult,
    initialized: bool,
    step_idx: u64,
}

impl StepNavigator {
    /// Create a runner for a page at `origin` + `path` opened with `initial_hash`.
    #[must_use]
    pub fn new(config: &PlazaConfig, origin: &str, path: &str, initial_hash: &str) -> Self {
        let store = ViewStore::from_config(config, WebLocation::new(origin, path, initial_hash));
        let inbox: Rc<RefCell<VecDeque<Notification>>> = Rc::default();
        let sink = Rc::clone(&inbox);
        let subscription = store.subscribe_stamped(move |note: &Notification| {
            sink.borrow_mut().push_back(note.clone());
        });
        Self {
            store,
            content: ContentArea::new(config),
            inbox,
            subscription: Some(subscription),
            clock: DeterministicClock::new(),
            events: VecDeque::new(),
            toasts: ToastQueue::new(config.toast_duration),
            poll: PollTimer::new(config.chat_poll_interval),
            outputs: WebOutputs::default(),
            counters: StepResult::default(),
            initialized: false,
            step_idx: 0,
        }
    }

    /// Restore the initial deep link and render the first view.
    ///
    /// Must be called exactly once before [`step`](Self::step).
    pub fn init(&mut self) -> Result<(), WebError> {
        if self.initialized {
            return Err(WebError::Unsupported("init called twice"));
        }
        self.initialized = true;
        let outcome = self.store.init_from_location();
        self.log(format!("init {:?}: {outcome:?}", self.store.location().hash()));
        self.drain_notifications();
        self.finish_outputs();
        Ok(())
    }

    pub fn push_event(&mut self, event: HostEvent) {
        self.events.push_back(event);
    }

    /// Decode and queue a JSON host event. Returns `false` if it was malformed.
    pub fn push_encoded_event(&mut self, json: &str) -> bool {
        match HostEvent::from_json_str(json) {
            Ok(event) => {
                self.push_event(event);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "rejected host event");
                false
            }
        }
    }

    pub fn advance_time(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    pub fn set_time(&mut self, now: Duration) {
        self.clock.set(now);
    }

    /// Process queued events, fire a due chat poll, and expire toasts.
    pub fn step(&mut self) -> Result<StepResult, WebError> {
        if !self.initialized {
            return Err(WebError::Unsupported("step called before init"));
        }
        self.counters = StepResult::default();

        while let Some(event) = self.events.pop_front() {
            self.counters.events_processed += 1;
            self.handle_event(event);
            self.drain_notifications();
        }

        let now = self.clock.now();
        if self.poll.due(now) {
            if self.store.current_section().is_some_and(|s| s.is_chat()) {
                self.counters.polled = true;
                let ticket = self.store.ticket();
                self.emit_fetch(ticket, FetchKind::ChatMessages);
            } else {
                self.poll.disarm();
            }
        }
        self.toasts.expire(now);

        let view_changed = self.finish_outputs();
        self.step_idx += 1;
        Ok(StepResult {
            view_changed,
            step_idx: self.step_idx,
            ..self.counters
        })
    }

    /// Take the outputs accumulated since the last call.
    ///
    /// `view` and `toasts` describe the current screen and are kept.
    pub fn take_outputs(&mut self) -> WebOutputs {
        let view = self.outputs.view.clone();
        let toasts = self.outputs.toasts.clone();
        let taken = std::mem::take(&mut self.outputs);
        self.outputs.view = view;
        self.outputs.toasts = toasts;
        taken
    }

    #[must_use]
    pub fn share_url(&self) -> String {
        self.store.share_url()
    }

    #[must_use]
    pub fn store(&self) -> &ViewStore<WebLocation> {
        &self.store
    }

    #[must_use]
    pub fn content(&self) -> &ContentArea {
        &self.content
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Stop receiving store notifications. Further steps only process events.
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.dispose();
        }
        self.poll.disarm();
    }

    fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::HashChanged { hash } => {
                self.store.location_mut().host_changed(hash.as_str());
                let outcome = self.store.sync_from_location();
                if outcome != SyncOutcome::Echo {
                    self.log(format!("hashchange {hash:?}: {outcome:?}"));
                }
            }
            HostEvent::Navigate { intent } => self.navigate(intent),
            HostEvent::Share => {
                let url = self.store.share_url();
                tracing::info!(%url, "share link copied");
                self.outputs.clipboard = Some(url);
                self.toasts
                    .push(ToastKind::Success, SHARE_COPIED, self.clock.now());
            }
            HostEvent::ClipboardFailed => {
                tracing::warn!("clipboard write failed");
                self.toasts.push(ToastKind::Error, COPY_FAILED, self.clock.now());
            }
            HostEvent::FetchResolved {
                ticket,
                kind,
                result,
            } => {
                let effects = self
                    .content
                    .accept_result(&self.store, &ticket, &kind, result);
                self.apply_effects(effects, &ticket);
            }
            HostEvent::Session { user } => self.content.set_session(user),
            HostEvent::SendChat { text } => {
                let effects = self.content.send_chat(&text, self.store.current_section());
                let ticket = self.store.ticket();
                self.apply_effects(effects, &ticket);
            }
            HostEvent::GameAction { action, item_id } => {
                let effects = self.content.game_action(action, item_id);
                let ticket = self.store.ticket();
                self.apply_effects(effects, &ticket);
            }
        }
    }

    fn navigate(&mut self, intent: NavIntent) {
        tracing::debug!(?intent, "navigate");
        let store = &mut self.store;
        let outcome = match intent.clone() {
            NavIntent::Nav { section } if section.is_chat() => store.show_chat(),
            NavIntent::Nav { section } | NavIntent::List { section } => store.show_list(section),
            NavIntent::Detail { section, item_id } => store.show_detail(section, &item_id),
            NavIntent::Chat => store.show_chat(),
            NavIntent::Special {
                section,
                view,
                item_id,
            } => store.show_special(section, view, item_id),
            NavIntent::CancelUpload { section } => {
                store.show_special(section, SpecialView::My, None)
            }
            NavIntent::Back => store.back_to_list(),
            NavIntent::Close => store.close(),
        };
        if outcome == Outcome::Ignored {
            tracing::debug!(?intent, "navigation ignored");
            self.counters.ignored_navigations += 1;
        }
    }

    fn drain_notifications(&mut self) {
        let mut delivered = 0;
        loop {
            let next = self.inbox.borrow_mut().pop_front();
            let Some(note) = next else {
                break;
            };
            if delivered == MAX_NOTIFICATIONS_PER_EVENT {
                tracing::error!(
                    generation = note.generation,
                    "too many follow-up navigations; dropping the rest"
                );
                self.inbox.borrow_mut().clear();
                break;
            }
            delivered += 1;
            self.counters.notifications += 1;
            let effects = self.content.render(&note.state, note.section);
            self.apply_effects(effects, &ViewTicket::from(&note));
        }
    }

    fn apply_effects(&mut self, effects: Vec<Effect>, ticket: &ViewTicket) {
        let now = self.clock.now();
        for effect in effects {
            match effect {
                Effect::Fetch(kind) => self.emit_fetch(ticket.clone(), kind),
                Effect::Toast(kind, text) => {
                    self.toasts.push(kind, text, now);
                }
                Effect::Navigate(intent) => self.navigate(intent),
                Effect::ArmPoll => self.poll.arm(now),
                Effect::DisarmPoll => self.poll.disarm(),
            }
        }
    }

    fn emit_fetch(&mut self, ticket: ViewTicket, kind: FetchKind) {
        tracing::trace!(generation = ticket.generation, ?kind, "fetch requested");
        self.counters.fetches_issued += 1;
        self.outputs.fetches.push(FetchRequest { ticket, kind });
    }

    /// Sync view, toasts and hash writes into the outputs. Returns whether the
    /// view changed.
    fn finish_outputs(&mut self) -> bool {
        let writes = self.store.location_mut().take_writes();
        self.outputs.hash_writes.extend(writes);
        self.outputs.toasts = self.toasts.active().to_vec();
        let view = self.content.view();
        if &self.outputs.view == view {
            return false;
        }
        self.outputs.view = view.clone();
        true
    }

    fn log(&mut self, line: String) {
        tracing::debug!(%line, "runner");
        self.outputs.logs.push(line);
    }
}

impl core::fmt::Debug for StepNavigator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StepNavigator")
            .field("route", &self.store.current_route())
            .field("view", self.content.view())
            .field("now", &self.clock.now())
            .field("step_idx", &self.step_idx)
            .finish_non_exhaustive()
    }
}
