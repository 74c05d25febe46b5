#![forbid(unsafe_code)]

//! Synchronous fan-out of view-state notifications.
//!
//! The bus computes one [`Notification`] per change and hands every listener
//! a shared reference to that same snapshot, in registration order. A
//! listener that panics is logged and skipped; the rest still receive the
//! notification.
//!
//! Isolation relies on unwinding. On `wasm32-unknown-unknown` a panic
//! aborts the module, so there `catch_unwind` catches nothing and a
//! panicking listener ends the session.
//!
//! Listeners may dispose themselves (or each other) while a notification is
//! being delivered. A listener disposed before its turn is not called.

use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};

use plaza_core::{SectionId, ViewState};
use serde::{Deserialize, Serialize};

/// A unique identifier for a listener.
pub type SubId = u64;

/// Snapshot delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Increases by one on every notify.
    pub generation: u64,
    pub section: Option<SectionId>,
    pub state: ViewState,
}

/// Contract of the component that turns a view state into visible content.
///
/// Implemented for every `FnMut(&ViewState, Option<SectionId>)`.
pub trait RenderDispatcher {
    fn dispatch(&mut self, state: &ViewState, section: Option<SectionId>);
}

impl<F> RenderDispatcher for F
where
    F: FnMut(&ViewState, Option<SectionId>),
{
    fn dispatch(&mut self, state: &ViewState, section: Option<SectionId>) {
        self(state, section);
    }
}

type Listener = Box<dyn FnMut(&Notification)>;

struct Entry {
    id: SubId,
    alive: Rc<Cell<bool>>,
    listener: Rc<RefCell<Listener>>,
}

#[derive(Default)]
struct Registry {
    next_id: SubId,
    entries: Vec<Entry>,
}

/// Handle that removes a listener from its bus.
///
/// Dropping the handle does *not* unsubscribe; call [`Disposer::dispose`].
#[derive(Debug)]
pub struct Disposer {
    id: SubId,
    alive: Rc<Cell<bool>>,
    registry: Weak<RefCell<Registry>>,
}

impl Disposer {
    #[must_use]
    pub fn id(&self) -> SubId {
        self.id
    }

    /// Whether the listener is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.alive.get()
    }

    /// Unsubscribe. Safe to call during a notification.
    pub fn dispose(self) {
        self.alive.set(false);
        if let Some(registry) = self.registry.upgrade() {
            registry
                .borrow_mut()
                .entries
                .retain(|entry| entry.id != self.id);
        }
        tracing::debug!(sub_id = self.id, "listener disposed");
    }
}

/// Ordered set of listeners.
#[derive(Default)]
pub struct NotificationBus {
    registry: Rc<RefCell<Registry>>,
}

impl NotificationBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`. It is called on every subsequent notification.
    pub fn subscribe(&self, listener: impl FnMut(&Notification) + 'static) -> Disposer {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        let alive = Rc::new(Cell::new(true));
        registry.entries.push(Entry {
            id,
            alive: Rc::clone(&alive),
            listener: Rc::new(RefCell::new(Box::new(listener))),
        });
        tracing::debug!(sub_id = id, "listener subscribed");
        Disposer {
            id,
            alive,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Register a [`RenderDispatcher`].
    pub fn subscribe_dispatcher(&self, mut dispatcher: impl RenderDispatcher + 'static) -> Disposer {
        self.subscribe(move |note: &Notification| dispatcher.dispatch(&note.state, note.section))
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `note` to every listener. Returns how many panicked.
    pub fn notify(&self, note: &Notification) -> usize {
        // Snapshot the entry list so listeners can (un)subscribe while we iterate.
        let targets: Vec<(SubId, Rc<Cell<bool>>, Rc<RefCell<Listener>>)> = self
            .registry
            .borrow()
            .entries
            .iter()
            .map(|e| (e.id, Rc::clone(&e.alive), Rc::clone(&e.listener)))
            .collect();

        tracing::trace!(
            generation = note.generation,
            listeners = targets.len(),
            "notifying listeners"
        );

        let mut failures = 0;
        for (id, alive, listener) in targets {
            if !alive.get() {
                continue;
            }
            // A listener that re-enters notify() on itself is skipped rather than
            // double-borrowed.
            let Ok(mut listener) = listener.try_borrow_mut() else {
                tracing::warn!(sub_id = id, "listener re-entered; skipping");
                continue;
            };
            let result = catch_unwind(AssertUnwindSafe(|| (*listener)(note)));
            if let Err(payload) = result {
                failures += 1;
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_owned());
                tracing::error!(sub_id = id, %reason, "listener panicked; continuing delivery");
            }
        }
        failures
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("listeners", &self.len())
            .finish()
    }
}
