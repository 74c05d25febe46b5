//! Property-based invariant tests for the view store.
//!
//! 1. At most one section is current, and it always has a stored entry.
//! 2. The location hash always encodes the current route after an internal
//!    navigation.
//! 3. `close` twice equals `close` once.
//! 4. Repeating any navigation never adds a history entry.
//! 5. Replaying the written hash into a fresh store reproduces the current
//!    route.
//! 6. Every stored state is already normalized.

use plaza_core::{ItemId, Route, SectionId, SectionRegistry, SpecialView, ViewState};
use plaza_runtime::{HashLocation, MemoryLocation, ViewStore};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    List(SectionId),
    Detail(SectionId, String),
    Chat,
    Special(SectionId, SpecialView, Option<String>),
    Back,
    Close,
}

fn arb_section() -> impl Strategy<Value = SectionId> {
    prop_oneof![
        Just(SectionId::Announcement),
        Just(SectionId::Game),
        Just(SectionId::Chat),
    ]
}

fn arb_special() -> impl Strategy<Value = SpecialView> {
    prop_oneof![
        Just(SpecialView::My),
        Just(SpecialView::Upload),
        Just(SpecialView::Edit),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        arb_section().prop_map(Op::List),
        (arb_section(), "[a-z0-9/%# ]{0,6}").prop_map(|(s, id)| Op::Detail(s, id)),
        Just(Op::Chat),
        (arb_section(), arb_special(), proptest::option::of("[a-z0-9]{1,4}"))
            .prop_map(|(s, v, id)| Op::Special(s, v, id)),
        Just(Op::Back),
        Just(Op::Close),
    ]
}

fn run(store: &mut ViewStore, op: &Op) {
    match op {
        Op::List(s) => {
            store.show_list(*s);
        }
        Op::Detail(s, id) => {
            store.show_detail(*s, id);
        }
        Op::Chat => {
            store.show_chat();
        }
        Op::Special(s, v, id) => {
            let id = id.as_deref().and_then(|id| ItemId::new(id).ok());
            store.show_special(*s, *v, id);
        }
        Op::Back => {
            store.back_to_list();
        }
        Op::Close => {
            store.close();
        }
    }
}

fn fresh() -> ViewStore {
    ViewStore::new(SectionRegistry::all(), MemoryLocation::default())
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Single current section, hash tracks route
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn current_section_is_consistent(ops in proptest::collection::vec(arb_op(), 0..24)) {
        let mut store = fresh();
        for op in &ops {
            run(&mut store, op);
            match store.current_section() {
                Some(section) => {
                    prop_assert!(store.remembered(section).is_some());
                    prop_assert!(!store.current_state().is_empty());
                }
                None => prop_assert_eq!(store.current_state(), ViewState::empty()),
            }
            if store.location().writes() > 0 {
                prop_assert_eq!(store.location().hash(), store.current_route().to_hash());
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Idempotent close
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn close_is_idempotent(ops in proptest::collection::vec(arb_op(), 0..12)) {
        let mut store = fresh();
        for op in &ops {
            run(&mut store, op);
        }
        store.close();
        let remembered = store.sections_remembered();
        let writes = store.location().writes();
        store.close();
        prop_assert_eq!(store.current_state(), ViewState::empty());
        prop_assert_eq!(store.sections_remembered(), remembered);
        prop_assert_eq!(store.location().writes(), writes);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. No duplicate history entries
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn repeated_op_adds_no_history(
        prefix in proptest::collection::vec(arb_op(), 0..8),
        op in arb_op(),
    ) {
        let mut store = fresh();
        for p in &prefix {
            run(&mut store, p);
        }
        run(&mut store, &op);
        let writes = store.location().writes();
        let generation = store.generation();
        run(&mut store, &op);
        prop_assert_eq!(store.location().writes(), writes);
        // `back_to_list` with nothing current does not notify at all.
        prop_assert!(store.generation() <= generation + 1);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Written hash reproduces the route
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn written_hash_restores_route(ops in proptest::collection::vec(arb_op(), 1..16)) {
        let mut store = fresh();
        for op in &ops {
            run(&mut store, op);
        }
        let hash = store.location().hash().to_owned();
        let mut restored = ViewStore::new(
            SectionRegistry::all(),
            MemoryLocation::default().with_hash(hash),
        );
        restored.init_from_location();
        let expected = if store.location().writes() == 0 {
            Route::Empty
        } else {
            store.current_route()
        };
        prop_assert_eq!(restored.current_route(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Stored states are normalized
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn stored_states_are_normalized(ops in proptest::collection::vec(arb_op(), 0..24)) {
        let mut store = fresh();
        for op in &ops {
            run(&mut store, op);
        }
        for section in store.sections_remembered() {
            let state = store.remembered(section).cloned().unwrap_or_default();
            let renormalized =
                ViewState::normalized(section, state.view, state.item_id.clone());
            prop_assert_eq!(renormalized, Some(state));
        }
    }
}
