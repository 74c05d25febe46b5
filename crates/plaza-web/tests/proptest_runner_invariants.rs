//! Property-based invariant tests for the step runner.
//!
//! 1. A fetch result whose ticket is stale never changes the content view.
//! 2. The last fetch emitted in a step carries a ticket that is current at
//!    the end of that step.
//! 3. The shared URL always ends with the location's current hash.
//! 4. Arbitrary host input never panics the runner.

#![cfg(not(target_arch = "wasm32"))]

use plaza_core::{SectionId, SpecialView};
use plaza_runtime::{HashLocation, PlazaConfig};
use plaza_web::content::{ContentItem, UserProfile};
use plaza_web::protocol::{FetchResult, HostEvent, NavIntent};
use plaza_web::step_program::StepNavigator;
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

fn arb_section() -> impl Strategy<Value = SectionId> {
    prop_oneof![
        Just(SectionId::Announcement),
        Just(SectionId::Game),
        Just(SectionId::Chat),
    ]
}

fn arb_intent() -> impl Strategy<Value = NavIntent> {
    prop_oneof![
        arb_section().prop_map(|section| NavIntent::Nav { section }),
        arb_section().prop_map(|section| NavIntent::List { section }),
        (arb_section(), "[a-z0-9]{0,3}")
            .prop_map(|(section, item_id)| NavIntent::Detail { section, item_id }),
        Just(NavIntent::Chat),
        arb_section().prop_map(|section| NavIntent::Special {
            section,
            view: SpecialView::My,
            item_id: None,
        }),
        arb_section().prop_map(|section| NavIntent::CancelUpload { section }),
        Just(NavIntent::Back),
        Just(NavIntent::Close),
    ]
}

fn navigator(logged_in: bool) -> StepNavigator {
    let mut nav = StepNavigator::new(&PlazaConfig::default(), "http://localhost", "/", "");
    nav.init().unwrap();
    if logged_in {
        nav.push_event(HostEvent::Session {
            user: Some(UserProfile {
                username: "ann".to_owned(),
                id: None,
            }),
        });
    }
    nav
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Stale results are inert
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn stale_results_never_change_view(
        logged_in in any::<bool>(),
        first in arb_intent(),
        rest in proptest::collection::vec(arb_intent(), 1..6),
    ) {
        let mut nav = navigator(logged_in);
        nav.push_event(HostEvent::Navigate { intent: first });
        nav.step().unwrap();
        let fetches = nav.take_outputs().fetches;

        for intent in rest {
            nav.push_event(HostEvent::Navigate { intent });
        }
        nav.step().unwrap();
        nav.take_outputs();

        for fetch in fetches {
            if nav.store().is_current(&fetch.ticket) {
                continue;
            }
            let before = nav.content().view().clone();
            nav.push_event(HostEvent::FetchResolved {
                ticket: fetch.ticket,
                kind: fetch.kind,
                result: FetchResult::Items { items: vec![ContentItem::new("x", "late")] },
            });
            let result = nav.step().unwrap();
            prop_assert!(!result.view_changed);
            prop_assert_eq!(nav.content().view(), &before);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2-3. Tickets and share URL
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn last_fetch_ticket_is_current(intents in proptest::collection::vec(arb_intent(), 1..8)) {
        let mut nav = navigator(true);
        for intent in intents {
            nav.push_event(HostEvent::Navigate { intent });
            nav.step().unwrap();
            let outputs = nav.take_outputs();
            if let Some(last) = outputs.fetches.last() {
                prop_assert!(nav.store().is_current(&last.ticket));
            }
            prop_assert!(nav.share_url().ends_with(nav.store().location().hash()));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. No panics
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn arbitrary_json_never_panics(inputs in proptest::collection::vec(any::<String>(), 0..8)) {
        let mut nav = navigator(false);
        for input in &inputs {
            let _ = nav.push_encoded_event(input);
        }
        nav.step().unwrap();
    }

    #[test]
    fn arbitrary_hashes_never_panic(hashes in proptest::collection::vec("#?(/[a-z0-9%]{0,8}){0,4}", 0..8)) {
        let mut nav = navigator(false);
        for hash in hashes {
            nav.push_event(HostEvent::HashChanged { hash });
        }
        nav.step().unwrap();
    }
}
