#![forbid(unsafe_code)]

use plaza_runtime::PlazaConfig;
use wasm_bindgen::prelude::*;

use crate::runner_core::RunnerCore;

/// Browser-facing Plaza navigator.
///
/// The page creates one instance on load, forwards `hashchange`, clicks,
/// login changes and fetch answers as JSON events, and applies the JSON
/// report returned by `step()`.
#[wasm_bindgen]
pub struct PlazaWeb {
    core: RunnerCore,
}

#[wasm_bindgen]
impl PlazaWeb {
    #[wasm_bindgen(constructor)]
    pub fn new(origin: &str, path: &str, initial_hash: &str) -> Self {
        Self {
            core: RunnerCore::new(&PlazaConfig::default(), origin, path, initial_hash),
        }
    }

    /// Queue a JSON host event. Returns `false` if it was malformed.
    #[wasm_bindgen(js_name = pushEvent)]
    pub fn push_event(&mut self, json: &str) -> bool {
        self.core.push_encoded_event(json)
    }

    /// Advance the deterministic clock by `dt_ms` milliseconds.
    #[wasm_bindgen(js_name = advanceTime)]
    pub fn advance_time(&mut self, dt_ms: f64) {
        self.core.advance_time_ms(dt_ms);
    }

    /// Process queued events; returns the step report as JSON.
    pub fn step(&mut self) -> String {
        self.core.step_json()
    }

    #[wasm_bindgen(js_name = shareUrl)]
    pub fn share_url(&self) -> String {
        self.core.share_url()
    }
}
