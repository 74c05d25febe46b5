#![forbid(unsafe_code)]

//! Platform-independent runner core wrapping [`StepNavigator`].
//!
//! This module contains the logic shared between the `wasm-bindgen` exports
//! and native tests. Everything crosses the boundary as JSON strings; no
//! JS/WASM types here.

use core::time::Duration;

use plaza_runtime::PlazaConfig;
use serde::Serialize;

use crate::WebOutputs;
use crate::step_program::{StepNavigator, StepResult};

/// What one [`RunnerCore::step_json`] call reports to the host.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub result: StepResult,
    pub outputs: WebOutputs,
}

/// JSON-in / JSON-out wrapper the host talks to.
#[derive(Debug)]
pub struct RunnerCore {
    inner: StepNavigator,
}

impl RunnerCore {
    /// Create and initialize a runner for the page the host loaded.
    pub fn new(config: &PlazaConfig, origin: &str, path: &str, initial_hash: &str) -> Self {
        let mut inner = StepNavigator::new(config, origin, path, initial_hash);
        if let Err(err) = inner.init() {
            tracing::error!(error = %err, "runner init failed");
        }
        Self { inner }
    }

    /// Parse a JSON-encoded host event and queue it.
    ///
    /// Returns `true` if the event was accepted, `false` if it was malformed.
    pub fn push_encoded_event(&mut self, json: &str) -> bool {
        self.inner.push_encoded_event(json)
    }

    /// Advance the deterministic clock by `dt_ms` milliseconds.
    pub fn advance_time_ms(&mut self, dt_ms: f64) {
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return;
        }
        self.inner.advance_time(Duration::from_secs_f64(dt_ms / 1000.0));
    }

    /// Process queued events and return the step report.
    pub fn step(&mut self) -> StepReport {
        let result = match self.inner.step() {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = %err, "step failed");
                StepResult::default()
            }
        };
        StepReport {
            result,
            outputs: self.inner.take_outputs(),
        }
    }

    /// [`Self::step`], encoded as JSON.
    pub fn step_json(&mut self) -> String {
        let report = self.step();
        serde_json::to_string(&report).unwrap_or_else(|err| {
            tracing::error!(error = %err, "encoding step report failed");
            "{}".to_owned()
        })
    }

    #[must_use]
    pub fn share_url(&self) -> String {
        self.inner.share_url()
    }

    #[must_use]
    pub fn navigator(&self) -> &StepNavigator {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn step_json_reports_first_view() {
        let mut core = RunnerCore::new(&PlazaConfig::default(), "http://localhost", "/", "#/chat");
        let report: serde_json::Value = serde_json::from_str(&core.step_json()).unwrap();
        assert_eq!(report["outputs"]["view"]["kind"], "chat");
        assert_eq!(report["outputs"]["fetches"][0]["kind"]["op"], "chat_messages");
        assert_eq!(report["result"]["step_idx"], 1);
    }

    #[test]
    fn negative_or_nan_time_is_ignored() {
        let mut core = RunnerCore::new(&PlazaConfig::default(), "http://localhost", "/", "");
        core.advance_time_ms(-5.0);
        core.advance_time_ms(f64::NAN);
        assert_eq!(core.navigator().now(), Duration::ZERO);
        core.advance_time_ms(16.0);
        assert_eq!(core.navigator().now(), Duration::from_millis(16));
    }
}
