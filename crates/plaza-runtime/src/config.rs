#![forbid(unsafe_code)]

//! Runtime configuration.
//!
//! [`PlazaConfig::default`] matches the production page. Hosts override
//! fields with the `with_*` builders; native binaries can additionally apply
//! `PLAZA_*` environment variables via [`PlazaConfig::from_env`].
//!
//! | variable               | field                | format                     |
//! |------------------------|----------------------|----------------------------|
//! | `PLAZA_SECTIONS`       | `sections`           | `announcement,game,chat`   |
//! | `PLAZA_CHAT_POLL_MS`   | `chat_poll_interval` | milliseconds, > 0          |
//! | `PLAZA_TOAST_MS`       | `toast_duration`     | milliseconds               |
//! | `PLAZA_UTC_OFFSET_MIN` | `utc_offset_minutes` | signed minutes             |

use core::fmt;
use std::env;
use std::time::Duration;

use plaza_core::SectionRegistry;

/// Default chat poll interval.
pub const DEFAULT_CHAT_POLL: Duration = Duration::from_millis(3_000);
/// Default time a toast stays visible.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(2_000);
/// Default bound on remembered hash writes awaiting their echo.
pub const DEFAULT_MAX_PENDING_ECHOES: usize = 8;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { key, value } => write!(f, "invalid value for {key}: {value:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration shared by the store, the web runner, and the demo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlazaConfig {
    /// Sections the page enables.
    pub sections: SectionRegistry,
    /// How often the chat board refreshes while visible.
    pub chat_poll_interval: Duration,
    /// How long a toast stays visible.
    pub toast_duration: Duration,
    /// Offset applied when rendering chat timestamps.
    pub utc_offset_minutes: i32,
    /// Bound on hash writes remembered for echo suppression.
    pub max_pending_echoes: usize,
}

impl Default for PlazaConfig {
    fn default() -> Self {
        Self {
            sections: SectionRegistry::all(),
            chat_poll_interval: DEFAULT_CHAT_POLL,
            toast_duration: DEFAULT_TOAST_DURATION,
            utc_offset_minutes: 0,
            max_pending_echoes: DEFAULT_MAX_PENDING_ECHOES,
        }
    }
}

impl PlazaConfig {
    #[must_use]
    pub fn with_sections(mut self, sections: SectionRegistry) -> Self {
        self.sections = sections;
        self
    }

    #[must_use]
    pub fn with_chat_poll_interval(mut self, interval: Duration) -> Self {
        self.chat_poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_toast_duration(mut self, duration: Duration) -> Self {
        self.toast_duration = duration;
        self
    }

    #[must_use]
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_max_pending_echoes(mut self, max: usize) -> Self {
        self.max_pending_echoes = max;
        self
    }

    /// Defaults overlaid with `PLAZA_*` environment variables.
    ///
    /// Invalid values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for (key, value) in PLAZA_ENV_KEYS
            .iter()
            .filter_map(|key| env::var(key).ok().map(|v| (*key, v)))
        {
            if let Err(err) = config.apply_var(key, &value) {
                tracing::warn!(error = %err, "ignoring environment override");
            }
        }
        config
    }

    /// Apply a single `PLAZA_*` variable.
    pub fn apply_var(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "PLAZA_SECTIONS" => {
                let sections = SectionRegistry::from_names(value);
                if sections.is_empty() {
                    return Err(invalid("PLAZA_SECTIONS", value));
                }
                self.sections = sections;
            }
            "PLAZA_CHAT_POLL_MS" => {
                let ms: u64 = value
                    .trim()
                    .parse()
                    .ok()
                    .filter(|ms| *ms > 0)
                    .ok_or_else(|| invalid("PLAZA_CHAT_POLL_MS", value))?;
                self.chat_poll_interval = Duration::from_millis(ms);
            }
            "PLAZA_TOAST_MS" => {
                let ms: u64 = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid("PLAZA_TOAST_MS", value))?;
                self.toast_duration = Duration::from_millis(ms);
            }
            "PLAZA_UTC_OFFSET_MIN" => {
                self.utc_offset_minutes = value
                    .trim()
                    .parse()
                    .ok()
                    .filter(|m: &i32| m.abs() <= 14 * 60)
                    .ok_or_else(|| invalid("PLAZA_UTC_OFFSET_MIN", value))?;
            }
            _ => tracing::debug!(key, "unrecognized config key"),
        }
        Ok(())
    }
}

const PLAZA_ENV_KEYS: &[&str] = &[
    "PLAZA_SECTIONS",
    "PLAZA_CHAT_POLL_MS",
    "PLAZA_TOAST_MS",
    "PLAZA_UTC_OFFSET_MIN",
];

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_owned(),
    }
}
