#![forbid(unsafe_code)]

//! Chat board view model.
//!
//! Holds the last message batch fetched from the server and the rendered
//! lines derived from it. A poll result only re-renders when the message
//! count changed, so an idle board costs nothing per poll.
//!
//! # Invariants
//!
//! 1. A user keeps the colour assigned at first sight for the page session.
//! 2. Colours are assigned in first-seen order, cycling through
//!    `1..=CHAT_COLORS`.
//! 3. A message without a username renders as [`ANONYMOUS`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Number of distinct user colours.
pub const CHAT_COLORS: u8 = 6;
/// Display name for messages without a username.
pub const ANONYMOUS: &str = "anonymous";

/// Server timestamp: unix milliseconds or an ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatTimestamp {
    UnixMillis(i64),
    Iso(String),
}

/// One message as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Older servers send `user` instead of `username`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub text: String,
    pub timestamp: ChatTimestamp,
}

impl ChatMessage {
    /// Display name with the `user` and anonymous fallbacks applied.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.user.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS)
    }
}

/// A rendered chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    /// `HH:MM`, or `--:--` when the timestamp is unreadable.
    pub time: String,
    pub username: String,
    /// Colour slot in `1..=CHAT_COLORS`.
    pub color: u8,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ChatBoard {
    offset: UtcOffset,
    messages: Vec<ChatMessage>,
    lines: Vec<ChatLine>,
    colors: HashMap<String, u8>,
    next_color: u8,
}

impl ChatBoard {
    /// Board rendering times at `utc_offset_minutes` from UTC.
    #[must_use]
    pub fn new(utc_offset_minutes: i32) -> Self {
        let offset = UtcOffset::from_whole_seconds(utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|err| {
                tracing::warn!(utc_offset_minutes, error = %err, "invalid offset; using UTC");
                UtcOffset::UTC
            });
        Self {
            offset,
            messages: Vec::new(),
            lines: Vec::new(),
            colors: HashMap::new(),
            next_color: 1,
        }
    }

    /// Take a fetched batch. Returns `true` if the lines were rebuilt.
    pub fn replace(&mut self, messages: Vec<ChatMessage>) -> bool {
        if messages.len() == self.messages.len() {
            return false;
        }
        tracing::debug!(
            before = self.messages.len(),
            after = messages.len(),
            "chat messages changed"
        );
        let mut lines = Vec::with_capacity(messages.len());
        for msg in &messages {
            let username = msg.display_name().to_owned();
            let color = self.color_for(&username);
            lines.push(ChatLine {
                time: format_time(&msg.timestamp, self.offset),
                username,
                color,
                text: msg.text.clone(),
            });
        }
        self.messages = messages;
        self.lines = lines;
        true
    }

    #[must_use]
    pub fn lines(&self) -> &[ChatLine] {
        &self.lines
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    fn color_for(&mut self, username: &str) -> u8 {
        if let Some(color) = self.colors.get(username) {
            return *color;
        }
        let color = self.next_color;
        self.colors.insert(username.to_owned(), color);
        self.next_color = color % CHAT_COLORS + 1;
        color
    }
}

/// Render `ts` as `HH:MM` in `offset`.
#[must_use]
pub fn format_time(ts: &ChatTimestamp, offset: UtcOffset) -> String {
    match parse_timestamp(ts) {
        Some(at) => {
            let local = at.to_offset(offset);
            format!("{:02}:{:02}", local.hour(), local.minute())
        }
        None => {
            tracing::debug!(timestamp = ?ts, "unreadable chat timestamp");
            "--:--".to_owned()
        }
    }
}

fn parse_timestamp(ts: &ChatTimestamp) -> Option<OffsetDateTime> {
    match ts {
        ChatTimestamp::UnixMillis(ms) => {
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(*ms) * 1_000_000).ok()
        }
        // Timestamps without a zone are taken as UTC.
        ChatTimestamp::Iso(text) => OffsetDateTime::parse(text, &Rfc3339).ok().or_else(|| {
            PrimitiveDateTime::parse(text, &Iso8601::DEFAULT)
                .ok()
                .map(PrimitiveDateTime::assume_utc)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn msg(user: Option<&str>, text: &str, ms: i64) -> ChatMessage {
        ChatMessage {
            username: user.map(str::to_owned),
            user: None,
            text: text.to_owned(),
            timestamp: ChatTimestamp::UnixMillis(ms),
        }
    }

    #[test]
    fn replace_only_rebuilds_on_count_change() {
        let mut board = ChatBoard::new(0);
        assert!(board.replace(vec![msg(Some("ann"), "hi", 0)]));
        assert!(!board.replace(vec![msg(Some("bob"), "edited", 0)]));
        assert_eq!(board.lines()[0].username, "ann");
        assert!(board.replace(Vec::new()));
        assert!(board.lines().is_empty());
    }

    #[test]
    fn replace_rebuilds_every_line_from_the_new_batch() {
        let mut board = ChatBoard::new(0);
        board.replace(vec![msg(Some("ann"), "one", 0), msg(None, "two", 60_000)]);
        assert!(board.replace(vec![
            msg(Some("ann"), "one", 0),
            msg(None, "two", 60_000),
            msg(Some("bob"), "three", 120_000),
        ]));
        let lines: Vec<(&str, &str, &str, u8)> = board
            .lines()
            .iter()
            .map(|l| (l.time.as_str(), l.username.as_str(), l.text.as_str(), l.color))
            .collect();
        assert_eq!(
            lines,
            vec![
                ("00:00", "ann", "one", 1),
                ("00:01", ANONYMOUS, "two", 2),
                ("00:02", "bob", "three", 3),
            ]
        );
        // Same count again: nothing to rebuild.
        assert!(!board.replace(vec![
            msg(Some("x"), "a", 0),
            msg(Some("y"), "b", 0),
            msg(Some("z"), "c", 0),
        ]));
        assert_eq!(board.lines()[2].username, "bob");
    }

    #[test]
    fn colours_cycle_in_first_seen_order() {
        let mut board = ChatBoard::new(0);
        let users = ["a", "b", "c", "d", "e", "f", "g", "a"];
        let batch = users.iter().map(|u| msg(Some(u), "x", 0)).collect();
        board.replace(batch);
        let colors: Vec<u8> = board.lines().iter().map(|l| l.color).collect();
        assert_eq!(colors, vec![1, 2, 3, 4, 5, 6, 1, 1]);
    }

    #[test]
    fn colour_survives_later_batches() {
        let mut board = ChatBoard::new(0);
        board.replace(vec![msg(Some("zed"), "1", 0)]);
        board.replace(vec![msg(Some("amy"), "1", 0), msg(Some("zed"), "2", 0)]);
        assert_eq!(board.lines()[0].color, 2);
        assert_eq!(board.lines()[1].color, 1);
    }

    #[test]
    fn missing_username_falls_back() {
        let legacy = ChatMessage {
            username: None,
            user: Some("old".to_owned()),
            text: String::new(),
            timestamp: ChatTimestamp::UnixMillis(0),
        };
        assert_eq!(legacy.display_name(), "old");
        assert_eq!(msg(None, "", 0).display_name(), ANONYMOUS);
        assert_eq!(msg(Some(""), "", 0).display_name(), ANONYMOUS);
    }

    #[test]
    fn time_applies_offset() {
        // 1970-01-01T09:05:00Z
        let ts = ChatTimestamp::UnixMillis((9 * 60 + 5) * 60 * 1000);
        assert_eq!(format_time(&ts, UtcOffset::UTC), "09:05");
        let plus8 = UtcOffset::from_whole_seconds(8 * 3600).unwrap();
        assert_eq!(format_time(&ts, plus8), "17:05");
    }

    #[test]
    fn iso_timestamps_parse() {
        let zoned = ChatTimestamp::Iso("2024-05-01T23:59:30Z".to_owned());
        assert_eq!(format_time(&zoned, UtcOffset::UTC), "23:59");
        let naive = ChatTimestamp::Iso("2024-05-01T08:07:00".to_owned());
        assert_eq!(format_time(&naive, UtcOffset::UTC), "08:07");
    }

    #[test]
    fn unreadable_timestamp_renders_placeholder() {
        let ts = ChatTimestamp::Iso("yesterday".to_owned());
        assert_eq!(format_time(&ts, UtcOffset::UTC), "--:--");
    }

    #[test]
    fn message_deserializes_from_server_shape() {
        let json = r#"{"username":"ann","text":"hello","timestamp":"2024-05-01T10:00:00"}"#;
        let parsed: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.display_name(), "ann");
        assert_eq!(
            parsed.timestamp,
            ChatTimestamp::Iso("2024-05-01T10:00:00".to_owned())
        );
    }
}
