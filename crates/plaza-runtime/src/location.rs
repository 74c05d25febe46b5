#![forbid(unsafe_code)]

//! The page location the view store reads and writes.
//!
//! The store never touches a browser API directly; it goes through
//! [`HashLocation`]. [`MemoryLocation`] keeps an in-memory history with
//! back/forward support and is what tests and the demo use. The host-driven
//! browser implementation lives in `plaza-web`.

/// Access to the page URL that the store needs.
pub trait HashLocation {
    /// Current fragment including the leading `#`, or `""` if none.
    fn hash(&self) -> &str;

    /// Replace the fragment, creating a new history entry.
    fn set_hash(&mut self, hash: &str);

    /// Scheme + host + port, e.g. `https://plaza.example`.
    fn origin(&self) -> &str;

    /// Path component, e.g. `/index.html`.
    fn path(&self) -> &str;

    /// Absolute URL of the current page including the fragment.
    fn href(&self) -> String {
        format!("{}{}{}", self.origin(), self.path(), self.hash())
    }
}

/// In-memory location with a linear history stack.
///
/// Writes truncate any forward entries, like a browser does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryLocation {
    origin: String,
    path: String,
    history: Vec<String>,
    index: usize,
    writes: usize,
}

impl MemoryLocation {
    /// Location at `origin` + `path` with an empty fragment.
    #[must_use]
    pub fn new(origin: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            path: path.into(),
            history: vec![String::new()],
            index: 0,
            writes: 0,
        }
    }

    /// Start at a deep link.
    #[must_use]
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.history[self.index] = hash.into();
        self
    }

    /// Number of times [`HashLocation::set_hash`] created an entry.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }

    /// Every fragment in history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Step back one entry. Returns the new fragment, or `None` at the start.
    pub fn go_back(&mut self) -> Option<&str> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.history[self.index].as_str())
    }

    /// Step forward one entry. Returns the new fragment, or `None` at the end.
    pub fn go_forward(&mut self) -> Option<&str> {
        if self.index + 1 >= self.history.len() {
            return None;
        }
        self.index += 1;
        Some(self.history[self.index].as_str())
    }

    /// Simulate the user editing the address bar.
    pub fn navigate_externally(&mut self, hash: impl Into<String>) {
        self.push(hash.into());
    }

    fn push(&mut self, hash: String) {
        self.history.truncate(self.index + 1);
        self.history.push(hash);
        self.index = self.history.len() - 1;
    }
}

impl Default for MemoryLocation {
    fn default() -> Self {
        Self::new("http://localhost", "/")
    }
}

impl HashLocation for MemoryLocation {
    fn hash(&self) -> &str {
        &self.history[self.index]
    }

    fn set_hash(&mut self, hash: &str) {
        self.writes += 1;
        self.push(hash.to_owned());
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn path(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn href_concatenates_parts() {
        let mut loc = MemoryLocation::new("https://plaza.example", "/index.html");
        assert_eq!(loc.href(), "https://plaza.example/index.html");
        loc.set_hash("#/game/list");
        assert_eq!(loc.href(), "https://plaza.example/index.html#/game/list");
    }

    #[test]
    fn back_and_forward_walk_history() {
        let mut loc = MemoryLocation::default();
        loc.set_hash("#/a");
        loc.set_hash("#/b");
        assert_eq!(loc.go_back(), Some("#/a"));
        assert_eq!(loc.go_back(), Some(""));
        assert_eq!(loc.go_back(), None);
        assert_eq!(loc.go_forward(), Some("#/a"));
        assert_eq!(loc.hash(), "#/a");
    }

    #[test]
    fn write_after_back_truncates_forward_entries() {
        let mut loc = MemoryLocation::default();
        loc.set_hash("#/a");
        loc.set_hash("#/b");
        loc.go_back();
        loc.set_hash("#/c");
        assert_eq!(loc.history(), &["", "#/a", "#/c"]);
        assert_eq!(loc.go_forward(), None);
        assert_eq!(loc.writes(), 3);
    }

    #[test]
    fn deep_link_is_not_a_write() {
        let loc = MemoryLocation::default().with_hash("#/chat");
        assert_eq!(loc.hash(), "#/chat");
        assert_eq!(loc.writes(), 0);
    }
}
