#![forbid(unsafe_code)]

//! Navigation scripts and their replay against a [`ViewStore`].
//!
//! A script is plain text with one command per line (see `--help` for the
//! command list). [`Replayer`] plays the browser: it owns the store over a
//! [`MemoryLocation`], reports every hash write back as a `hashchange` the
//! way a real page does, and turns each line into a [`Record`].
//!
//! # Invariants
//!
//! 1. Every hash write is echoed back to the store before the next command
//!    runs, so pending echoes never outlive the command that caused them.
//! 2. Records are emitted in script order, one per command line, preceded by
//!    a single `init` record with line number 0.

use core::fmt;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use plaza_core::{ItemId, SectionId, SpecialView, ViewState};
use plaza_runtime::{
    Disposer, HashLocation, MemoryLocation, Notification, Outcome, PlazaConfig, SyncOutcome,
    ViewStore,
};
use serde::Serialize;

/// The script replayed when none is given.
pub const TOUR: &str = "\
# Browse announcements, hop to chat, come back with the browser.
list announcement
detail announcement 5
chat
browser-back
list game
detail game 7
my game
share
back
browser-back
browser-forward
go #/game/detail/12
close
state
";

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ScriptError {
    /// The script could not be read.
    Io { path: String, source: io::Error },
    /// A script line is not a valid command.
    Parse { line: usize, message: String },
    /// A record could not be written to the output.
    Output(io::Error),
    /// A record could not be encoded.
    Encode(serde_json::Error),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read script {path}: {source}"),
            Self::Parse { line, message } => write!(f, "line {line}: {message}"),
            Self::Output(err) => write!(f, "cannot write output: {err}"),
            Self::Encode(err) => write!(f, "cannot encode record: {err}"),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Output(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Parse { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ScriptError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// One script command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List(SectionId),
    Detail(SectionId, String),
    Chat,
    Special(SectionId, SpecialView, Option<ItemId>),
    Back,
    Close,
    /// Address-bar edit.
    Go(String),
    BrowserBack,
    BrowserForward,
    Share,
    State,
}

/// A parsed command with its position in the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// 1-based line number.
    pub line: usize,
    /// The line as written, trimmed.
    pub source: String,
    pub command: Command,
}

/// Parse a whole script. Blank lines and lines starting with `#` are skipped.
pub fn parse_script(text: &str) -> Result<Vec<Step>, ScriptError> {
    let mut steps = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let source = raw.trim();
        if source.is_empty() || source.starts_with('#') {
            continue;
        }
        let command = parse_command(source).map_err(|message| ScriptError::Parse {
            line: idx + 1,
            message,
        })?;
        steps.push(Step {
            line: idx + 1,
            source: source.to_owned(),
            command,
        });
    }
    Ok(steps)
}

fn parse_command(source: &str) -> Result<Command, String> {
    let words: Vec<&str> = source.split_whitespace().collect();
    let (name, args) = match words.split_first() {
        Some((name, args)) => (*name, args),
        None => return Err("empty command".into()),
    };
    let command = match (name, args) {
        ("list", [section]) => Command::List(section_arg(section)?),
        ("detail", [section, id]) => Command::Detail(section_arg(section)?, (*id).to_owned()),
        ("chat", []) => Command::Chat,
        ("my" | "upload" | "edit", [section, rest @ ..]) if rest.len() <= 1 => {
            let view = match name {
                "my" => SpecialView::My,
                "upload" => SpecialView::Upload,
                _ => SpecialView::Edit,
            };
            let item_id = match rest.first() {
                Some(id) => Some(ItemId::new(*id).map_err(|err| err.to_string())?),
                None => None,
            };
            Command::Special(section_arg(section)?, view, item_id)
        }
        ("back", []) => Command::Back,
        ("close", []) => Command::Close,
        ("go", []) => Command::Go(String::new()),
        ("go", [hash]) => Command::Go((*hash).to_owned()),
        ("browser-back", []) => Command::BrowserBack,
        ("browser-forward", []) => Command::BrowserForward,
        ("share", []) => Command::Share,
        ("state", []) => Command::State,
        (
            "list" | "detail" | "chat" | "my" | "upload" | "edit" | "back" | "close" | "go"
            | "browser-back" | "browser-forward" | "share" | "state",
            _,
        ) => return Err(format!("wrong number of arguments for {name:?}")),
        _ => return Err(format!("unknown command {name:?}")),
    };
    Ok(command)
}

fn section_arg(name: &str) -> Result<SectionId, String> {
    name.parse().map_err(|err: plaza_core::ParseError| err.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Replay
// ─────────────────────────────────────────────────────────────────────────────

/// What one script line did, printed as a JSON line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub line: usize,
    pub command: String,
    /// `applied`, `unchanged`, `ignored`, `echo`, `rejected`, `noop`, or `info`.
    pub outcome: &'static str,
    /// Notifications delivered while the command ran.
    pub notifications: Vec<Notification>,
    pub section: Option<SectionId>,
    pub state: ViewState,
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remembered: Option<Vec<SectionId>>,
}

/// Drives a [`ViewStore`] the way a browser page would.
pub struct Replayer {
    store: ViewStore<MemoryLocation>,
    inbox: Rc<RefCell<Vec<Notification>>>,
    subscription: Option<Disposer>,
    reported_writes: usize,
}

impl Replayer {
    #[must_use]
    pub fn new(config: &PlazaConfig, origin: &str, path: &str, initial_hash: &str) -> Self {
        let location = MemoryLocation::new(origin, path).with_hash(initial_hash);
        let store = ViewStore::from_config(config, location);
        let inbox = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&inbox);
        let subscription = store.subscribe_stamped(move |note| sink.borrow_mut().push(note.clone()));
        Self {
            store,
            inbox,
            subscription: Some(subscription),
            reported_writes: 0,
        }
    }

    /// Apply the initial fragment, as on page load.
    pub fn init(&mut self) -> Record {
        let outcome = self.store.init_from_location();
        self.record(0, "init".to_owned(), sync_label(outcome))
    }

    /// Run one step and describe what happened.
    pub fn run(&mut self, step: &Step) -> Record {
        tracing::debug!(line = step.line, command = %step.source, "replaying");
        let store = &mut self.store;
        let outcome = match &step.command {
            Command::List(section) => outcome_label(store.show_list(*section)),
            Command::Detail(section, id) => outcome_label(store.show_detail(*section, id)),
            Command::Chat => outcome_label(store.show_chat()),
            Command::Special(section, view, id) => {
                outcome_label(store.show_special(*section, *view, id.clone()))
            }
            Command::Back => outcome_label(store.back_to_list()),
            Command::Close => outcome_label(store.close()),
            Command::Go(hash) => {
                store.location_mut().navigate_externally(hash.as_str());
                sync_label(store.sync_from_location())
            }
            Command::BrowserBack => {
                if store.location_mut().go_back().is_some() {
                    sync_label(store.sync_from_location())
                } else {
                    "noop"
                }
            }
            Command::BrowserForward => {
                if store.location_mut().go_forward().is_some() {
                    sync_label(store.sync_from_location())
                } else {
                    "noop"
                }
            }
            Command::Share | Command::State => "info",
        };
        self.deliver_echo();

        let mut record = self.record(step.line, step.source.clone(), outcome);
        match step.command {
            Command::Share => record.url = Some(self.store.share_url()),
            Command::State => record.remembered = Some(self.store.sections_remembered()),
            _ => {}
        }
        record
    }

    #[must_use]
    pub fn store(&self) -> &ViewStore<MemoryLocation> {
        &self.store
    }

    /// Stop collecting notifications.
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.dispose();
        }
    }

    /// Report new hash writes back to the store, as the page's `hashchange`
    /// handler does.
    fn deliver_echo(&mut self) {
        let writes = self.store.location().writes();
        if writes > self.reported_writes {
            self.reported_writes = writes;
            let echo = self.store.sync_from_location();
            if echo != SyncOutcome::Echo {
                tracing::warn!(?echo, hash = %self.store.location().hash(), "hash write was not recognised as an echo");
            }
        }
    }

    fn record(&mut self, line: usize, command: String, outcome: &'static str) -> Record {
        Record {
            line,
            command,
            outcome,
            notifications: self.inbox.borrow_mut().drain(..).collect(),
            section: self.store.current_section(),
            state: self.store.current_state(),
            hash: self.store.location().hash().to_owned(),
            url: None,
            remembered: None,
        }
    }
}

impl fmt::Debug for Replayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replayer")
            .field("store", &self.store)
            .field("pending", &self.inbox.borrow().len())
            .field("reported_writes", &self.reported_writes)
            .finish()
    }
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Ignored => "ignored",
        Outcome::Applied { changed: true } => "applied",
        Outcome::Applied { changed: false } => "unchanged",
    }
}

fn sync_label(outcome: SyncOutcome) -> &'static str {
    match outcome {
        SyncOutcome::Applied { changed: true } => "applied",
        SyncOutcome::Applied { changed: false } => "unchanged",
        SyncOutcome::Echo => "echo",
        SyncOutcome::Rejected => "rejected",
    }
}

/// Replay `steps` and write one JSON record per line to `out`, starting with
/// the `init` record. Returns the number of records written.
pub fn replay(
    replayer: &mut Replayer,
    steps: &[Step],
    out: &mut impl Write,
) -> Result<usize, ScriptError> {
    let mut written = 0;
    let init = replayer.init();
    write_record(out, &init)?;
    written += 1;
    for step in steps {
        let record = replayer.run(step);
        write_record(out, &record)?;
        written += 1;
    }
    out.flush().map_err(ScriptError::Output)?;
    tracing::info!(records = written, "replay finished");
    Ok(written)
}

fn write_record(out: &mut impl Write, record: &Record) -> Result<(), ScriptError> {
    serde_json::to_writer(&mut *out, record)?;
    out.write_all(b"\n").map_err(ScriptError::Output)
}
