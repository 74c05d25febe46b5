#![forbid(unsafe_code)]

//! Command-line argument parsing for the replay demo.
//!
//! Parses args manually to keep the binary lean. Supports environment
//! variable overrides via the `PLAZA_DEMO_*` prefix.

use std::env;
use std::process;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
Plaza navigation replay

USAGE:
    plaza-demo [OPTIONS]

Replays a navigation script against the view store and prints one JSON
object per script line on stdout. Logs go to stderr (filter with RUST_LOG).

OPTIONS:
    --script=PATH    Script file to replay, '-' for stdin (default: built-in tour)
    --hash=HASH      Initial URL fragment, e.g. '#/game/detail/7' (default: empty)
    --origin=URL     Page origin (default: http://localhost:8080)
    --path=PATH      Page path (default: /)
    --help, -h       Show this help message
    --version, -V    Show version

SCRIPT COMMANDS (one per line, '#' starts a comment):
    list SECTION              Show the section's list
    detail SECTION ID         Show one item
    chat                      Open the chat board
    my SECTION [ID]           Personal items view
    upload SECTION [ID]       Upload form
    edit SECTION [ID]         Edit form
    back                      Return the current section to its list
    close                     Close the current section
    go HASH                   Type a fragment into the address bar
    browser-back              Press the browser back button
    browser-forward           Press the browser forward button
    share                     Print the shareable URL
    state                     Print the store state

SECTIONS:
    announcement   Announcements
    game           Game gallery
    chat           Chat board

ENVIRONMENT VARIABLES:
    PLAZA_DEMO_SCRIPT      Override --script
    PLAZA_DEMO_HASH        Override --hash
    PLAZA_DEMO_ORIGIN      Override --origin
    PLAZA_DEMO_PATH        Override --path
    PLAZA_SECTIONS         Comma-separated enabled sections (default: all)
    RUST_LOG               Log filter (default: info)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Script path; `None` replays the built-in tour, `-` reads stdin.
    pub script: Option<String>,
    /// Fragment the page is loaded with.
    pub hash: String,
    pub origin: String,
    pub path: String,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            script: None,
            hash: String::new(),
            origin: "http://localhost:8080".into(),
            path: "/".into(),
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(Opts),
    Help,
    Version,
}

impl Opts {
    /// Parse command-line arguments and environment variables, exiting the
    /// process on `--help`, `--version`, or bad input.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags.
    pub fn parse() -> Self {
        match Self::parse_from(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(Invocation::Run(opts)) => opts,
            Ok(Invocation::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Invocation::Version) => {
                println!("plaza-demo {VERSION}");
                process::exit(0);
            }
            Err(msg) => {
                eprintln!("{msg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` with `var` as the environment lookup.
    pub fn parse_from(
        args: impl IntoIterator<Item = String>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Invocation, String> {
        let mut opts = Self::default();

        // Apply environment variable defaults first
        if let Some(val) = var("PLAZA_DEMO_SCRIPT")
            && !val.is_empty()
        {
            opts.script = Some(val);
        }
        if let Some(val) = var("PLAZA_DEMO_HASH") {
            opts.hash = val;
        }
        if let Some(val) = var("PLAZA_DEMO_ORIGIN")
            && !val.is_empty()
        {
            opts.origin = val;
        }
        if let Some(val) = var("PLAZA_DEMO_PATH")
            && !val.is_empty()
        {
            opts.path = val;
        }

        // Parse command-line args (override env vars)
        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Invocation::Help),
                "--version" | "-V" => return Ok(Invocation::Version),
                other => {
                    if let Some(val) = other.strip_prefix("--script=") {
                        if val.is_empty() {
                            return Err("Invalid --script value: empty path".into());
                        }
                        opts.script = Some(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--hash=") {
                        opts.hash = val.to_string();
                    } else if let Some(val) = other.strip_prefix("--origin=") {
                        if val.is_empty() {
                            return Err("Invalid --origin value: empty".into());
                        }
                        opts.origin = val.to_string();
                    } else if let Some(val) = other.strip_prefix("--path=") {
                        if !val.starts_with('/') {
                            return Err(format!("Invalid --path value: {val}"));
                        }
                        opts.path = val.to_string();
                    } else {
                        return Err(format!("Unknown argument: {other}"));
                    }
                }
            }
        }

        Ok(Invocation::Run(opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_opts() {
        let opts = Opts::default();
        assert_eq!(opts.script, None);
        assert_eq!(opts.hash, "");
        assert_eq!(opts.origin, "http://localhost:8080");
        assert_eq!(opts.path, "/");
    }

    #[test]
    fn version_string_nonempty() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn help_text_contains_sections_and_commands() {
        assert!(HELP_TEXT.contains("announcement"));
        assert!(HELP_TEXT.contains("browser-back"));
        assert!(HELP_TEXT.contains("PLAZA_DEMO_SCRIPT"));
    }

    #[test]
    fn flags_are_parsed() {
        let parsed = Opts::parse_from(
            args(&["--script=tour.txt", "--hash=#/game/list", "--path=/plaza/"]),
            no_env,
        );
        assert_eq!(
            parsed,
            Ok(Invocation::Run(Opts {
                script: Some("tour.txt".into()),
                hash: "#/game/list".into(),
                origin: "http://localhost:8080".into(),
                path: "/plaza/".into(),
            }))
        );
    }

    #[test]
    fn flags_override_env() {
        let env = |key: &str| match key {
            "PLAZA_DEMO_HASH" => Some("#/chat".to_owned()),
            "PLAZA_DEMO_ORIGIN" => Some("https://env.example".to_owned()),
            _ => None,
        };
        let Ok(Invocation::Run(opts)) = Opts::parse_from(args(&["--hash=#/game/list"]), env) else {
            panic!("expected run");
        };
        assert_eq!(opts.hash, "#/game/list");
        assert_eq!(opts.origin, "https://env.example");
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(Opts::parse_from(args(&["-h", "--bogus"]), no_env), Ok(Invocation::Help));
        assert_eq!(Opts::parse_from(args(&["--version"]), no_env), Ok(Invocation::Version));
    }

    #[test]
    fn bad_input_is_an_error() {
        assert!(Opts::parse_from(args(&["--frobnicate"]), no_env).is_err());
        assert!(Opts::parse_from(args(&["--path=relative"]), no_env).is_err());
        assert!(Opts::parse_from(args(&["--script="]), no_env).is_err());
    }
}
