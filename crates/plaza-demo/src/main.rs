#![forbid(unsafe_code)]

//! Plaza navigation replay.
//!
//! Run with: `cargo run -p plaza-demo -- --script=tour.txt`

use std::io::{self, Read};
use std::process;

use plaza_demo::cli;
use plaza_demo::script::{self, Replayer, ScriptError, TOUR};
use plaza_runtime::PlazaConfig;
use tracing_subscriber::EnvFilter;

fn main() {
    let opts = cli::Opts::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(&opts) {
        eprintln!("plaza-demo: {err}");
        process::exit(1);
    }
}

fn run(opts: &cli::Opts) -> Result<(), ScriptError> {
    let text = load_script(opts.script.as_deref())?;
    let steps = script::parse_script(&text)?;

    let config = PlazaConfig::from_env();
    let mut replayer = Replayer::new(&config, &opts.origin, &opts.path, &opts.hash);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    script::replay(&mut replayer, &steps, &mut out)?;
    replayer.shutdown();
    Ok(())
}

fn load_script(path: Option<&str>) -> Result<String, ScriptError> {
    match path {
        None => Ok(TOUR.to_owned()),
        Some("-") => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|source| ScriptError::Io {
                    path: "<stdin>".to_owned(),
                    source,
                })?;
            Ok(text)
        }
        Some(path) => std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_owned(),
            source,
        }),
    }
}
