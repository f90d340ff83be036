// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, and hand the
//   command to `cli::dispatch`.
// - Failures print as a single `error: <context>: <cause>` line on
//   stderr and exit with status 1.

use clap::Parser;
use gist::cli::{self, Cli};
use gist::ui::Style;
use std::io::{self, Write};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Cli::parse();
    init_logging(args.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = cli::dispatch(args, &mut out, Style::detect()).and_then(|()| Ok(out.flush()?));
    if let Err(err) = result {
        eprintln!("error: {:#}", err);
        process::exit(1);
    }
}

/// Log to stderr. `GIST_LOG` takes an `EnvFilter` directive and wins
/// over the `-v` count.
fn init_logging(verbosity: u8) {
    let filter = match std::env::var("GIST_LOG") {
        Ok(directive) => EnvFilter::new(directive),
        Err(_) => EnvFilter::new(match verbosity {
            0 => "warn",
            1 => "gist=info",
            2 => "gist=debug",
            _ => "trace",
        }),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}
