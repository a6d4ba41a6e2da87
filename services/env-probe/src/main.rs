//! Resolves the keys given on the command line the same way a service does at
//! startup and prints the result as JSON.
//!
//! ```text
//! env-probe [--json-logs] <app-name> [KEY | KEY=fallback]...
//! ```
//!
//! Exits 0 on success, 1 when the configuration cannot be resolved and 2 on
//! bad usage.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use cfconfig::{load_environment, telemetry, Requested, RequestedKey};
use tracing::error;

const USAGE: &str = "usage: env-probe [--json-logs] <app-name> [KEY | KEY=fallback]...";

const EXIT_CONFIG: u8 = 1;
const EXIT_USAGE: u8 = 2;

struct Args {
    json_logs: bool,
    app_name: String,
    requested: Requested,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut json_logs = false;
    let mut positional = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--json-logs" => json_logs = true,
            flag if flag.starts_with("--") => anyhow::bail!("unknown flag {flag}"),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let app_name = positional.next().context("missing <app-name>")?;
    let requested = positional
        .map(|raw| raw.parse::<RequestedKey>())
        .collect::<Result<Requested, _>>()?;

    Ok(Args {
        json_logs,
        app_name,
        requested,
    })
}

fn main() -> ExitCode {
    let status = exit_status(std::env::args().skip(1), &mut std::io::stderr());
    ExitCode::from(status)
}

/// Runs the command and maps the outcome to a process exit status. The
/// diagnostic goes to `stderr` as well as to the log so it survives
/// `RUST_LOG=off`.
fn exit_status(raw_args: impl IntoIterator<Item = String>, stderr: &mut dyn Write) -> u8 {
    let args = match parse_args(raw_args) {
        Ok(args) => args,
        Err(e) => {
            let _ = writeln!(stderr, "{e:#}\n{USAGE}");
            return EXIT_USAGE;
        }
    };
    telemetry::init_tracing(args.json_logs);

    match run(&args) {
        Ok(()) => 0,
        Err(e) => {
            error!(error = ?e, "cannot start");
            let _ = writeln!(stderr, "{e:#}");
            EXIT_CONFIG
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let resolved = load_environment(&args.app_name, &args.requested)
        .context("configuration error")?;
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}
