//! Manual-test CLI: drive one transaction against a real (or mocked) PED.
//!
//! Grounded on the teacher's `main.rs` `clap`/`tokio::main` shape, stripped
//! of the database/auth machinery that has no counterpart here — this crate
//! owns no config-sourcing layer (spec.md §1), so flags are parsed directly
//! rather than merged from env/file layers.

#![expect(clippy::print_stdout, reason = "CLI result output is this binary's whole purpose")]
#![expect(clippy::print_stderr, reason = "CLI error reporting")]

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use ngenius_ped::{
    config::{EngineConfig, TransportConfig},
    engine::TransactionEngine,
    logging,
    session::PedSession,
    source_id,
    transport::Endpoint,
    value::Frame,
};

/// Drive a single transaction (or report) against an NGPAS-style PED
/// gateway and print the resulting frame as JSON.
#[derive(Parser, Debug)]
#[command(name = "ngenius-probe")]
struct Cli {
    /// PED/gateway hostname or address.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// PED/gateway TCP port.
    #[arg(long, default_value_t = 5000)]
    port: u16,
    /// Transaction amount, minor units as a string (spec.md §3 fields are
    /// transmitted as opaque strings, not numerics).
    #[arg(long, default_value = "0")]
    amount: String,
    /// Poll interval in seconds.
    #[arg(long, default_value_t = 3)]
    poll_interval_secs: u64,
    /// Phase deadline in seconds before any parameter update is sent.
    #[arg(long, default_value_t = 120)]
    base_timeout_secs: u64,
    /// Log file path; defaults to `ngenius.log` in the current directory.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Run an X report instead of a sale.
    #[arg(long, conflicts_with = "z_report")]
    x_report: bool,
    /// Run a Z report instead of a sale.
    #[arg(long)]
    z_report: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_path = cli.log_file.clone().unwrap_or_else(|| PathBuf::from(logging::DEFAULT_LOG_FILE));
    let _guard = match logging::init_file_logging(&log_path) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to install logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli).await {
        Ok(frame) => {
            println!("{}", frame.to_compact_json());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("transaction failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<Frame, ngenius_ped::TransportError> {
    let endpoint = Endpoint::new(cli.host.clone(), cli.port);
    let session = PedSession::new(endpoint, TransportConfig::default());
    let mut engine = TransactionEngine::new(session, EngineConfig::transaction_defaults());

    let poll_interval = std::time::Duration::from_secs(cli.poll_interval_secs);

    if cli.x_report {
        return engine.run_x_report(poll_interval).await;
    }
    if cli.z_report {
        return engine.run_z_report(poll_interval).await;
    }

    let source_id = source_id::generate();
    let payload = Frame::empty()
        .with("type", "eposSale")
        .with("amount", cli.amount.clone())
        .with("sourceid", source_id.clone());
    let base_timeout = std::time::Duration::from_secs(cli.base_timeout_secs);
    engine.run(&source_id, &payload, poll_interval, base_timeout).await
}
