// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::process::ExitCode;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use homeledger::audit::{AuditSink, SqliteAuditSink, TracingAuditSink};
use homeledger::commands::{self, Session};
use homeledger::config::Config;
use homeledger::directory::SqliteDirectory;
use homeledger::{Ledger, cli, db};

fn main() -> ExitCode {
    let matches = cli::build_cli().get_matches();
    let config = match Config::from_matches(&matches) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_logger(config.log_level);
    debug!(db = %config.db_path.display(), "starting");

    match run(&config, &matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, matches: &clap::ArgMatches) -> Result<()> {
    let mut conn = db::open_or_init(&config.db_path)?;
    let audit: Box<dyn AuditSink> = match SqliteAuditSink::spawn(&config.db_path) {
        Ok(sink) => Box::new(sink),
        Err(e) => {
            warn!("Audit log unavailable, falling back to tracing: {e:#}");
            Box::new(TracingAuditSink)
        }
    };
    let dir = SqliteDirectory;
    let session = Session::new(config, Ledger::new(&dir, audit.as_ref()));

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", config.db_path.display());
        }
        Some(("user", sub)) => commands::household::handle_users(&conn, sub)?,
        Some(("household", sub)) => commands::household::handle(&mut conn, &session, sub)?,
        Some(("movement", sub)) => commands::movements::handle(&mut conn, &session, sub)?,
        Some(("template", sub)) => commands::templates::handle(&mut conn, &session, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&mut conn, &session, sub)?,
        Some(("card", sub)) => commands::cards::handle(&mut conn, &session, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, &session, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

/// Logs go to stderr; RUST_LOG wins over --log-level.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
