//! `firewatch-console` – Fire-Safety Monitoring Console
//!
//! Terminal front end for the installation.  It:
//!
//! 1. Loads `~/.firewatch/config.toml` (or defaults), with `FIREWATCH_*`
//!    environment overrides.
//! 2. Opens the resilient telemetry link and folds every decoded frame
//!    into the [`SafetyMonitor`].
//! 3. Drops the operator into an interactive REPL with slash-commands
//!    (`/status`, `/fan`, `/sprinkler`, `/mode`, `/reconnect`, `/help`).
//!
//! Actuator commands are gated locally (manual mode + live link) before
//! any request reaches the Command Service.

mod commands;
mod config;
mod repl;

use std::sync::{Arc, Mutex};

use colored::Colorize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use firewatch_link::{LinkEvent, TelemetryLink, WsTransport};
use firewatch_safety::SafetyMonitor;

use crate::commands::CommandClient;

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // Initialise tracing-subscriber using RUST_LOG (defaults to "info").
    // Set FIREWATCH_LOG_FORMAT=json to emit newline-delimited JSON logs
    // suitable for log aggregators.  The REPL's operator-facing output
    // still uses println! for UX consistency.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("FIREWATCH_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => cfg,
        Ok(None) => {
            println!(
                "{}",
                format!(
                    "No config at {}; using defaults.",
                    config::config_path().display()
                )
                .dimmed()
            );
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            eprintln!("{}: {e}", "Failed to load configuration".red());
            std::process::exit(1);
        }
    };
    info!(
        telemetry = %cfg.telemetry_url,
        commands = %cfg.command_url,
        "starting firewatch console"
    );

    // ── Runtime and core components ───────────────────────────────────────
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {e}", "Failed to start async runtime".red());
            std::process::exit(1);
        }
    };

    let link = {
        let _guard = rt.enter();
        TelemetryLink::spawn(cfg.link_config(), WsTransport)
    };
    let monitor = Arc::new(Mutex::new(SafetyMonitor::new()));
    let client = CommandClient::new(&cfg.command_url);

    rt.spawn(fold_events(link.subscribe(), Arc::clone(&monitor)));
    link.connect();

    // ── Operator REPL ─────────────────────────────────────────────────────
    repl::run(&rt, &link, &monitor, &client, cfg.max_attempts);

    link.disconnect();
}

/// Fold link notifications into the safety monitor and the log.
async fn fold_events(
    mut events: broadcast::Receiver<LinkEvent>,
    monitor: Arc<Mutex<SafetyMonitor>>,
) {
    loop {
        match events.recv().await {
            Ok(LinkEvent::Telemetry(frame)) => {
                if let Ok(mut guard) = monitor.lock() {
                    guard.apply(frame);
                }
            }
            Ok(LinkEvent::Connected) => info!("telemetry stream online"),
            Ok(LinkEvent::Disconnected) => info!("telemetry stream offline"),
            Ok(LinkEvent::Error(e)) => warn!(error = %e, "telemetry link error"),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(lagged_by = n, "telemetry consumer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_banner() {
    println!();
    println!("{}", "FIREWATCH".bold().red());
    println!("{}", "Fire-safety monitoring console".dimmed());
    println!("{}", "Type /help for commands.".dimmed());
    println!();
}
