//! REPL – Read-Eval-Print Loop for the Firewatch operator console.
//!
//! Supported slash-commands:
//!   /help               – show this list
//!   /status             – connection, sensor, and safety overview
//!   /fan on|off         – command the ventilation fan
//!   /sprinkler on|off   – command the sprinkler system
//!   /mode manual|auto   – switch the installation's control mode
//!   /reconnect          – reset the retry budget and reconnect now
//!   /connect /disconnect – open / close the telemetry link
//!   /quit | /exit       – leave the console

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use firewatch_link::{ConnectionState, TelemetryLink};
use firewatch_safety::{GasLevel, SafetyMonitor};
use firewatch_types::{ActuatorTarget, ControlMode, DeviceState};

use crate::commands::CommandClient;

/// One parsed operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplCommand {
    Help,
    Status,
    Device(ActuatorTarget, DeviceState),
    Mode(ControlMode),
    Reconnect,
    Connect,
    Disconnect,
    Quit,
}

fn parse(line: &str) -> Option<ReplCommand> {
    let mut words = line.split_whitespace();
    let command = match (words.next()?, words.next()) {
        ("/help", None) => ReplCommand::Help,
        ("/status", None) => ReplCommand::Status,
        ("/fan", Some("on")) => ReplCommand::Device(ActuatorTarget::Fan, DeviceState::On),
        ("/fan", Some("off")) => ReplCommand::Device(ActuatorTarget::Fan, DeviceState::Off),
        ("/sprinkler", Some("on")) => {
            ReplCommand::Device(ActuatorTarget::Sprinkler, DeviceState::On)
        }
        ("/sprinkler", Some("off")) => {
            ReplCommand::Device(ActuatorTarget::Sprinkler, DeviceState::Off)
        }
        ("/mode", Some("manual")) => ReplCommand::Mode(ControlMode::Manual),
        ("/mode", Some("auto" | "automatico")) => ReplCommand::Mode(ControlMode::Automatic),
        ("/reconnect", None) => ReplCommand::Reconnect,
        ("/connect", None) => ReplCommand::Connect,
        ("/disconnect", None) => ReplCommand::Disconnect,
        ("/quit" | "/exit", None) => ReplCommand::Quit,
        _ => return None,
    };
    // Reject trailing words so `/fan on fire` is not a command.
    if words.next().is_some() {
        return None;
    }
    Some(command)
}

/// Entry point for the interactive REPL.  Returns when the operator
/// quits or stdin closes.
pub fn run(
    rt: &tokio::runtime::Runtime,
    link: &TelemetryLink,
    monitor: &Arc<Mutex<SafetyMonitor>>,
    client: &CommandClient,
    max_attempts: u32,
) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", "firewatch>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse(trimmed) {
            Some(ReplCommand::Help) => cmd_help(),
            Some(ReplCommand::Status) => cmd_status(link, monitor, max_attempts),
            Some(ReplCommand::Device(target, state)) => {
                cmd_device(rt, link, monitor, client, target, state);
            }
            Some(ReplCommand::Mode(mode)) => cmd_mode(rt, link, monitor, client, mode),
            Some(ReplCommand::Reconnect) => {
                link.manual_reconnect();
                println!("{}", "Retry budget reset; reconnecting …".yellow());
            }
            Some(ReplCommand::Connect) => {
                link.connect();
                println!("{}", "Connecting …".yellow());
            }
            Some(ReplCommand::Disconnect) => {
                link.disconnect();
                println!("{}", "Telemetry link closed.".yellow());
            }
            Some(ReplCommand::Quit) => {
                println!("{}", "Goodbye.".green());
                break;
            }
            None => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    trimmed.yellow(),
                    "/help".bold()
                );
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Firewatch Commands".bold().underline());
    println!("  {}            – connection, sensor, and safety overview", "/status".bold().cyan());
    println!("  {}        – command the ventilation fan", "/fan on|off".bold().cyan());
    println!("  {}  – command the sprinkler system", "/sprinkler on|off".bold().cyan());
    println!("  {}  – switch the control mode", "/mode manual|auto".bold().cyan());
    println!("  {}         – reset the retry budget and reconnect", "/reconnect".bold().cyan());
    println!("  {} – open / close the telemetry link", "/connect /disconnect".bold().cyan());
    println!("  {}        – leave the console", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_status(link: &TelemetryLink, monitor: &Arc<Mutex<SafetyMonitor>>, max_attempts: u32) {
    let status = link.status();
    let guard = monitor.lock().expect("safety monitor lock poisoned");
    let snapshot = guard.snapshot();
    let derived = guard.derived();

    println!();
    let connection = match status.state {
        ConnectionState::Connected => "connected".green().to_string(),
        ConnectionState::Connecting => "connecting …".yellow().to_string(),
        ConnectionState::Reconnecting => format!(
            "{} (attempt {}/{})",
            "reconnecting …".yellow(),
            status.attempts,
            max_attempts
        ),
        ConnectionState::Disconnected => "disconnected".red().to_string(),
        ConnectionState::Exhausted => format!(
            "{}; type {} to retry",
            format!("connection failed after {max_attempts} attempts").red().bold(),
            "/reconnect".bold()
        ),
    };
    println!("  Connection : {connection}");

    let gas = match snapshot.gas {
        Some(ppm) => {
            let level = match derived.gas_level {
                GasLevel::Safe => "safe".green(),
                GasLevel::Warning => "warning".yellow(),
                GasLevel::Danger => "danger".red().bold(),
                GasLevel::Unknown => "unknown".dimmed(),
            };
            format!("{ppm} ppm ({level})")
        }
        None => "--".dimmed().to_string(),
    };
    println!("  Gas        : {gas}");
    println!("  Flame      : {}", match snapshot.flame {
        Some(true) => "DETECTED".red().bold().to_string(),
        Some(false) => "none".green().to_string(),
        None => "--".dimmed().to_string(),
    });
    println!("  Fan        : {}", device_label(snapshot.fan));
    println!("  Sprinkler  : {}", device_label(snapshot.sprinkler));
    println!("  Mode       : {}", match snapshot.mode {
        Some(mode) => mode.to_string().bold().to_string(),
        None => "--".dimmed().to_string(),
    });
    println!("  Last frame : {}", match guard.received_at() {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "never".dimmed().to_string(),
    });

    if derived.emergency {
        println!();
        println!("  {}", "⚠  EMERGENCY CONDITION ACTIVE".red().bold());
    }
    if derived.controls_locked {
        println!(
            "  {}",
            "Manual controls are locked while the installation runs in AUTOMATICO.".dimmed()
        );
    }
    println!();
}

fn device_label(state: Option<DeviceState>) -> String {
    match state {
        Some(DeviceState::On) => "ON".green().to_string(),
        Some(DeviceState::Off) => "OFF".to_string(),
        None => "--".dimmed().to_string(),
    }
}

fn cmd_device(
    rt: &tokio::runtime::Runtime,
    link: &TelemetryLink,
    monitor: &Arc<Mutex<SafetyMonitor>>,
    client: &CommandClient,
    target: ActuatorTarget,
    state: DeviceState,
) {
    let status = link.status();
    let (permitted, mode) = {
        let guard = monitor.lock().expect("safety monitor lock poisoned");
        (
            guard.can_issue_device_command(status.state),
            guard.snapshot().mode,
        )
    };

    if !permitted {
        if status.state != ConnectionState::Connected {
            println!(
                "{} telemetry link is {}.",
                "Refused:".red(),
                status.state.to_string().yellow()
            );
        } else if mode == Some(ControlMode::Automatic) {
            println!(
                "{} the installation is in {} mode; switch with {} first.",
                "Refused:".red(),
                "AUTOMATICO".bold(),
                "/mode manual".bold()
            );
        } else {
            println!(
                "{} control mode is unknown; wait for a telemetry frame.",
                "Refused:".red()
            );
        }
        return;
    }

    match rt.block_on(client.set_device(target, state)) {
        Ok(()) => println!("{} {} set to {}", "✓".green(), target, state.to_string().bold()),
        Err(e) => println!("{}: {}", "Command failed".red(), e),
    }
}

fn cmd_mode(
    rt: &tokio::runtime::Runtime,
    link: &TelemetryLink,
    monitor: &Arc<Mutex<SafetyMonitor>>,
    client: &CommandClient,
    mode: ControlMode,
) {
    let status = link.status();
    let permitted = {
        let guard = monitor.lock().expect("safety monitor lock poisoned");
        guard.can_issue_mode_command(status.state)
    };

    if !permitted {
        println!(
            "{} telemetry link is {}.",
            "Refused:".red(),
            status.state.to_string().yellow()
        );
        return;
    }

    match rt.block_on(client.set_mode(mode)) {
        Ok(()) => println!("{} control mode set to {}", "✓".green(), mode.to_string().bold()),
        Err(e) => println!("{}: {}", "Command failed".red(), e),
    }
}
