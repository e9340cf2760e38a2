//! LPDDR6 device timing simulator CLI.
//!
//! This binary drives the device model for quick experiments:
//! 1. **Free run:** Initialize a device from a JSON config and tick it for a
//!    fixed number of cycles (useful for checking configs and trace output).
//! 2. **Scripted run:** Feed a command script through a minimal in-order
//!    driver that resolves prerequisites and issues each request when the
//!    device reports ready.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::{fs, process};

use lpddr6_core::command::RequestKind;
use lpddr6_core::common::Level;
use lpddr6_core::{AddrVec, Config, Device};

#[derive(Parser, Debug)]
#[command(
    name = "lpddr6-sim",
    author,
    version,
    about = "Cycle-accurate LPDDR6 device timing simulator",
    long_about = "Initialize an LPDDR6 device model from a JSON configuration and run it,\n\
                  either freely for a number of cycles or against a request script.\n\n\
                  Script lines are `<request> <channel> <rank> <bankgroup> <bank> <row> <column>`\n\
                  with request one of: read, write, all-bank-refresh, open-row, close-row.\n\
                  Blank lines and lines starting with '#' are ignored.\n\n\
                  Examples:\n  \
                  lpddr6-sim run --cycles 2000 --trace-dir trace\n  \
                  lpddr6-sim run --config lpddr6.json --script requests.txt"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the device, freely or against a request script.
    Run {
        /// JSON configuration file (defaults to the built-in presets).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Request script to drive through the device.
        #[arg(long)]
        script: Option<PathBuf>,

        /// Cycle budget (free-run length, or script timeout).
        #[arg(long, default_value_t = 10_000)]
        cycles: u64,

        /// Enable trace output into this directory (overrides the config).
        #[arg(long)]
        trace_dir: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            script,
            cycles,
            trace_dir,
        } => cmd_run(config, script, cycles, trace_dir),
    }
}

/// Loads the config, builds the device, and runs it to completion.
fn cmd_run(
    config_path: Option<PathBuf>,
    script_path: Option<PathBuf>,
    cycles: u64,
    trace_dir: Option<PathBuf>,
) {
    let mut config = match &config_path {
        Some(path) => {
            let text = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config {}: {}", path.display(), e);
                process::exit(1);
            });
            serde_json::from_str::<Config>(&text).unwrap_or_else(|e| {
                eprintln!("Error parsing config {}: {}", path.display(), e);
                process::exit(1);
            })
        }
        None => Config::default(),
    };
    if trace_dir.is_some() {
        config.trace.dir = trace_dir;
    }

    let mut device = Device::new(&config).unwrap_or_else(|e| {
        eprintln!("[!] {}", e);
        process::exit(1);
    });

    println!(
        "Configuration: org {} / timing {}",
        config.org.preset.as_deref().unwrap_or("(manual)"),
        config.timing.preset.as_deref().unwrap_or("(manual)"),
    );
    println!(
        "  Density: {} Mbit  Read latency: {} cycles  Trace: {}",
        device.organization().density_mbit,
        device.read_latency(),
        config
            .trace
            .dir
            .as_ref()
            .map_or("off".to_string(), |d| d.display().to_string()),
    );
    println!();

    let requests = match &script_path {
        Some(path) => parse_script(path),
        None => Vec::new(),
    };

    if requests.is_empty() {
        for _ in 0..cycles {
            device.tick();
        }
    } else {
        run_script(&mut device, &requests, cycles);
    }

    device.stats().print();
}

/// Parses a request script into `(request, address)` pairs.
///
/// Exits the process on the first malformed line.
fn parse_script(path: &PathBuf) -> Vec<(RequestKind, AddrVec)> {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading script {}: {}", path.display(), e);
        process::exit(1);
    });

    let mut requests = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let kind = fields
            .next()
            .and_then(RequestKind::from_name)
            .unwrap_or_else(|| {
                eprintln!("{}:{}: unknown request", path.display(), lineno + 1);
                process::exit(1);
            });
        let mut addr: AddrVec = [0; Level::COUNT];
        for slot in addr.iter_mut() {
            *slot = fields
                .next()
                .and_then(|f| f.parse().ok())
                .unwrap_or_else(|| {
                    eprintln!(
                        "{}:{}: expected {} address indices",
                        path.display(),
                        lineno + 1,
                        Level::COUNT
                    );
                    process::exit(1);
                });
        }
        requests.push((kind, addr));
    }
    requests
}

/// Drives the requests through the device in order.
///
/// Each cycle the device ticks first, then the driver resolves the current
/// request's prerequisite chain and issues the next legal command. A request
/// completes when its own command has been issued.
fn run_script(device: &mut Device, requests: &[(RequestKind, AddrVec)], cycles: u64) {
    let mut pending = requests.iter();
    let mut current = pending.next();

    for _ in 0..cycles {
        device.tick();

        let Some(&(kind, addr)) = current else {
            break;
        };
        let goal = kind.command();
        let next = device.get_preq_command(goal, &addr).unwrap_or_else(|e| {
            eprintln!("\n[!] FATAL: {}", e);
            device.stats().print();
            process::exit(1);
        });
        if device.check_ready(next, &addr) {
            if let Err(e) = device.issue_command(next, &addr) {
                eprintln!("\n[!] FATAL: {}", e);
                device.stats().print();
                process::exit(1);
            }
            if next == goal {
                current = pending.next();
            }
        }
    }

    if current.is_some() {
        eprintln!("[!] cycle budget exhausted with requests outstanding");
    }
}
