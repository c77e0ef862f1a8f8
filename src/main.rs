//! Logic Emu - Digital Logic Circuit Emulator
//!
//! Loads a netlist, drives its ENTRY pins and prints pin levels tick by tick.
//!
//! # Usage
//!
//! ```bash
//! logic-emu latch.net --set set_o=HIGH --set en_o=HIGH --ticks 8 --delay-ms 100
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use clap::{ArgAction, Parser};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use logic_emu::{
    circuit::Level,
    engine::{EvalDelay, Session, Snapshot},
    error::{EmuError, Result},
    netlist,
};

/// Digital logic circuit emulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the netlist file
    #[arg(value_name = "NETLIST")]
    netlist: PathBuf,

    /// Pause between ticks in milliseconds (overrides `.delay`)
    #[arg(short, long)]
    delay_ms: Option<f64>,

    /// Number of ticks to run (overrides `.ticks`); runs until Ctrl-C when unset
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Drive an ENTRY pin before the first tick, e.g. `a_o=HIGH`
    #[arg(short, long = "set", value_name = "PIN=LEVEL", value_parser = parse_assignment)]
    set: Vec<(String, Level)>,

    /// Print every pin instead of only EXIT inputs
    #[arg(short, long)]
    all: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_assignment(s: &str) -> std::result::Result<(String, Level), String> {
    let (pin, level) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PIN=LEVEL, got '{}'", s))?;
    Ok((pin.trim().to_string(), level.trim().parse()?))
}

fn init_logging(verbose: u8) -> Result<()> {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|source| EmuError::Unexpected {
            message: "failed to install log subscriber".to_string(),
            source,
        })
}

fn print_snapshot(snapshot: &Snapshot, watched: &[String]) {
    let levels: Vec<String> = watched
        .iter()
        .filter_map(|pin| snapshot.level(pin).map(|level| format!("{}={}", pin, level)))
        .collect();
    println!("T={:<6} {}", snapshot.tick, levels.join(" "));
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    // Parse and build the circuit
    let netlist = netlist::parse_file(&args.netlist)?;
    let graph = Arc::new(netlist.build_graph()?);

    // Command-line settings win over netlist directives
    let mut config = netlist.options.scheduler_config();
    if let Some(ms) = args.delay_ms {
        config = config.with_eval_delay(EvalDelay::from_millis_f64(ms)?);
    }
    if let Some(ticks) = args.ticks {
        config = config.with_tick_limit(ticks);
    }

    let mut session = Session::with_config(Arc::clone(&graph), config)?;
    for (pin, level) in &args.set {
        session.set_entry_level(pin, *level)?;
    }

    let watched: Vec<String> = if args.all {
        graph.pins().iter().map(|p| p.name.clone()).collect()
    } else {
        graph
            .exit_nodes()
            .flat_map(|n| n.inputs.iter().map(|&p| graph.pin_name(p).to_string()))
            .collect()
    };

    print_snapshot(&session.snapshot()?, &watched);
    let subscription = session.subscribe()?;
    let printer = thread::spawn(move || {
        for snapshot in subscription.receiver.iter() {
            print_snapshot(&snapshot, &watched);
        }
    });

    let handle = session.stop_handle();
    ctrlc::set_handler(move || {
        info!("Received Ctrl+C, stopping at the next tick");
        handle.cancel();
    })
    .map_err(|e| EmuError::unexpected("failed to install Ctrl-C handler", e))?;

    session.start()?;
    let summary = session.run()?;
    info!(
        ticks = summary.ticks_run,
        tick = summary.tick,
        stop = ?summary.stop,
        "emulation finished"
    );

    // Disposing closes the subscription, which ends the printer
    session.dispose()?;
    if printer.join().is_err() {
        warn!("snapshot printer panicked");
    }

    Ok(())
}
