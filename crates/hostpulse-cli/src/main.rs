//! CLI for hostpulse: a live terminal dashboard for pushed host telemetry.

mod commands;
mod tui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hostpulse")]
#[command(about = "hostpulse — one chart, every metric, always warm")]
#[command(version = hostpulse_core::VERSION)]
struct Cli {
    /// TOML dashboard config (history_seconds, initial_family, fallback_sample_period)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seconds of history per chart; overrides the config file
    #[arg(long, global = true)]
    history: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Live dashboard fed by a collector's JSON-lines stream over TCP
    Monitor {
        /// Collector address, e.g. 192.168.1.20:5000
        #[arg(long)]
        connect: String,
    },

    /// Live dashboard replaying a captured JSON-lines file
    Replay {
        /// Capture file, one message envelope per line
        file: PathBuf,

        /// Playback speed multiplier (2.0 plays twice as fast)
        #[arg(long, default_value = "1.0")]
        speed: f64,
    },

    /// Feed a capture through the dashboard and print the final state
    Summary {
        /// Capture file, one message envelope per line
        file: PathBuf,

        /// Print machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref(), cli.history);

    match cli.command {
        Commands::Monitor { connect } => commands::monitor::run(config, &connect),
        Commands::Replay { file, speed } => commands::replay::run(config, &file, speed),
        Commands::Summary { file, json } => commands::summary::run(config, &file, json),
    }
}
