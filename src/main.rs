mod cmd;

use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rangepick", about = "pick a date range in the terminal")]
struct Cli {
    /// Path to the data directory containing picker.yaml and selection.json (default: ./config)
    #[arg(long, default_value = "./config")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default picker.yaml
    Init,
    /// Print the calendar grid for a month
    Month {
        /// Month to show (e.g. 2025-03)
        month: String,
    },
    /// List the configured presets as they resolve today
    Presets,
    /// Parse a date range the way the picker's text input does
    Parse {
        /// Range text (e.g. "03/01/2025 - 03/09/2025")
        text: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = if cli.data_dir.is_absolute() {
        cli.data_dir.clone()
    } else {
        std::env::current_dir()?.join(&cli.data_dir)
    };
    rangepick::data::persistence::set_data_dir(data_dir.clone());

    // Auto-init when the data directory is missing or empty and the user did not
    // explicitly invoke the `init` subcommand.
    let is_init_command = matches!(cli.command, Some(Commands::Init));
    if !is_init_command && dir_needs_init(&data_dir) {
        eprintln!(
            "Data directory '{}' is missing or empty, running init...",
            data_dir.display()
        );
        cmd::init::run()?;
    }

    init_logging(&data_dir, cli.command.is_none());

    match cli.command {
        None => cmd::root::run(),
        Some(Commands::Init) => cmd::init::run(),
        Some(Commands::Month { month }) => cmd::month::run(&month),
        Some(Commands::Presets) => cmd::presets::run(),
        Some(Commands::Parse { text }) => cmd::parse::run(&text),
    }
}

/// `RUST_LOG` filtering, `warn` by default. The interactive picker owns the
/// terminal, so it logs to rangepick.log in the data directory instead.
fn init_logging(data_dir: &Path, interactive: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if !interactive {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("rangepick.log"));
    match log_file {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        Err(e) => {
            eprintln!("cannot open rangepick.log ({e}); logging disabled");
        }
    }
}

/// Returns true when `dir` does not exist or exists but contains no files.
fn dir_needs_init(dir: &Path) -> bool {
    if !dir.exists() {
        return true;
    }
    dir.read_dir()
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
