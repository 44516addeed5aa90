//! factoriod - daemon entry point and operator commands.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use factoriod::config::FactorioConfig;

#[derive(Parser)]
#[command(name = "factoriod", version, about = "Operates a Factorio headless server")]
struct Cli {
    /// Path to the daemon configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write daily-rotated logs into this directory instead of stderr.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the daemon (the default when no command is given).
    Run,
    /// List saves and the current selection.
    Saves {
        /// Include backup copies in the listing.
        #[arg(long)]
        backups: bool,
    },
    /// Query or control the running server over the remote console.
    Console {
        #[command(subcommand)]
        command: commands::console::ConsoleCommand,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = init_tracing(cli.log_dir.as_deref());

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(default_config_path);
    let config = match FactorioConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("could not load {}: {}", config_path.display(), e);
            return ExitCode::from(2);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("could not start async runtime: {}", e);
            return ExitCode::from(2);
        }
    };

    runtime.block_on(async {
        match cli.command.unwrap_or(Command::Run) {
            Command::Run => commands::run::execute(config).await,
            Command::Saves { backups } => commands::saves::execute(&config, backups),
            Command::Console { command } => commands::console::execute(&config, command).await,
        }
    })
}

fn init_tracing(log_dir: Option<&std::path::Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "factoriod.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("factoriod")
        .join("config.json")
}
