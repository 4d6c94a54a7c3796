use clap::{Parser, Subcommand};
use lessongate_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "lessongate", version, about = "Lesson time tracking and access gating")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Elapsed-time tracking
    Track {
        #[command(subcommand)]
        action: commands::track::TrackAction,
    },
    /// Sequential lesson access
    Gate {
        #[command(subcommand)]
        action: commands::gate::GateAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr so stdout stays machine-readable. `RUST_LOG` wins over the
/// configured filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let configured = Config::load_or_default().logging.filter;
        EnvFilter::try_new(&configured).unwrap_or_else(|_| EnvFilter::new("warn"))
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Track { action } => commands::track::run(action),
        Commands::Gate { action } => commands::gate::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
