use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "pomo", version, about = "Interactive Pomodoro timer")]
struct Cli {
    /// Settings file (default is ~/.config/pomo/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep history in memory only, for a throwaway session
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the next interval(s)
    Run(commands::timer::RunArgs),
    /// Print the interval that would run next
    Next,
    /// Print a stored interval
    Show {
        /// Interval id
        id: i64,
    },
    /// Print the most recent interval
    Last,
    /// Print the most recent breaks
    Breaks {
        /// How many breaks to list
        #[arg(short, long, default_value = "3")]
        n: usize,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("POMO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = commands::Context::load(cli.config, cli.memory).and_then(|ctx| match cli.command {
        Commands::Run(args) => commands::timer::run(&ctx, args),
        Commands::Next => commands::history::next(&ctx),
        Commands::Show { id } => commands::history::show(&ctx, id),
        Commands::Last => commands::history::last(&ctx),
        Commands::Breaks { n } => commands::history::breaks(&ctx, n),
        Commands::Config { action } => commands::config::run(&ctx, action),
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
