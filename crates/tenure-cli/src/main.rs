use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "tenure")]
#[command(about = "Run the built-in memory-defect scenarios against checked ownership slots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios and print one verdict per scenario
    Run {
        /// Only run scenarios whose name contains this substring
        #[arg(long)]
        filter: Option<String>,

        /// Stop at the first failing scenario
        #[arg(long)]
        fail_fast: bool,

        /// Do not report slots left live at the end of a run as leaks
        #[arg(long)]
        no_leak_check: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List the built-in scenarios with their expected outcome
    List,
}

/// Output format of `tenure run`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// One `PASS`/`FAIL` line per scenario plus a summary.
    Text,
    /// A single JSON document.
    Json,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            filter,
            fail_fast,
            no_leak_check,
            format,
        } => {
            let code = commands::run::run(filter, fail_fast, no_leak_check, format)?;
            std::process::exit(code);
        }
        Commands::List => commands::list::run(),
    }
}
