//! hound-harvest: parallel greyhound race-result extraction.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use hound_harvest::cli::{columns_cmd, doctor, output, run_cmd};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hound-harvest")]
#[command(about = "Scrape greyhound race results for a spreadsheet of runners", long_about = None)]
#[command(version)]
struct Cli {
    /// Machine-readable JSON output on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress the human summary.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Stream info logs instead of drawing a progress bar.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every row of an input sheet and export the results
    Run(run_cmd::RunArgs),

    /// Check that a usable Chromium and a valid config are available
    Doctor {
        /// JSON config file to validate
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the export column layout
    Columns,

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

fn init_tracing(cli: &Cli) {
    let default = if cli.quiet || cli.json || run_cmd::wants_progress_bar() {
        "hound_harvest=warn"
    } else {
        "hound_harvest=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.with_ansi(output::color_enabled()).init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.json {
        std::env::set_var("HOUND_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("HOUND_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("HOUND_VERBOSE", "1");
    }
    if cli.no_color {
        std::env::set_var("HOUND_NO_COLOR", "1");
    }

    init_tracing(&cli);

    let code = match execute(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "error": "config",
                    "message": format!("{e:#}"),
                }));
            } else {
                eprintln!("Error: {e:#}");
            }
            1
        }
    };
    std::process::exit(code);
}

async fn execute(command: Commands) -> Result<i32> {
    match command {
        Commands::Run(args) => run_cmd::run(args).await,
        Commands::Doctor { config } => doctor::run(config.as_deref()),
        Commands::Columns => {
            columns_cmd::run();
            Ok(0)
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "hound-harvest",
                &mut std::io::stdout(),
            );
            Ok(0)
        }
    }
}
