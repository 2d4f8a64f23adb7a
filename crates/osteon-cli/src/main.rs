//! osteon CLI: solve requests, run the benchmark suite, validate inputs.

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

#[derive(Parser)]
#[command(name = "osteon")]
#[command(version, about = "osteon: multi-physics structural analysis core")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an analysis request.
    Solve {
        /// Path to the request (JSON).
        request: String,

        /// Output file. Prints JSON to stdout when omitted.
        #[arg(short, long)]
        output: Option<String>,

        /// Write the response as bincode instead of JSON.
        #[arg(long, requires = "output")]
        binary: bool,

        /// Worker threads, overriding the request.
        #[arg(short, long)]
        threads: Option<usize>,
    },

    /// Run the benchmark suite.
    Benchmark {
        /// Which scenario to run (uniaxial_bar, neo_hookean_bar,
        /// peridynamic_fracture, meshfree_compression, contact_press, all).
        #[arg(short, long, default_value = "all")]
        scenario: String,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate a request without solving it.
    Validate {
        /// Path to the request (JSON).
        path: String,
    },

    /// Probe the compute backends and report which are available.
    Backends,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: logging unavailable: {e}");
    }

    let result = match cli.command {
        Commands::Solve { request, output, binary, threads } => {
            commands::solve(&request, output.as_deref(), binary, threads)
        }
        Commands::Benchmark { scenario, output } => commands::benchmark(&scenario, output.as_deref()),
        Commands::Validate { path } => commands::validate(&path),
        Commands::Backends => commands::backends(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
