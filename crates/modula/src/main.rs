mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{debug, error};
use tracing_subscriber::EnvFilter;

use modula_core::kernel::constants;

/// Modula: dependency-aware extension lifecycle management
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Simple ping command for testing
    #[arg(long)]
    ping: bool,

    /// Site manifest declaring the available extensions
    #[arg(long, short, default_value = constants::DEFAULT_MANIFEST_FILE)]
    manifest: PathBuf,

    /// Persisted registry state; defaults to a file next to the manifest
    #[arg(long, short)]
    state: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List enabled extensions in load order
    List {
        /// Include known but disabled extensions
        #[arg(long)]
        all: bool,
    },
    /// Show one extension
    Info {
        name: String,
    },
    /// Install extensions and their missing dependencies
    Install {
        #[arg(required = true)]
        names: Vec<String>,
        /// Fail instead of pulling in dependencies
        #[arg(long)]
        no_dependencies: bool,
    },
    /// Uninstall extensions
    Uninstall {
        #[arg(required = true)]
        names: Vec<String>,
        /// Uninstall enabled dependents too
        #[arg(long)]
        with_dependents: bool,
    },
    /// Change the weight of an extension
    SetWeight {
        name: String,
        #[arg(allow_negative_numbers = true)]
        weight: i32,
    },
    /// Show the order a change would apply, without applying it
    Plan {
        #[command(subcommand)]
        command: PlanCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    Install {
        #[arg(required = true)]
        names: Vec<String>,
        #[arg(long)]
        no_dependencies: bool,
    },
    Uninstall {
        #[arg(required = true)]
        names: Vec<String>,
        #[arg(long)]
        with_dependents: bool,
    },
}

/// Install a fmt subscriber writing to stderr and route `log` records into it.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("modula={level},modula_core={level}")));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {}", e);
        return;
    }
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records: {}", e);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    init_logging(args.verbose);
    debug!("{} {} starting", constants::APP_NAME, constants::APP_VERSION);

    let Some(command) = args.command else {
        eprintln!("No command given, see --help");
        return ExitCode::FAILURE;
    };

    match cli::run(&args.manifest, args.state.as_deref(), command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
