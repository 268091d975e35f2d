use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use frate::core::log::init_logging;
use frate::fusion::ContainerClass;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch the latest index readings and store them
    Acquire {
        /// Index families to refresh; all configured families when omitted
        families: Vec<String>,
        /// Fetch and display without storing
        #[arg(long)]
        dry_run: bool,
    },
    /// Show stored readings of an index family
    Latest {
        family: String,
        /// Route names to look up, in order of preference
        routes: Vec<String>,
    },
    /// Estimate the freight rate of a lane from stored indices
    Estimate {
        #[arg(long)]
        origin: String,
        #[arg(long)]
        destination: String,
        /// Container class (20GP, 40GP, 40HC, 45HC, 20RF, 40RF)
        #[arg(long, default_value = "40GP")]
        container: ContainerClass,
        /// Cargo weight in metric tons
        #[arg(long)]
        weight: Option<f64>,
        /// Print the estimate as JSON
        #[arg(long)]
        json: bool,
    },
}

impl From<Commands> for frate::AppCommand {
    fn from(cmd: Commands) -> frate::AppCommand {
        match cmd {
            Commands::Acquire { families, dry_run } => {
                frate::AppCommand::Acquire { families, dry_run }
            }
            Commands::Latest { family, routes } => frate::AppCommand::Latest { family, routes },
            Commands::Estimate {
                origin,
                destination,
                container,
                weight,
                json,
            } => frate::AppCommand::Estimate {
                origin,
                destination,
                container,
                weight_tons: weight,
                json,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => frate::cli::setup::setup_at_path(path),
            None => frate::cli::setup::setup(),
        },
        Some(cmd) => frate::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
