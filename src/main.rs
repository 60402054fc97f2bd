use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use fxdash::cli::setup::setup;
use fxdash::core::convert::Amount;
use fxdash::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable logging, repeat for more detail (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxdash::AppCommand {
    fn from(cmd: Commands) -> fxdash::AppCommand {
        match cmd {
            Commands::Rates => fxdash::AppCommand::Rates,
            Commands::Crypto => fxdash::AppCommand::Crypto,
            Commands::Convert {
                amount,
                currency,
                crypto,
            } => fxdash::AppCommand::Convert {
                amount,
                currency,
                crypto,
            },
            Commands::Watch => fxdash::AppCommand::Watch,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display fiat exchange rates
    Rates,
    /// Display crypto prices
    Crypto,
    /// Convert an amount into the base currency
    Convert {
        /// Amount to convert, e.g. 12.5
        amount: Amount,
        /// Currency or coin code, e.g. USD or BTC
        currency: String,
        /// Treat the code as a crypto symbol
        #[arg(long)]
        crypto: bool,
    },
    /// Live dashboard, refreshed in the background until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => fxdash::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
