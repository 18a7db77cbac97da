use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Registry};

use envelope_ledger::cli::{
    handle_account_command, handle_budget_command, handle_category_command,
    handle_transaction_command, AccountCommands, BudgetCommands, CategoryCommands, CliContext,
    TransactionCommands,
};
use envelope_ledger::config::{EnvelopePaths, Settings};
use envelope_ledger::error::EnvelopeError;
use envelope_ledger::storage::{initialize_storage, Storage};

#[derive(Parser)]
#[command(
    name = "envelope-ledger",
    version,
    about = "Zero-based budgeting ledger",
    long_about = "Give every dollar a job. Record transactions, assign money to \
                  categories, and keep credit card payments funded from the \
                  command line."
)]
struct Cli {
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new ledger with starter categories
    Init,

    /// Show current configuration and paths
    Config,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Transaction management commands
    #[command(subcommand, alias = "transaction")]
    Txn(TransactionCommands),

    /// Budget management commands
    #[command(subcommand)]
    Budget(BudgetCommands),
}

type LogLevelHandle = reload::Handle<EnvFilter, Registry>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_level = init_logging();

    match run(cli, log_level.as_ref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<EnvelopeError>() {
                Some(ledger_err) => {
                    if ledger_err.is_internal() {
                        tracing::error!(error = %ledger_err, "command failed");
                    }
                    eprintln!("Error: {}", ledger_err.public_message());
                }
                None => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, log_level: Option<&LogLevelHandle>) -> Result<()> {
    let paths = EnvelopePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    if let Some(handle) = log_level {
        use_configured_level(handle, &settings);
    }

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("envelope-ledger - zero-based budgeting");
            println!();
            println!("Run 'envelope-ledger init' to create a ledger.");
            println!("Run 'envelope-ledger --help' for usage information.");
            return Ok(());
        }
    };

    match command {
        Commands::Init => {
            println!("Initializing ledger at: {}", paths.base_dir().display());
            if initialize_storage(&paths)? {
                println!("Initialization complete!");
                println!();
                println!("Starter category groups have been created:");
                println!("  - Bills, Needs, Wants, Savings");
                println!();
                println!("Run 'envelope-ledger category list' to see all categories.");
            } else {
                println!("Ledger already initialized; nothing changed.");
            }
            return Ok(());
        }
        Commands::Config => {
            println!("envelope-ledger configuration");
            println!("=============================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Data directory: {}", paths.data_dir().display());
            println!("Settings file:  {}", paths.settings_file().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol: {}", settings.currency_symbol);
            println!("  Log level:       {}", settings.log_level);
            return Ok(());
        }
        _ => {}
    }

    let storage = Storage::open(paths)?;
    let ctx = CliContext {
        storage: &storage,
        settings: &settings,
        json: cli.json,
    };

    match command {
        Commands::Account(cmd) => handle_account_command(&ctx, cmd)?,
        Commands::Category(cmd) => handle_category_command(&ctx, cmd)?,
        Commands::Txn(cmd) => handle_transaction_command(&ctx, cmd)?,
        Commands::Budget(cmd) => handle_budget_command(&ctx, cmd)?,
        Commands::Init | Commands::Config => {}
    }

    Ok(())
}

/// Log to stderr at `warn` until the settings have been read
///
/// Returns a handle for switching to the configured level, or `None` when
/// `RUST_LOG` sets the filter.
fn init_logging() -> Option<LogLevelHandle> {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new("warn"), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .ok()?;

    (!from_env).then_some(handle)
}

fn use_configured_level(handle: &LogLevelHandle, settings: &Settings) {
    match EnvFilter::try_new(&settings.log_level) {
        Ok(filter) => {
            if let Err(e) = handle.reload(filter) {
                tracing::warn!(error = %e, "could not apply configured log level");
            }
        }
        Err(e) => {
            tracing::warn!(level = %settings.log_level, error = %e, "invalid log level in settings")
        }
    }
}
