//! Account CLI commands
//!
//! Implements CLI commands for account management.

use clap::Subcommand;

use super::{parse_amount, print_json, CliContext};
use crate::display::format_account_list;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::models::AccountType;
use crate::services::AccountService;

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    #[command(alias = "create")]
    Add {
        /// Account name
        name: String,
        /// Account type (checking, savings, cash, credit)
        #[arg(short = 't', long, default_value = "checking")]
        account_type: String,
        /// Opening balance (e.g., "1000.00"); for credit cards, the amount owed
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        balance: String,
    },
    /// List all accounts
    List,
    /// Rename an account (and its payment category)
    Rename {
        /// Account name or ID
        account: String,
        /// New name
        name: String,
    },
    /// Delete an account and all of its transactions
    Delete {
        /// Account name or ID
        account: String,
    },
}

/// Handle an account command
pub fn handle_account_command(ctx: &CliContext<'_>, cmd: AccountCommands) -> EnvelopeResult<()> {
    let service = AccountService::new(ctx.storage);

    match cmd {
        AccountCommands::Add {
            name,
            account_type,
            balance,
        } => {
            let account_type = AccountType::parse(&account_type).ok_or_else(|| {
                EnvelopeError::Validation(format!(
                    "Invalid account type: '{}'. Valid types: checking, savings, cash, credit",
                    account_type
                ))
            })?;

            // Users enter card debt as a positive number; it is stored negative.
            let mut opening_balance = parse_amount(&balance)?;
            if account_type.is_credit() && opening_balance.is_positive() {
                opening_balance = -opening_balance;
            }

            let account = service.create(&name, account_type, opening_balance)?;

            if ctx.json {
                return print_json(&account);
            }
            println!("Created account: {}", account.name);
            println!("  Type: {}", account.account_type);
            println!(
                "  Balance: {}",
                account.balance.format_with_symbol(ctx.symbol())
            );
            if account_type.is_credit() {
                println!("  Payment category: {}", account.name);
            }
            println!("  ID: {}", account.id);
        }

        AccountCommands::List => {
            let accounts = service.list()?;
            if ctx.json {
                return print_json(&accounts);
            }
            print!("{}", format_account_list(&accounts, ctx.symbol()));
        }

        AccountCommands::Rename { account, name } => {
            let target = ctx.account(&account)?;
            let renamed = service.rename(target.id, &name)?;

            if ctx.json {
                return print_json(&renamed);
            }
            println!("Renamed '{}' to '{}'", target.name, renamed.name);
        }

        AccountCommands::Delete { account } => {
            let target = ctx.account(&account)?;
            let deleted = service.delete(target.id)?;

            if ctx.json {
                return print_json(&serde_json::json!({
                    "account_id": target.id,
                    "transactions": deleted.transactions,
                    "payment_category": deleted.payment_category,
                    "allocations": deleted.allocations,
                }));
            }
            println!("Deleted account: {}", target.name);
            println!("  Transactions removed: {}", deleted.transactions);
            if deleted.payment_category {
                println!(
                    "  Payment category removed with {} allocation(s)",
                    deleted.allocations
                );
            }
        }
    }

    Ok(())
}
