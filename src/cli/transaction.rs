//! Transaction CLI commands
//!
//! Implements CLI commands for transaction management.

use clap::Subcommand;

use super::{parse_amount, parse_date, print_json, CliContext};
use crate::display::format_transaction_register;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::models::Transaction;
use crate::services::{CreateTransactionInput, TransactionService, UpdateTransactionInput};

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Add a new transaction
    Add {
        /// Account name or ID
        account: String,
        /// Amount (e.g., "-50.00" for outflow, "100.00" for inflow)
        #[arg(allow_negative_numbers = true)]
        amount: String,
        /// Category name or ID (required for outflows)
        #[arg(short, long)]
        category: Option<String>,
        /// Transaction date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Description
        #[arg(short = 'm', long)]
        description: Option<String>,
        /// External id used to skip duplicate imports
        #[arg(long)]
        import_id: Option<String>,
        /// Record as a transfer with this account
        #[arg(long)]
        transfer: Option<String>,
    },
    /// List transactions
    List {
        /// Filter by account
        #[arg(short, long)]
        account: Option<String>,
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Edit a transaction
    Edit {
        /// Transaction ID
        id: String,
        /// New amount
        #[arg(short, long, allow_negative_numbers = true)]
        amount: Option<String>,
        /// New category name or ID
        #[arg(short, long)]
        category: Option<String>,
        /// Remove the category
        #[arg(long, conflicts_with = "category")]
        uncategorize: bool,
        /// New date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
        /// New description
        #[arg(short = 'm', long)]
        description: Option<String>,
    },
    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },
}

/// Handle a transaction command
pub fn handle_transaction_command(
    ctx: &CliContext<'_>,
    cmd: TransactionCommands,
) -> EnvelopeResult<()> {
    let service = TransactionService::new(ctx.storage);

    match cmd {
        TransactionCommands::Add {
            account,
            amount,
            category,
            date,
            description,
            import_id,
            transfer,
        } => {
            let account = ctx.account(&account)?;
            let mut input = CreateTransactionInput::new(
                account.id,
                parse_amount(&amount)?,
                parse_date(date.as_deref())?,
            );
            if let Some(category) = category {
                input = input.category(ctx.category(&category)?.id);
            }
            if let Some(description) = description {
                input = input.description(description);
            }
            if let Some(import_id) = import_id {
                input = input.import_id(import_id);
            }
            if let Some(other) = transfer {
                input = input.transfer_with(ctx.account(&other)?.id);
            }

            let txn = service.create(input)?;

            if ctx.json {
                return print_json(&txn);
            }
            println!(
                "Recorded {} on {} ({})",
                txn.amount.format_with_symbol(ctx.symbol()),
                account.name,
                txn.date
            );
            println!("  ID: {}", txn.id);
        }

        TransactionCommands::List {
            account,
            category,
            limit,
        } => {
            let mut transactions = match (account, category) {
                (Some(a), _) => {
                    let account_id = ctx.account(&a)?.id;
                    service.list_for_account(account_id)?
                }
                (None, Some(c)) => service.list_for_category(ctx.category(&c)?.id)?,
                (None, None) => service.list()?,
            };
            transactions.truncate(limit);

            if ctx.json {
                return print_json(&transactions);
            }
            let category_name = |txn: &Transaction| {
                txn.category_id
                    .and_then(|id| ctx.storage.categories.get_category(id).ok().flatten())
                    .map(|c| c.name)
                    .unwrap_or_default()
            };
            print!(
                "{}",
                format_transaction_register(&transactions, category_name, ctx.symbol())
            );
        }

        TransactionCommands::Edit {
            id,
            amount,
            category,
            uncategorize,
            date,
            description,
        } => {
            let txn = find_transaction(&service, &id)?;

            let mut input = UpdateTransactionInput {
                description,
                ..Default::default()
            };
            if let Some(amount) = amount {
                input.amount = Some(parse_amount(&amount)?);
            }
            if let Some(date) = date {
                input.date = Some(parse_date(Some(&date))?);
            }
            if let Some(category) = category {
                input.category_id = Some(Some(ctx.category(&category)?.id));
            } else if uncategorize {
                input.category_id = Some(None);
            }

            let updated = service.update(txn.id, input)?;

            if ctx.json {
                return print_json(&updated);
            }
            println!("Updated transaction {}", updated.id);
        }

        TransactionCommands::Delete { id } => {
            let txn = find_transaction(&service, &id)?;
            let deleted = service.delete(txn.id)?;

            if ctx.json {
                return print_json(&deleted);
            }
            println!(
                "Deleted transaction {} ({})",
                deleted.id,
                deleted.amount.format_with_symbol(ctx.symbol())
            );
        }
    }

    Ok(())
}

fn find_transaction(service: &TransactionService<'_>, id: &str) -> EnvelopeResult<Transaction> {
    service
        .find(id)?
        .ok_or_else(|| EnvelopeError::transaction_not_found(id))
}
