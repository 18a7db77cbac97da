//! Budget CLI commands
//!
//! Allocation, the per-period summary, Ready-to-Assign and covering an
//! underfunded credit card payment category.

use clap::Subcommand;

use super::{parse_amount, parse_period, print_json, CliContext};
use crate::display::format_budget_summary;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::services::BudgetService;

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set a category's allocation for a period
    Assign {
        /// Category name or ID
        category: String,
        /// Amount (e.g., "100" or "100.00")
        amount: String,
        /// Budget period (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Add to (or with a negative amount, take from) a category's allocation
    Add {
        /// Category name or ID
        category: String,
        /// Amount to add
        #[arg(allow_negative_numbers = true)]
        amount: String,
        /// Budget period (YYYY-MM)
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Attach notes to a category's allocation
    Notes {
        /// Category name or ID
        category: String,
        /// Note text
        notes: String,
        /// Budget period (YYYY-MM)
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Show every category's allocation, activity and availability
    #[command(alias = "overview")]
    Summary {
        /// Budget period (YYYY-MM)
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Show money not yet assigned to any category
    Rta {
        /// Budget period (YYYY-MM)
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Show why a payment category is underfunded
    Underfunded {
        /// Payment category (credit account name) or ID
        category: String,
    },

    /// Fund a payment category's shortfall from Ready to Assign
    Cover {
        /// Payment category (credit account name) or ID
        category: String,
        /// Budget period (YYYY-MM)
        #[arg(short, long)]
        period: Option<String>,
    },
}

/// Handle a budget command
pub fn handle_budget_command(ctx: &CliContext<'_>, cmd: BudgetCommands) -> EnvelopeResult<()> {
    let service = BudgetService::new(ctx.storage);
    let symbol = ctx.symbol();

    match cmd {
        BudgetCommands::Assign {
            category,
            amount,
            period,
        } => {
            let category = ctx.category(&category)?;
            let period = parse_period(period.as_deref())?;
            let amount = parse_amount(&amount)?;

            let allocation = service.assign(category.id, period, amount)?;

            if ctx.json {
                return print_json(&allocation);
            }
            println!(
                "Assigned {} to {} for {}",
                allocation.amount.format_with_symbol(symbol),
                category.name,
                period
            );
            println!(
                "Ready to Assign: {}",
                service.ready_to_assign(period)?.format_with_symbol(symbol)
            );
        }

        BudgetCommands::Add {
            category,
            amount,
            period,
        } => {
            let category = ctx.category(&category)?;
            let period = parse_period(period.as_deref())?;
            let amount = parse_amount(&amount)?;

            let allocation = service.add_to_category(category.id, period, amount)?;

            if ctx.json {
                return print_json(&allocation);
            }
            println!(
                "{} allocation for {}: {}",
                category.name,
                period,
                allocation.amount.format_with_symbol(symbol)
            );
            println!(
                "Ready to Assign: {}",
                service.ready_to_assign(period)?.format_with_symbol(symbol)
            );
        }

        BudgetCommands::Notes {
            category,
            notes,
            period,
        } => {
            let category = ctx.category(&category)?;
            let period = parse_period(period.as_deref())?;

            let allocation = service.set_notes(category.id, period, &notes)?;

            if ctx.json {
                return print_json(&allocation);
            }
            println!("Saved notes for {} ({})", category.name, period);
        }

        BudgetCommands::Summary { period } => {
            let period = parse_period(period.as_deref())?;
            let rows = service.allocation_summary(period)?;
            let ready_to_assign = service.ready_to_assign(period)?;

            if ctx.json {
                return print_json(&serde_json::json!({
                    "period": period,
                    "ready_to_assign": ready_to_assign,
                    "categories": rows,
                }));
            }
            println!("Budget for {}", period);
            println!("{}", "=".repeat(60));
            print!("{}", format_budget_summary(&rows, ready_to_assign, symbol));
        }

        BudgetCommands::Rta { period } => {
            let period = parse_period(period.as_deref())?;
            let ready_to_assign = service.ready_to_assign(period)?;

            if ctx.json {
                return print_json(&serde_json::json!({
                    "period": period,
                    "ready_to_assign": ready_to_assign,
                }));
            }
            println!("{}", ready_to_assign.format_with_symbol(symbol));
        }

        BudgetCommands::Underfunded { category } => {
            let category = ctx.category(&category)?;
            let report = service
                .underfunded(category.id)?
                .ok_or_else(|| EnvelopeError::NotAPaymentCategory(category.name.clone()))?;

            if ctx.json {
                return print_json(&report);
            }
            println!("{}", category.name);
            println!("  Debt:              {}", report.debt.format_with_symbol(symbol));
            println!(
                "  Card spending:     {}",
                report.total_spending.format_with_symbol(symbol)
            );
            println!(
                "  Unbudgeted:        {}",
                report.unbudgeted_debt.format_with_symbol(symbol)
            );
            println!(
                "  Payment available: {}",
                report.payment_available.format_with_symbol(symbol)
            );
            println!(
                "  Underfunded:       {}",
                report.underfunded.format_with_symbol(symbol)
            );
            for id in report.responsible_categories() {
                let name = ctx
                    .storage
                    .categories
                    .get_category(id)?
                    .map(|c| c.name)
                    .unwrap_or_else(|| id.to_string());
                println!("    from {}", name);
            }
        }

        BudgetCommands::Cover { category, period } => {
            let category = ctx.category(&category)?;
            let period = parse_period(period.as_deref())?;

            let result = service.cover_underfunded(category.id, period)?;

            if ctx.json {
                return print_json(&result);
            }
            println!(
                "Covered {} for {} ({})",
                result.covered_amount.format_with_symbol(symbol),
                category.name,
                period
            );
            println!(
                "Ready to Assign: {}",
                result.ready_to_assign_after.format_with_symbol(symbol)
            );
        }
    }

    Ok(())
}
