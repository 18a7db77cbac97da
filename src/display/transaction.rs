//! Transaction display formatting

use crate::models::Transaction;

/// Format one register row; `category` is the resolved category name
pub fn format_transaction_row(txn: &Transaction, category: &str, symbol: &str) -> String {
    let transfer_indicator = if txn.is_transfer() { "⇄ " } else { "" };
    let description = format!("{}{}", transfer_indicator, txn.description);

    format!(
        "{} {:<12} {:<20} {:<20} {:>12}",
        txn.date.format("%Y-%m-%d"),
        txn.id,
        truncate(&description, 20),
        truncate(category, 20),
        txn.amount.format_with_symbol(symbol),
    )
}

/// Format a list of transactions as a register
pub fn format_transaction_register<F>(
    transactions: &[Transaction],
    category_name: F,
    symbol: &str,
) -> String
where
    F: Fn(&Transaction) -> String,
{
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:10} {:<12} {:<20} {:<20} {:>12}\n",
        "Date", "ID", "Description", "Category", "Amount"
    ));
    output.push_str(&"-".repeat(78));
    output.push('\n');

    for txn in transactions {
        output.push_str(&format_transaction_row(txn, &category_name(txn), symbol));
        output.push('\n');
    }

    output
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
