//! Account display formatting

use crate::models::{Account, Money};

/// Format accounts as a table with a total row
pub fn format_account_list(accounts: &[Account], symbol: &str) -> String {
    if accounts.is_empty() {
        return "No accounts found.\n".to_string();
    }

    let name_width = accounts
        .iter()
        .map(|a| a.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<11}  {:>14}  {}\n",
        "Name",
        "Type",
        "Balance",
        "ID",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<11}  {:->14}  {:-<12}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for account in accounts {
        output.push_str(&format!(
            "{:<name_width$}  {:<11}  {:>14}  {}\n",
            account.name,
            account.account_type.to_string(),
            account.balance.format_with_symbol(symbol),
            account.id,
            name_width = name_width,
        ));
    }

    let total: Money = accounts.iter().map(|a| a.balance).sum();
    output.push_str(&format!(
        "{:<name_width$}  {:<11}  {:>14}\n",
        "Total",
        "",
        total.format_with_symbol(symbol),
        name_width = name_width,
    ));

    output
}
