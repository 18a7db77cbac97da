//! Category and budget summary formatting

use crate::models::{Category, CategoryGroup, Money};
use crate::services::CategorySummary;

/// Format categories under their groups
pub fn format_category_tree(groups: &[CategoryGroup], categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories found.\n".to_string();
    }

    let mut output = String::new();
    for group in groups {
        let members: Vec<_> = categories
            .iter()
            .filter(|c| c.group_id == Some(group.id))
            .collect();
        output.push_str(&format!("{}\n", group.name));
        for category in members {
            output.push_str(&format!("  {:<30} {}\n", category.name, category.id));
        }
    }

    let ungrouped: Vec<_> = categories
        .iter()
        .filter(|c| !c.is_payment_category())
        .filter(|c| match c.group_id {
            None => true,
            Some(id) => !groups.iter().any(|g| g.id == id),
        })
        .collect();
    if !ungrouped.is_empty() {
        output.push_str("(ungrouped)\n");
        for category in ungrouped {
            output.push_str(&format!("  {:<30} {}\n", category.name, category.id));
        }
    }

    let payment: Vec<_> = categories.iter().filter(|c| c.is_payment_category()).collect();
    if !payment.is_empty() {
        output.push_str("Credit Card Payments\n");
        for category in payment {
            output.push_str(&format!("  {:<30} {}\n", category.name, category.id));
        }
    }

    output
}

/// Format the allocation summary for a period
pub fn format_budget_summary(
    rows: &[CategorySummary],
    ready_to_assign: Money,
    symbol: &str,
) -> String {
    let name_width = rows
        .iter()
        .map(|r| r.category.name.len())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "Ready to Assign: {}\n\n",
        ready_to_assign.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "{:<name_width$}  {:>12}  {:>12}  {:>12}\n",
        "Category",
        "Allocated",
        "Activity",
        "Available",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:->12}  {:->12}  {:->12}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for row in rows {
        let allocated = row.allocation.as_ref().map(|a| a.amount).unwrap_or_default();
        let flag = if row.available.is_negative() {
            "  overspent"
        } else {
            ""
        };
        output.push_str(&format!(
            "{:<name_width$}  {:>12}  {:>12}  {:>12}{}\n",
            row.category.name,
            allocated.format_with_symbol(symbol),
            row.activity.format_with_symbol(symbol),
            row.available.format_with_symbol(symbol),
            flag,
            name_width = name_width,
        ));

        if let Some(underfunded) = row.underfunded {
            let names = row
                .underfunded_categories
                .as_deref()
                .unwrap_or_default()
                .join(", ");
            output.push_str(&format!(
                "{:<name_width$}  underfunded by {} ({})\n",
                "",
                underfunded.format_with_symbol(symbol),
                names,
                name_width = name_width,
            ));
        }
    }

    output
}
