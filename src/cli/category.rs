//! Category CLI commands
//!
//! Implements CLI commands for category and category group management.

use clap::Subcommand;

use super::{print_json, CliContext};
use crate::display::format_category_tree;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::services::CategoryService;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List all categories (organized by group)
    List,

    /// Create a new category
    #[command(alias = "create")]
    Add {
        /// Category name
        name: String,
        /// Category group name or ID
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Create a new category group
    Group {
        /// Group name
        name: String,
    },

    /// Delete a category
    Delete {
        /// Category name or ID
        category: String,
    },
}

/// Handle a category command
pub fn handle_category_command(ctx: &CliContext<'_>, cmd: CategoryCommands) -> EnvelopeResult<()> {
    let service = CategoryService::new(ctx.storage);

    match cmd {
        CategoryCommands::List => {
            let groups = service.list_groups()?;
            let categories = service.list_categories()?;
            if ctx.json {
                return print_json(&serde_json::json!({
                    "groups": groups,
                    "categories": categories,
                }));
            }
            print!("{}", format_category_tree(&groups, &categories));
        }

        CategoryCommands::Add { name, group } => {
            let group = match group {
                Some(g) => Some(
                    service
                        .find_group(&g)?
                        .ok_or_else(|| EnvelopeError::group_not_found(&g))?,
                ),
                None => None,
            };

            let category = service.create_category(&name, group.as_ref().map(|g| g.id))?;

            if ctx.json {
                return print_json(&category);
            }
            match group {
                Some(g) => println!("Created category: {} (in {})", category.name, g.name),
                None => println!("Created category: {}", category.name),
            }
            println!("  ID: {}", category.id);
        }

        CategoryCommands::Group { name } => {
            let group = service.create_group(&name)?;

            if ctx.json {
                return print_json(&group);
            }
            println!("Created category group: {}", group.name);
            println!("  ID: {}", group.id);
        }

        CategoryCommands::Delete { category } => {
            let target = ctx.category(&category)?;
            service.delete_category(target.id)?;

            if ctx.json {
                return print_json(&serde_json::json!({ "deleted": target.id }));
            }
            println!("Deleted category: {}", target.name);
        }
    }

    Ok(())
}
