//! Categories command

use anyhow::Result;
use console::style;
use openclaw_backup::{Category, CollectionRule, Priority};

use crate::output;

pub fn run() -> Result<()> {
    output::header("Backup Categories");
    for category in Category::ALL {
        println!(
            "  {:<10} {:<9} {:<17} {}",
            style(category.id()).bold(),
            priority_cell(category.priority()),
            category.label(),
            style(source(category)).dim()
        );
    }
    println!();
    output::info("Use with: openclaw backup --mode selective --include people,knowledge");
    Ok(())
}

fn priority_cell(priority: Priority) -> String {
    let text = format!("{:<9}", priority.to_string());
    match priority {
        Priority::Critical => style(text).red().to_string(),
        Priority::High => style(text).yellow().to_string(),
        Priority::Medium => style(text).to_string(),
    }
}

/// Where a category's files come from, in one line.
fn source(category: Category) -> String {
    match category.rule() {
        CollectionRule::Glob(patterns) => patterns.join(", "),
        CollectionRule::ConfigFiles => "~/.openclaw/{config,settings}.json, openclaw.mjs".to_string(),
        CollectionRule::SessionLogs => "~/.openclaw/agents/<agent>/sessions/**".to_string(),
    }
}
