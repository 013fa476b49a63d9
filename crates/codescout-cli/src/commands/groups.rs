//! Groups command implementation.

use super::{Context, GlobalArgs};
use anyhow::Result;
use codescout_core::service::SearchService;
use colored::Colorize;

/// Run the groups command.
pub async fn run(args: &GlobalArgs, refresh: bool) -> Result<()> {
    let ctx = Context::open(args).await?;
    if !ctx.service.has_credential() {
        eprintln!("{} No token configured", "✗".red());
        eprintln!("Run 'codescout login --token <token>' first.");
        return Ok(());
    }

    if refresh {
        println!("{} Fetching groups from {}", "→".blue(), ctx.base_url);
    }
    let groups = ctx.service.groups(refresh).await?;

    if groups.is_empty() {
        println!("{} No groups found.", "→".yellow());
        return Ok(());
    }

    println!("{} {} groups:", "✓".green(), groups.len());
    println!();
    for group in &groups {
        println!(
            "  {} {}",
            format!("[{}]", group.id).blue(),
            group.full_path.as_str().yellow()
        );
    }

    Ok(())
}
