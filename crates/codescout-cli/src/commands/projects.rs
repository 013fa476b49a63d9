//! Projects command implementation.

use super::{Context, GlobalArgs};
use anyhow::Result;
use codescout_core::service::SearchService;
use codescout_core::GroupFilter;
use colored::Colorize;

/// Run the projects command.
pub async fn run(args: &GlobalArgs, refresh: bool, group: Option<String>) -> Result<()> {
    let ctx = Context::open(args).await?;
    if !ctx.service.has_credential() {
        eprintln!("{} No token configured", "✗".red());
        eprintln!("Run 'codescout login --token <token>' first.");
        return Ok(());
    }

    if refresh {
        println!("{} Fetching projects from {}", "→".blue(), ctx.base_url);
    }
    let projects = ctx.service.projects(refresh).await?;
    let filter = GroupFilter::from_parts(Vec::new(), group);
    let shown = filter.select(&projects);

    if shown.is_empty() {
        println!("{} No projects found.", "→".yellow());
        return Ok(());
    }

    println!(
        "{} {} of {} projects:",
        "✓".green(),
        shown.len(),
        projects.len()
    );
    println!();
    for project in shown {
        println!(
            "  {} {}",
            format!("[{}]", project.id).blue(),
            project.path_with_namespace.as_str().yellow()
        );
        println!("    {} {}", "→".dimmed(), project.web_url.dimmed());
    }

    Ok(())
}
