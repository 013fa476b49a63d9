//! Login command implementation.

use super::{Context, GlobalArgs};
use anyhow::Result;
use codescout_core::service::SearchService;
use codescout_core::settings::save_base_url;
use codescout_core::Credential;
use colored::Colorize;

/// Run the login command.
pub async fn run(args: &GlobalArgs) -> Result<()> {
    let Some(token) = args.token.as_deref().filter(|t| !t.trim().is_empty()) else {
        eprintln!("{} No token given", "✗".red());
        eprintln!("Pass one with --token or the CODESCOUT_TOKEN environment variable.");
        return Ok(());
    };

    let ctx = Context::open(args).await?;

    if args.base_url.is_some() {
        save_base_url(&*ctx.storage, &ctx.base_url).await?;
        println!("{} Instance: {}", "→".blue(), ctx.base_url.cyan());
    }

    let credential = Credential::new(token);
    let fingerprint = credential.id();
    let evicted = ctx.service.set_credential(credential).await?;
    println!("{} Token saved ({})", "✓".green(), fingerprint.short().dimmed());
    if evicted > 0 {
        println!(
            "  {} Dropped {} cached entries of other tokens",
            "•".dimmed(),
            evicted
        );
    }

    // Verify the token by fetching its groups; this also warms the cache
    match ctx.service.groups(true).await {
        Ok(groups) => println!(
            "{} {} groups visible",
            "✓".green(),
            groups.len().to_string().green()
        ),
        Err(e) => eprintln!("{} Token check failed: {}", "✗".red(), e),
    }

    Ok(())
}
