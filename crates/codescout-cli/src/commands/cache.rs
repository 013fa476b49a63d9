//! Cache command implementation.

use super::{CacheAction, Context, GlobalArgs};
use anyhow::Result;
use codescout_core::service::SearchService;
use colored::Colorize;

/// Run the cache command.
pub async fn run(args: &GlobalArgs, action: CacheAction) -> Result<()> {
    let ctx = Context::open(args).await?;

    match action {
        CacheAction::Evict => {
            if !ctx.service.has_credential() {
                eprintln!("{} No token configured", "✗".red());
                return Ok(());
            }
            let evicted = ctx.service.set_credential(ctx.service.credential()).await?;
            println!(
                "{} Removed {} entries of other tokens",
                "✓".green(),
                evicted
            );
        }
        CacheAction::Clear => {
            ctx.service.clear_cache().await?;
            println!("{} Cache cleared", "✓".green());
        }
    }

    Ok(())
}
