//! Settings command implementation.

use super::{Context, GlobalArgs};
use anyhow::Result;
use codescout_core::service::SearchService;
use codescout_core::{Settings, Throttle};
use colored::Colorize;

/// Requested changes; `None` keeps the saved value.
pub struct SettingsChanges {
    pub concurrency: Option<usize>,
    pub delay: Option<u64>,
    pub inventory_concurrency: Option<usize>,
    pub inventory_delay: Option<u64>,
}

impl SettingsChanges {
    fn is_empty(&self) -> bool {
        self.concurrency.is_none()
            && self.delay.is_none()
            && self.inventory_concurrency.is_none()
            && self.inventory_delay.is_none()
    }

    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(limit) = self.concurrency {
            settings.search.concurrency_limit = limit;
        }
        if let Some(delay) = self.delay {
            settings.search.request_delay_ms = delay;
        }
        if let Some(limit) = self.inventory_concurrency {
            settings.inventory.concurrency_limit = limit;
        }
        if let Some(delay) = self.inventory_delay {
            settings.inventory.request_delay_ms = delay;
        }
        settings
    }
}

/// Run the settings command.
pub async fn run(args: &GlobalArgs, changes: SettingsChanges) -> Result<()> {
    let ctx = Context::open(args).await?;
    let mut settings = ctx.service.settings().await?;

    if !changes.is_empty() {
        match ctx.service.update_settings(changes.apply(settings)).await {
            Ok(saved) => {
                settings = saved;
                println!("{} Settings saved", "✓".green());
            }
            Err(e) => {
                eprintln!("{} {}", "✗".red(), e);
                return Ok(());
            }
        }
    }

    println!("{} Settings", "→".blue());
    println!();
    println!("  Instance: {}", ctx.base_url);
    println!(
        "  Token: {}",
        if ctx.service.has_credential() {
            "configured".green()
        } else {
            "missing".red()
        }
    );
    print_throttle("Search", &settings.search);
    print_throttle("Inventory", &settings.inventory);

    Ok(())
}

fn print_throttle(label: &str, throttle: &Throttle) {
    println!(
        "  {}: {} concurrent, {} ms delay",
        label,
        throttle.concurrency_limit.to_string().green(),
        throttle.request_delay_ms
    );
}
