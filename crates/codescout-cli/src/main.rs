//! CodeScout CLI
//!
//! Command-line interface for searching code across every project a GitLab
//! access token can see.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::search::ExportFormat;
use commands::{CacheAction, GlobalArgs};

#[derive(Parser)]
#[command(name = "codescout")]
#[command(author, version, about = "Search code across GitLab groups and projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database path
    #[arg(short, long, global = true, default_value = ".codescout/cache.db")]
    database: PathBuf,

    /// GitLab instance URL
    #[arg(long, global = true, env = "CODESCOUT_BASE_URL")]
    base_url: Option<String>,

    /// Personal access token (overrides the saved one)
    #[arg(long, global = true, env = "CODESCOUT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Save the token given with --token and drop cached data of other tokens
    Login,

    /// List groups visible to the token
    Groups {
        /// Bypass the cache
        #[arg(long)]
        refresh: bool,
    },

    /// List projects of every visible group
    Projects {
        /// Bypass the cache
        #[arg(long)]
        refresh: bool,

        /// Only show projects whose group path contains this text
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Search code across projects
    Search {
        /// Keyword, optionally with ref:, group: and group_id: filters
        query: String,

        /// Search for the query text as typed, without inline filters
        #[arg(long)]
        literal: bool,

        /// Branch or tag to search
        #[arg(short, long = "ref")]
        git_ref: Option<String>,

        /// Only search groups whose path contains this text
        #[arg(short, long)]
        group: Option<String>,

        /// Only search these group ids
        #[arg(long = "group-id")]
        group_ids: Vec<u64>,

        /// Comma-separated globs a result path must match
        #[arg(short, long)]
        include: Option<String>,

        /// Comma-separated globs that drop a result path
        #[arg(short, long)]
        exclude: Option<String>,

        /// Result page to show
        #[arg(long, default_value = "1")]
        page: usize,

        /// Results per page
        #[arg(long, default_value = "10")]
        page_size: usize,

        /// Show matched files per project
        #[arg(long)]
        stats: bool,

        /// Write per-project statistics to a file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Format of the exported statistics
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },

    /// Show or change throttling settings
    Settings {
        /// Concurrent project searches (1-20)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Delay after each project search in ms (0-5000)
        #[arg(long)]
        delay: Option<u64>,

        /// Concurrent group listings (1-20)
        #[arg(long)]
        inventory_concurrency: Option<usize>,

        /// Delay after each group listing in ms (0-5000)
        #[arg(long)]
        inventory_delay: Option<u64>,
    },

    /// Maintain the inventory cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("codescout=debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("codescout=info")
            .with_writer(std::io::stderr)
            .init();
    }

    let global = GlobalArgs {
        database: cli.database,
        base_url: cli.base_url,
        token: cli.token,
    };

    match cli.command {
        Commands::Login => {
            commands::login::run(&global).await?;
        }
        Commands::Groups { refresh } => {
            commands::groups::run(&global, refresh).await?;
        }
        Commands::Projects { refresh, group } => {
            commands::projects::run(&global, refresh, group).await?;
        }
        Commands::Search {
            query,
            literal,
            git_ref,
            group,
            group_ids,
            include,
            exclude,
            page,
            page_size,
            stats,
            export,
            format,
        } => {
            let options = commands::search::SearchOptions {
                literal,
                git_ref,
                group,
                group_ids,
                include,
                exclude,
                page,
                page_size,
                stats,
                export,
                format,
            };
            commands::search::run(&global, query, options).await?;
        }
        Commands::Settings {
            concurrency,
            delay,
            inventory_concurrency,
            inventory_delay,
        } => {
            let changes = commands::settings::SettingsChanges {
                concurrency,
                delay,
                inventory_concurrency,
                inventory_delay,
            };
            commands::settings::run(&global, changes).await?;
        }
        Commands::Cache { action } => {
            commands::cache::run(&global, action).await?;
        }
    }

    Ok(())
}
