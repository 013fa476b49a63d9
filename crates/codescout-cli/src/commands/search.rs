//! Search command implementation.

use super::{Context, GlobalArgs};
use anyhow::Result;
use codescout_core::results::{filter_or_all, project_stats, ProjectStats};
use codescout_core::service::{ResultPage, ResultQuery, SearchRequest, SearchService, StatsExporter};
use codescout_core::{CodeMatch, RunStatus, SearchRun};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;

/// Snippet lines shown per match before eliding.
const PREVIEW_LINES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    fn render(self, stats: &[ProjectStats]) -> codescout_core::Result<String> {
        match self {
            ExportFormat::Csv => StatsExporter::to_csv(stats),
            ExportFormat::Json => StatsExporter::to_json(stats),
        }
    }
}

/// Search flags besides the query itself.
pub struct SearchOptions {
    pub literal: bool,
    pub git_ref: Option<String>,
    pub group: Option<String>,
    pub group_ids: Vec<u64>,
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub page: usize,
    pub page_size: usize,
    pub stats: bool,
    pub export: Option<PathBuf>,
    pub format: ExportFormat,
}

impl SearchOptions {
    fn request(&self, query: String) -> SearchRequest {
        SearchRequest {
            query,
            git_ref: self.git_ref.clone(),
            group_ids: self.group_ids.clone(),
            group_path: self.group.clone(),
            raw: self.literal,
        }
    }

    fn result_query(&self) -> ResultQuery {
        ResultQuery {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            page: Some(self.page),
            page_size: Some(self.page_size),
        }
    }
}

/// Run the search command.
pub async fn run(args: &GlobalArgs, query: String, options: SearchOptions) -> Result<()> {
    let ctx = Context::open(args).await?;
    let request = options.request(query);
    let params = request.to_parameters();

    println!("{} Searching for: {}", "→".blue(), params.keyword.yellow());
    if let Some(ref git_ref) = params.git_ref {
        println!("  {} ref: {}", "•".dimmed(), git_ref.cyan());
    }
    if params.group_filter.is_set() {
        println!("  {} groups: {:?}", "•".dimmed(), params.group_filter);
    }
    println!();

    let mut updates = ctx.service.progress_updates();
    let started = match ctx.service.start_search(request).await {
        Ok(run) => run,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            return Ok(());
        }
    };

    // Follow this run's progress until it ends
    loop {
        let progress = updates.borrow_and_update().clone();
        if progress.generation == started.generation {
            eprint!(
                "\r  {} {}/{} projects, {} matches",
                "•".dimmed(),
                progress.projects_searched,
                progress.projects_total,
                progress.result_count
            );
            std::io::stderr().flush()?;
            if progress.status.is_terminal() {
                eprintln!();
                break;
            }
        }
        if updates.changed().await.is_err() {
            break;
        }
    }

    let run = ctx.service.current_run();
    print_summary(&run);
    print_page(&run, &options);

    if options.stats || options.export.is_some() {
        let (filtered, _) = filter_or_all(
            &run.results,
            options.include.as_deref(),
            options.exclude.as_deref(),
        );
        let stats = project_stats(filtered);

        if options.stats {
            println!("{} Matches per project:", "→".blue());
            for row in &stats {
                println!(
                    "  {} {} ({} files)",
                    format!("[{}]", row.index).blue(),
                    row.project_name.as_str().yellow(),
                    row.files.len()
                );
                println!("    {} {}", "→".dimmed(), row.project_link.dimmed());
            }
            println!();
        }

        if let Some(path) = &options.export {
            std::fs::write(path, options.format.render(&stats)?)?;
            println!(
                "{} Exported {} projects to {}",
                "✓".green(),
                stats.len(),
                path.display()
            );
        }
    }

    Ok(())
}

fn print_summary(run: &SearchRun) {
    match run.status {
        RunStatus::Completed => println!(
            "{} {}: {} matches in {} projects",
            "✓".green(),
            run.message,
            run.results.len().to_string().green(),
            run.projects_total
        ),
        _ => println!("{} {}", "✗".red(), run.message),
    }
    println!();
}

fn print_page(run: &SearchRun, options: &SearchOptions) {
    let page = ResultPage::from_run(run, &options.result_query());

    if let Some(ref error) = page.filter_error {
        eprintln!("{} {}: {}", "✗".red(), page.progress.message, error);
        eprintln!("Showing unfiltered results.");
        println!();
    }
    if page.items.is_empty() {
        if page.filtered_results > 0 {
            println!("{} Page {} is empty.", "→".yellow(), page.page);
        } else {
            println!("{} No results found.", "→".yellow());
        }
        return;
    }

    let first = (page.page - 1) * page.page_size;
    for (i, item) in page.items.iter().enumerate() {
        print_match(first + i + 1, item);
    }

    let pages = page.filtered_results.div_ceil(page.page_size);
    println!(
        "{} Page {} of {} ({} results)",
        "→".blue(),
        page.page,
        pages,
        page.filtered_results
    );
    println!();
}

fn print_match(number: usize, item: &CodeMatch) {
    println!(
        "{} {}",
        format!("[{}]", number).blue(),
        item.display_path.as_str().yellow()
    );
    println!("    {} {}", "→".dimmed(), item.file_link().dimmed());
    println!();

    for (line_no, line) in item.numbered_lines().take(PREVIEW_LINES) {
        println!("    {} {}", format!("{:>5}", line_no).dimmed(), line);
    }
    if item.line_count > PREVIEW_LINES {
        println!(
            "    {} ({} more lines)",
            "...".dimmed(),
            item.line_count - PREVIEW_LINES
        );
    }
    println!();
}
