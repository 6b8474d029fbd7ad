use anyhow::{Context, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use methodmap_core::report::{generate_crawl_report, summarize};
use methodmap_core::sink::{OutputFormat, ResultSink};
use methodmap_scanner::Method;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument::WithSubscriber;
use url::Url;

use crate::logging::{LogLevels, build_dispatch};

// Re-export crawl types and functions from methodmap-core
pub use methodmap_core::crawl::{
    CrawlOptions, CrawlProgressCallback, execute_crawl, extract_url_path,
};

// Helper functions for crawl handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("Either --url or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if let Ok(url) = Url::parse(line)
        && url.has_host()
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("{} Skipping invalid URL '{}'", "⚠".yellow(), line);
    None
}

/// Parse a comma-separated method list such as `GET,head, OPTIONS`.
pub fn parse_methods(list: &str) -> Result<Vec<Method>, String> {
    let methods = list
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::parse::<Method>)
        .collect::<Result<Vec<_>, _>>()?;

    if methods.is_empty() {
        return Err("At least one HTTP method is required".to_string());
    }
    Ok(methods)
}

/// Expand `~` in a user-supplied path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub async fn handle_crawl(
    sub_matches: &ArgMatches,
    quiet: bool,
    verbose: bool,
) -> anyhow::Result<()> {
    let url = sub_matches.get_one::<Url>("url");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let threads = *sub_matches.get_one::<usize>("threads").unwrap_or(&10);
    let max_depth = *sub_matches.get_one::<usize>("max-depth").unwrap_or(&2);
    let timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap_or(&60);
    let progress = sub_matches.get_flag("progress");
    let no_report = sub_matches.get_flag("no-report");

    let methods = sub_matches
        .get_one::<String>("methods")
        .map(|list| parse_methods(list))
        .transpose()
        .map_err(|e| anyhow!(e))?
        .unwrap_or_else(|| Method::ALL.to_vec());

    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| OutputFormat::from_str(f))
        .unwrap_or(OutputFormat::Json);
    let output = expand_path(
        sub_matches
            .get_one::<String>("output")
            .map(String::as_str)
            .unwrap_or("output.json"),
    );
    let log_file = sub_matches
        .get_one::<String>("log-file")
        .map(|p| expand_path(p));

    let urls = load_urls_from_source(url, hosts_file).map_err(|e| anyhow!(e))?;

    let dispatch = build_dispatch(
        log_file.as_deref(),
        LogLevels::from_flags(quiet, verbose, progress),
    )
    .with_context(|| {
        format!(
            "Failed to open log file {}",
            log_file.as_deref().unwrap_or(Path::new("")).display()
        )
    })?;

    if !quiet {
        print_divider();
        println!("{}", "  METHODMAP CRAWL".bright_white().bold());
        print_divider();
        println!("{} Seeds:     {}", "→".blue(), urls.len());
        println!("{} Workers:   {}", "→".blue(), threads);
        println!("{} Max depth: {}", "→".blue(), max_depth);
        let method_names: Vec<&str> = methods.iter().map(Method::as_str).collect();
        println!("{} Methods:   {}", "→".blue(), method_names.join(", "));
        println!();
    }

    let options = CrawlOptions {
        urls,
        threads,
        max_depth,
        methods,
        timeout_secs,
        show_progress_bars: progress && !quiet,
    };

    let progress_callback: CrawlProgressCallback = Arc::new(move |msg: String| {
        if !quiet {
            println!("{}", msg);
        }
    });

    let results = execute_crawl(options, Some(progress_callback))
        .with_subscriber(dispatch.clone())
        .await?;

    let sink = format.sink(&output);
    let saved = tracing::dispatcher::with_default(&dispatch, || sink.write(&results));

    if !quiet {
        let summary = summarize(&results);
        println!();
        println!(
            "{} Crawl complete! {} addresses, {} requests, {} failed",
            "✓".green().bold(),
            summary.addresses,
            summary.requests,
            summary.failed
        );
        if saved.is_ok() {
            println!(
                "{} Results: {}",
                "✓".green().bold(),
                output.display().to_string().bright_white()
            );
        }
        if !no_report {
            println!();
            print!("{}", generate_crawl_report(&results));
        }
    }

    saved.with_context(|| format!("Failed to save results to {}", output.display()))
}
