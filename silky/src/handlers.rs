use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use silky_core::CoreError;
use silky_core::crawl::{CrawlOptions, HostLimits, execute_crawl};
use silky_core::export::{
    export_bundle, export_image_metadata, export_images, export_urls, import_bundle_file,
};
use silky_core::handoff::spawn_worker;
use silky_core::notify::{CrawlSummary, WebhookNotifier, notify_best_effort};
use silky_core::report::{ReportFormat, generate_full_report, generate_json_report, save_report};
use silky_core::search::search_records;
use silky_scanner::{ResultBundle, Termination};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;
use url::Url;

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
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| parse_url_line(line.trim()))
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("⚠️  Skipping invalid URL '{}'", line);
    None
}

/// Maps `-q` and the `-v` count onto a tracing level.
pub fn log_level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn init_tracing(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Builds crawl options from the `crawl` subcommand's arguments.
pub fn crawl_options_from_matches(args: &ArgMatches) -> Result<CrawlOptions, String> {
    let url = args.get_one::<Url>("url");
    let hosts_file = args.get_one::<PathBuf>("hosts-file");
    let urls = load_urls_from_source(url, hosts_file)?;
    let text = |id: &str| args.get_one::<String>(id).cloned();

    Ok(CrawlOptions {
        urls,
        workers: *args.get_one::<usize>("workers").unwrap_or(&1),
        max_depth: *args.get_one::<usize>("depth").unwrap_or(&0),
        max_pages: *args.get_one::<usize>("pages").unwrap_or(&0),
        stop_on_url: text("stop-on-url"),
        site_only: args.get_flag("site-only"),
        include_pattern: text("include"),
        exclude_pattern: text("exclude"),
        forced_domain: text("forced-domain"),
        file_types: text("file-types"),
        content_filter: text("filter"),
        image_only: args.get_flag("image-only"),
        cookies: text("cookies"),
        timeout_secs: args.get_one::<u64>("timeout").copied(),
        page_timeout_secs: *args.get_one::<u64>("page-timeout").unwrap_or(&15),
        show_progress_bars: false,
    })
}

/// Short label for the crawl target used in reports and notifications.
pub fn target_label(urls: &[String]) -> String {
    match urls {
        [single] => single.clone(),
        _ => format!("{} hosts", urls.len()),
    }
}

pub fn print_banner() {
    println!(
        "{} {}",
        "silky".bright_magenta().bold(),
        format!("v{} - target-seeking web crawler", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub async fn handle_crawl(args: &ArgMatches, quiet: bool) -> Result<()> {
    let mut options = crawl_options_from_matches(args).map_err(anyhow::Error::msg)?;
    let on_worker_thread = args.get_flag("worker-thread");
    if on_worker_thread {
        options = HostLimits::default().clamp(options);
    }
    options.show_progress_bars = !quiet && !on_worker_thread;

    let target = target_label(&options.urls);
    let image_only = options.image_only;

    if !quiet {
        print_crawl_configuration(&options);
    }

    let (bundle, termination) = if on_worker_thread {
        let limit = options.timeout_secs.unwrap_or(HostLimits::default().timeout_seconds);
        let worker = spawn_worker(options, Duration::from_secs(limit + 5))?;
        let outcome = worker.receive().await?;
        if outcome.timed_out && !quiet {
            println!(
                "{} Worker hit its time limit; showing partial results",
                "⚠".yellow().bold()
            );
        }
        (outcome.bundle, outcome.termination)
    } else {
        let outcome = execute_crawl(options, None, None)
            .await
            .context("Crawl failed")?;
        (outcome.bundle, outcome.termination)
    };

    if !quiet {
        print_crawl_summary(&bundle, termination);
    }

    let report = emit_report(&target, &bundle, image_only, args)?;
    run_exports(&bundle, args)?;

    if let Some(webhook) = args.get_one::<String>("webhook") {
        let notifier = WebhookNotifier::new(webhook)?;
        let summary = CrawlSummary::from_bundle(&target, &bundle, image_only);
        let full_report = match report {
            Some(text) => text,
            None => generate_full_report(&target, &bundle, image_only),
        };
        if notify_best_effort(&notifier, &summary, Some(&full_report)).await && !quiet {
            println!("{} Webhook notified", "✓".green().bold());
        }
    }

    Ok(())
}

pub async fn handle_import(args: &ArgMatches, quiet: bool) -> Result<()> {
    let file = args
        .get_one::<PathBuf>("FILE")
        .context("No bundle file given")?;
    let path = expand_path(&file.to_string_lossy());
    let bundle = import_bundle_file(&path)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    if !quiet {
        println!(
            "{} Imported {} record(s) from {}",
            "✓".green().bold(),
            bundle.data.len(),
            path.display().to_string().bright_white()
        );
    }

    if let Some(query) = args.get_one::<String>("search") {
        print_search_results(&bundle, query, report_format(args))?;
    } else {
        let target = path.display().to_string();
        let image_only = bundle.pages().next().is_none() && bundle.images().next().is_some();
        emit_report(&target, &bundle, image_only, args)?;
    }

    run_exports(&bundle, args)?;
    Ok(())
}

fn report_format(args: &ArgMatches) -> ReportFormat {
    args.get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text)
}

/// Renders the report to `--output` or stdout. Returns the text report when one was built.
fn emit_report(
    target: &str,
    bundle: &ResultBundle,
    image_only: bool,
    args: &ArgMatches,
) -> Result<Option<String>> {
    let (content, text_report) = match report_format(args) {
        ReportFormat::Json => (generate_json_report(target, bundle)?, None),
        ReportFormat::Text => {
            let report = generate_full_report(target, bundle, image_only);
            (report.clone(), Some(report))
        }
    };

    match args.get_one::<String>("output") {
        Some(output) => {
            let path = expand_path(output);
            save_report(&content, &path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", content),
    }

    Ok(text_report)
}

fn run_exports(bundle: &ResultBundle, args: &ArgMatches) -> Result<()> {
    if let Some(raw) = args.get_one::<String>("export-links") {
        let path = expand_path(raw);
        report_export("links", &path, export_urls(&bundle.data, &path))?;
    }
    if let Some(raw) = args.get_one::<String>("export-images") {
        let path = expand_path(raw);
        report_export("image URLs", &path, export_images(&bundle.data, &path))?;
    }
    if let Some(raw) = args.get_one::<String>("export-image-metadata") {
        let path = expand_path(raw);
        report_export(
            "image metadata entries",
            &path,
            export_image_metadata(&bundle.data, &path),
        )?;
    }
    if let Some(raw) = args.get_one::<String>("export-bundle") {
        let path = expand_path(raw);
        let written = export_bundle(bundle, &path).map(|()| bundle.data.len());
        report_export("records", &path, written)?;
    }
    Ok(())
}

fn report_export(what: &str, path: &Path, result: silky_core::error::Result<usize>) -> Result<()> {
    match result {
        Ok(count) => {
            println!(
                "{} Exported {} {} to {}",
                "✓".green().bold(),
                count,
                what,
                path.display().to_string().bright_white()
            );
            Ok(())
        }
        Err(CoreError::NothingToExport(reason)) => {
            println!("{} {}", "→".yellow(), reason);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_search_results(bundle: &ResultBundle, query: &str, format: ReportFormat) -> Result<()> {
    let hits = search_records(&bundle.data, query);

    if format == ReportFormat::Json {
        let results: Vec<serde_json::Value> = hits
            .iter()
            .map(|hit| {
                serde_json::json!({
                    "score": hit.score,
                    "url": hit.record.url(),
                    "depth": hit.record.depth(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    print_divider();
    println!(
        "{}",
        format!("  SEARCH RESULTS FOR '{}'", query).bright_white().bold()
    );
    print_divider();

    if hits.is_empty() {
        println!("No matches found.");
        return Ok(());
    }

    for hit in &hits {
        let title = hit
            .record
            .as_page()
            .map(|page| page.title.as_str())
            .filter(|title| !title.is_empty())
            .unwrap_or("No title");
        println!(
            "{:>4}  {}  {}",
            hit.score.to_string().cyan(),
            hit.record.url().bright_white(),
            title.dimmed()
        );
    }
    println!();
    println!("{} match(es)", hits.len());
    Ok(())
}

fn print_crawl_configuration(options: &CrawlOptions) {
    println!("\n🕷️  Crawling {} host(s)", options.urls.len());
    println!("Workers: {}", options.workers);
    println!("Max depth: {}", limit_label(options.max_depth));
    println!("Max pages: {}", limit_label(options.max_pages));
    match options.stop_on_url.as_deref() {
        Some(target) if !target.is_empty() && !target.eq_ignore_ascii_case("n/a") => {
            println!("Mode: smart (hunting {})", target)
        }
        _ => println!("Mode: direct (depth-first)"),
    }
    if options.site_only {
        println!("Scope: seed domain only");
    }
    println!();
}

fn limit_label(limit: usize) -> String {
    if limit == 0 {
        "unlimited".to_string()
    } else {
        limit.to_string()
    }
}

fn print_crawl_summary(bundle: &ResultBundle, termination: Termination) {
    let stats = &bundle.stats;
    println!();
    print_divider();
    println!("{}", "  CRAWL COMPLETE".green().bold());
    print_divider();
    println!("Stopped because: {}", termination.as_str().bright_white());
    println!("Pages crawled:   {}", stats.pages_crawled);
    println!("Pages skipped:   {}", stats.skipped);
    println!("Errors:          {}", stats.errors);
    println!("Images found:    {}", stats.images_found);
    println!("Records:         {}", bundle.data.len());
    println!();
}
