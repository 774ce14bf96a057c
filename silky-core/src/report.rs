// Report generation from a result bundle

use crate::crawl::extract_url_path;
use serde::{Deserialize, Serialize};
use silky_scanner::lineage::{LineageError, reconstruct_tree};
use silky_scanner::{CollectedRecord, CrawlStats, ImageRecord, ResultBundle};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEAVY_RULE: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";
const LIGHT_RULE: &str =
    "────────────────────────────────────────────────────────────────────────────────\n";
const TOP_N: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

fn section(title: &str) -> String {
    format!("{}{}\n{}\n", HEAVY_RULE, title, HEAVY_RULE)
}

pub fn stats_report(stats: &CrawlStats) -> String {
    let mut report = section("CRAWL STATISTICS");

    report.push_str(&format!("Pages Crawled: {}\n", stats.pages_crawled));
    report.push_str(&format!("Pages Skipped: {}\n", stats.skipped));
    report.push_str(&format!("Errors:        {}\n", stats.errors));
    report.push_str(&format!("Images Found:  {}\n", stats.images_found));
    report.push_str(&format!("Crawl Time:    {:.1}s\n", stats.elapsed_secs()));
    report.push_str(&format!("Crawl Rate:    {:.2} pages/sec\n", stats.pages_per_second()));

    report.push_str("Content Types:\n");
    let mut content_types: Vec<(&String, &usize)> = stats.content_types.iter().collect();
    content_types.sort_by(|a, b| b.1.cmp(a.1));
    for (content_type, count) in content_types {
        report.push_str(&format!("  {}: {}\n", content_type, count));
    }

    if !stats.broken_links.is_empty() {
        report.push_str(&format!("\nBroken Links ({}):\n", stats.broken_links.len()));
        for link in &stats.broken_links {
            report.push_str(&format!("  {}\n", link));
        }
    }

    report.push('\n');
    report
}

pub fn link_analysis_report(stats: &CrawlStats) -> String {
    let mut report = section("LINK ANALYSIS");

    if stats.inbound_links.is_empty() && stats.outgoing_links.is_empty() {
        report.push_str("No link data available.\n\n");
        return report;
    }

    report.push_str(&format!("Most Linked Pages (Top {}):\n", TOP_N));
    let mut inbound: Vec<(&String, usize)> =
        stats.inbound_links.iter().map(|(url, count)| (url, *count)).collect();
    inbound.sort_by(|a, b| b.1.cmp(&a.1));
    for (i, (url, count)) in inbound.iter().take(TOP_N).enumerate() {
        report.push_str(&format!("{:>2}. [{} links] {}\n", i + 1, count, url));
    }

    report.push_str(&format!("\nPages with Most Outgoing Links (Top {}):\n", TOP_N));
    let mut outgoing: Vec<(&String, usize)> = stats
        .outgoing_links
        .iter()
        .map(|(url, links)| (url, links.len()))
        .collect();
    outgoing.sort_by(|a, b| b.1.cmp(&a.1));
    for (i, (url, count)) in outgoing.iter().take(TOP_N).enumerate() {
        report.push_str(&format!("{:>2}. [{} outgoing] {}\n", i + 1, count, url));
    }

    report.push('\n');
    report
}

/// Pages grouped by crawl depth, indented two spaces per level.
pub fn sitemap_report(records: &[CollectedRecord]) -> String {
    let mut report = section("SITE MAP (Title and URL by Depth)");

    let mut by_depth: BTreeMap<usize, Vec<&silky_scanner::PageRecord>> = BTreeMap::new();
    for page in records.iter().filter_map(CollectedRecord::as_page) {
        by_depth.entry(page.depth).or_default().push(page);
    }

    if by_depth.is_empty() {
        report.push_str("No collected page data found.\n\n");
        return report;
    }

    for (depth, pages) in &by_depth {
        let indent = " ".repeat(depth * 2);
        report.push_str(&format!("{}Depth {} ({} pages total):\n", indent, depth, pages.len()));
        for page in pages {
            let title = if page.title.is_empty() {
                "No title"
            } else {
                page.title.as_str()
            };
            report.push_str(&format!("{}├─ {}\n", indent, title));
            report.push_str(&format!("{}   {}\n", indent, page.url));
        }
    }

    report.push('\n');
    report
}

pub fn image_report(records: &[CollectedRecord]) -> String {
    let images: Vec<&ImageRecord> = records.iter().filter_map(CollectedRecord::as_image).collect();

    let mut report = section("IMAGE SCRAPING RESULTS");
    if images.is_empty() {
        report.push_str("No images found.\n\n");
        return report;
    }

    report.push_str(&format!("Total Images Found: {}\n\n", images.len()));

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    let mut by_dimensions: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_source: BTreeMap<&str, Vec<&ImageRecord>> = BTreeMap::new();
    for image in &images {
        *by_type.entry(image.image_type.as_str()).or_insert(0) += 1;
        if let Some((w, h)) = image.dimensions {
            *by_dimensions.entry(format!("{}x{}", w, h)).or_insert(0) += 1;
        }
        by_source.entry(image.source_page.as_str()).or_default().push(image);
    }

    report.push_str("Images by Type:\n");
    for (image_type, count) in sorted_by_count(by_type) {
        report.push_str(&format!("  • {}: {}\n", image_type, count));
    }

    if !by_dimensions.is_empty() {
        report.push_str("\nImages by Dimensions:\n");
        for (dims, count) in sorted_by_count(by_dimensions) {
            report.push_str(&format!("  • {}: {}\n", dims, count));
        }
    }

    report.push_str("\nDetailed Image List by Source Page:\n");
    report.push_str(LIGHT_RULE);
    for (source_page, list) in by_source {
        report.push_str(&format!("\nSource Page: {}\n", source_page));
        report.push_str(&format!("Images Found: {}\n", list.len()));
        for (i, image) in list.iter().enumerate() {
            report.push_str(&format!("\n  {}. URL: {}\n", i + 1, image.url));
            if let Some(ref alt) = image.alt_text
                && !alt.is_empty()
            {
                report.push_str(&format!("     Alt: {}\n", alt));
            }
            if let Some((w, h)) = image.dimensions {
                report.push_str(&format!("     Size: {}x{}px\n", w, h));
            }
            report.push_str(&format!("     Type: {}\n", image.image_type.as_str()));
        }
    }

    report.push('\n');
    report
}

fn sorted_by_count<K>(counts: BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut counts: Vec<(K, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn lineage_report(stats: &CrawlStats) -> String {
    let mut report = section("DISCOVERY TREE");
    match reconstruct_tree(&stats.path_map) {
        Ok(tree) => report.push_str(&tree.render()),
        Err(LineageError::NoRoot) => report.push_str("Tree unavailable: no seed was visited.\n"),
        Err(LineageError::MultipleRoots(n)) => {
            report.push_str(&format!("Tree unavailable: {} seeds were visited.\n", n))
        }
    }
    report.push('\n');
    report
}

/// Human-readable report of a whole run.
pub fn generate_full_report(target: &str, bundle: &ResultBundle, image_only: bool) -> String {
    let mut report = String::new();

    report.push_str(HEAVY_RULE);
    report.push_str("                          SILKY CRAWL REPORT\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');
    report.push_str(&format!("Target:       {}\n", target));
    report.push_str(&format!(
        "Date:         {}\n\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    report.push_str(&stats_report(&bundle.stats));

    if image_only {
        report.push_str(&image_report(&bundle.data));
    } else {
        report.push_str(&link_analysis_report(&bundle.stats));
        report.push_str(&sitemap_report(&bundle.data));
        report.push_str(&lineage_report(&bundle.stats));

        if bundle.images().next().is_some() {
            report.push_str(&image_report(&bundle.data));
        }

        report.push_str(&section("RAW PAGE DATA (URLs and Titles)"));
        for page in bundle.pages() {
            report.push_str(&format!("URL:       {}\n", page.url));
            report.push_str(&format!("Path:      {}\n", extract_url_path(&page.url)));
            report.push_str(&format!("Title:     {}\n", page.title));
            if page.load_time_ms > 0 {
                report.push_str(&format!("Load Time: {}ms\n", page.load_time_ms));
            }
            report.push_str(LIGHT_RULE);
        }
        report.push('\n');
    }

    report.push_str(HEAVY_RULE);
    report.push_str("                            End of Report\n");
    report.push_str(HEAVY_RULE);

    report
}

pub fn generate_json_report(target: &str, bundle: &ResultBundle) -> Result<String, serde_json::Error> {
    let tree = reconstruct_tree(&bundle.stats.path_map).ok();

    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Silky",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "target": target,
            "summary": {
                "pages_crawled": bundle.stats.pages_crawled,
                "skipped": bundle.stats.skipped,
                "errors": bundle.stats.errors,
                "images_found": bundle.stats.images_found,
                "records_collected": bundle.data.len(),
                "elapsed_seconds": bundle.stats.elapsed_secs()
            },
            "stats": bundle.stats,
            "discovery_tree": tree,
            "data": bundle.data
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
