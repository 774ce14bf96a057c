// Tests for report generation functionality

use silky_core::report::{
    ReportFormat, generate_full_report, generate_json_report, image_report, lineage_report,
    link_analysis_report, save_report, sitemap_report, stats_report,
};
use silky_scanner::bundle::pack;
use silky_scanner::{CollectedRecord, CrawlStats, ImageKind, ImageRecord, PageRecord, ResultBundle};
use tempfile::TempDir;

fn page(url: &str, title: &str, depth: usize) -> CollectedRecord {
    let mut record = PageRecord::new(url.to_string(), depth).with_content("some text");
    record.title = title.to_string();
    record.load_time_ms = 42;
    CollectedRecord::Page(record)
}

fn image(url: &str, source: &str, dimensions: Option<(u32, u32)>) -> CollectedRecord {
    CollectedRecord::Image(ImageRecord {
        url: url.to_string(),
        source_page: source.to_string(),
        depth: 0,
        image_type: ImageKind::ImgTag,
        alt_text: Some("alt".to_string()),
        dimensions,
    })
}

fn sample_stats() -> CrawlStats {
    let mut stats = CrawlStats {
        pages_crawled: 3,
        errors: 1,
        skipped: 2,
        images_found: 4,
        ..CrawlStats::default()
    };
    stats.content_types.insert("text/html".to_string(), 2);
    stats.content_types.insert("application/pdf".to_string(), 1);
    stats.broken_links.insert("https://a.com/missing".to_string());
    stats.outgoing_links.insert(
        "https://a.com".to_string(),
        vec!["https://a.com/b".to_string(), "https://a.com/c".to_string()],
    );
    stats.outgoing_links.insert("https://a.com/b".to_string(), vec!["https://a.com/c".to_string()]);
    stats.inbound_links.insert("https://a.com/b".to_string(), 1);
    stats.inbound_links.insert("https://a.com/c".to_string(), 2);
    stats
        .path_map
        .insert("https://a.com".to_string(), vec!["https://a.com".to_string()]);
    stats.path_map.insert(
        "https://a.com/b".to_string(),
        vec!["https://a.com".to_string(), "https://a.com/b".to_string()],
    );
    stats
}

fn sample_bundle() -> ResultBundle {
    pack(
        vec![
            page("https://a.com", "Home", 0),
            page("https://a.com/b", "Bee", 1),
        ],
        sample_stats(),
    )
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("TXT"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("json"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("yaml"), None);
}

// ============================================================================
// Section Tests
// ============================================================================

#[test]
fn test_stats_report_lists_counters_and_broken_links() {
    let report = stats_report(&sample_stats());

    assert!(report.contains("CRAWL STATISTICS"));
    assert!(report.contains("Pages Crawled: 3"));
    assert!(report.contains("Pages Skipped: 2"));
    assert!(report.contains("Images Found:  4"));
    assert!(report.contains("Broken Links (1)"));
    assert!(report.contains("https://a.com/missing"));

    // most common content type first
    let html = report.find("text/html: 2").unwrap();
    let pdf = report.find("application/pdf: 1").unwrap();
    assert!(html < pdf);
}

#[test]
fn test_link_analysis_orders_by_count() {
    let report = link_analysis_report(&sample_stats());

    assert!(report.contains(" 1. [2 links] https://a.com/c"));
    assert!(report.contains(" 2. [1 links] https://a.com/b"));
    assert!(report.contains(" 1. [2 outgoing] https://a.com\n"));
}

#[test]
fn test_link_analysis_without_data() {
    let report = link_analysis_report(&CrawlStats::default());
    assert!(report.contains("No link data available."));
}

#[test]
fn test_link_analysis_caps_at_ten() {
    let mut stats = CrawlStats::default();
    for i in 0..15 {
        stats.inbound_links.insert(format!("https://a.com/{}", i), i + 1);
    }

    let report = link_analysis_report(&stats);
    assert!(report.contains("10. "));
    assert!(!report.contains("11. "));
}

#[test]
fn test_sitemap_groups_by_depth() {
    let records = vec![
        page("https://a.com", "Home", 0),
        page("https://a.com/b", "", 1),
        page("https://a.com/c", "Sea", 1),
    ];

    let report = sitemap_report(&records);
    assert!(report.contains("Depth 0 (1 pages total):"));
    assert!(report.contains("  Depth 1 (2 pages total):"));
    assert!(report.contains("  ├─ No title"));
    assert!(report.contains("     https://a.com/c"));
}

#[test]
fn test_sitemap_without_pages() {
    let report = sitemap_report(&[image("https://a.com/x.png", "https://a.com", None)]);
    assert!(report.contains("No collected page data found."));
}

#[test]
fn test_image_report_groups_by_type_dimensions_and_source() {
    let records = vec![
        image("https://a.com/1.png", "https://a.com", Some((10, 10))),
        image("https://a.com/2.png", "https://a.com", Some((10, 10))),
        image("https://a.com/3.png", "https://a.com/b", None),
    ];

    let report = image_report(&records);
    assert!(report.contains("Total Images Found: 3"));
    assert!(report.contains("  • img_tag: 3"));
    assert!(report.contains("  • 10x10: 2"));
    assert!(report.contains("Source Page: https://a.com/b"));
    assert!(report.contains("     Size: 10x10px"));
}

#[test]
fn test_image_report_without_images() {
    assert!(image_report(&[]).contains("No images found."));
}

#[test]
fn test_lineage_report_renders_tree() {
    let report = lineage_report(&sample_stats());
    assert!(report.contains("https://a.com\n└── https://a.com/b\n"));
}

#[test]
fn test_lineage_report_unavailable_with_two_roots() {
    let mut stats = CrawlStats::default();
    stats.path_map.insert("https://a.com".into(), vec!["https://a.com".into()]);
    stats.path_map.insert("https://b.com".into(), vec!["https://b.com".into()]);

    let report = lineage_report(&stats);
    assert!(report.contains("Tree unavailable: 2 seeds were visited."));
}

// ============================================================================
// Full Report Tests
// ============================================================================

#[test]
fn test_full_report_contains_all_sections() {
    let report = generate_full_report("https://a.com", &sample_bundle(), false);

    assert!(report.contains("SILKY CRAWL REPORT"));
    assert!(report.contains("Target:       https://a.com"));
    assert!(report.contains("CRAWL STATISTICS"));
    assert!(report.contains("LINK ANALYSIS"));
    assert!(report.contains("SITE MAP"));
    assert!(report.contains("DISCOVERY TREE"));
    assert!(report.contains("RAW PAGE DATA"));
    assert!(report.contains("Title:     Bee"));
    assert!(report.contains("Load Time: 42ms"));
    assert!(report.contains("End of Report"));
    assert!(!report.contains("IMAGE SCRAPING RESULTS"));
}

#[test]
fn test_full_report_image_only() {
    let bundle = pack(
        vec![image("https://a.com/1.png", "https://a.com", None)],
        sample_stats(),
    );

    let report = generate_full_report("https://a.com", &bundle, true);
    assert!(report.contains("IMAGE SCRAPING RESULTS"));
    assert!(!report.contains("LINK ANALYSIS"));
    assert!(!report.contains("RAW PAGE DATA"));
}

#[test]
fn test_json_report_structure() {
    let json = generate_json_report("https://a.com", &sample_bundle()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let report = &value["report"];
    assert_eq!(report["metadata"]["generator"], "Silky");
    assert_eq!(report["summary"]["pages_crawled"], 3);
    assert_eq!(report["summary"]["records_collected"], 2);
    assert_eq!(report["stats"]["link_map"]["https://a.com/b"][0], "https://a.com/c");
    assert_eq!(report["discovery_tree"]["url"], "https://a.com");
    assert_eq!(report["data"][0]["type"], "page");
}

#[test]
fn test_save_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.txt");

    save_report("hello report", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello report");
}
