// Tests for searching collected data

use silky_core::search::{score_record, search_records};
use silky_scanner::{CollectedRecord, ImageKind, ImageRecord, PageRecord};

fn page(url: &str, title: &str, content: &str, h1: &[&str]) -> CollectedRecord {
    let mut record = PageRecord::new(url.to_string(), 0).with_content(content);
    record.title = title.to_string();
    record.h1_tags = h1.iter().map(|s| s.to_string()).collect();
    CollectedRecord::Page(record)
}

fn image(url: &str) -> CollectedRecord {
    CollectedRecord::Image(ImageRecord {
        url: url.to_string(),
        source_page: "https://a.com".to_string(),
        depth: 0,
        image_type: ImageKind::ImgTag,
        alt_text: None,
        dimensions: None,
    })
}

#[test]
fn test_title_content_and_h1_scores_add_up() {
    let record = page(
        "https://a.com",
        "Rust crawler",
        "rust is fast. RUST is safe.",
        &["Why Rust", "Other"],
    );

    // title 10 + two body hits + one h1 hit
    assert_eq!(score_record(&record, "rust"), 10 + 2 + 5);
}

#[test]
fn test_image_matches_on_url_only() {
    assert_eq!(score_record(&image("https://a.com/rust-logo.png"), "rust"), 1);
    assert_eq!(score_record(&image("https://a.com/logo.png"), "rust"), 0);
}

#[test]
fn test_results_sorted_best_first() {
    let records = vec![
        page("https://a.com/1", "Nothing", "rust", &[]),
        page("https://a.com/2", "Rust", "", &[]),
        page("https://a.com/3", "Other", "nothing relevant", &[]),
        image("https://a.com/rust.png"),
    ];

    let hits = search_records(&records, "Rust");
    let urls: Vec<&str> = hits.iter().map(|hit| hit.record.url()).collect();

    assert_eq!(urls, vec!["https://a.com/2", "https://a.com/1", "https://a.com/rust.png"]);
    assert_eq!(hits[0].score, 10);
}

#[test]
fn test_equal_scores_keep_collection_order() {
    let records = vec![
        page("https://a.com/first", "", "rust", &[]),
        page("https://a.com/second", "", "rust", &[]),
    ];

    let hits = search_records(&records, "rust");
    assert_eq!(hits[0].record.url(), "https://a.com/first");
    assert_eq!(hits[1].record.url(), "https://a.com/second");
}

#[test]
fn test_blank_query_matches_nothing() {
    let records = vec![page("https://a.com", "Title", "content", &[])];
    assert!(search_records(&records, "   ").is_empty());
}
