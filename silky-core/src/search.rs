use silky_scanner::CollectedRecord;

const TITLE_HIT: usize = 10;
const H1_HIT: usize = 5;
const IMAGE_URL_HIT: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    pub score: usize,
    pub record: &'a CollectedRecord,
}

/// Relevance of one record for a lowercased query. Zero means no match.
pub fn score_record(record: &CollectedRecord, query_lower: &str) -> usize {
    if query_lower.is_empty() {
        return 0;
    }

    match record {
        CollectedRecord::Page(page) => {
            let mut score = 0;
            if page.title.to_lowercase().contains(query_lower) {
                score += TITLE_HIT;
            }
            score += page.content.to_lowercase().matches(query_lower).count();
            score += page
                .h1_tags
                .iter()
                .filter(|h1| h1.to_lowercase().contains(query_lower))
                .count()
                * H1_HIT;
            score
        }
        CollectedRecord::Image(image) => {
            if image.url.to_lowercase().contains(query_lower) {
                IMAGE_URL_HIT
            } else {
                0
            }
        }
    }
}

/// Matching records, best first. Equal scores keep collection order.
pub fn search_records<'a>(records: &'a [CollectedRecord], query: &str) -> Vec<SearchHit<'a>> {
    let query_lower = query.trim().to_lowercase();

    let mut hits: Vec<SearchHit<'a>> = records
        .iter()
        .map(|record| SearchHit {
            score: score_record(record, &query_lower),
            record,
        })
        .filter(|hit| hit.score > 0)
        .collect();

    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits
}
