use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieSnapshot {
    pub name: String,
    pub value: String,
    pub visited_url: String,
    pub timestamp: DateTime<Utc>,
}

impl CookieSnapshot {
    pub fn new(name: &str, value: &str, visited_url: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            visited_url: visited_url.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Cookies in `after` that are new or whose value changed. Identity is the name.
pub fn diff(before: &[CookieSnapshot], after: &[CookieSnapshot]) -> Vec<CookieSnapshot> {
    let known: HashMap<&str, &str> = before
        .iter()
        .map(|c| (c.name.as_str(), c.value.as_str()))
        .collect();

    after
        .iter()
        .filter(|c| known.get(c.name.as_str()) != Some(&c.value.as_str()))
        .cloned()
        .collect()
}

/// Splits a `Cookie` request header (`a=1; b=2`) into snapshots.
pub fn parse_cookie_header(header: &str, visited_url: &str) -> Vec<CookieSnapshot> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| CookieSnapshot::new(name.trim(), value.trim(), visited_url))
        .filter(|c| !c.name.is_empty())
        .collect()
}

/// Parses user-supplied cookies, either a JSON object or `name=value` pairs
/// separated by `;` or `,`.
pub fn parse_cookie_string(input: &str) -> BTreeMap<String, String> {
    let input = input.trim();
    if input.is_empty() {
        return BTreeMap::new();
    }

    if input.starts_with('{')
        && let Ok(object) = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(input)
    {
        return object
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, value)
            })
            .collect();
    }

    input
        .split([';', ','])
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(name: &str, value: &str) -> CookieSnapshot {
        CookieSnapshot::new(name, value, "https://a.com")
    }

    #[test]
    fn test_identical_snapshots_emit_nothing() {
        let jar = vec![cookie("session", "abc"), cookie("theme", "dark")];
        assert!(diff(&jar, &jar).is_empty());
    }

    #[test]
    fn test_new_and_changed_cookies_are_reported() {
        let before = vec![cookie("session", "abc"), cookie("theme", "dark")];
        let after = vec![
            cookie("session", "xyz"),
            cookie("theme", "dark"),
            cookie("tracking", "1"),
        ];

        let changed: Vec<_> = diff(&before, &after).into_iter().map(|c| c.name).collect();
        assert_eq!(changed, vec!["session", "tracking"]);
    }

    #[test]
    fn test_removed_cookies_are_not_reported() {
        let before = vec![cookie("session", "abc")];
        assert!(diff(&before, &[]).is_empty());
    }

    #[test]
    fn test_parse_cookie_header() {
        let cookies = parse_cookie_header("a=1; b=two=2; junk", "https://a.com/x");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[1].name, "b");
        assert_eq!(cookies[1].value, "two=2");
        assert_eq!(cookies[0].visited_url, "https://a.com/x");
    }

    #[test]
    fn test_parse_cookie_string_pairs() {
        let cookies = parse_cookie_string("session=abc; theme=dark, lang=en");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies["theme"], "dark");
    }

    #[test]
    fn test_parse_cookie_string_json() {
        let cookies = parse_cookie_string(r#"{"session": "abc", "visits": 3}"#);
        assert_eq!(cookies["session"], "abc");
        assert_eq!(cookies["visits"], "3");
    }

    #[test]
    fn test_parse_cookie_string_blank() {
        assert!(parse_cookie_string("   ").is_empty());
    }
}
