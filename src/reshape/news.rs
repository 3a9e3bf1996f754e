// src/reshape/news.rs

use serde_json::Value;
use tracing::{debug, warn};

use crate::raw::{json_type, RawTree, Record};

/// Article records from `articleList`, in feed order. An absent list, or one
/// that is not an array, gives no articles.
///
/// Entries that are not JSON objects cannot be flattened and are skipped;
/// the second value is how many were skipped.
pub fn news(raw: &RawTree) -> (Vec<Record>, usize) {
    let list = match &raw.article_list {
        Some(Value::Array(list)) => list,
        Some(other) => {
            warn!(found = json_type(other), "articleList is not an array; ignored");
            return (Vec::new(), 0);
        }
        None => {
            debug!("no articleList in payload");
            return (Vec::new(), 0);
        }
    };

    let articles: Vec<Record> = list
        .iter()
        .filter_map(|entry| entry.as_object().cloned())
        .collect();
    let skipped = list.len() - articles.len();
    if skipped > 0 {
        warn!(skipped, "articleList entries that are not objects");
    }
    (articles, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_object_entries_in_order() {
        let raw = RawTree::from_value(json!({
            "articleList": [
                {"title": "a", "url": "https://example.com/a"},
                "not an article",
                {"title": "b"}
            ]
        }))
        .unwrap();
        let (articles, skipped) = news(&raw);

        assert_eq!(skipped, 1);
        let titles: Vec<&str> = articles
            .iter()
            .filter_map(|a| a.get("title").and_then(|t| t.as_str()))
            .collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn absent_list_is_empty() {
        let (articles, skipped) = news(&RawTree::default());
        assert!(articles.is_empty());
        assert_eq!(skipped, 0);
    }

    #[test]
    fn non_array_list_gives_no_articles() {
        let raw = RawTree::from_value(json!({"articleList": {"title": "a"}})).unwrap();
        let (articles, skipped) = news(&raw);
        assert!(articles.is_empty());
        assert_eq!(skipped, 0);
    }
}
