//! Read-only aggregations over a snapshot of the event log.

use std::collections::HashMap;

use crate::types::EventRecord;

pub const LEAD_CATEGORY: &str = "Lead";
pub const MISSING_LABEL: &str = "sem label";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(String),
}

impl CategoryFilter {
    /// `"all"` (any case) selects everything; anything else is an exact category.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("all") {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(raw.to_string())
        }
    }

    pub fn matches(&self, event: &EventRecord) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => &event.category == category,
        }
    }
}

pub fn count_by_category(snapshot: &[EventRecord], category: &str) -> usize {
    snapshot.iter().filter(|e| e.category == category).count()
}

pub fn top_labels_for_category(
    snapshot: &[EventRecord],
    category: &str,
    n: usize,
) -> Vec<(String, usize)> {
    rank(
        snapshot
            .iter()
            .filter(|e| e.category == category)
            .filter_map(|e| e.label_str().map(str::to_string)),
        n,
    )
}

pub fn top_pages(snapshot: &[EventRecord], n: usize) -> Vec<(String, usize)> {
    rank(snapshot.iter().map(|e| e.page.clone()), n)
}

/// Click-type actions keyed as `"{action} - {label}"`.
pub fn top_ctas(snapshot: &[EventRecord], n: usize) -> Vec<(String, usize)> {
    rank(
        snapshot
            .iter()
            .filter(|e| e.action.contains("click"))
            .map(|e| format!("{} - {}", e.action, e.label_str().unwrap_or(MISSING_LABEL))),
        n,
    )
}

/// Share of `Lead` events in the snapshot; 0 when empty.
pub fn conversion_rate(snapshot: &[EventRecord]) -> f64 {
    if snapshot.is_empty() {
        return 0.0;
    }
    count_by_category(snapshot, LEAD_CATEGORY) as f64 / snapshot.len() as f64
}

pub fn filter_by_category<'a>(
    snapshot: &'a [EventRecord],
    filter: &CategoryFilter,
) -> Vec<&'a EventRecord> {
    snapshot.iter().filter(|e| filter.matches(e)).collect()
}

/// Group, count, sort by count descending and keep the first `n`.
///
/// Ties keep first-seen order.
fn rank(keys: impl Iterator<Item = String>, n: usize) -> Vec<(String, usize)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for key in keys {
        match index.get(&key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(category: &str, action: &str, label: Option<&str>, page: &str) -> EventRecord {
        EventRecord {
            timestamp: 0,
            category: category.into(),
            action: action.into(),
            label: label.map(Into::into),
            value: None,
            page: page.into(),
        }
    }

    fn owned(pairs: &[(&str, usize)]) -> Vec<(String, usize)> {
        pairs.iter().map(|(k, c)| (k.to_string(), *c)).collect()
    }

    #[test]
    fn top_labels_sorted_and_truncated() {
        let snapshot: Vec<_> = ["A", "A", "B", "C", "C", "C"]
            .iter()
            .map(|l| event("Sistemas", "click_saiba_mais", Some(*l), "/"))
            .collect();
        assert_eq!(
            top_labels_for_category(&snapshot, "Sistemas", 2),
            owned(&[("C", 3), ("A", 2)])
        );
    }

    #[test]
    fn top_labels_ties_keep_first_seen_order() {
        let snapshot: Vec<_> = ["B", "A", "A", "B", "C"]
            .iter()
            .map(|l| event("Sistemas", "click_saiba_mais", Some(*l), "/"))
            .collect();
        assert_eq!(
            top_labels_for_category(&snapshot, "Sistemas", 10),
            owned(&[("B", 2), ("A", 2), ("C", 1)])
        );
    }

    #[test]
    fn top_labels_skip_other_categories_and_empty_labels() {
        let snapshot = vec![
            event("Sistemas", "click_saiba_mais", Some("A"), "/"),
            event("sistemas", "click_saiba_mais", Some("A"), "/"),
            event("Sistemas", "click_saiba_mais", None, "/"),
            event("Sistemas", "click_saiba_mais", Some(""), "/"),
            event("CTA", "click_cta", Some("A"), "/"),
        ];
        assert_eq!(
            top_labels_for_category(&snapshot, "Sistemas", 5),
            owned(&[("A", 1)])
        );
    }

    #[test]
    fn top_pages_span_all_categories() {
        let snapshot = vec![
            event("CTA", "click_cta", None, "/sistemas"),
            event("Lead", "submit_form", None, "/contato"),
            event("Video", "click_video", None, "/contato"),
        ];
        assert_eq!(
            top_pages(&snapshot, 5),
            owned(&[("/contato", 2), ("/sistemas", 1)])
        );
        assert!(top_pages(&snapshot, 0).is_empty());
    }

    #[test]
    fn top_ctas_use_placeholder_and_ignore_non_clicks() {
        let snapshot = vec![
            event("CTA", "click_cta", Some("Demo - hero"), "/"),
            event("CTA", "click_cta", None, "/"),
            event("Contato", "click_whatsapp", Some(""), "/"),
            event("Lead", "submit_form", Some("geral"), "/"),
            event("Download", "download_manual", Some("X"), "/"),
            event("CTA", "click_cta", Some("Demo - hero"), "/"),
        ];
        assert_eq!(
            top_ctas(&snapshot, 5),
            owned(&[
                ("click_cta - Demo - hero", 2),
                ("click_cta - sem label", 1),
                ("click_whatsapp - sem label", 1),
            ])
        );
    }

    #[test]
    fn conversion_rate_is_lead_share() {
        let mut snapshot: Vec<_> = (0..8).map(|_| event("CTA", "click_cta", None, "/")).collect();
        snapshot.push(event("Lead", "submit_form", Some("geral"), "/"));
        snapshot.push(event("Lead", "submit_form", Some("geral"), "/"));
        assert!((conversion_rate(&snapshot) - 0.2).abs() < f64::EPSILON);
        assert_eq!(conversion_rate(&[]), 0.0);
    }

    #[test]
    fn count_is_case_sensitive() {
        let snapshot = vec![
            event("Lead", "submit_form", None, "/"),
            event("lead", "submit_form", None, "/"),
        ];
        assert_eq!(count_by_category(&snapshot, "Lead"), 1);
    }

    #[test]
    fn filter_by_category_all_and_only() {
        let snapshot = vec![
            event("Lead", "submit_form", None, "/"),
            event("CTA", "click_cta", None, "/"),
        ];
        assert_eq!(filter_by_category(&snapshot, &CategoryFilter::parse("ALL")).len(), 2);
        let leads = filter_by_category(&snapshot, &CategoryFilter::parse("Lead"));
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].category, "Lead");
    }
}
