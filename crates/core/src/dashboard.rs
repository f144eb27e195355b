use crate::{
    aggregate::{
        CategoryFilter, conversion_rate, count_by_category, filter_by_category, top_ctas,
        top_labels_for_category, top_pages,
    },
    types::EventRecord,
};

/// Categories offered as table filters, besides "all".
pub const DASHBOARD_CATEGORIES: [&str; 7] = [
    "Sistemas",
    "Contato",
    "Lead",
    "Download",
    "Video",
    "CTA",
    "Navegacao",
];

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const TOP_N: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub total_events: usize,
    pub system_clicks: usize,
    pub whatsapp_clicks: usize,
    pub form_submissions: usize,
    pub downloads: usize,
    pub video_clicks: usize,
}

#[derive(Clone, Debug)]
pub struct DashboardQuery {
    pub filter: CategoryFilter,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for DashboardQuery {
    fn default() -> Self {
        Self {
            filter: CategoryFilter::All,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecentEvents {
    /// Most recent first.
    pub rows: Vec<EventRecord>,
    pub page: usize,
    pub total_pages: usize,
    pub total_matching: usize,
}

#[derive(Clone, Debug)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub systems: Vec<(String, usize)>,
    pub pages: Vec<(String, usize)>,
    pub ctas: Vec<(String, usize)>,
    pub conversion_rate: f64,
    pub recent: RecentEvents,
}

impl Dashboard {
    pub fn build(snapshot: &[EventRecord], query: &DashboardQuery) -> Self {
        let stats = DashboardStats {
            total_events: snapshot.len(),
            system_clicks: count_by_category(snapshot, "Sistemas"),
            whatsapp_clicks: count_by_category(snapshot, "Contato"),
            form_submissions: count_by_category(snapshot, "Lead"),
            downloads: count_by_category(snapshot, "Download"),
            video_clicks: count_by_category(snapshot, "Video"),
        };

        Self {
            stats,
            systems: top_labels_for_category(snapshot, "Sistemas", usize::MAX),
            pages: top_pages(snapshot, TOP_N),
            ctas: top_ctas(snapshot, TOP_N),
            conversion_rate: conversion_rate(snapshot),
            recent: recent_events(snapshot, query),
        }
    }
}

fn recent_events(snapshot: &[EventRecord], query: &DashboardQuery) -> RecentEvents {
    let page_size = query.page_size.max(1);
    let page = query.page.max(1);

    let matching = filter_by_category(snapshot, &query.filter);
    let total_matching = matching.len();
    let rows = matching
        .into_iter()
        .rev()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .cloned()
        .collect();

    RecentEvents {
        rows,
        page,
        total_pages: total_matching.div_ceil(page_size),
        total_matching,
    }
}

/// Fraction of the widest bar `value` should fill.
pub fn bar_ratio(value: usize, max: usize) -> f64 {
    if max == 0 {
        return 0.0;
    }
    value as f64 / max as f64
}
