//! Tracking façade: the closed set of interactions the site records.

use std::sync::Arc;

use tracing::warn;

use crate::{
    sink::{TagEvent, TagSink},
    store::{CurrentPage, EventStore},
};

/// Label recorded for form submissions with no declared interest.
pub const DEFAULT_FORM_INTEREST: &str = "geral";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interaction {
    SaibaMais,
    WhatsApp,
    FormSubmit,
    ManualDownload,
    VideoClick,
    TabNavigation,
    CtaClick,
}

impl Interaction {
    pub const ALL: [Interaction; 7] = [
        Interaction::SaibaMais,
        Interaction::WhatsApp,
        Interaction::FormSubmit,
        Interaction::ManualDownload,
        Interaction::VideoClick,
        Interaction::TabNavigation,
        Interaction::CtaClick,
    ];

    pub fn category(self) -> &'static str {
        match self {
            Interaction::SaibaMais => "Sistemas",
            Interaction::WhatsApp => "Contato",
            Interaction::FormSubmit => "Lead",
            Interaction::ManualDownload => "Download",
            Interaction::VideoClick => "Video",
            Interaction::TabNavigation => "Navegacao",
            Interaction::CtaClick => "CTA",
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            Interaction::SaibaMais => "click_saiba_mais",
            Interaction::WhatsApp => "click_whatsapp",
            Interaction::FormSubmit => "submit_form",
            Interaction::ManualDownload => "download_manual",
            Interaction::VideoClick => "click_video",
            Interaction::TabNavigation => "click_tab",
            Interaction::CtaClick => "click_cta",
        }
    }
}

#[derive(Clone)]
pub struct Tracker {
    store: EventStore,
    sink: Option<Arc<dyn TagSink>>,
}

impl Tracker {
    pub fn new(store: EventStore) -> Self {
        Self { store, sink: None }
    }

    pub fn with_sink(mut self, sink: Arc<dyn TagSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn current_page(&self) -> &CurrentPage {
        self.store.current_page()
    }

    /// Record an interaction locally and mirror it to the tag sink.
    ///
    /// Never fails: storage errors are logged and dropped here and nowhere else.
    pub fn track_event(&self, category: &str, action: &str, label: Option<&str>, value: Option<f64>) {
        if let Err(e) = self.store.append(category, action, label, value) {
            warn!(category, action, error = %e, "failed to store local event");
        }

        if let Some(sink) = &self.sink {
            sink.fire(TagEvent::interaction(category, action, label, value));
        }
    }

    pub fn track(&self, interaction: Interaction, label: &str) {
        self.track_event(interaction.category(), interaction.action(), Some(label), None);
    }

    pub fn track_saiba_mais_click(&self, system_name: &str) {
        self.track(Interaction::SaibaMais, system_name);
    }

    pub fn track_whatsapp_click(&self, page_name: &str) {
        self.track(Interaction::WhatsApp, page_name);
    }

    pub fn track_form_submit(&self, interest: Option<&str>) {
        let label = interest
            .filter(|i| !i.is_empty())
            .unwrap_or(DEFAULT_FORM_INTEREST);
        self.track(Interaction::FormSubmit, label);
    }

    pub fn track_manual_download(&self, system_name: &str) {
        self.track(Interaction::ManualDownload, system_name);
    }

    pub fn track_video_click(&self, video_title: &str, system_name: Option<&str>) {
        let label = match system_name.filter(|s| !s.is_empty()) {
            Some(system) => format!("{} - {}", system, video_title),
            None => video_title.to_string(),
        };
        self.track(Interaction::VideoClick, &label);
    }

    pub fn track_tab_navigation(&self, tab_name: &str, system_name: &str) {
        self.track(
            Interaction::TabNavigation,
            &format!("{} - {}", system_name, tab_name),
        );
    }

    pub fn track_cta_click(&self, cta_type: &str, location: &str) {
        self.track(Interaction::CtaClick, &format!("{} - {}", cta_type, location));
    }

    /// Move to `path` and report the view to the tag sink only.
    pub fn track_page_view(&self, path: &str, title: Option<&str>) {
        self.current_page().navigate(path);
        if let Some(sink) = &self.sink {
            sink.fire(TagEvent::page_view(path, title));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sink::DataLayer, storage::MemoryStorage};

    fn tracker() -> (Tracker, Arc<DataLayer>) {
        let storage = Arc::new(MemoryStorage::new());
        let layer = Arc::new(DataLayer::new());
        let tracker = Tracker::new(EventStore::new(storage, CurrentPage::default()))
            .with_sink(layer.clone());
        (tracker, layer)
    }

    fn last(tracker: &Tracker) -> (String, String, Option<String>) {
        let e = tracker.store().read_all().pop().expect("one event");
        (e.category, e.action, e.label)
    }

    #[test]
    fn helpers_follow_the_taxonomy() {
        let (t, _) = tracker();
        let cases: Vec<(Box<dyn Fn(&Tracker)>, (&str, &str, &str))> = vec![
            (
                Box::new(|t: &Tracker| t.track_saiba_mais_click("SalesMasters")),
                ("Sistemas", "click_saiba_mais", "SalesMasters"),
            ),
            (
                Box::new(|t: &Tracker| t.track_whatsapp_click("Home")),
                ("Contato", "click_whatsapp", "Home"),
            ),
            (
                Box::new(|t: &Tracker| t.track_form_submit(None)),
                ("Lead", "submit_form", "geral"),
            ),
            (
                Box::new(|t: &Tracker| t.track_form_submit(Some("SalesSpot"))),
                ("Lead", "submit_form", "SalesSpot"),
            ),
            (
                Box::new(|t: &Tracker| t.track_manual_download("Emissor Fiscal")),
                ("Download", "download_manual", "Emissor Fiscal"),
            ),
            (
                Box::new(|t: &Tracker| t.track_video_click("Intro", Some("SalesMasters"))),
                ("Video", "click_video", "SalesMasters - Intro"),
            ),
            (
                Box::new(|t: &Tracker| t.track_video_click("Intro", None)),
                ("Video", "click_video", "Intro"),
            ),
            (
                Box::new(|t: &Tracker| t.track_tab_navigation("Recursos", "SalesSpot")),
                ("Navegacao", "click_tab", "SalesSpot - Recursos"),
            ),
            (
                Box::new(|t: &Tracker| t.track_cta_click("Demo", "hero")),
                ("CTA", "click_cta", "Demo - hero"),
            ),
        ];

        for (call, (category, action, label)) in cases {
            call(&t);
            assert_eq!(
                last(&t),
                (category.to_string(), action.to_string(), Some(label.to_string()))
            );
        }
    }

    #[test]
    fn every_helper_mirrors_one_event_named_after_action() {
        let (t, layer) = tracker();
        t.track_cta_click("Demo", "footer");
        t.track_form_submit(None);

        let names: Vec<_> = layer.entries().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["click_cta", "submit_form"]);
    }

    #[test]
    fn without_sink_only_the_store_receives() {
        let storage = Arc::new(MemoryStorage::new());
        let t = Tracker::new(EventStore::new(storage, CurrentPage::default()));
        t.track_whatsapp_click("Contato");
        t.track_page_view("/contato", None);
        assert_eq!(t.store().len(), 1);
    }

    #[test]
    fn page_view_moves_current_page_but_is_not_stored() {
        let (t, layer) = tracker();
        t.track_page_view("/sistemas", Some("Sistemas"));
        t.track_saiba_mais_click("SalesMasters");

        let stored = t.store().read_all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].page, "/sistemas");
        assert_eq!(layer.entries()[0], TagEvent::page_view("/sistemas", Some("Sistemas")));
    }

    #[test]
    fn invalid_event_is_swallowed_but_still_mirrored() {
        let (t, layer) = tracker();
        t.track_event("", "click", None, None);
        assert!(t.store().is_empty());
        assert_eq!(layer.entries().len(), 1);
    }

    #[test]
    fn taxonomy_actions_are_unique() {
        let mut actions: Vec<_> = Interaction::ALL.iter().map(|i| i.action()).collect();
        actions.sort();
        actions.dedup();
        assert_eq!(actions.len(), Interaction::ALL.len());
    }
}
