use chrono::Local;
use console::style;

use softham_analytics_core::{
    CategoryFilter, Dashboard, bar_ratio,
    dashboard::{DASHBOARD_CATEGORIES, RecentEvents},
    export::format_timestamp,
};

const BAR_WIDTH: usize = 30;
const EMPTY_TABLE: &str =
    "Nenhum evento registrado ainda. Navegue pelo site para gerar dados de analytics.";

pub fn render_dashboard(dashboard: &Dashboard, filter: &CategoryFilter) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n\n", style("SoftHam Analytics").bold()));

    let stats = &dashboard.stats;
    for (title, count) in [
        ("Total de eventos", stats.total_events),
        ("Cliques em sistemas", stats.system_clicks),
        ("Cliques WhatsApp", stats.whatsapp_clicks),
        ("Formulários", stats.form_submissions),
        ("Downloads", stats.downloads),
        ("Vídeos", stats.video_clicks),
    ] {
        output.push_str(&format!("  {:<22} {}\n", title, style(count).cyan().bold()));
    }
    output.push_str(&format!(
        "  {:<22} {}\n\n",
        "Taxa de conversão",
        style(format!("{:.1}%", dashboard.conversion_rate * 100.0)).green().bold()
    ));

    output.push_str(&render_ranking("Sistemas mais clicados", &dashboard.systems));
    output.push_str(&render_ranking("Páginas mais visitadas", &dashboard.pages));
    output.push_str(&render_ranking("CTAs mais clicados", &dashboard.ctas));

    output.push_str(&render_filters(filter));
    output.push_str(&render_recent(&dashboard.recent));
    output
}

fn render_ranking(title: &str, rows: &[(String, usize)]) -> String {
    let mut output = format!("{}\n", style(title).bold());
    if rows.is_empty() {
        output.push_str(&format!("  {}\n\n", style("sem dados").dim()));
        return output;
    }

    let max = rows.iter().map(|(_, count)| *count).max().unwrap_or(0);
    let key_width = rows.iter().map(|(key, _)| key.chars().count()).max().unwrap_or(0);
    for (key, count) in rows {
        let filled = (bar_ratio(*count, max) * BAR_WIDTH as f64).round() as usize;
        output.push_str(&format!(
            "  {:<width$}  {} {}\n",
            key,
            style("█".repeat(filled)).cyan(),
            count,
            width = key_width
        ));
    }
    output.push('\n');
    output
}

fn render_filters(filter: &CategoryFilter) -> String {
    let chip = |name: &str, active: bool| {
        if active {
            format!("[{}]", style(name).cyan().bold())
        } else {
            style(name).dim().to_string()
        }
    };

    let mut chips = vec![chip("all", matches!(filter, CategoryFilter::All))];
    chips.extend(
        DASHBOARD_CATEGORIES
            .iter()
            .map(|c| chip(c, matches!(filter, CategoryFilter::Only(f) if f == c))),
    );
    format!("{} {}\n", style("Eventos recentes").bold(), chips.join(" "))
}

fn render_recent(recent: &RecentEvents) -> String {
    if recent.rows.is_empty() {
        return format!("  {}\n", style(EMPTY_TABLE).dim());
    }

    let mut output = String::new();
    output.push_str(&format!(
        "  {:<22} {:<12} {:<18} {:<30} {}\n",
        "Data/Hora", "Categoria", "Ação", "Label", "Página"
    ));
    for event in &recent.rows {
        output.push_str(&format!(
            "  {:<22} {:<12} {:<18} {:<30} {}\n",
            format_timestamp(event.timestamp, &Local),
            event.category,
            event.action,
            event.label_str().unwrap_or("-"),
            event.page
        ));
    }
    output.push_str(&format!(
        "\n  {}\n",
        style(format!(
            "Página {} de {} ({} eventos)",
            recent.page, recent.total_pages, recent.total_matching
        ))
        .dim()
    ));
    output
}
