use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use softham_analytics_core::{
    AccessGate, CategoryFilter, CurrentPage, Dashboard, DashboardQuery, EventStore, FileStorage,
    Ga4Sink, Tracker, TrackerConfig, TrackerError, dashboard::DEFAULT_PAGE_SIZE, export_csv,
    export_file_name,
};

mod render;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "softham-analytics")]
#[command(about = "Record site interactions and browse the local analytics dashboard")]
struct Cli {
    /// Path of the page the interaction happens on
    #[arg(long, global = true, default_value = "/")]
    page: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record an interaction
    #[command(subcommand)]
    Track(TrackCommand),

    /// Navigate to a page and report the view to the tag manager
    Pageview {
        path: String,

        #[arg(short, long)]
        title: Option<String>,
    },

    /// Unlock the dashboard for this session
    Login {
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Lock the dashboard again
    Logout,

    /// Show summary cards, rankings and recent events
    Dashboard {
        /// Category to list in the recent events table, or "all"
        #[arg(short, long, default_value = "all")]
        filter: String,

        #[arg(short = 'n', long, default_value_t = 1)]
        page_number: usize,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },

    /// Write every stored event to a CSV file
    Export {
        /// Defaults to softham-analytics-<date>.csv in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete every stored event
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TrackCommand {
    /// "Saiba mais" click on a system card
    SaibaMais { system: String },
    /// WhatsApp button click
    Whatsapp { page_name: String },
    /// Contact form submission
    Form {
        #[arg(long)]
        interest: Option<String>,
    },
    /// Manual (PDF) download
    Download { system: String },
    /// Tutorial video click
    Video {
        title: String,

        #[arg(long)]
        system: Option<String>,
    },
    /// Tab switch on a system page
    Tab { tab: String, system: String },
    /// Call-to-action click
    Cta { cta_type: String, location: String },
    /// Free-form event
    Event {
        category: String,
        action: String,

        #[arg(long)]
        label: Option<String>,

        #[arg(long)]
        value: Option<f64>,
    },
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn apply_track(tracker: &Tracker, cmd: TrackCommand) {
    match cmd {
        TrackCommand::SaibaMais { system } => tracker.track_saiba_mais_click(&system),
        TrackCommand::Whatsapp { page_name } => tracker.track_whatsapp_click(&page_name),
        TrackCommand::Form { interest } => tracker.track_form_submit(interest.as_deref()),
        TrackCommand::Download { system } => tracker.track_manual_download(&system),
        TrackCommand::Video { title, system } => {
            tracker.track_video_click(&title, system.as_deref())
        }
        TrackCommand::Tab { tab, system } => tracker.track_tab_navigation(&tab, &system),
        TrackCommand::Cta { cta_type, location } => tracker.track_cta_click(&cta_type, &location),
        TrackCommand::Event {
            category,
            action,
            label,
            value,
        } => tracker.track_event(&category, &action, label.as_deref(), value),
    }
}

/// Run `f` against a tracker, mirroring to GA4 when configured, and wait for delivery.
async fn record(store: &EventStore, config: &TrackerConfig, f: impl FnOnce(&Tracker)) {
    let mut tracker = Tracker::new(store.clone());
    let mut drain = None;
    match Ga4Sink::spawn(&config.tag) {
        Ok((sink, handle)) => {
            tracker = tracker.with_sink(Arc::new(sink));
            drain = Some(handle);
        }
        Err(e) => debug!(error = %e, "tag manager mirroring disabled"),
    }

    f(&tracker);
    drop(tracker);

    if let Some(handle) = drain {
        let spinner = create_spinner("Sending to Google Analytics...");
        if tokio::time::timeout(FLUSH_TIMEOUT, handle).await.is_err() {
            debug!("gave up waiting for tag delivery");
        }
        spinner.finish_and_clear();
    }
}

fn require_login(gate: &AccessGate) {
    if !gate.is_authenticated() {
        eprintln!(
            "{} Acesso restrito. Run {} first.",
            style("Error:").red().bold(),
            style("softham-analytics login").cyan()
        );
        std::process::exit(1);
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    let term = Term::stdout();
    term.write_str(prompt)?;
    let answer = term.read_line()?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "sim" | "y" | "yes"
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = TrackerConfig::from_env();

    let store = EventStore::new(
        Arc::new(FileStorage::new(&config.data_dir)),
        CurrentPage::new(cli.page),
    );
    let gate = AccessGate::new(
        Arc::new(FileStorage::new(&config.session_dir)),
        config.dashboard_password.clone(),
    );

    match cli.command {
        Command::Track(cmd) => {
            record(&store, &config, |tracker| apply_track(tracker, cmd)).await;
            println!(
                "{} Recorded on {} {}",
                style("✓").green().bold(),
                style(store.current_page().path()).cyan(),
                style(format!("({} stored)", store.len())).dim()
            );
        }
        Command::Pageview { path, title } => {
            record(&store, &config, |tracker| {
                tracker.track_page_view(&path, title.as_deref())
            })
            .await;
            println!("{} Viewed {}", style("✓").green().bold(), style(&path).cyan());
        }
        Command::Login { password } => {
            let password = match password {
                Some(p) => p,
                None => {
                    let term = Term::stderr();
                    term.write_str("Senha: ")?;
                    term.read_secure_line()?
                }
            };
            match gate.login(&password) {
                Ok(()) => println!("{} Dashboard unlocked", style("✓").green().bold()),
                Err(TrackerError::WrongPassword) => {
                    eprintln!("{} {}", style("Error:").red().bold(), TrackerError::WrongPassword);
                    std::process::exit(1);
                }
                Err(e) => return Err(e).context("failed to save session flag"),
            }
        }
        Command::Logout => {
            gate.logout().context("failed to remove session flag")?;
            println!("{} Dashboard locked", style("✓").green().bold());
        }
        Command::Dashboard {
            filter,
            page_number,
            page_size,
        } => {
            require_login(&gate);
            let query = DashboardQuery {
                filter: CategoryFilter::parse(&filter),
                page: page_number,
                page_size,
            };
            let snapshot = store.read_all();
            let dashboard = Dashboard::build(&snapshot, &query);
            println!("{}", render::render_dashboard(&dashboard, &query.filter));
        }
        Command::Export { output } => {
            require_login(&gate);
            let csv = export_csv(&store.read_all())?;
            if csv.is_empty() {
                println!("{}", style("Nenhum dado para exportar").yellow());
                return Ok(());
            }
            let path = output
                .unwrap_or_else(|| PathBuf::from(export_file_name(Local::now().date_naive())));
            fs::write(&path, csv)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "{} {}",
                style("Saved:").dim(),
                style(path.display()).cyan()
            );
        }
        Command::Clear { yes } => {
            require_login(&gate);
            if !yes
                && !confirm("Tem certeza que deseja limpar todos os dados de analytics? [s/N] ")?
            {
                println!("{}", style("Nada foi apagado").dim());
                return Ok(());
            }
            store.clear().context("failed to clear event log")?;
            println!("{} Dados de analytics apagados", style("✓").green().bold());
        }
    }

    Ok(())
}
