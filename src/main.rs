//! CyberSentinel operator CLI
//!
//! Loads the alert set once, renders the dashboard, and drives threat
//! status transitions.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentinel_dashboard::constants::{APP_NAME, APP_VERSION};
use sentinel_dashboard::logic::{
    self, allowed_transition, query, DashboardSession, ThreatFilter,
};
use sentinel_dashboard::models::AffectedSystem;
use sentinel_dashboard::{DashboardConfig, Severity, ThreatId, ThreatRecord, ThreatStatus};

/// CyberSentinel threat dashboard
#[derive(Parser, Debug)]
#[command(name = "sentinel", version, about, long_about = None)]
struct Cli {
    /// Alert backend base URL (overrides SENTINEL_API_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds (overrides SENTINEL_REQUEST_TIMEOUT)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Counters, type distribution, recent activity and open threats
    Summary,
    /// List threats, optionally filtered
    List {
        #[arg(long, value_parser = parse_severity)]
        severity: Option<Severity>,
        #[arg(long, value_parser = parse_status)]
        status: Option<ThreatStatus>,
        /// Case-insensitive text match on id, type, source, target, details
        #[arg(long)]
        search: Option<String>,
        /// Only Active/Investigating threats
        #[arg(long)]
        open: bool,
    },
    /// Threat detail
    Show { id: String },
    /// Mark an Active threat as Investigating
    Investigate { id: String },
    /// Mark an Investigating threat as Resolved
    Resolve { id: String },
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    match Severity::parse(s) {
        Severity::Other(label) => Err(format!("unknown severity '{}' (critical, high, medium, low)", label)),
        severity => Ok(severity),
    }
}

fn parse_status(s: &str) -> Result<ThreatStatus, String> {
    match ThreatStatus::parse(s) {
        ThreatStatus::Other(label) => Err(format!(
            "unknown status '{}' (active, investigating, contained, resolved)",
            label
        )),
        status => Ok(status),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = match cli.verbose {
        0 => "sentinel_dashboard=warn,sentinel=warn",
        1 => "sentinel_dashboard=info,sentinel=info",
        _ => "sentinel_dashboard=debug,sentinel=debug",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let mut config = DashboardConfig::from_env();
    if let Some(url) = cli.base_url.clone() {
        config.base_url = url;
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = timeout;
    }
    let config = config.validated().context("invalid configuration")?;

    tracing::info!("{} v{} starting ({})", APP_NAME, APP_VERSION, config.environment);

    let session = DashboardSession::connect(&config).context("failed to create alert client")?;
    let loaded = session.store.load().await;

    match cli.command.unwrap_or(Commands::Summary) {
        Commands::Summary => {
            if let Err(e) = &loaded {
                eprintln!("warning: failed to fetch threats: {}", e);
            }
            print_summary(&session, config.timeline_limit, cli.json)?;
            loaded.map(|_| ()).context("alert backend unavailable")
        }
        Commands::List { severity, status, search, open } => {
            loaded.context("failed to fetch threats")?;
            let records = session.store.list();
            let filter = ThreatFilter { severity, status, search };
            let rows: Vec<&ThreatRecord> = filter
                .apply(&records)
                .into_iter()
                .filter(|r| !open || r.is_open())
                .collect();
            print_list(&rows, cli.json)
        }
        Commands::Show { id } => {
            loaded.context("failed to fetch threats")?;
            let records = session.store.list();
            let Some(record) = query::find_by_label(&records, &id) else {
                bail!("threat {} not found", id);
            };
            print_detail(record, cli.json)
        }
        Commands::Investigate { id } => {
            loaded.context("failed to fetch threats")?;
            transition(&session, &id, ThreatStatus::Investigating, cli.json).await
        }
        Commands::Resolve { id } => {
            loaded.context("failed to fetch threats")?;
            transition(&session, &id, ThreatStatus::Resolved, cli.json).await
        }
    }
}

/// Resolve an operator-typed id against the loaded records
fn resolve_id(session: &DashboardSession, label: &str) -> ThreatId {
    let records = session.store.list();
    query::find_by_label(&records, label)
        .map(|r| r.id.clone())
        .unwrap_or_else(|| label.parse::<ThreatId>().unwrap_or_else(|never| match never {}))
}

async fn transition(session: &DashboardSession, label: &str, target: ThreatStatus, json: bool) -> anyhow::Result<()> {
    let id = resolve_id(session, label);
    let updated = session.updater
        .set_status(&id, target.clone())
        .await
        .with_context(|| format!("failed to mark threat {} as {}", id, target))?;

    if json {
        print_json(&updated)
    } else {
        println!("Threat {} status updated to {}.", updated.id, updated.status_label());
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_summary(session: &DashboardSession, timeline_limit: usize, json: bool) -> anyhow::Result<()> {
    let records = session.store.list();
    let summary = logic::compute_summary(&records);
    let by_type = logic::group_by_type(&records);
    let timeline = logic::recent_timeline(&records, timeline_limit);
    let open = logic::open_threats(&records);

    if json {
        #[derive(Serialize)]
        struct Dashboard<'a> {
            load_state: logic::LoadState,
            summary: &'a logic::ThreatSummary,
            by_type: &'a [logic::TypeCount],
            timeline: &'a [logic::TimelineEntry],
            open_threats: &'a [&'a ThreatRecord],
        }
        return print_json(&Dashboard {
            load_state: session.store.load_state(),
            summary: &summary,
            by_type: &by_type,
            timeline: &timeline,
            open_threats: &open,
        });
    }

    println!("{} v{}", APP_NAME, APP_VERSION);
    println!();
    println!("  Active Threats         {:>5}", summary.active);
    println!("  New Today              {:>5}", summary.new_today);
    println!("  Pending Investigation  {:>5}", summary.investigation_pending);
    println!("  Resolved               {:>5}", summary.resolved);
    println!(
        "  Severity               C:{} H:{} M:{} L:{} (total {})",
        summary.critical, summary.high, summary.medium, summary.low, summary.total
    );

    println!();
    println!("Threat Distribution");
    for group in &by_type {
        println!("  {:<24} {:>4}  {:>5.1}%", group.name, group.count, group.percentage);
    }

    println!();
    println!("Recent Activity");
    for entry in &timeline {
        println!("  {:>7}  [{}] {}", entry.display_time, entry.severity, entry.event_text);
    }

    println!();
    println!("Open Threats");
    print_rows(&open);
    Ok(())
}

fn print_rows(rows: &[&ThreatRecord]) {
    println!(
        "  {:<10} {:<20} {:<9} {:<16} {:<24} {:<6} {:<13}",
        "ID", "Type", "Severity", "Source", "Target", "Time", "Status"
    );
    for r in rows {
        println!(
            "  {:<10} {:<20} {:<9} {:<16} {:<24} {:<6} {:<13}",
            r.id.to_string(),
            r.type_label(),
            r.severity_label(),
            r.source_label(),
            r.target_label(),
            r.display_time(),
            r.status_label()
        );
    }
}

fn print_list(rows: &[&ThreatRecord], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(rows);
    }
    print_rows(rows);
    println!("  ({} threats)", rows.len());
    Ok(())
}

fn print_detail(record: &ThreatRecord, json: bool) -> anyhow::Result<()> {
    let steps = logic::mitigation_steps(record);
    let phases = logic::incident_phases(record);
    let systems = logic::affected_systems(record);
    let next_action = allowed_transition(record.status.as_ref());

    if json {
        #[derive(Serialize)]
        struct Detail<'a> {
            threat: &'a ThreatRecord,
            mitigation_steps: &'a [String],
            phases: &'a [logic::IncidentPhase],
            affected_systems: &'a [AffectedSystem],
            next_action: Option<ThreatStatus>,
        }
        return print_json(&Detail {
            threat: record,
            mitigation_steps: &steps,
            phases: &phases,
            affected_systems: &systems,
            next_action,
        });
    }

    println!("{} Threat [{} / {}]", record.type_label(), record.severity_label(), record.status_label());
    println!("  ID:        {}", record.id);
    println!("  Source:    {}", record.source_label());
    println!("  Target:    {}", record.target_label());
    println!("  Detected:  {}", record.display_datetime());
    if let Some(details) = &record.details {
        println!("  Details:   {}", details);
    }

    if let Some(analysis) = &record.analysis {
        println!();
        println!("AI Analysis");
        if let Some((class, p)) = analysis.top_class() {
            println!("  Predicted class:  {} ({:.1}%)", class, p * 100.0);
        }
        if let Some(score) = analysis.anomaly_score {
            println!("  Anomaly score:    {:.4}", score);
        }
        if let Some(is_anomaly) = analysis.is_anomaly {
            println!("  Anomalous:        {}", if is_anomaly { "yes" } else { "no" });
        }
        if let Some(explanation) = &analysis.explanation {
            let ranked = explanation.ranked();
            if !ranked.is_empty() {
                println!("  Top features:");
                for (feature, importance) in ranked {
                    println!("    {:<24} {:.4}", feature, importance);
                }
            } else if let Some(message) = &explanation.message {
                println!("  Explanation:      {}", message);
            }
        }
    }

    println!();
    println!("Event Timeline");
    for phase in &phases {
        let at = phase
            .at
            .map(|ts| ts.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        match phase.title {
            Some(title) => {
                println!("  {}  {}", at, title);
                println!("      {}", phase.description);
            }
            None => println!("  {}  {}", at, phase.description),
        }
    }

    println!();
    println!("Affected Systems");
    for system in &systems {
        println!(
            "  {:<24} {:<10} IP: {:<16} Status: {}",
            system.name.as_deref().unwrap_or("Unknown"),
            system.kind.as_deref().unwrap_or("-"),
            system.ip.as_deref().unwrap_or("Unknown"),
            system.status.as_deref().unwrap_or("Unknown")
        );
    }

    println!();
    println!("Recommended Mitigation Steps");
    for (i, step) in steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }

    println!();
    match next_action {
        Some(ThreatStatus::Investigating) => println!("Next action: sentinel investigate {}", record.id),
        Some(ThreatStatus::Resolved) => println!("Next action: sentinel resolve {}", record.id),
        _ => println!("No status action available."),
    }
    Ok(())
}
