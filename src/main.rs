//! content-lifecycle: binary entrypoint.
//! Loads config + dataset, then runs one audit or product-list command (or
//! schedules audits with `watch`).

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use content_lifecycle::config::{LifecycleConfig, ENV_LIFECYCLE_CONFIG_PATH};
use content_lifecycle::lifecycle::{Confirm, ExecutionStatus, NeverConfirm};
use content_lifecycle::pipeline::{self, AuditParams, AuditReport, AuditTarget, TopPicksReport};
use content_lifecycle::ranking::SmartPick;
use content_lifecycle::schedule::{run_scheduled, ScheduleCfg};
use content_lifecycle::scoring::{ScoredEntity, ScoredProduct, Scorer};
use content_lifecycle::signals::SignalRepository;
use content_lifecycle::site::{SiteContext, ENV_SITE_URL};
use content_lifecycle::store::json_file::{DEFAULT_DATA_PATH, ENV_DATA_PATH};
use content_lifecycle::store::JsonFileStore;
use content_lifecycle::telemetry::init_tracing;
use content_lifecycle::EngineError;

#[derive(Parser, Debug)]
#[command(name = "content-lifecycle", version, about = "Score, rank and prune site content")]
struct Cli {
    /// TOML config (missing default file = built-in defaults)
    #[arg(long, global = true, env = ENV_LIFECYCLE_CONFIG_PATH)]
    config: Option<PathBuf>,

    /// JSON dataset with products, content and signal rows
    #[arg(long, global = true, env = ENV_DATA_PATH, default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,

    /// Site whose signals are evaluated (overrides config)
    #[arg(long, global = true, env = ENV_SITE_URL)]
    site_url: Option<String>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Blog audit: low performers are set to noindex
    AuditContent(AuditArgs),
    /// Review cleanup: low performers are unpublished (draft)
    CleanupReviews(AuditArgs),
    /// Top-N products, kept apart from the homepage picks
    TopPicks {
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
    /// Homepage slots: best savings, best rated, newest, filler
    HomepagePicks,
    /// Discount-ranked products
    Deals {
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Run the blog audit (forced) on an interval until interrupted
    Watch {
        #[arg(long, default_value_t = 86_400)]
        interval_secs: u64,
        /// Stop after this many runs
        #[arg(long)]
        max_runs: Option<usize>,
        /// Also run the review cleanup each tick
        #[arg(long)]
        include_reviews: bool,
        /// Report only, never write
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct AuditArgs {
    /// Share of ranked entities always kept [default: 70]
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    keep_percentage: Option<u8>,
    /// Young entities with impressions are spared [default: 60]
    #[arg(long)]
    grace_days: Option<i64>,
    /// Entities younger than this are not evaluated [default: 30]
    #[arg(long)]
    min_age_days: Option<i64>,
    /// Signal window in days, 0 = all time [default: 90]
    #[arg(long)]
    window_days: Option<u32>,
    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,
    /// Skip the confirmation prompt
    #[arg(long)]
    force: bool,
    /// Rows shown per bucket [default: 10]
    #[arg(long)]
    top: Option<usize>,
}

/// y/N prompt on stderr; a non-interactive stdin answers no.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            return false;
        }
        eprint!("{prompt} [y/N] ");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e
                .downcast_ref::<EngineError>()
                .map(EngineError::exit_code)
                .unwrap_or(1);
            error!(target: "cli", error = %format!("{e:#}"), "command failed");
            eprintln!("error: {e:#}");
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = match &cli.config {
        Some(path) => LifecycleConfig::load_from(path)?,
        None => LifecycleConfig::load()?,
    };

    match &cli.command {
        Command::AuditContent(args) => {
            audit_once(&cli, &cfg, AuditTarget::BlogPosts, args, &mut StdinConfirm)
        }
        Command::CleanupReviews(args) => {
            audit_once(&cli, &cfg, AuditTarget::Reviews, args, &mut StdinConfirm)
        }
        Command::TopPicks { count } => {
            let store = JsonFileStore::open(&cli.data)?;
            let scorer = Scorer::new(Utc::now());
            let report = pipeline::top_picks(
                &store,
                &cfg.cascade,
                *count,
                &cfg.picks,
                &scorer,
                &mut rand::rng(),
            )?;
            emit(&cli, &report, print_top_picks)
        }
        Command::HomepagePicks => {
            let store = JsonFileStore::open(&cli.data)?;
            let scorer = Scorer::new(Utc::now());
            let picks = pipeline::homepage_picks(&store, &cfg.picks, &scorer, &mut rand::rng())?;
            emit(&cli, &picks, |p| print_picks(p))
        }
        Command::Deals { count } => {
            let store = JsonFileStore::open(&cli.data)?;
            let scorer = Scorer::new(Utc::now());
            let deals = pipeline::deals(&store, *count, &scorer)?;
            emit(&cli, &deals, |d| print_products(d))
        }
        Command::Watch {
            interval_secs,
            max_runs,
            include_reviews,
            dry_run,
        } => {
            // Fail fast on configuration before scheduling anything.
            resolve_site(&cli, &cfg)?;

            let mut targets = vec![AuditTarget::BlogPosts];
            if *include_reviews {
                targets.push(AuditTarget::Reviews);
            }
            let args = AuditArgs {
                dry_run: *dry_run,
                force: true,
                ..Default::default()
            };
            let sched = ScheduleCfg {
                max_runs: *max_runs,
                ..ScheduleCfg::every_secs(*interval_secs)
            };

            info!(target: "cli", interval_secs, ?targets, "watch started");
            tokio::select! {
                runs = run_scheduled(sched, |_| {
                    for t in &targets {
                        audit_once(&cli, &cfg, *t, &args, &mut NeverConfirm)?;
                    }
                    Ok(())
                }) => info!(target: "cli", runs, "watch finished"),
                _ = tokio::signal::ctrl_c() => info!(target: "cli", "interrupted, stopping watch"),
            }
            Ok(())
        }
    }
}

fn resolve_site(cli: &Cli, cfg: &LifecycleConfig) -> Result<SiteContext> {
    let from_cfg = cfg.site_url();
    Ok(SiteContext::resolve([
        cli.site_url.as_deref(),
        from_cfg.as_deref(),
    ])?)
}

fn audit_params(cfg: &LifecycleConfig, target: AuditTarget, args: &AuditArgs) -> (AuditParams, usize) {
    let section = match target {
        AuditTarget::BlogPosts => cfg.audit,
        AuditTarget::Reviews => cfg.reviews,
    };
    let mut params = AuditParams::from(section);
    if let Some(v) = args.keep_percentage {
        params.categorize.keep_percentage = v;
    }
    if let Some(v) = args.grace_days {
        params.categorize.grace_period_days = v.max(0);
    }
    if let Some(v) = args.min_age_days {
        params.min_age_days = v.max(0);
    }
    if let Some(v) = args.window_days {
        params.window_days = v;
    }
    params.execute.dry_run = args.dry_run;
    params.execute.force = args.force;
    (params, args.top.unwrap_or(section.top_count))
}

fn audit_once<C: Confirm + ?Sized>(
    cli: &Cli,
    cfg: &LifecycleConfig,
    target: AuditTarget,
    args: &AuditArgs,
    confirm: &mut C,
) -> Result<()> {
    let site = resolve_site(cli, cfg)?;
    let mut store = JsonFileStore::open(&cli.data)?;
    let signals = SignalRepository::load(&site, &store)?;
    info!(target: "cli", site = site.url(), rows = signals.len(), "signals loaded");

    let (params, top) = audit_params(cfg, target, args);
    let scorer = Scorer::new(Utc::now());
    let report = pipeline::run_audit(target, &mut store, &signals, &scorer, &params, confirm)?;

    emit(cli, &report, |r| print_audit(r, top))?;

    if report.execution.status == ExecutionStatus::Cancelled {
        return Err(EngineError::CancelledByUser.into());
    }
    Ok(())
}

fn emit<T: serde::Serialize>(cli: &Cli, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    if cli.json {
        let out = serde_json::to_string_pretty(value).context("serializing report")?;
        println!("{out}");
    } else {
        text(value);
    }
    Ok(())
}

fn print_audit(r: &AuditReport, top: usize) {
    let c = &r.categorization;
    println!(
        "{:?} audit at {} (target flag: {})",
        r.target,
        r.evaluated_at.format("%Y-%m-%d %H:%M UTC"),
        r.execution.target
    );
    println!(
        "evaluated {} | skipped (too young) {} | keep {} | winners {} | candidates {} | losers {}",
        r.evaluated,
        r.skipped_too_young.len(),
        c.keep_count,
        c.winners.len(),
        c.candidates.len(),
        c.losers.len()
    );

    print_bucket("Winners", &c.winners, top);
    print_bucket("Candidates", &c.candidates, top);
    print_bucket("Losers", &c.losers, top);

    let e = &r.execution;
    match e.status {
        ExecutionStatus::DryRun => {
            println!("dry run: {} would change, {} already {}", e.planned.len(), e.unchanged.len(), e.target)
        }
        ExecutionStatus::Cancelled => println!("cancelled: nothing written"),
        ExecutionStatus::Completed | ExecutionStatus::PartialFailure => println!(
            "updated {} | unchanged {} | failed {}",
            e.count(),
            e.unchanged.len(),
            e.failed.len()
        ),
    }
    for f in &e.failed {
        println!("  failed {}: {}", f.id, f.error);
    }
    if !r.warnings.is_empty() {
        println!("{} warning(s); use --json for details", r.warnings.len());
    }
}

fn print_bucket(name: &str, items: &[ScoredEntity], top: usize) {
    if items.is_empty() {
        return;
    }
    println!("\n{name}:");
    for (i, e) in items.iter().take(top).enumerate() {
        println!(
            "  {:>3}. {:<24} score {:>8.1}  impr {:>6}  clicks {:>5}  age {:>4}d  {:?}",
            i + 1,
            e.id,
            e.score,
            e.signals.total_impressions,
            e.signals.total_clicks,
            e.age_days,
            e.formula
        );
    }
    if items.len() > top {
        println!("  ... {} more", items.len() - top);
    }
}

fn print_picks(picks: &[SmartPick]) {
    for p in picks {
        println!("  {:<12?} {:<24} {}", p.slot, p.product.id, p.product.title);
    }
}

fn print_products(items: &[ScoredProduct]) {
    for (i, sp) in items.iter().enumerate() {
        println!(
            "  {:>3}. {:<24} score {:>6.1}  price {:>8.2}  {}",
            i + 1,
            sp.product.id,
            sp.score,
            sp.product.price,
            sp.product.title
        );
    }
}

fn print_top_picks(r: &TopPicksReport) {
    println!(
        "top {} (stages run: {}; {} excluded from homepage)",
        r.outcome.wanted,
        r.outcome.stages_run.join(" -> "),
        r.homepage.len()
    );
    print_products(&r.outcome.picks);
    if !r.outcome.is_satisfied() {
        println!("only {} of {} found", r.outcome.picks.len(), r.outcome.wanted);
    }
}
