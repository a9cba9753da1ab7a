//! lc - loading coordinator CLI
//!
//! Runs simulated operations, sequences and navigations through the
//! coordinator and prints what the loading indicator does.

use std::fs;
use std::pin::pin;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use futures::StreamExt;
use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use loadcoord::cli::{Cli, Command, OutputFormat, get_log_path};
use loadcoord::config::Config;
use loadcoord::route::{NavigationTarget, RouteSession, RouteView};
use loadcoord::{LoadingCoordinator, SessionConfig, VisibilityEvent};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log level from config file first, before the full load
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate()?;

    let reporter = Reporter::new(cli.format);
    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Routes { path } => cmd_routes(&config, path.as_deref(), &reporter),
        Command::Run {
            work_ms,
            min_ms,
            message,
            fail,
            absorb,
            stall_ms,
        } => {
            let opts = RunOptions {
                work: Duration::from_millis(work_ms),
                min: Duration::from_millis(min_ms),
                message,
                fail,
                absorb,
                stall: stall_ms.map(Duration::from_millis),
            };
            cmd_run(&config, opts, &reporter).await
        }
        Command::Sequence {
            steps,
            step_ms,
            min_ms,
            message,
            fail_at,
        } => {
            cmd_sequence(
                &config,
                steps,
                Duration::from_millis(step_ms),
                Duration::from_millis(min_ms),
                message,
                fail_at,
                &reporter,
            )
            .await
        }
        Command::Navigate { targets, gap_ms } => {
            cmd_navigate(&config, targets, Duration::from_millis(gap_ms), &reporter).await
        }
    }
}

/// Prints timestamped lines in the selected format
#[derive(Clone, Copy)]
struct Reporter {
    format: OutputFormat,
    started: Instant,
}

impl Reporter {
    fn new(format: OutputFormat) -> Self {
        Self {
            format,
            started: Instant::now(),
        }
    }

    fn line(&self, kind: &str, value: &impl Serialize, text: String) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        match self.format {
            OutputFormat::Json => println!("{}", json!({ "elapsed_ms": elapsed_ms, "kind": kind, "data": value })),
            OutputFormat::Text => println!("[{:>6}ms] {:<10} {}", elapsed_ms, kind.cyan(), text),
        }
    }

    fn visibility(&self, event: &VisibilityEvent) {
        let text = match event {
            VisibilityEvent::Shown { message } => format!("{} {}", "shown".green(), message),
            VisibilityEvent::MessageChanged { message } => format!("{} {}", "message".yellow(), message),
            VisibilityEvent::Hidden => "hidden".red().to_string(),
        };
        self.line("indicator", event, text);
    }

    /// Print indicator events until the coordinator's channel closes
    fn spawn_visibility_printer(self, mut rx: broadcast::Receiver<VisibilityEvent>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => self.visibility(&event),
                    Err(broadcast::error::RecvError::Lagged(n)) => debug!(n, "visibility printer lagged"),
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

fn cmd_routes(config: &Config, path: Option<&str>, reporter: &Reporter) -> Result<()> {
    debug!(?path, "cmd_routes: called");
    let policy = &config.routes;
    let Some(path) = path else {
        match reporter.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(policy)?),
            OutputFormat::Text => {
                println!("{}", "Trigger prefixes:".bold());
                for prefix in &policy.trigger_prefixes {
                    println!("  {}", prefix);
                }
                println!("{}", "Messages:".bold());
                for (route, message) in &policy.messages {
                    println!("  {:<20} {}", route, message);
                }
                println!("{}", "Durations (ms):".bold());
                for (route, ms) in &policy.durations {
                    println!("  {:<20} {}", route, ms);
                }
                println!("{} {}ms", "Prepare delay:".bold(), policy.prepare_delay_ms);
            }
        }
        return Ok(());
    };

    let target = NavigationTarget::parse(path);
    let resolution = policy.resolve(&target.path, &config.coordinator.default_message);
    match reporter.format {
        OutputFormat::Json => {
            let body = json!({
                "path": target.path,
                "triggers": resolution.is_some(),
                "message": resolution.as_ref().map(|r| r.message.clone()),
                "min_duration_ms": resolution.as_ref().map(|r| r.min_duration.as_millis() as u64),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => match resolution {
            Some(r) => println!(
                "{} triggers a session: \"{}\" for at least {}ms",
                target.path.bold(),
                r.message,
                r.min_duration.as_millis()
            ),
            None => println!("{} does not trigger a session", target.path.bold()),
        },
    }
    Ok(())
}

struct RunOptions {
    work: Duration,
    min: Duration,
    message: Option<String>,
    fail: bool,
    absorb: bool,
    stall: Option<Duration>,
}

async fn cmd_run(config: &Config, opts: RunOptions, reporter: &Reporter) -> Result<()> {
    debug!(work_ms = opts.work.as_millis() as u64, min_ms = opts.min.as_millis() as u64, "cmd_run: called");
    let coordinator = LoadingCoordinator::new(&config.coordinator);
    let printer = reporter.spawn_visibility_printer(coordinator.subscribe());
    let message = opts
        .message
        .unwrap_or_else(|| coordinator.default_message().to_string());

    if let Some(stall) = opts.stall {
        let work = futures::future::pending::<Result<u64>>();
        // Pinned so the stalled run outlives the select and still holds its token at force-hide
        let mut run = pin!(coordinator.run_with_loading(work, SessionConfig::new(message, opts.min)));
        tokio::select! {
            outcome = &mut run => debug!(ok = outcome.is_ok(), "cmd_run: stalled work finished"),
            _ = sleep(stall) => {
                let cleared = coordinator.force_hide();
                reporter.line(
                    "recovery",
                    &json!({ "cleared": cleared }),
                    format!("force-hide cleared {} token(s)", cleared),
                );
            }
        }
    } else {
        let (work_time, fail) = (opts.work, opts.fail);
        let work = async move {
            sleep(work_time).await;
            if fail {
                Err(eyre!("simulated failure"))
            } else {
                Ok(work_time.as_millis() as u64)
            }
        };
        let mut session = SessionConfig::new(message, opts.min);
        if opts.absorb {
            session = session.on_failure(|e| {
                tracing::warn!(error = %e, "absorbing failure");
                Ok(0)
            });
        }

        let outcome = match coordinator.run_with_loading(work, session).await {
            Ok(value) => Outcome::ok(json!(value), value.to_string()),
            Err(e) => Outcome::failed(&e),
        };
        return finish(coordinator, printer, reporter, Some(outcome)).await;
    }

    finish(coordinator, printer, reporter, None).await
}

async fn cmd_sequence(
    config: &Config,
    steps: u32,
    step: Duration,
    min: Duration,
    message: Option<String>,
    fail_at: Option<u32>,
    reporter: &Reporter,
) -> Result<()> {
    debug!(steps, ?fail_at, "cmd_sequence: called");
    let coordinator = LoadingCoordinator::new(&config.coordinator);
    let printer = reporter.spawn_visibility_printer(coordinator.subscribe());
    let message = message.unwrap_or_else(|| coordinator.default_message().to_string());

    let rep = *reporter;
    let units = (1..=steps).map(|i| {
        move || async move {
            rep.line("step", &json!({ "step": i }), format!("step {} started", i));
            sleep(step).await;
            if fail_at == Some(i) {
                return Err(eyre!("step {} failed", i));
            }
            Ok(i)
        }
    });

    let outcome = match coordinator.run_sequence_with_loading(units, message, min).await {
        Ok(results) => Outcome::ok(json!(results), format!("{:?}", results)),
        Err(e) => Outcome::failed(&e),
    };

    finish(coordinator, printer, reporter, Some(outcome)).await
}

async fn cmd_navigate(config: &Config, targets: Vec<String>, gap: Duration, reporter: &Reporter) -> Result<()> {
    debug!(count = targets.len(), "cmd_navigate: called");
    let coordinator = LoadingCoordinator::new(&config.coordinator);
    let printer = reporter.spawn_visibility_printer(coordinator.subscribe());
    let session = RouteSession::new(coordinator.clone(), config.routes.clone());

    let mut view = session.view();
    let rep = *reporter;
    let view_printer = tokio::spawn(async move {
        while view.changed().await.is_ok() {
            let current = view.borrow_and_update().clone();
            let text = match &current {
                RouteView::Unmounted => "unmounted".to_string(),
                RouteView::Loading { message } => format!("{} {}", "loading".yellow(), message),
                RouteView::Content { path, query } => match query {
                    Some(q) => format!("{} {}?{}", "content".green(), path, q),
                    None => format!("{} {}", "content".green(), path),
                },
            };
            rep.line("view", &current, text);
        }
    });

    let events = futures::stream::iter(targets.into_iter().enumerate()).then(move |(i, target)| async move {
        if i > 0 {
            sleep(gap).await;
        }
        let target = NavigationTarget::parse(&target);
        rep.line("navigate", &target, target.to_string());
        target
    });
    session.run(events).await;

    view_printer.await.context("View printer task failed")?;
    finish(coordinator, printer, reporter, None).await
}

/// Final result of a simulated operation
struct Outcome {
    data: serde_json::Value,
    text: String,
}

impl Outcome {
    fn ok(value: serde_json::Value, text: String) -> Self {
        Self {
            data: json!({ "ok": value }),
            text: format!("{} ({})", "ok".green(), text),
        }
    }

    fn failed(error: &eyre::Report) -> Self {
        Self {
            data: json!({ "error": error.to_string() }),
            text: format!("{} {}", "failed:".red(), error),
        }
    }
}

/// Close the coordinator, wait for the printer, then print the outcome and ledger stats
async fn finish(
    coordinator: LoadingCoordinator,
    printer: tokio::task::JoinHandle<()>,
    reporter: &Reporter,
    outcome: Option<Outcome>,
) -> Result<()> {
    let stats = coordinator.stats();
    // Dropping the last handle closes the event channel and ends the printer
    drop(coordinator);
    printer.await.context("Indicator printer task failed")?;

    if let Some(outcome) = outcome {
        reporter.line("result", &outcome.data, outcome.text);
    }

    reporter.line(
        "stats",
        &stats,
        format!(
            "acquired={} released={} ignored={} forced={} peak={}",
            stats.acquired, stats.released, stats.ignored_releases, stats.forced_tokens, stats.peak_active
        ),
    );
    Ok(())
}
