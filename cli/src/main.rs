//! CLI entrypoint for diligence
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod services;

use anyhow::{Context, Result, bail};
use clap::Parser;
use diligence_application::{
    AnalysisStatusView, DispatchInput, OrchestrationError, PollAnalysisUseCase, ReanalysisRequest,
    ReanalysisResponse,
};
use diligence_domain::{
    AgentDefinition, AgentName, AnalysisId, AnalysisMode, DealId, DomainTag, ImpactAnalyzer,
    PostCallReport, SessionId, UserId,
};
use diligence_infrastructure::{ConfigLoader, FileConfig};
use diligence_presentation::{Cli, Command, ConsoleFormatter, OutputFormat, RunArgs};
use serde::Serialize;
use services::Services;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const USAGE_WINDOW_DAYS: u32 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("failed to load configuration")?
    };

    let _log_guard = init_tracing(cli.verbose, &file_config);
    info!("Starting diligence");

    if matches!(cli.command, Command::ShowConfig) {
        return show_config(&file_config);
    }

    let resolved = file_config.resolve()?;
    for issue in &resolved.warnings {
        warn!("{}", issue.message);
    }

    match &cli.command {
        Command::Agents { tag } => {
            let agents: Vec<&AgentDefinition> = if tag.is_empty() {
                resolved.registry.list_all().iter().collect()
            } else {
                let tags: BTreeSet<DomainTag> = tag.iter().map(|t| resolved.policy.canonical_tag(t)).collect();
                resolved.registry.resolve_tags(&tags)
            };
            match cli.output {
                OutputFormat::Text => print!("{}", ConsoleFormatter::format_agents(&agents)),
                OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&agents)),
            }
        }
        Command::Impact { report } => {
            let content = std::fs::read_to_string(report)
                .with_context(|| format!("failed to read {}", report.display()))?;
            let payload: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON in {}", report.display()))?;
            let assessment = ImpactAnalyzer::new(&resolved.registry, &resolved.policy)
                .assess(&PostCallReport::from_payload(&payload));
            emit(cli.output, &assessment, ConsoleFormatter::format_assessment);
        }
        Command::Analyze { deal, run } => {
            let services = Services::build(&cli, &file_config, resolved, Some(run))?;
            let deal_id = DealId::parse(deal)?;
            let output = services
                .dispatch
                .execute(DispatchInput::new(deal_id.clone(), AnalysisMode::Full))
                .await
                .map_err(with_status)?;
            finish_run(&cli, services, &deal_id, output.analysis_id, &output.agents, run).await?;
        }
        Command::Reanalyze {
            deal,
            session,
            mode,
            run,
        } => {
            let services = Services::build(&cli, &file_config, resolved, Some(run))?;
            let mut request = ReanalysisRequest::new(
                deal.as_str(),
                session.as_str(),
                mode.as_str(),
                UserId::parse(&run.caller)?,
            );
            if run.admin {
                request = request.as_admin();
            }
            match services.reanalysis.execute(request).await.map_err(with_status)? {
                ReanalysisResponse::Delta(report) => {
                    emit(cli.output, &report, ConsoleFormatter::format_delta);
                }
                ReanalysisResponse::Accepted {
                    analysis_id,
                    agents,
                } => {
                    let deal_id = DealId::parse(deal)?;
                    finish_run(&cli, services, &deal_id, analysis_id, &agents, run).await?;
                }
            }
        }
        Command::Delta { deal, session } => {
            let services = Services::build(&cli, &file_config, resolved, None)?;
            let report = services
                .delta
                .execute(&SessionId::parse(session)?, &DealId::parse(deal)?)
                .await
                .map_err(with_status)?;
            emit(cli.output, &report, ConsoleFormatter::format_delta);
        }
        Command::ShowConfig => {}
    }

    Ok(())
}

/// Print the accepted run, wait for the worker to finish it, then report
/// status and costs.
async fn finish_run(
    cli: &Cli,
    mut services: Services,
    deal_id: &DealId,
    analysis_id: AnalysisId,
    agents: &[AgentName],
    run: &RunArgs,
) -> Result<()> {
    if cli.output == OutputFormat::Text {
        print!("{}", ConsoleFormatter::format_accepted(&analysis_id, agents));
    }

    if run.no_wait {
        let view = services.poll.by_id(analysis_id).await.map_err(with_status)?;
        if cli.output == OutputFormat::Json {
            println!("{}", ConsoleFormatter::format_json(&view));
        }
        return Ok(());
    }

    let view = wait_for_run(&services.poll, analysis_id).await?;
    if let Some(stats) = services.shutdown().await? {
        info!(batches = stats.batches_completed, "Job worker drained");
    }

    let costs = services
        .ledger
        .get_deal_cost_summary(deal_id)
        .await
        .map_err(with_status)?;
    let owner = services
        .store
        .deals()?
        .into_iter()
        .find(|d| &d.id == deal_id)
        .map(|d| d.owner_id);
    let usage = match owner {
        Some(owner) => Some(
            services
                .ledger
                .get_user_stats(&owner, USAGE_WINDOW_DAYS)
                .await
                .map_err(with_status)?,
        ),
        None => None,
    };

    match cli.output {
        OutputFormat::Text => {
            print!("{}", ConsoleFormatter::format_status(&view));
            print!("{}", ConsoleFormatter::format_costs(&costs));
            if let Some(usage) = &usage {
                print!("{}", ConsoleFormatter::format_user_stats(usage));
            }
        }
        OutputFormat::Json => {
            let combined = serde_json::json!({
                "analysis": view,
                "costs": costs,
                "usage": usage,
            });
            println!("{}", ConsoleFormatter::format_json(&combined));
        }
    }
    Ok(())
}

async fn wait_for_run(poll: &PollAnalysisUseCase, analysis_id: AnalysisId) -> Result<AnalysisStatusView> {
    loop {
        let view = poll.by_id(analysis_id).await.map_err(with_status)?;
        if view.status.is_terminal() {
            return Ok(view);
        }
        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = tokio::signal::ctrl_c() => {
                bail!("interrupted while waiting for analysis {}", analysis_id);
            }
        }
    }
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl Fn(&T) -> String) {
    match format {
        OutputFormat::Text => print!("{}", text(value)),
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(value)),
    }
}

fn with_status(e: OrchestrationError) -> anyhow::Error {
    anyhow::anyhow!("[{}] {}", e.status_code(), e)
}

/// Initialize logging: stderr at the `-v` level (or `RUST_LOG`), plus a
/// daily-rolling file when `[logging].dir` is set.
fn init_tracing(verbose: u8, config: &FileConfig) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter());

    let (file_layer, guard) = match config.logging.dir.as_ref().and(config.logging.log_dir()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "diligence.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    guard
}

fn show_config(config: &FileConfig) -> Result<()> {
    println!("Configuration sources (in priority order):");
    for (label, path, found) in ConfigLoader::config_sources() {
        let marker = if found { "[FOUND]" } else { "[     ]" };
        match path {
            Some(path) => println!("  {} {:<8} {}", marker, label, path.display()),
            None => println!("  {} {}", marker, label),
        }
    }

    let issues = config.validate();
    if !issues.is_empty() {
        println!("\nIssues:");
        for issue in &issues {
            let kind = if issue.is_error() { "error" } else { "warning" };
            println!("  {}: {}", kind, issue.message);
        }
    }

    println!("\nEffective configuration:\n");
    println!(
        "{}",
        toml::to_string_pretty(config).context("failed to render configuration")?
    );
    Ok(())
}
