//! Compliance CLI
//!
//! Checks a template file or a public URL and prints the report, either as
//! a coloured summary or as JSON for other tools.

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use compliance_core::{
    AcquisitionConfig, AttemptOutcome, CheckError, CheckRequest, ComplianceChecker,
    ComplianceReport, ContentType, LoadSummary, OpenAiCollaborator, RuleEngine, Severity,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "compliance")]
#[command(about = "Check marketing content against compliance rules")]
struct Cli {
    /// Print the full report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Rule file replacing the built-in catalogue
    #[arg(long, global = true, value_name = "PATH")]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire a public page and check it
    CheckUrl {
        url: String,
        #[arg(long, default_value = "webpage")]
        content_type: String,
        /// Check pasted page content instead of fetching the URL
        #[arg(long, value_name = "FILE")]
        content_file: Option<PathBuf>,
    },

    /// Check a template file (EDM markup or plain text)
    CheckTemplate {
        file: PathBuf,
        #[arg(long, default_value = "edm")]
        content_type: String,
    },

    /// Load a rule file and report which rules compile
    ValidateRules { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,compliance_core=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::ValidateRules { path } => {
            let engine = RuleEngine::empty();
            let summary = engine
                .load_from_path(&path)
                .with_context(|| format!("failed to load rules from {}", path.display()))?;
            print_load_summary(&path, &summary, cli.json)?;
            Ok(if summary.skipped.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::CheckTemplate { file, content_type } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let checker = build_checker(&config, cli.rules.as_deref())?;

            let report = checker
                .check_template(CheckRequest::new(content, ContentType::from(content_type)))
                .await;

            print_report(&report, cli.json)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::CheckUrl {
            url,
            content_type,
            content_file,
        } => {
            let checker = build_checker(&config, cli.rules.as_deref())?;
            let content_type = ContentType::from(content_type);

            if let Some(file) = content_file {
                let content = std::fs::read_to_string(&file)
                    .with_context(|| format!("failed to read {}", file.display()))?;
                let report = checker.check_manual_content(&url, &content, content_type).await;
                print_report(&report, cli.json)?;
                return Ok(ExitCode::SUCCESS);
            }

            match checker.check_url(&url, content_type).await {
                Ok(report) => {
                    print_report(&report, cli.json)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(CheckError::Acquisition(err)) => {
                    if cli.json {
                        let body = serde_json::json!({
                            "error": err.to_string(),
                            "code": err.code(),
                            "attempts": err.attempts(),
                        });
                        println!("{}", serde_json::to_string_pretty(&body)?);
                    } else {
                        eprintln!("{} {}", "✗".red().bold(), err);
                        for attempt in err.attempts() {
                            if let AttemptOutcome::Failed { reason, .. } = &attempt.outcome {
                                eprintln!(
                                    "  tier {} {}: {}",
                                    attempt.tier,
                                    attempt.strategy.dimmed(),
                                    reason
                                );
                            }
                        }
                        if err.requires_manual_content() {
                            eprintln!(
                                "\n{} save the page content to a file and run:\n  compliance check-url {} --content-file <FILE>",
                                "→".yellow().bold(),
                                url
                            );
                        }
                    }
                    Ok(ExitCode::from(2))
                }
            }
        }
    }
}

fn build_checker(config: &Config, rules_override: Option<&Path>) -> Result<ComplianceChecker> {
    let engine = match rules_override.or(config.rules_path.as_deref()) {
        Some(path) => {
            let engine = RuleEngine::empty();
            let summary = engine
                .load_from_path(path)
                .with_context(|| format!("failed to load rules from {}", path.display()))?;
            for skipped in &summary.skipped {
                tracing::warn!(rule_id = %skipped.rule_id, reason = %skipped.reason, "Rule skipped");
            }
            engine
        }
        None => RuleEngine::with_default_rules(),
    };

    let mut builder = ComplianceChecker::builder()
        .rules(Arc::new(engine))
        .acquisition_config(AcquisitionConfig::default().with_timeout(config.fetch_timeout));

    match &config.openai_api_key {
        Some(api_key) => {
            let mut collaborator = OpenAiCollaborator::with_timeout(api_key.clone(), config.analysis_timeout);
            if let Some(base_url) = &config.openai_base_url {
                collaborator = collaborator.with_base_url(base_url.clone());
            }
            if let Some(model) = &config.model {
                collaborator = collaborator.with_model(model.clone());
            }
            tracing::info!(model = collaborator.model(), "Generative analyzers enabled");

            let collaborator = Arc::new(collaborator);
            builder = builder
                .analyzer(collaborator.clone())
                .seo_advisor(collaborator.clone())
                .assisted_extractor(collaborator);
        }
        None => {
            tracing::info!("OPENAI_API_KEY not set, running deterministic checks only");
        }
    }

    builder.build().context("failed to build checker")
}

fn severity_label(severity: Severity) -> ColoredString {
    let label = severity.as_str().to_uppercase();
    match severity {
        Severity::Critical => label.bright_red().bold(),
        Severity::High => label.red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.blue(),
    }
}

fn score_label(score: u8) -> ColoredString {
    let text = format!("{}/100", score);
    match score {
        90..=100 => text.bright_green().bold(),
        70..=89 => text.yellow().bold(),
        _ => text.bright_red().bold(),
    }
}

fn print_report(report: &ComplianceReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{} {}", "Compliance score:".bold(), score_label(report.score));
    println!(
        "  languages: {}{}",
        report.languages.join(", "),
        if report.is_bilingual { " (bilingual)" } else { "" }
    );
    if let Some(acquisition) = &report.acquisition {
        println!(
            "  acquired: {} ({} attempt(s))",
            acquisition.method,
            acquisition.attempts.len()
        );
    }
    let counts = &report.severity_counts;
    println!(
        "  issues: {} critical, {} high, {} medium, {} low",
        counts.critical, counts.high, counts.medium, counts.low
    );

    for (category, issues) in &report.issues {
        println!("\n{}", category.as_str().cyan().bold());
        for issue in issues {
            println!("  [{}] {}", severity_label(issue.severity), issue.message);
            if !issue.original.is_empty() {
                println!("      {}", issue.original.dimmed());
            }
            if let Some(suggestion) = &issue.suggestion {
                println!("      {} {}", "→".green(), suggestion);
            }
        }
    }

    if let Some(seo) = &report.seo {
        println!(
            "\n{} {} ({})",
            "SEO score:".bold(),
            score_label(seo.score),
            seo.category
        );
        for finding in &seo.findings {
            for issue in &finding.issues {
                println!(
                    "  [{}] {}: {}",
                    severity_label(issue.severity),
                    finding.aspect,
                    issue.message
                );
            }
        }
    }

    if !report.suggestions.is_empty() {
        println!("\n{}", "Suggestions".bold());
        for suggestion in &report.suggestions {
            println!("  • {}", suggestion);
        }
    }

    Ok(())
}

fn print_load_summary(path: &Path, summary: &LoadSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!(
        "{} {} rule(s) loaded from {}",
        "✓".bright_green().bold(),
        summary.loaded,
        path.display()
    );
    for skipped in &summary.skipped {
        println!("  {} {}: {}", "✗".red(), skipped.rule_id.bold(), skipped.reason);
    }
    Ok(())
}
