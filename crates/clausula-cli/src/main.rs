//! clausula command line interface.
//!
//! Reads plain-text contracts, runs the analysis and prints JSON on stdout.
//! Logs go to stderr.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use clausula_core::{
    analyze, analyze_debug, normalize_with_limit, rules, AnalysisError, Classification, Engine,
    EngineConfig, ExtractedDocument, LegalContext, RuleGroup,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clausula")]
#[command(version, about = "Risk analysis for rental, services, employment and banking contracts")]
struct Cli {
    /// Engine configuration (YAML, or JSON by extension)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a contract and print the findings as JSON
    Analyze {
        file: PathBuf,

        /// Contract group (alquiler, servicios, laboral, bancario); all rules run when omitted
        #[arg(long)]
        group: Option<RuleGroup>,

        /// Use the debug confidence threshold
        #[arg(long)]
        debug: bool,

        /// Override the confidence threshold
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// List the rules selected for a group, or every registered rule
    Rules {
        #[arg(long)]
        group: Option<RuleGroup>,
    },

    /// Print the legal context resolved for a contract
    Context { file: PathBuf },

    /// Print the normalized paragraphs, spans and notes of a contract
    Normalize { file: PathBuf },
}

#[derive(Serialize)]
struct RuleListing {
    id: &'static str,
    group: RuleGroup,
    enabled: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<AnalysisError>() {
            Some(analysis_err) => {
                eprintln!("{}", analysis_err.user_hint());
                tracing::error!(error = %analysis_err, "analysis failed");
                ExitCode::from(2)
            }
            None => {
                eprintln!("error: {:#}", err);
                ExitCode::FAILURE
            }
        },
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Analyze {
            file,
            group,
            debug,
            threshold,
        } => {
            let mut config = config;
            if let Some(threshold) = threshold {
                if debug {
                    config.debug_threshold = threshold;
                } else {
                    config.confidence_threshold = threshold;
                }
                config.validate().context("invalid --threshold")?;
            }

            let document = read_document(&file)?;
            let classification = group.map_or_else(Classification::unknown, Classification::pinned);
            let debug_mode = debug;
            tracing::info!(
                file = %file.display(),
                contract_type = classification.kind.as_str(),
                debug_mode,
                "analyzing"
            );

            let analysis = if debug {
                analyze_debug(&document, classification, &config)?
            } else {
                analyze(&document, classification, &config)?
            };
            tracing::info!(findings = analysis.findings.len(), "analysis complete");
            print_json(&analysis)
        }
        Command::Rules { group } => {
            let engine = Engine::new(config);
            let listing: Vec<RuleListing> = match group {
                Some(group) => engine
                    .selected_rules(group)
                    .into_iter()
                    .map(|entry| RuleListing {
                        id: entry.id,
                        group: entry.group,
                        enabled: true,
                    })
                    .collect(),
                None => {
                    let enabled: HashSet<&str> = RuleGroup::ALL
                        .into_iter()
                        .flat_map(|group| engine.selected_rule_ids(group))
                        .collect();
                    rules::REGISTRY
                        .iter()
                        .map(|entry| RuleListing {
                            id: entry.id,
                            group: entry.group,
                            enabled: enabled.contains(entry.id),
                        })
                        .collect()
                }
            };
            print_json(&listing)
        }
        Command::Context { file } => {
            let document = read_document(&file)?;
            let normalized = normalize_with_limit(&document.text, config.max_chars)
                .map_err(AnalysisError::from)?;
            print_json(&LegalContext::resolve(normalized.text()))
        }
        Command::Normalize { file } => {
            let document = read_document(&file)?;
            let normalized = normalize_with_limit(&document.text, config.max_chars)
                .map_err(AnalysisError::from)?;
            print_json(&normalized)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn read_document(path: &Path) -> Result<ExtractedDocument> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path.file_name().and_then(|name| name.to_str());
    Ok(ExtractedDocument::from_bytes(&bytes, filename, None)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
