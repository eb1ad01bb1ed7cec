//! synprobe - LLM consistency testing
//!
//! Expands seed questions into synonym rephrasings selected by a covering
//! array, submits every rephrasing to a model and scores the answers.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use synprobe_oracle::{
    OracleError, OracleRegistry, OracleService, SentenceFilter, DEFAULT_ORACLE_ID,
};
use synprobe_runner::{Orchestrator, RunnerConfig, SeedReader};
use synprobe_store::ResultStore;
use synprobe_types::{Cardinalities, OracleId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "synprobe")]
#[command(about = "Combinatorial consistency testing for language models", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SYNPROBE_CONFIG")]
    config: Option<String>,

    /// Log level (overrides the configuration file)
    #[arg(long, env = "SYNPROBE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "SYNPROBE_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline over the seed file
    Run {
        /// Seed file (JSONL)
        #[arg(short, long)]
        seeds: Option<PathBuf>,

        /// Covering-array strength
        #[arg(short = 't', long)]
        strength: Option<usize>,

        /// Resume after the last stored sentence
        #[arg(long)]
        continue_run: bool,

        /// Evaluate the stored results afterwards and print the report
        #[arg(long)]
        evaluate: bool,
    },

    /// Print the synonym table of a sentence as JSON
    Expand {
        sentence: String,

        /// Candidates per position, original token included
        #[arg(short, long)]
        max_candidates: Option<usize>,
    },

    /// Print the covering array for a cardinality vector
    Generate {
        /// Covering-array strength
        #[arg(short = 't', long, default_value = "2")]
        strength: usize,

        /// Candidate counts per position, e.g. 3,5,2
        #[arg(value_delimiter = ',', required = true)]
        cardinalities: Vec<usize>,
    },

    /// Classify stored responses and print the scores
    Evaluate {
        /// Oracle identifier
        #[arg(short, long, default_value = "1")]
        oracle: i64,

        /// Only sentences run against this model
        #[arg(long)]
        model: Option<String>,

        /// Only sentences generated with this strength
        #[arg(long)]
        strength: Option<usize>,

        /// Only sentences carrying this note
        #[arg(long)]
        note: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        RunnerConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    match cli.command {
        Commands::Run {
            seeds,
            strength,
            continue_run,
            evaluate,
        } => {
            if let Some(seeds) = seeds {
                config.run.seeds = seeds;
            }
            if let Some(strength) = strength {
                config.run.strength = strength;
            }
            config.run.continue_run |= continue_run;

            let mut orchestrator = Orchestrator::from_config(&config)?;
            if let Some(settings) = &config.executor.settings {
                orchestrator.apply_model_settings(settings).await?;
            }
            let seeds = SeedReader::open(&config.run.seeds)?;
            let summary = orchestrator.run(seeds, config.run.continue_run).await?;
            print_json(&summary)?;

            if evaluate {
                let filter = SentenceFilter {
                    model_name: Some(config.executor.model.clone()),
                    strength: None,
                    note: Some(config.run.note.clone()),
                };
                evaluate_store(orchestrator.store().clone(), DEFAULT_ORACLE_ID, &filter).await?;
            }
        }

        Commands::Expand {
            sentence,
            max_candidates,
        } => {
            let expander = config.lexicon.build()?;
            let max = max_candidates.unwrap_or(config.lexicon.max_candidates);
            let table = expander.expand(&sentence, max)?;
            println!("{}", table.to_json());
        }

        Commands::Generate {
            strength,
            cardinalities,
        } => {
            let generator = config.generator.build()?;
            let handle = generator
                .generate(&Cardinalities(cardinalities), strength)
                .await?;
            for row in generator.read_rows(&handle)? {
                let row = row?;
                let line: Vec<String> = row.iter().map(ToString::to_string).collect();
                println!("{}", line.join(","));
            }
        }

        Commands::Evaluate {
            oracle,
            model,
            strength,
            note,
        } => {
            let store = config.storage.build()?;
            let filter = SentenceFilter {
                model_name: model,
                strength,
                note,
            };
            evaluate_store(store, OracleId(oracle), &filter).await?;
        }
    }

    Ok(())
}

async fn evaluate_store(
    store: Arc<dyn ResultStore>,
    oracle_id: OracleId,
    filter: &SentenceFilter,
) -> anyhow::Result<()> {
    let registry = OracleRegistry::with_defaults();
    let oracle = registry.get(oracle_id).ok_or_else(|| {
        let known: Vec<String> = registry.ids().map(|id| id.to_string()).collect();
        anyhow::anyhow!(
            "{} (known oracles: {})",
            OracleError::UnknownOracle(oracle_id),
            known.join(", ")
        )
    })?;
    let service = OracleService::new(store);
    service.evaluate(oracle.as_ref(), filter).await?;
    let report = service.report(oracle_id, filter).await?;
    print_json(&report)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
