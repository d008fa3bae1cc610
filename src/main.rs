//! Brandbrief - company research and branded message generation pipeline

use anyhow::Result;
use brandbrief::{
    config::BrandbriefConfig,
    content::{GeminiClient, TavilyClient},
    pipeline::{render::RenderStage, research::ResearchStage, Pipeline},
    store::ArtifactStore,
};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "brandbrief")]
#[command(version)]
#[command(about = "Company research and branded message generation pipeline")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "BRANDBRIEF_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for a company
    Run {
        /// Target company name
        company: String,

        /// Seed for deterministic persona/topic/provider selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run the research stage only
    Research {
        /// Target company name
        company: String,
    },

    /// Re-render documents from stored artifacts
    Render {
        /// Company whose message batches to render
        company: String,

        /// Entity whose blended view styles the documents
        #[arg(long)]
        entity: String,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("brandbrief={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = if let Some(config_path) = cli.config {
        let content = std::fs::read_to_string(&config_path)?;
        toml::from_str(&content)?
    } else {
        BrandbriefConfig::default()
    };

    match cli.command {
        Commands::Run { company, seed } => {
            run_pipeline(config, &company, seed).await?;
        }
        Commands::Research { company } => {
            run_research(config, &company).await?;
        }
        Commands::Render { company, entity } => {
            run_render(config, &company, &entity)?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn run_pipeline(config: BrandbriefConfig, company: &str, seed: Option<u64>) -> Result<()> {
    let store = ArtifactStore::open(&config.storage.artifact_dir)?;
    let content = GeminiClient::from_env(&config.model.name)?;
    let search = TavilyClient::from_env()?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let pipeline = Pipeline::new(&store, &content, &search, &config);
    let report = pipeline.run(&mut rng, company).await?;

    match report.provider {
        Some(provider) => tracing::info!(
            "Pipeline complete: provider {}, {} document(s)",
            provider,
            report.documents
        ),
        None => tracing::warn!("Pipeline stopped after research: no provider selected"),
    }

    Ok(())
}

async fn run_research(config: BrandbriefConfig, company: &str) -> Result<()> {
    let store = ArtifactStore::open(&config.storage.artifact_dir)?;
    let content = GeminiClient::from_env(&config.model.name)?;

    ResearchStage::new(&store, &content).run(company).await?;
    tracing::info!("Research complete for {}", company);
    Ok(())
}

fn run_render(config: BrandbriefConfig, company: &str, entity: &str) -> Result<()> {
    let store = ArtifactStore::open(&config.storage.artifact_dir)?;
    let written = RenderStage::new(&store, &config.storage.document_dir)?
        .run(company, entity, None)?;
    tracing::info!("Rendered {} document(s)", written);
    Ok(())
}

fn show_config(config: Option<&BrandbriefConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
