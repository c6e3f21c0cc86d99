//! Deep Research Server
//!
//! Axum server streaming research runs over Server-Sent Events, plus a CLI
//! mode that runs one topic to completion and saves the report.

mod api;

use anyhow::Context;
use clap::{Parser, Subcommand};
use deep_research_core::config::ResearchConfig;
use deep_research_core::state::ResearchState;
use deep_research_core::swarm::{EngineEvent, ProgressNotification, ResearchGraph};
use futures::StreamExt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use api::research::fallback_model;
use api::AppState;

#[derive(Parser, Clone)]
#[command(author, version, about = "Deep Research - iterative web research agent")]
struct Args {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the research API server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Research a topic (CLI mode, no server)
    Run {
        /// The topic to research
        topic: String,
        /// Model selector, e.g. openai/gpt-4o
        #[arg(short, long)]
        model: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// `{topic lowercased, spaces replaced}_report.md`
fn report_file_name(topic: &str) -> String {
    format!("{}_report.md", topic.replace(' ', "_").to_lowercase())
}

fn report_path(dir: &Path, topic: &str) -> PathBuf {
    dir.join(report_file_name(topic))
}

async fn run_topic(config: &ResearchConfig, topic: &str, model: Option<String>) -> anyhow::Result<()> {
    let topic = topic.trim();
    if topic.is_empty() {
        anyhow::bail!("Topic cannot be empty");
    }

    let graph = ResearchGraph::from_config(config)?;
    let model = model.unwrap_or_else(|| fallback_model(&config.llm.model));

    println!("🔬 Starting research on: {}", topic);

    let mut events = Box::pin(graph.stream(ResearchState::new(topic, model)));
    let mut finished = None;

    while let Some(event) = events.next().await {
        match event {
            EngineEvent::Stage(ref stage_event) => {
                for notification in ProgressNotification::from_stage_event(stage_event) {
                    if let ProgressNotification::Update { node, message } = notification {
                        println!("   [{}] {}", node, message);
                    }
                }
            }
            EngineEvent::Finished(state) => finished = Some(state),
            EngineEvent::Failed(e) => return Err(e).context("Research failed"),
        }
    }

    let state = finished.context("Research ended without a final state")?;

    println!("\n✅ Research Complete!\n");
    println!("{}", state.report);

    let path = report_path(&config.report_dir, topic);
    tokio::fs::write(&path, &state.report)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("\n📄 Report saved to {}", path.display());

    Ok(())
}

async fn run_server(config: &ResearchConfig, host: &str, port: u16) -> anyhow::Result<()> {
    let graph = ResearchGraph::from_config(config)?;
    let state = Arc::new(AppState {
        graph,
        default_model: fallback_model(&config.llm.model),
        provider: config.llm.provider,
    });
    let app = api::router(state, &config.allowed_origins);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    println!("🚀 Deep Research Server running at http://{}", addr);
    println!("   Research:  POST /research (SSE)");
    println!("   Health:    GET  /health");
    println!("   Models:    GET  /models");
    println!("   OpenAPI:   GET  /openapi.json");
    println!("   Provider:  {}", config.llm.provider.display_name());
    tracing::info!(provider = config.llm.provider.display_name(), model = %config.llm.model, "Server ready");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine; keys may come from the environment
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(args.verbose);

    let config = ResearchConfig::load();

    match args.command {
        Some(CliCommand::Run { topic, model }) => run_topic(&config, &topic, model).await,
        Some(CliCommand::Serve { port, host }) => run_server(&config, &host, port).await,
        None => run_server(&config, "127.0.0.1", 8000).await,
    }
}
