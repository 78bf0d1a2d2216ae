pub mod compile;
pub mod config;
pub mod contract;
pub mod coordinator;
pub mod job;
pub mod llm;
pub mod load_config;
pub mod materialize;
pub mod orchestrate;
pub mod progress;
pub mod publish;
pub mod select;
pub mod status;
pub mod summarize;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::llm::HttpChatModel;
use crate::load_config::load_config;
use crate::orchestrate::JobRunner;
use crate::publish::HttpObjectStore;
use crate::status::InMemoryStatusStore;

#[derive(Parser)]
#[clap(
    name = "repodoc",
    version,
    about = "Generate one browsable HTML document of LLM summaries for a source repository"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one documentation job to a terminal state and print the outcome
    Process {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Repository URL to document
        #[clap(long)]
        repo_url: String,
        /// Job identifier; a fresh one is minted when omitted
        #[clap(long)]
        job_id: Option<String>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Process {
            config,
            repo_url,
            job_id,
        } => {
            let config = load_config(config)?;

            let model = Arc::new(HttpChatModel::new(config.model.clone()).map_err(|e| {
                anyhow::anyhow!("Failed to construct model client: {e}")
            })?);
            let object_store =
                Arc::new(HttpObjectStore::new(config.storage.clone()).map_err(|e| {
                    anyhow::anyhow!("Failed to construct object store: {e}")
                })?);
            let status_store = Arc::new(InMemoryStatusStore::new());

            let job_id = job_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            let runner = JobRunner::new(model, object_store, status_store, config.pipeline);
            println!("Processing {repo_url} as job {job_id}...");
            let outcome = runner.run_job(&job_id, &repo_url).await;

            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if outcome.status == job::JobStage::Failed {
                anyhow::bail!(
                    "Job {job_id} failed: {}",
                    outcome.error.unwrap_or_else(|| "unknown error".to_string())
                );
            }
            Ok(())
        }
    }
}
