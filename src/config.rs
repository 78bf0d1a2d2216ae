use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Fully merged runtime configuration for one worker process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub model: ModelConfig,
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            scratch_dir = %self.pipeline.scratch_dir.display(),
            concurrency = self.pipeline.concurrency,
            bucket = %self.storage.bucket,
            model = %self.model.model,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}

/// Tunables for the per-job pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root under which per-job scratch clone directories are created.
    pub scratch_dir: PathBuf,
    /// Maximum in-flight summarizations per job.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Character budget per file before truncation.
    #[serde(default = "default_max_file_chars")]
    pub max_file_chars: usize,
    /// Emit a progress event after this many completed summarizations.
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

fn default_concurrency() -> usize {
    10
}

fn default_max_file_chars() -> usize {
    10_000
}

fn default_progress_every() -> usize {
    5
}

/// Object-storage destination for published artifacts.
///
/// `endpoint` and `bucket` come from the config file; the access token comes
/// from the environment at load time. Missing values are a fatal configuration
/// error, not a retryable one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    /// Base URL under which stored objects are readable. Defaults to
    /// `{endpoint}/{bucket}` when absent.
    #[serde(default)]
    pub public_base_url: Option<String>,
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl StorageConfig {
    pub fn trace_loaded(&self) {
        info!(
            endpoint = %self.endpoint,
            bucket = %self.bucket,
            has_token = self.access_token.is_some(),
            "Loaded storage config"
        );
    }
}

/// Chat-model endpoint used for per-file summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub api_base: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Defensive per-request timeout; an ungoverned model call can stall a
    /// worker slot indefinitely.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl ModelConfig {
    pub fn trace_loaded(&self) {
        info!(
            api_base = %self.api_base,
            model = %self.model,
            "Loaded model config"
        );
    }
}
