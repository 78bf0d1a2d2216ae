use crate::config::{Config, ModelConfig, PipelineConfig, StorageConfig};
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Deserialize)]
struct StaticConfig {
    pipeline: PipelineSection,
    storage: StorageSection,
    model: ModelSection,
}

#[derive(Deserialize)]
struct PipelineSection {
    scratch_dir: std::path::PathBuf,
    #[serde(default)]
    concurrency: Option<usize>,
    #[serde(default)]
    max_file_chars: Option<usize>,
    #[serde(default)]
    progress_every: Option<usize>,
}

#[derive(Deserialize)]
struct StorageSection {
    endpoint: String,
    bucket: String,
    #[serde(default)]
    public_base_url: Option<String>,
}

#[derive(Deserialize)]
struct ModelSection {
    api_base: String,
    model: String,
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
}

/// Loads a static YAML config file (no secrets) and injects required env vars
/// for secrets. Returns a fully merged Config or an error.
///
/// Missing storage configuration is a fatal configuration error: it is caught
/// here, before any job runs, rather than surfacing mid-upload.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let static_conf: StaticConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if static_conf.storage.bucket.trim().is_empty() {
        error!("storage.bucket is empty in config");
        anyhow::bail!("storage.bucket must not be empty");
    }
    if static_conf.storage.endpoint.trim().is_empty() {
        error!("storage.endpoint is empty in config");
        anyhow::bail!("storage.endpoint must not be empty");
    }

    let storage_token = match std::env::var("STORAGE_ACCESS_TOKEN") {
        Ok(token) => {
            info!("STORAGE_ACCESS_TOKEN found in env");
            Some(token)
        }
        Err(e) => {
            error!(error = ?e, "STORAGE_ACCESS_TOKEN environment variable not set");
            return Err(anyhow::anyhow!(
                "STORAGE_ACCESS_TOKEN environment variable not set: {e}"
            ));
        }
    };

    let model_api_key = match std::env::var("MODEL_API_KEY") {
        Ok(key) => {
            info!("MODEL_API_KEY found in env");
            Some(key)
        }
        Err(e) => {
            error!(error = ?e, "MODEL_API_KEY environment variable not set");
            return Err(anyhow::anyhow!(
                "MODEL_API_KEY environment variable not set: {e}"
            ));
        }
    };

    let pipeline = PipelineConfig {
        scratch_dir: static_conf.pipeline.scratch_dir,
        concurrency: static_conf.pipeline.concurrency.unwrap_or(10),
        max_file_chars: static_conf.pipeline.max_file_chars.unwrap_or(10_000),
        progress_every: static_conf.pipeline.progress_every.unwrap_or(5),
    };

    let storage = StorageConfig {
        endpoint: static_conf.storage.endpoint,
        bucket: static_conf.storage.bucket,
        public_base_url: static_conf.storage.public_base_url,
        access_token: storage_token,
    };

    let model = ModelConfig {
        api_base: static_conf.model.api_base,
        model: static_conf.model.model,
        temperature: static_conf.model.temperature.unwrap_or(0.3),
        request_timeout_secs: static_conf.model.request_timeout_secs.unwrap_or(120),
        api_key: model_api_key,
    };

    let config = Config {
        pipeline,
        storage,
        model,
    };

    info!(
        bucket = %config.storage.bucket,
        scratch_dir = %config.pipeline.scratch_dir.display(),
        "Config loaded and merged successfully"
    );
    config.trace_loaded();

    Ok(config)
}
