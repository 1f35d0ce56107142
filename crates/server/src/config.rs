//! Service settings, read from the environment (and a `.env` file).

use config::{Config, Environment};
use deck_detector::{DetectorRegistry, HubConfig, ModelStore, OnnxClassifierLoader, OnnxOptions};
use serde::Deserialize;
use std::path::PathBuf;

/// Every tunable of the service. Unset keys take the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Model
    pub hf_token: Option<String>,
    pub hf_model_name: String,
    pub model_cache_dir: PathBuf,
    pub model_onnx_file: String,
    pub hub_endpoint: String,
    pub hub_revision: String,
    pub hub_downloads: bool,
    pub ai_label_index: usize,
    pub max_tokens: usize,
    pub min_text_length_for_detection: usize,

    // API
    pub api_host: String,
    pub api_port: u16,
    pub max_upload_size_mb: u64,
    pub allowed_ppt_extensions: String,
    pub cors_origins: String,
    pub temp_dir: PathBuf,

    // Logging
    pub log_level: String,
    pub log_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hf_token: None,
            hf_model_name: "roberta-base-openai-detector".to_string(),
            model_cache_dir: PathBuf::from("./models"),
            model_onnx_file: "onnx/model.onnx".to_string(),
            hub_endpoint: "https://huggingface.co".to_string(),
            hub_revision: "main".to_string(),
            hub_downloads: true,
            ai_label_index: 1,
            max_tokens: 512,
            min_text_length_for_detection: deck_detector::MIN_TEXT_LENGTH_FOR_DETECTION,
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            max_upload_size_mb: 10,
            allowed_ppt_extensions: ".pptx,.ppt".to_string(),
            cors_origins: "*".to_string(),
            temp_dir: std::env::temp_dir().join("post-automation"),
            log_level: "INFO".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl Settings {
    /// Load `.env` (if present) and read the process environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_environment(Environment::default())
    }

    /// Read settings from an explicit environment source.
    pub fn from_environment(environment: Environment) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }

    /// Allowed upload extensions, lowercase with a leading dot.
    pub fn allowed_extensions(&self) -> Vec<String> {
        split_list(&self.allowed_ppt_extensions)
            .map(|ext| {
                let ext = ext.to_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{}", ext)
                }
            })
            .collect()
    }

    pub fn cors_origins_list(&self) -> Vec<String> {
        split_list(&self.cors_origins).map(str::to_string).collect()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// The hub token, when one is configured.
    pub fn hub_token(&self) -> Option<&str> {
        self.hf_token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn model_store(&self) -> ModelStore {
        let store = ModelStore::new(&self.model_cache_dir);
        if !self.hub_downloads {
            return store;
        }
        store.with_hub(HubConfig {
            endpoint: self.hub_endpoint.clone(),
            revision: self.hub_revision.clone(),
            token: self.hub_token().map(str::to_string),
        })
    }

    pub fn onnx_options(&self) -> OnnxOptions {
        OnnxOptions {
            onnx_file: self.model_onnx_file.clone(),
            max_tokens: self.max_tokens,
            ai_label_index: self.ai_label_index,
            ..Default::default()
        }
    }

    /// Registry of ONNX detectors backed by the configured cache and hub.
    pub fn detector_registry(&self) -> DetectorRegistry {
        let loader = OnnxClassifierLoader::new(self.model_store(), self.onnx_options());
        DetectorRegistry::new(loader, self.hf_model_name.clone())
            .with_min_text_length(self.min_text_length_for_detection)
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}
