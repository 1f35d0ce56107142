//! Local model cache with optional download from a model hub.
//!
//! Files live at `<cache_dir>/<model_id>/<file>`. A missing file is fetched
//! from `{endpoint}/{model_id}/resolve/{revision}/{file}` when a hub is
//! configured.

use deck_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Where and how to download model files.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub endpoint: String,
    pub revision: String,
    /// Sent as a bearer token when present.
    pub token: Option<String>,
}

impl HubConfig {
    /// URL of one file of a model at the configured revision.
    pub fn file_url(&self, model_id: &str, file: &str) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.endpoint.trim_end_matches('/'),
            model_id,
            self.revision,
            file
        )
    }
}

/// On-disk cache of model files.
#[derive(Debug, Clone)]
pub struct ModelStore {
    cache_dir: PathBuf,
    hub: Option<HubConfig>,
}

impl ModelStore {
    /// A store that only reads files already in `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            hub: None,
        }
    }

    /// Allow missing files to be downloaded from `hub`.
    pub fn with_hub(mut self, hub: HubConfig) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn can_download(&self) -> bool {
        self.hub.is_some()
    }

    /// Path a model file has (or would have) in the cache.
    pub fn local_path(&self, model_id: &str, file: &str) -> PathBuf {
        self.cache_dir.join(model_id).join(file)
    }

    pub fn contains(&self, model_id: &str, file: &str) -> bool {
        self.local_path(model_id, file).is_file()
    }

    /// Path to a cached model file, downloading it first if needed.
    pub fn fetch(&self, model_id: &str, file: &str) -> Result<PathBuf> {
        validate_model_id(model_id)?;

        let path = self.local_path(model_id, file);
        if path.is_file() {
            return Ok(path);
        }

        let hub = self.hub.as_ref().ok_or_else(|| {
            Error::Download(format!(
                "{} is not cached and hub downloads are disabled",
                path.display()
            ))
        })?;

        download(hub, model_id, file, &path)?;
        Ok(path)
    }
}

fn download(hub: &HubConfig, model_id: &str, file: &str, dest: &Path) -> Result<()> {
    let url = hub.file_url(model_id, file);
    log::info!("Downloading {}", url);

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("deck-detector/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::Download(e.to_string()))?;

    let mut request = client.get(&url);
    if let Some(ref token) = hub.token {
        request = request.bearer_auth(token);
    }

    let mut response = request
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::Download(format!("{}: {}", url, e)))?;

    let parent = dest
        .parent()
        .ok_or_else(|| Error::Download(format!("invalid destination {}", dest.display())))?;
    fs::create_dir_all(parent)?;

    // Partial downloads never reach the final path
    let mut partial = NamedTempFile::new_in(parent)?;
    let bytes = response
        .copy_to(&mut partial)
        .map_err(|e| Error::Download(format!("{}: {}", url, e)))?;
    partial.persist(dest).map_err(|e| Error::IoError(e.error))?;

    log::info!("Saved {} ({} bytes)", dest.display(), bytes);
    Ok(())
}

/// Model ids are `name` or `org/name`, never paths that leave the cache.
pub fn validate_model_id(model_id: &str) -> Result<()> {
    let valid_segment = |segment: &str| {
        !segment.is_empty()
            && segment != "."
            && segment != ".."
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };

    let segments: Vec<&str> = model_id.split('/').collect();
    if segments.len() > 2 || !segments.iter().all(|s| valid_segment(s)) {
        return Err(Error::InvalidInput(format!("Invalid model name: '{}'", model_id)));
    }
    Ok(())
}
