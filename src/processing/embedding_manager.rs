//! Local store of Model2Vec models used as pretrained term-vector sources

use crate::error::{RankerError, Result};
use hf_hub::api::tokio::Api;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A model the store knows how to fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub dimensions: u32,
    pub description: String,
}

const KNOWN_MODELS: &[(&str, &str, &str, u64, u32, &str)] = &[
    (
        "potion-base-8M",
        "Potion Base 8M",
        "minishlab/potion-base-8M",
        33,
        256,
        "Compact general-purpose static embeddings, good default for skill terms",
    ),
    (
        "m2v-base",
        "Model2Vec Base",
        "minishlab/M2V_base_output",
        90,
        256,
        "Legacy Model2Vec base model",
    ),
    (
        "m2v-large",
        "Model2Vec Large",
        "minishlab/M2V_large_output",
        250,
        512,
        "Larger Model2Vec model for higher accuracy",
    ),
];

const REQUIRED_FILES: &[&str] = &["model.safetensors", "tokenizer.json", "config.json"];
const OPTIONAL_FILES: &[&str] = &["README.md"];

/// Downloads models into `models_dir/<id>` and resolves configured model names.
pub struct ModelStore {
    models_dir: PathBuf,
    known: Vec<ModelInfo>,
    downloaded: BTreeSet<String>,
}

impl ModelStore {
    pub async fn open(models_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&models_dir).await.map_err(|e| {
            RankerError::ModelError(format!(
                "Failed to create models directory {}: {}",
                models_dir.display(),
                e
            ))
        })?;

        let known = KNOWN_MODELS
            .iter()
            .map(|(id, name, repo_id, size_mb, dimensions, description)| ModelInfo {
                id: id.to_string(),
                name: name.to_string(),
                repo_id: repo_id.to_string(),
                size_mb: *size_mb,
                dimensions: *dimensions,
                description: description.to_string(),
            })
            .collect();

        let mut store = Self {
            models_dir,
            known,
            downloaded: BTreeSet::new(),
        };
        store.scan().await?;
        Ok(store)
    }

    async fn scan(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await.map_err(|e| {
            RankerError::ModelError(format!("Failed to scan models directory: {}", e))
        })?;

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() && is_model_directory(&entry.path()).await {
                self.downloaded
                    .insert(entry.file_name().to_string_lossy().to_string());
            }
        }

        Ok(())
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn known_models(&self) -> &[ModelInfo] {
        &self.known
    }

    pub fn downloaded_models(&self) -> Vec<String> {
        self.downloaded.iter().cloned().collect()
    }

    pub fn is_downloaded(&self, model_id: &str) -> bool {
        self.downloaded.contains(model_id)
    }

    pub fn model_info(&self, model_id: &str) -> Option<&ModelInfo> {
        self.known.iter().find(|m| m.id == model_id)
    }

    /// Accepts a store id, a Hugging Face repo id or a display name (case-insensitive).
    pub fn resolve_model_id(&self, input: &str) -> Option<String> {
        let lowered = input.to_lowercase();
        self.known
            .iter()
            .find(|m| m.id == input || m.repo_id == input || m.name.to_lowercase() == lowered)
            .map(|m| m.id.clone())
    }

    pub fn model_path(&self, model_id: &str) -> Option<PathBuf> {
        self.is_downloaded(model_id)
            .then(|| self.models_dir.join(model_id))
    }

    /// Where to load the configured model from: a downloaded store model, an
    /// existing local directory, or a repo id handed to the loader as-is.
    pub fn locate(&self, model: &str) -> Result<String> {
        if let Some(id) = self.resolve_model_id(model) {
            return match self.model_path(&id) {
                Some(path) => Ok(path.to_string_lossy().to_string()),
                None => Err(RankerError::Configuration(format!(
                    "Embedding model '{}' is not downloaded; run `resume-ranker models download {}`",
                    model, id
                ))),
            };
        }

        let local = Path::new(model);
        if local.is_dir() {
            return Ok(model.to_string());
        }

        if model.contains('/') {
            warn!("Model '{}' is not in the local store, loading from the hub", model);
            return Ok(model.to_string());
        }

        Err(RankerError::Configuration(format!(
            "Unknown embedding model: {}",
            model
        )))
    }

    pub async fn download(&mut self, model_id: &str) -> Result<PathBuf> {
        let info = self
            .model_info(model_id)
            .cloned()
            .ok_or_else(|| RankerError::ModelError(format!("Unknown embedding model: {}", model_id)))?;

        let model_dir = self.models_dir.join(&info.id);
        if self.is_downloaded(&info.id) {
            info!("Model {} already present at {}", info.id, model_dir.display());
            return Ok(model_dir);
        }

        info!(
            "Downloading embedding model {} ({} MB) from {}",
            info.name, info.size_mb, info.repo_id
        );
        fs::create_dir_all(&model_dir).await?;

        let api = Api::new()
            .map_err(|e| RankerError::ModelError(format!("Failed to initialize HF API: {}", e)))?;
        let repo = api.repo(hf_hub::Repo::model(info.repo_id.clone()));

        for file in REQUIRED_FILES.iter().chain(OPTIONAL_FILES) {
            match repo.get(file).await {
                Ok(cached) => {
                    fs::copy(&cached, model_dir.join(file)).await.map_err(|e| {
                        RankerError::ModelError(format!("Failed to copy {}: {}", file, e))
                    })?;
                    info!("Downloaded {}", file);
                }
                Err(e) if OPTIONAL_FILES.contains(file) => {
                    warn!("Optional file {} not available: {}", file, e);
                }
                Err(e) => {
                    return Err(RankerError::ModelError(format!(
                        "Failed to download required file {}: {}",
                        file, e
                    )));
                }
            }
        }

        self.downloaded.insert(info.id.clone());
        Ok(model_dir)
    }
}

async fn is_model_directory(path: &Path) -> bool {
    for file in REQUIRED_FILES {
        if fs::metadata(path.join(file)).await.is_err() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn fake_model(root: &Path, id: &str) {
        let dir = root.join(id);
        fs::create_dir_all(&dir).await.unwrap();
        for file in REQUIRED_FILES {
            fs::write(dir.join(file), b"stub").await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_open_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = ModelStore::open(temp_dir.path().join("models")).await.unwrap();

        assert!(store.models_dir().exists());
        assert_eq!(store.known_models().len(), 3);
        assert!(store.downloaded_models().is_empty());
    }

    #[tokio::test]
    async fn test_scan_finds_complete_models_only() {
        let temp_dir = TempDir::new().unwrap();
        fake_model(temp_dir.path(), "potion-base-8M").await;
        fs::create_dir_all(temp_dir.path().join("partial")).await.unwrap();

        let store = ModelStore::open(temp_dir.path().to_path_buf()).await.unwrap();
        assert_eq!(store.downloaded_models(), vec!["potion-base-8M".to_string()]);
        assert!(store.model_path("potion-base-8M").is_some());
        assert!(store.model_path("m2v-base").is_none());
    }

    #[tokio::test]
    async fn test_resolve_model_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = ModelStore::open(temp_dir.path().to_path_buf()).await.unwrap();

        assert_eq!(store.resolve_model_id("potion-base-8M"), Some("potion-base-8M".to_string()));
        assert_eq!(store.resolve_model_id("minishlab/potion-base-8M"), Some("potion-base-8M".to_string()));
        assert_eq!(store.resolve_model_id("potion base 8m"), Some("potion-base-8M".to_string()));
        assert_eq!(store.resolve_model_id("bert-base"), None);
    }

    #[tokio::test]
    async fn test_locate() {
        let temp_dir = TempDir::new().unwrap();
        fake_model(temp_dir.path(), "m2v-base").await;
        let store = ModelStore::open(temp_dir.path().to_path_buf()).await.unwrap();

        let located = store.locate("m2v-base").unwrap();
        assert!(located.ends_with("m2v-base"));

        assert!(matches!(store.locate("potion-base-8M"), Err(RankerError::Configuration(_))));
        assert!(matches!(store.locate("nonsense"), Err(RankerError::Configuration(_))));
        assert_eq!(store.locate("someone/custom-m2v").unwrap(), "someone/custom-m2v");
    }
}
