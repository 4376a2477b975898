//! Configuration management for the resume ranker

use crate::error::{RankerError, Result};
use crate::processing::ranker::ScoringWeights;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub resources: ResourceConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub skills_weight: f32,
    pub education_weight: f32,
    pub experience_weight: f32,
    /// Similarity at which a required skill is reported as matched. Does not affect scores.
    pub skill_match_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub models_dir: PathBuf,
    /// JSON or TOML map of canonical skill -> synonyms. The built-in vocabulary is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vocabulary_path: Option<PathBuf>,
    pub embeddings: EmbeddingSource,
}

/// Where term vectors come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbeddingSource {
    /// Deterministic word-level feature hashing. Needs no external resource.
    Hashed { dimension: usize },
    /// JSON table: `{ "dimension": N, "terms": { "python": [..], .. } }`
    Table { path: PathBuf },
    /// Model2Vec static model, by model store name, repo id or local directory.
    #[serde(rename = "model2vec")]
    Model2Vec { model: String },
}

impl std::fmt::Display for EmbeddingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingSource::Hashed { dimension } => write!(f, "hashed words ({} dims)", dimension),
            EmbeddingSource::Table { path } => write!(f, "table {}", path.display()),
            EmbeddingSource::Model2Vec { model } => write!(f, "model2vec {}", model),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Extract and score candidates on the rayon thread pool.
    pub parallel: bool,
    /// Year counts above this are treated as noise (e.g. "2019 year plan").
    pub max_experience_years: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
    Html,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let weights = ScoringWeights::default();
        Self {
            skills_weight: weights.skills(),
            education_weight: weights.education(),
            experience_weight: weights.experience(),
            skill_match_threshold: 0.75,
        }
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-ranker")
            .join("models");

        Self {
            models_dir,
            vocabulary_path: None,
            embeddings: EmbeddingSource::Hashed { dimension: 256 },
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_experience_years: 50.0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Console,
            detailed: false,
            color_output: true,
            top: None,
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults there on first use.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load and validate an explicit config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RankerError::Configuration(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| RankerError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| RankerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-ranker")
            .join("config.toml")
    }

    /// Check everything that must hold before a ranking run starts.
    pub fn validate(&self) -> Result<()> {
        self.weights()?;

        let threshold = self.scoring.skill_match_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(RankerError::Configuration(format!(
                "skill_match_threshold must be within [0, 1], got {}",
                threshold
            )));
        }

        let cap = self.processing.max_experience_years;
        if !cap.is_finite() || cap <= 0.0 {
            return Err(RankerError::Configuration(
                "max_experience_years must be positive".to_string(),
            ));
        }

        if let Some(path) = &self.resources.vocabulary_path {
            if !path.exists() {
                return Err(RankerError::Configuration(format!(
                    "Skill vocabulary not found: {}",
                    path.display()
                )));
            }
        }

        match &self.resources.embeddings {
            EmbeddingSource::Hashed { dimension } if *dimension == 0 => Err(
                RankerError::Configuration("Hashed embedding dimension must be positive".to_string()),
            ),
            EmbeddingSource::Table { path } if !path.exists() => Err(RankerError::Configuration(
                format!("Embedding table not found: {}", path.display()),
            )),
            _ => Ok(()),
        }
    }

    pub fn weights(&self) -> Result<ScoringWeights> {
        ScoringWeights::new(
            self.scoring.skills_weight,
            self.scoring.education_weight,
            self.scoring.experience_weight,
        )
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.resources.models_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.skills_weight, 0.5);
        assert_eq!(config.scoring.education_weight, 0.2);
        assert_eq!(config.scoring.experience_weight, 0.3);
    }

    #[test]
    fn test_round_trip_through_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.output.top = Some(3);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.output.top, Some(3));
        assert_eq!(loaded.resources.embeddings, EmbeddingSource::Hashed { dimension: 256 });
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[processing]\nparallel = false\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.processing.parallel);
        assert_eq!(config.scoring.skills_weight, 0.5);
    }

    #[test]
    fn test_weights_not_summing_to_one_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[scoring]\nskills_weight = 0.5\neducation_weight = 0.2\nexperience_weight = 0.2\n",
        )
        .unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(RankerError::Configuration(_))));
    }

    #[test]
    fn test_missing_vocabulary_rejected() {
        let mut config = Config::default();
        config.resources.vocabulary_path = Some(PathBuf::from("/nonexistent/vocabulary.json"));
        assert!(matches!(config.validate(), Err(RankerError::Configuration(_))));
    }

    #[test]
    fn test_missing_embedding_table_rejected() {
        let mut config = Config::default();
        config.resources.embeddings = EmbeddingSource::Table {
            path: PathBuf::from("/nonexistent/terms.json"),
        };
        assert!(matches!(config.validate(), Err(RankerError::Configuration(_))));
    }

    #[test]
    fn test_embedding_source_from_toml() {
        let config: Config = toml::from_str(
            "[resources.embeddings]\nkind = \"model2vec\"\nmodel = \"potion-base-8M\"\n",
        )
        .unwrap();
        assert_eq!(
            config.resources.embeddings,
            EmbeddingSource::Model2Vec { model: "potion-base-8M".to_string() }
        );
    }
}
