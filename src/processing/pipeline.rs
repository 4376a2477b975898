//! End-to-end ranking: normalize, extract, score, sort

use crate::config::{Config, EmbeddingSource};
use crate::error::{RankerError, Result};
use crate::processing::embedding_manager::ModelStore;
use crate::processing::embeddings::{load_static_model, SimilarityEngine, TermEmbeddings};
use crate::processing::entities::{CandidateProfile, EntityExtractor, RequirementSet};
use crate::processing::ranker::{MatchResult, Ranker, ScoringWeights};
use crate::processing::text_processor::TextNormalizer;
use crate::processing::vocabulary::SkillVocabulary;
use log::{debug, info};
use rayon::prelude::*;
use std::time::Instant;

/// Everything one ranking run produced.
#[derive(Debug, Clone)]
pub struct RankingOutcome {
    pub requirements: RequirementSet,
    /// In input order.
    pub profiles: Vec<CandidateProfile>,
    /// Best first.
    pub results: Vec<MatchResult>,
}

/// Holds the resources acquired once per process (vocabulary, term vectors) and
/// runs any number of independent ranking passes over them.
pub struct RankingEngine {
    normalizer: TextNormalizer,
    vocabulary: SkillVocabulary,
    extractor: EntityExtractor,
    ranker: Ranker,
    embedding_source: String,
    parallel: bool,
}

impl RankingEngine {
    pub fn new(
        vocabulary: SkillVocabulary,
        embeddings: TermEmbeddings,
        weights: ScoringWeights,
    ) -> Result<Self> {
        let normalizer = TextNormalizer::new();
        let extractor = EntityExtractor::new(&vocabulary, &normalizer)?;
        let embedding_source = format!("{} term vectors ({} dims)", embeddings.len(), embeddings.dimension());
        let ranker = Ranker::new(weights, SimilarityEngine::new(embeddings));

        Ok(Self {
            normalizer,
            vocabulary,
            extractor,
            ranker,
            embedding_source,
            parallel: false,
        })
    }

    /// Built-in vocabulary, hashed term vectors and default weights.
    pub fn with_defaults() -> Result<Self> {
        let vocabulary = SkillVocabulary::builtin();
        let terms: Vec<&str> = vocabulary.canonical_names().collect();
        let embeddings = TermEmbeddings::hashed(&terms, 256)?;
        Self::new(vocabulary, embeddings, ScoringWeights::default())
    }

    /// Validate the configuration and acquire the vocabulary and term vectors it names.
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let start_time = Instant::now();

        let vocabulary = match &config.resources.vocabulary_path {
            Some(path) => SkillVocabulary::from_file(path)?,
            None => SkillVocabulary::builtin(),
        };
        info!("Skill vocabulary: {} canonical skills", vocabulary.len());

        let terms: Vec<&str> = vocabulary.canonical_names().collect();
        let embeddings = match &config.resources.embeddings {
            EmbeddingSource::Hashed { dimension } => TermEmbeddings::hashed(&terms, *dimension)?,
            EmbeddingSource::Table { path } => {
                let table = TermEmbeddings::from_table_file(path)?;
                let uncovered = terms.iter().filter(|t| !table.contains(t)).count();
                if uncovered > 0 {
                    info!(
                        "{} vocabulary skills have no vector and only match exactly",
                        uncovered
                    );
                }
                table
            }
            EmbeddingSource::Model2Vec { model } => {
                let store = ModelStore::open(config.models_dir().clone()).await?;
                let location = store.locate(model)?;
                let static_model = load_static_model(&location).map_err(|e| {
                    RankerError::Configuration(format!("Embedding model unavailable: {}", e))
                })?;
                TermEmbeddings::from_static_model(&static_model, &terms)?
            }
        };
        info!(
            "Embeddings: {} ({} dims)",
            config.resources.embeddings,
            embeddings.dimension()
        );

        let normalizer = TextNormalizer::new();
        let extractor = EntityExtractor::new(&vocabulary, &normalizer)?
            .with_max_experience_years(config.processing.max_experience_years);
        let ranker = Ranker::new(config.weights()?, SimilarityEngine::new(embeddings))
            .with_skill_match_threshold(config.scoring.skill_match_threshold)
            .with_parallel(config.processing.parallel);

        debug!("Ranking engine ready in {:.2?}", start_time.elapsed());

        Ok(Self {
            normalizer,
            vocabulary,
            extractor,
            ranker,
            embedding_source: config.resources.embeddings.to_string(),
            parallel: config.processing.parallel,
        })
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self.ranker = self.ranker.with_parallel(parallel);
        self
    }

    pub fn vocabulary(&self) -> &SkillVocabulary {
        &self.vocabulary
    }

    pub fn weights(&self) -> &ScoringWeights {
        self.ranker.weights()
    }

    pub fn embedding_source(&self) -> &str {
        &self.embedding_source
    }

    pub fn normalize(&self, text: &str) -> Vec<String> {
        self.normalizer.normalize(text)
    }

    pub fn requirements(&self, jd_text: &str) -> RequirementSet {
        self.extractor.extract_requirements(&self.normalize(jd_text))
    }

    pub fn profile(&self, candidate_id: &str, resume_text: &str) -> CandidateProfile {
        let tokens = self.normalize(resume_text);
        if tokens.is_empty() {
            debug!("Candidate '{}' has no usable text", candidate_id);
        }
        self.extractor.extract_profile(candidate_id, &tokens)
    }

    pub fn rank(&self, requirements: &RequirementSet, profiles: &[CandidateProfile]) -> Vec<MatchResult> {
        self.ranker.rank(requirements, profiles)
    }

    /// Rank `(candidate_id, resume_text)` pairs against a job description.
    pub fn rank_texts<I, T>(&self, jd_text: &str, candidates: &[(I, T)]) -> RankingOutcome
    where
        I: AsRef<str> + Sync,
        T: AsRef<str> + Sync,
    {
        let requirements = self.requirements(jd_text);

        let profiles: Vec<CandidateProfile> = if self.parallel {
            candidates
                .par_iter()
                .map(|(id, text)| self.profile(id.as_ref(), text.as_ref()))
                .collect()
        } else {
            candidates
                .iter()
                .map(|(id, text)| self.profile(id.as_ref(), text.as_ref()))
                .collect()
        };

        let results = self.rank(&requirements, &profiles);
        info!("Ranked {} candidates", results.len());

        RankingOutcome {
            requirements,
            profiles,
            results,
        }
    }
}
