//! Term embeddings and embedding-based skill set similarity

use crate::error::{RankerError, Result};
use log::{debug, info, warn};
use model2vec_rs::model::StaticModel;
use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::time::Instant;

/// Fixed seeds. Changing them changes every hashed vector.
const HASH_SEED_K0: u64 = 0x5d1f_7a3c_94e2_0b68;
const HASH_SEED_K1: u64 = 0xa4c0_3e91_6b7d_f215;

/// A fixed-dimension vector per skill term.
#[derive(Debug, Clone)]
pub struct TermEmbeddings {
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
}

/// On-disk term table: `{ "dimension": 3, "terms": { "python": [0.1, 0.2, 0.3] } }`
#[derive(Debug, Serialize, Deserialize)]
pub struct TermTable {
    pub dimension: usize,
    pub terms: BTreeMap<String, Vec<f32>>,
}

impl TermEmbeddings {
    pub fn new(dimension: usize, vectors: HashMap<String, Vec<f32>>) -> Result<Self> {
        if dimension == 0 {
            return Err(RankerError::Configuration(
                "Embedding dimension must be positive".to_string(),
            ));
        }
        if let Some((term, vector)) = vectors.iter().find(|(_, v)| v.len() != dimension) {
            return Err(RankerError::Configuration(format!(
                "Vector for '{}' has {} dimensions, expected {}",
                term,
                vector.len(),
                dimension
            )));
        }
        Ok(Self { dimension, vectors })
    }

    /// Load a pretrained term table from JSON.
    pub fn from_table_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RankerError::Configuration(format!(
                "Failed to read embedding table {}: {}",
                path.display(),
                e
            ))
        })?;
        let table: TermTable = serde_json::from_str(&content).map_err(|e| {
            RankerError::Configuration(format!(
                "Invalid embedding table {}: {}",
                path.display(),
                e
            ))
        })?;

        let vectors = table
            .terms
            .into_iter()
            .map(|(term, vector)| (crate::processing::vocabulary::canonicalize_skill(&term), vector))
            .collect();

        let embeddings = Self::new(table.dimension, vectors)?;
        info!(
            "Loaded {} term vectors ({} dims) from {}",
            embeddings.len(),
            embeddings.dimension,
            path.display()
        );
        Ok(embeddings)
    }

    /// Encode every term once with a Model2Vec static model.
    pub fn from_static_model<S: AsRef<str>>(model: &StaticModel, terms: &[S]) -> Result<Self> {
        let start_time = Instant::now();
        let texts: Vec<String> = terms.iter().map(|t| t.as_ref().to_string()).collect();
        let encoded = model.encode(&texts);

        let dimension = encoded.first().map(Vec::len).unwrap_or(0);
        let vectors = texts.into_iter().zip(encoded).collect();
        let embeddings = Self::new(dimension, vectors)?;

        debug!(
            "Encoded {} terms with Model2Vec in {:.2?}",
            embeddings.len(),
            start_time.elapsed()
        );
        Ok(embeddings)
    }

    /// Deterministic word-level feature hashing. Each distinct word of the terms gets
    /// its own dimension, so skills relate only through the words they share
    /// ("machine learning" and "deep learning") and never through spelling
    /// ("java" and "javascript" are orthogonal).
    pub fn hashed<S: AsRef<str>>(terms: &[S], dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(RankerError::Configuration(
                "Hashed embedding dimension must be positive".to_string(),
            ));
        }

        let words: BTreeSet<&str> = terms
            .iter()
            .flat_map(|term| term.as_ref().split_whitespace())
            .collect();
        if words.len() > dimension {
            warn!(
                "{} distinct skill words share {} hashed dimensions; unrelated skills may overlap",
                words.len(),
                dimension
            );
        }
        let slots = assign_slots(&words, dimension);

        let vectors = terms
            .iter()
            .map(|term| {
                let term = term.as_ref();
                (term.to_string(), word_vector(term, &slots, dimension))
            })
            .collect();
        Self::new(dimension, vectors)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vector(&self, term: &str) -> Option<&[f32]> {
        self.vectors.get(term).map(Vec::as_slice)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.vectors.contains_key(term)
    }
}

/// Load a Model2Vec model from a local directory or Hugging Face repo id.
pub fn load_static_model(model: &str) -> Result<StaticModel> {
    let start_time = Instant::now();
    info!("Loading Model2Vec embedding model from: {}", model);

    let static_model = StaticModel::from_pretrained(
        model,
        None, // token
        None, // normalize
        None, // subfolder
    )
    .map_err(|e| RankerError::ModelError(format!("Failed to load model '{}': {}", model, e)))?;

    info!("Model loaded successfully in {:.2?}", start_time.elapsed());
    Ok(static_model)
}

fn hash_word(word: &str) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
    word.hash(&mut hasher);
    hasher.finish()
}

/// Home slot from the hash, linear probing past occupied slots. Words are placed in
/// sorted order so the layout only depends on the word set. Once every slot is taken,
/// words fall back to their home slot and share it.
fn assign_slots<'a>(words: &BTreeSet<&'a str>, dimension: usize) -> HashMap<&'a str, usize> {
    let mut occupied = vec![false; dimension];
    let mut slots = HashMap::with_capacity(words.len());

    for (placed, word) in words.iter().enumerate() {
        let home = (hash_word(word) % dimension as u64) as usize;
        let slot = if placed < dimension {
            (0..dimension)
                .map(|offset| (home + offset) % dimension)
                .find(|slot| !occupied[*slot])
                .unwrap_or(home)
        } else {
            home
        };
        occupied[slot] = true;
        slots.insert(*word, slot);
    }

    slots
}

fn word_vector(term: &str, slots: &HashMap<&str, usize>, dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimension];
    for word in term.split_whitespace() {
        if let Some(slot) = slots.get(word) {
            vector[*slot] += 1.0;
        }
    }

    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }
    vector
}

/// Cosine similarity in [-1, 1]. Mismatched, empty or zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

/// Best candidate counterpart for one required skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub required: String,
    pub matched: Option<String>,
    pub similarity: f32,
}

/// Compares skill sets through their term vectors.
pub struct SimilarityEngine {
    embeddings: TermEmbeddings,
}

impl SimilarityEngine {
    pub fn new(embeddings: TermEmbeddings) -> Self {
        Self { embeddings }
    }

    pub fn embeddings(&self) -> &TermEmbeddings {
        &self.embeddings
    }

    /// Similarity of two terms clamped to [0, 1]. Identical terms always score 1;
    /// a term without a vector only matches itself.
    pub fn term_similarity(&self, a: &str, b: &str) -> f32 {
        if a == b {
            return 1.0;
        }
        match (self.embeddings.vector(a), self.embeddings.vector(b)) {
            (Some(va), Some(vb)) => cosine_similarity(va, vb).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// For each required skill, the most similar candidate skill. Ties go to the
    /// alphabetically first candidate skill.
    pub fn best_matches(
        &self,
        required: &BTreeSet<String>,
        candidate: &BTreeSet<String>,
    ) -> Vec<SkillMatch> {
        required
            .iter()
            .map(|req| {
                let mut best: Option<(&String, f32)> = None;
                for skill in candidate {
                    let similarity = self.term_similarity(req, skill);
                    if best.map_or(true, |(_, s)| similarity > s) {
                        best = Some((skill, similarity));
                    }
                }
                SkillMatch {
                    required: req.clone(),
                    matched: best.map(|(skill, _)| skill.clone()),
                    similarity: best.map_or(0.0, |(_, s)| s),
                }
            })
            .collect()
    }

    /// Average over required skills of the best similarity to any candidate skill.
    /// Nothing required scores 1; something required from an empty set scores 0.
    pub fn skill_similarity(&self, required: &BTreeSet<String>, candidate: &BTreeSet<String>) -> f32 {
        if required.is_empty() {
            return 1.0;
        }
        if candidate.is_empty() {
            return 0.0;
        }

        let matches = self.best_matches(required, candidate);
        let total: f32 = matches.iter().map(|m| m.similarity).sum();
        (total / matches.len() as f32).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn table_engine() -> SimilarityEngine {
        let vectors = HashMap::from([
            ("javascript".to_string(), vec![1.0, 0.0, 0.0]),
            ("typescript".to_string(), vec![0.8, 0.6, 0.0]),
            ("python".to_string(), vec![0.0, 1.0, 0.0]),
            ("cooking".to_string(), vec![-1.0, 0.0, 0.0]),
            ("sql".to_string(), vec![0.0, 0.0, 1.0]),
        ]);
        SimilarityEngine::new(TermEmbeddings::new(3, vectors).unwrap())
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_empty_sets() {
        let engine = table_engine();
        assert_eq!(engine.skill_similarity(&set(&[]), &set(&[])), 1.0);
        assert_eq!(engine.skill_similarity(&set(&[]), &set(&["python"])), 1.0);
        assert_eq!(engine.skill_similarity(&set(&["python"]), &set(&[])), 0.0);
    }

    #[test]
    fn test_exact_match_scores_one() {
        let engine = table_engine();
        assert_eq!(engine.skill_similarity(&set(&["python", "sql"]), &set(&["sql", "python"])), 1.0);
        // identical terms score 1 even without vectors
        assert_eq!(engine.skill_similarity(&set(&["haskell"]), &set(&["haskell"])), 1.0);
    }

    #[test]
    fn test_near_equivalents_get_partial_credit() {
        let engine = table_engine();
        let score = engine.skill_similarity(&set(&["javascript"]), &set(&["typescript", "sql"]));
        assert!((score - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_negative_cosine_clamped() {
        let engine = table_engine();
        assert_eq!(engine.term_similarity("javascript", "cooking"), 0.0);
        assert_eq!(engine.skill_similarity(&set(&["javascript"]), &set(&["cooking"])), 0.0);
    }

    #[test]
    fn test_average_over_required() {
        let engine = table_engine();
        let score = engine.skill_similarity(&set(&["python", "sql"]), &set(&["python"]));
        assert!((score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_best_matches() {
        let engine = table_engine();
        let matches = engine.best_matches(&set(&["javascript", "rust"]), &set(&["python", "typescript"]));

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].required, "javascript");
        assert_eq!(matches[0].matched.as_deref(), Some("typescript"));
        // no vector for "rust": everything scores 0, first candidate wins the tie
        assert_eq!(matches[1].matched.as_deref(), Some("python"));
        assert_eq!(matches[1].similarity, 0.0);
    }

    #[test]
    fn test_hashed_vectors_normalized_and_deterministic() {
        let terms = ["python", "machine learning", "deep learning", "r"];
        let first = TermEmbeddings::hashed(&terms, 256).unwrap();
        let second = TermEmbeddings::hashed(&terms, 256).unwrap();

        for term in terms {
            let vector = first.vector(term).unwrap();
            let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5, "{} norm {}", term, norm);
            assert_eq!(vector, second.vector(term).unwrap());
        }
    }

    #[test]
    fn test_hashed_similarity_follows_shared_words() {
        let terms = ["java", "javascript", "git", "github", "machine learning", "deep learning", "learning"];
        let engine = SimilarityEngine::new(TermEmbeddings::hashed(&terms, 256).unwrap());

        assert_eq!(engine.term_similarity("java", "javascript"), 0.0);
        assert_eq!(engine.term_similarity("git", "github"), 0.0);
        assert!((engine.term_similarity("machine learning", "deep learning") - 0.5).abs() < 1e-5);
        assert!((engine.term_similarity("learning", "deep learning") - 0.70710677).abs() < 1e-5);
    }

    #[test]
    fn test_hashed_words_never_collide_below_capacity() {
        let terms: Vec<String> = (0..64).map(|i| format!("skill{}", i)).collect();
        let engine = SimilarityEngine::new(TermEmbeddings::hashed(&terms, 64).unwrap());

        for a in &terms {
            for b in &terms {
                if a != b {
                    assert_eq!(engine.term_similarity(a, b), 0.0, "{} vs {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_builtin_vocabulary_hashes_without_spelling_overlap() {
        let vocabulary = crate::processing::vocabulary::SkillVocabulary::builtin();
        let terms: Vec<&str> = vocabulary.canonical_names().collect();
        let engine = SimilarityEngine::new(TermEmbeddings::hashed(&terms, 256).unwrap());

        let score = engine.skill_similarity(&set(&["javascript"]), &set(&["java"]));
        assert_eq!(score, 0.0);
        let score = engine.skill_similarity(&set(&["github", "mysql"]), &set(&["git", "postgresql"]));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            TermEmbeddings::hashed(&["python"], 0),
            Err(RankerError::Configuration(_))
        ));
    }

    #[test]
    fn test_table_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, r#"{{"dimension": 2, "terms": {{"Python": [1.0, 0.0], "SQL": [0.0, 1.0]}}}}"#).unwrap();

        let embeddings = TermEmbeddings::from_table_file(file.path()).unwrap();
        assert_eq!(embeddings.dimension(), 2);
        assert!(embeddings.contains("python"));
        assert!(embeddings.contains("sql"));
    }

    #[test]
    fn test_table_dimension_mismatch_rejected() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, r#"{{"dimension": 3, "terms": {{"python": [1.0, 0.0]}}}}"#).unwrap();

        assert!(matches!(
            TermEmbeddings::from_table_file(file.path()),
            Err(RankerError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_table_rejected() {
        let result = TermEmbeddings::from_table_file(Path::new("/nonexistent/table.json"));
        assert!(matches!(result, Err(RankerError::Configuration(_))));
    }
}
