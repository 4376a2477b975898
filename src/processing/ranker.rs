//! Per-category scoring, weighted aggregation and deterministic ordering

use crate::error::{RankerError, Result};
use crate::processing::embeddings::{SimilarityEngine, SkillMatch};
use crate::processing::entities::{CandidateProfile, EducationLevel, RequirementSet};
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

const WEIGHT_TOLERANCE: f32 = 1e-4;

/// Category weights. Always sum to 1; construct through [`ScoringWeights::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    skills: f32,
    education: f32,
    experience: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skills: 0.5,
            education: 0.2,
            experience: 0.3,
        }
    }
}

impl ScoringWeights {
    pub fn new(skills: f32, education: f32, experience: f32) -> Result<Self> {
        for (name, weight) in [("skills", skills), ("education", education), ("experience", experience)] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RankerError::Configuration(format!(
                    "{} weight must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        let sum = skills + education + experience;
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(RankerError::Configuration(format!(
                "Scoring weights must sum to 1.0, got {} (skills {}, education {}, experience {})",
                sum, skills, education, experience
            )));
        }

        Ok(Self {
            skills,
            education,
            experience,
        })
    }

    pub fn skills(&self) -> f32 {
        self.skills
    }

    pub fn education(&self) -> f32 {
        self.education
    }

    pub fn experience(&self) -> f32 {
        self.experience
    }

    pub fn weight(&self, category: Category) -> f32 {
        match category {
            Category::Skills => self.skills,
            Category::Education => self.education,
            Category::Experience => self.experience,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Skills,
    Education,
    Experience,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Skills, Category::Education, Category::Experience];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Skills => write!(f, "Skills"),
            Category::Education => write!(f, "Education"),
            Category::Experience => write!(f, "Experience"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    /// In [0, 1]
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub candidate_id: String,
    /// In [0, 100]
    pub overall_score: f32,
    pub category_scores: Vec<CategoryScore>,
    /// Required skills whose best counterpart reached the match threshold.
    pub matched_skills: Vec<SkillMatch>,
    pub missing_skills: Vec<String>,
}

impl MatchResult {
    pub fn category_score(&self, category: Category) -> f32 {
        self.category_scores
            .iter()
            .find(|c| c.category == category)
            .map_or(0.0, |c| c.value)
    }
}

/// 1 when the requirement is met or absent, otherwise the share of the required rank reached.
pub fn education_score(candidate: EducationLevel, required: EducationLevel) -> f32 {
    if required.rank() == 0 || candidate.meets(required) {
        1.0
    } else {
        candidate.rank() as f32 / required.rank() as f32
    }
}

/// 1 when no experience is required, otherwise the share of the required years, capped at 1.
pub fn experience_score(candidate_years: f32, required_years: f32) -> f32 {
    if required_years > 0.0 {
        (candidate_years / required_years).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Ranks candidate profiles against a requirement set.
pub struct Ranker {
    weights: ScoringWeights,
    similarity: SimilarityEngine,
    skill_match_threshold: f32,
    parallel: bool,
}

impl Ranker {
    pub fn new(weights: ScoringWeights, similarity: SimilarityEngine) -> Self {
        Self {
            weights,
            similarity,
            skill_match_threshold: 0.75,
            parallel: false,
        }
    }

    pub fn with_skill_match_threshold(mut self, threshold: f32) -> Self {
        self.skill_match_threshold = threshold;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn similarity(&self) -> &SimilarityEngine {
        &self.similarity
    }

    /// Score one candidate. Never fails: missing signals just score low.
    pub fn score(&self, requirements: &RequirementSet, profile: &CandidateProfile) -> MatchResult {
        let matches = self
            .similarity
            .best_matches(requirements.required_skills(), profile.skills());

        let skills = self
            .similarity
            .skill_similarity(requirements.required_skills(), profile.skills());
        let education = education_score(profile.education(), requirements.min_education());
        let experience = experience_score(
            profile.experience_years(),
            requirements.min_experience_years(),
        );

        let category_scores = vec![
            CategoryScore { category: Category::Skills, value: skills },
            CategoryScore { category: Category::Education, value: education },
            CategoryScore { category: Category::Experience, value: experience },
        ];

        let weighted: f32 = category_scores
            .iter()
            .map(|c| self.weights.weight(c.category) * c.value)
            .sum();
        let overall_score = (weighted * 100.0).clamp(0.0, 100.0);

        let (matched_skills, missing): (Vec<SkillMatch>, Vec<SkillMatch>) = matches
            .into_iter()
            .partition(|m| m.matched.is_some() && m.similarity >= self.skill_match_threshold);

        debug!(
            "Scored '{}': overall {:.1} (skills {:.2}, education {:.2}, experience {:.2})",
            profile.candidate_id(),
            overall_score,
            skills,
            education,
            experience
        );

        MatchResult {
            candidate_id: profile.candidate_id().to_string(),
            overall_score,
            category_scores,
            matched_skills,
            missing_skills: missing.into_iter().map(|m| m.required).collect(),
        }
    }

    /// One result per profile, best first; equal scores ordered by candidate id.
    pub fn rank(&self, requirements: &RequirementSet, profiles: &[CandidateProfile]) -> Vec<MatchResult> {
        let mut results: Vec<MatchResult> = if self.parallel {
            profiles
                .par_iter()
                .map(|profile| self.score(requirements, profile))
                .collect()
        } else {
            profiles
                .iter()
                .map(|profile| self.score(requirements, profile))
                .collect()
        };

        results.sort_by(compare_results);
        results
    }
}

fn compare_results(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.overall_score
        .total_cmp(&a.overall_score)
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}
