//! Ranking report: everything a formatter needs to present one ranking run

use crate::processing::embeddings::SkillMatch;
use crate::processing::entities::{CandidateProfile, EducationLevel, RequirementSet};
use crate::processing::pipeline::RankingOutcome;
use crate::processing::ranker::{Category, MatchResult, ScoringWeights};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingReport {
    pub metadata: ReportMetadata,
    pub requirements: RequirementSummary,
    pub weights: ScoringWeights,
    /// Best first.
    pub rankings: Vec<RankedCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub ranker_version: String,
    pub job_file: String,
    pub embedding_source: String,
    pub total_candidates: usize,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementSummary {
    pub required_skills: Vec<String>,
    pub min_education: EducationLevel,
    pub min_experience_years: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub rank: usize,
    pub candidate_id: String,
    pub overall_score: f32,
    pub skills_score: f32,
    pub education_score: f32,
    pub experience_score: f32,
    pub matched_skills: Vec<SkillMatch>,
    pub missing_skills: Vec<String>,
    pub education: EducationLevel,
    pub experience_years: f32,
    pub job_titles: Vec<String>,
    /// The source document could not be read and was ranked as empty.
    pub unreadable: bool,
}

impl RankedCandidate {
    pub fn verdict(&self) -> &'static str {
        verdict(self.overall_score)
    }
}

pub fn verdict(score: f32) -> &'static str {
    match score {
        s if s >= 90.0 => "Excellent match",
        s if s >= 75.0 => "Strong match",
        s if s >= 60.0 => "Good match",
        s if s >= 40.0 => "Partial match",
        _ => "Weak match",
    }
}

impl RequirementSummary {
    pub fn from_requirements(requirements: &RequirementSet) -> Self {
        Self {
            required_skills: requirements.required_skills().iter().cloned().collect(),
            min_education: requirements.min_education(),
            min_experience_years: requirements.min_experience_years(),
        }
    }
}

impl RankingReport {
    pub fn new(
        outcome: &RankingOutcome,
        weights: ScoringWeights,
        job_file: impl Into<String>,
        embedding_source: impl Into<String>,
        processing_time_ms: u64,
    ) -> Self {
        let profiles: HashMap<&str, &CandidateProfile> = outcome
            .profiles
            .iter()
            .map(|p| (p.candidate_id(), p))
            .collect();

        let rankings = outcome
            .results
            .iter()
            .enumerate()
            .map(|(index, result)| ranked_candidate(index + 1, result, profiles.get(result.candidate_id.as_str()).copied()))
            .collect();

        Self {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                ranker_version: env!("CARGO_PKG_VERSION").to_string(),
                job_file: job_file.into(),
                embedding_source: embedding_source.into(),
                total_candidates: outcome.results.len(),
                processing_time_ms,
            },
            requirements: RequirementSummary::from_requirements(&outcome.requirements),
            weights,
            rankings,
        }
    }

    pub fn mark_unreadable(mut self, candidate_ids: &BTreeSet<String>) -> Self {
        for candidate in &mut self.rankings {
            candidate.unreadable = candidate_ids.contains(&candidate.candidate_id);
        }
        self
    }

    /// Keep only the best `top` candidates. `total_candidates` still counts everyone.
    pub fn limit(mut self, top: Option<usize>) -> Self {
        if let Some(top) = top {
            self.rankings.truncate(top);
        }
        self
    }
}

fn ranked_candidate(rank: usize, result: &MatchResult, profile: Option<&CandidateProfile>) -> RankedCandidate {
    RankedCandidate {
        rank,
        candidate_id: result.candidate_id.clone(),
        overall_score: result.overall_score,
        skills_score: result.category_score(Category::Skills),
        education_score: result.category_score(Category::Education),
        experience_score: result.category_score(Category::Experience),
        matched_skills: result.matched_skills.clone(),
        missing_skills: result.missing_skills.clone(),
        education: profile.map(|p| p.education()).unwrap_or_default(),
        experience_years: profile.map_or(0.0, |p| p.experience_years()),
        job_titles: profile
            .map(|p| p.job_titles().iter().cloned().collect())
            .unwrap_or_default(),
        unreadable: false,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::processing::pipeline::RankingEngine;

    pub(crate) fn sample_report() -> RankingReport {
        let engine = RankingEngine::with_defaults().unwrap();
        let outcome = engine.rank_texts(
            "Data analyst: SQL, Python and Tableau. Bachelor's degree required. 2+ years.",
            &[
                ("alice.txt", "Senior Analyst, 4 years of SQL, Python, Tableau. BSc Economics."),
                ("bob.md", "Junior analyst. Excel and SQL. 1 year."),
                ("carol.pdf", ""),
            ],
        );
        RankingReport::new(&outcome, *engine.weights(), "jd.txt", engine.embedding_source(), 12)
    }

    #[test]
    fn test_report_from_outcome() {
        let report = sample_report();

        assert_eq!(report.metadata.total_candidates, 3);
        assert_eq!(report.rankings.len(), 3);
        assert_eq!(report.rankings[0].rank, 1);
        assert_eq!(report.rankings[0].candidate_id, "alice.txt");
        assert_eq!(report.rankings[0].education, EducationLevel::Bachelors);
        assert!(report.rankings[0].job_titles.contains(&"senior analyst".to_string()));
        assert_eq!(report.requirements.min_education, EducationLevel::Bachelors);
        assert!(report.requirements.required_skills.contains(&"tableau".to_string()));
    }

    #[test]
    fn test_limit_and_unreadable() {
        let unreadable = BTreeSet::from(["carol.pdf".to_string()]);
        let report = sample_report().mark_unreadable(&unreadable);
        assert!(report.rankings.iter().any(|c| c.candidate_id == "carol.pdf" && c.unreadable));

        let report = report.limit(Some(1));
        assert_eq!(report.rankings.len(), 1);
        assert_eq!(report.metadata.total_candidates, 3);
    }

    #[test]
    fn test_verdict_bands() {
        assert_eq!(verdict(95.0), "Excellent match");
        assert_eq!(verdict(60.0), "Good match");
        assert_eq!(verdict(0.0), "Weak match");
    }
}
