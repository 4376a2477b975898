//! Structured signal extraction: skills, education level and years of experience
//!
//! Both the job description and the resumes go through the same strategies so the
//! resulting [`RequirementSet`] and [`CandidateProfile`] compare field by field.
//! Extraction never fails: a missing signal degrades to an empty skill set,
//! [`EducationLevel::None`] or zero years.

use crate::error::Result;
use crate::processing::text_processor::TextNormalizer;
use crate::processing::vocabulary::{canonicalize_skill, SkillMatcher, SkillVocabulary};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Ordered education levels. Comparisons always go through [`EducationLevel::rank`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EducationLevel {
    #[default]
    None,
    HighSchool,
    Bachelors,
    Masters,
    Doctorate,
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 5] = [
        EducationLevel::None,
        EducationLevel::HighSchool,
        EducationLevel::Bachelors,
        EducationLevel::Masters,
        EducationLevel::Doctorate,
    ];

    pub fn rank(self) -> u8 {
        match self {
            EducationLevel::None => 0,
            EducationLevel::HighSchool => 1,
            EducationLevel::Bachelors => 2,
            EducationLevel::Masters => 3,
            EducationLevel::Doctorate => 4,
        }
    }

    pub fn meets(self, minimum: EducationLevel) -> bool {
        self.rank() >= minimum.rank()
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EducationLevel::None => "None",
            EducationLevel::HighSchool => "High School",
            EducationLevel::Bachelors => "Bachelor's",
            EducationLevel::Masters => "Master's",
            EducationLevel::Doctorate => "Doctorate",
        };
        write!(f, "{}", label)
    }
}

/// What a job description asks for. Built once per job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementSet {
    required_skills: BTreeSet<String>,
    min_education: EducationLevel,
    min_experience_years: f32,
}

impl RequirementSet {
    pub fn new<I, S>(required_skills: I, min_education: EducationLevel, min_experience_years: f32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            required_skills: normalize_skill_set(required_skills),
            min_education,
            min_experience_years: sanitize_years(min_experience_years),
        }
    }

    pub fn required_skills(&self) -> &BTreeSet<String> {
        &self.required_skills
    }

    pub fn min_education(&self) -> EducationLevel {
        self.min_education
    }

    pub fn min_experience_years(&self) -> f32 {
        self.min_experience_years
    }
}

/// What a resume offers. One per candidate, built once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    candidate_id: String,
    skills: BTreeSet<String>,
    education: EducationLevel,
    experience_years: f32,
    job_titles: BTreeSet<String>,
    #[serde(skip)]
    raw_text: String,
}

impl CandidateProfile {
    pub fn new<I, S>(
        candidate_id: impl Into<String>,
        skills: I,
        education: EducationLevel,
        experience_years: f32,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            candidate_id: candidate_id.into(),
            skills: normalize_skill_set(skills),
            education,
            experience_years: sanitize_years(experience_years),
            job_titles: BTreeSet::new(),
            raw_text: String::new(),
        }
    }

    pub fn with_raw_text(mut self, raw_text: impl Into<String>) -> Self {
        self.raw_text = raw_text.into();
        self
    }

    pub fn with_job_titles(mut self, job_titles: BTreeSet<String>) -> Self {
        self.job_titles = job_titles;
        self
    }

    pub fn candidate_id(&self) -> &str {
        &self.candidate_id
    }

    pub fn skills(&self) -> &BTreeSet<String> {
        &self.skills
    }

    pub fn education(&self) -> EducationLevel {
        self.education
    }

    pub fn experience_years(&self) -> f32 {
        self.experience_years
    }

    pub fn job_titles(&self) -> &BTreeSet<String> {
        &self.job_titles
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// True when nothing at all could be extracted.
    pub fn is_degraded(&self) -> bool {
        self.skills.is_empty() && self.education == EducationLevel::None && self.experience_years == 0.0
    }
}

fn normalize_skill_set<I, S>(skills: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    skills
        .into_iter()
        .map(|s| canonicalize_skill(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect()
}

fn sanitize_years(years: f32) -> f32 {
    if years.is_finite() && years > 0.0 {
        years
    } else {
        0.0
    }
}

/// Extracts requirement sets and candidate profiles from normalized tokens.
pub struct EntityExtractor {
    matcher: SkillMatcher,
    max_experience_years: f32,
}

impl EntityExtractor {
    pub fn new(vocabulary: &SkillVocabulary, normalizer: &TextNormalizer) -> Result<Self> {
        Ok(Self {
            matcher: vocabulary.compile(normalizer)?,
            max_experience_years: 50.0,
        })
    }

    /// Year counts above `cap` are ignored as noise.
    pub fn with_max_experience_years(mut self, cap: f32) -> Self {
        self.max_experience_years = cap;
        self
    }

    pub fn extract_requirements(&self, jd_tokens: &[String]) -> RequirementSet {
        let requirements = RequirementSet {
            required_skills: self.matcher.find_skills(jd_tokens),
            min_education: required_education(jd_tokens),
            min_experience_years: stated_experience_years(jd_tokens, self.max_experience_years)
                .unwrap_or(0.0),
        };

        debug!(
            "Requirements: {} skills, education {}, {} years",
            requirements.required_skills.len(),
            requirements.min_education,
            requirements.min_experience_years
        );

        requirements
    }

    pub fn extract_profile(&self, candidate_id: &str, resume_tokens: &[String]) -> CandidateProfile {
        let profile = CandidateProfile {
            candidate_id: candidate_id.to_string(),
            skills: self.matcher.find_skills(resume_tokens),
            education: highest_education(resume_tokens),
            experience_years: stated_experience_years(resume_tokens, self.max_experience_years)
                .unwrap_or(0.0),
            job_titles: job_titles(resume_tokens),
            raw_text: resume_tokens.join(" "),
        };

        if profile.is_degraded() {
            debug!("No signals extracted for candidate '{}'", candidate_id);
        }

        profile
    }
}

const DOCTORATE_TERMS: &[&str] = &["phd", "doctorate", "doctoral", "dphil"];
const MASTERS_TERMS: &[&str] = &["master", "msc", "mba", "meng", "mphil", "mtech"];
const BACHELORS_TERMS: &[&str] = &["bachelor", "bsc", "beng", "btech", "bba", "undergraduate"];
const HIGH_SCHOOL_TERMS: &[&str] = &["ged", "diploma"];

/// Undotted abbreviations that double as state codes ("Boston, MA") and honorifics
/// ("Ms. Doe"). Dotted forms are already folded into "bachelor" / "master".
const AMBIGUOUS_MASTERS: &[&str] = &["ms", "ma"];
const AMBIGUOUS_BACHELORS: &[&str] = &["bs", "ba"];

/// Tokens that may follow a degree word: subject fields and "degree" itself.
const DEGREE_CONTEXT: &[&str] = &[
    "degree", "computer", "science", "engineering", "mathematic", "math", "physic", "chemistry",
    "biology", "economic", "business", "finance", "accounting", "statistic", "information",
    "data", "psychology", "english", "history", "art", "education", "nursing", "electrical",
    "mechanical", "civil", "chemical", "communication", "marketing", "management",
    "philosophy", "political", "law", "humanity", "liberal", "related", "relevant",
    "equivalent", "technical", "quantitative",
];

const REQUIRED_CUES: &[&str] = &[
    "required", "require", "requirement", "minimum", "least", "must", "mandatory", "essential",
    "necessary", "need", "needed",
];

fn is_degree_word(token: &str) -> bool {
    [
        DOCTORATE_TERMS,
        MASTERS_TERMS,
        BACHELORS_TERMS,
        HIGH_SCHOOL_TERMS,
        AMBIGUOUS_MASTERS,
        AMBIGUOUS_BACHELORS,
    ]
    .iter()
    .any(|terms| terms.contains(&token))
}

fn in_degree_context(next: Option<&str>) -> bool {
    next.is_some_and(|n| DEGREE_CONTEXT.contains(&n) || is_degree_word(n))
}

/// Every education level mentioned, with its token position.
fn education_mentions(tokens: &[String]) -> Vec<(usize, EducationLevel)> {
    let mut mentions = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let token = token.as_str();
        let next = tokens.get(i + 1).map(String::as_str);
        let prev = i.checked_sub(1).and_then(|p| tokens.get(p)).map(String::as_str);

        let level = if DOCTORATE_TERMS.contains(&token) {
            Some(EducationLevel::Doctorate)
        } else if MASTERS_TERMS.contains(&token) {
            let scrum_master = token == "master" && prev == Some("scrum");
            (!scrum_master).then_some(EducationLevel::Masters)
        } else if AMBIGUOUS_MASTERS.contains(&token) {
            in_degree_context(next).then_some(EducationLevel::Masters)
        } else if BACHELORS_TERMS.contains(&token) {
            Some(EducationLevel::Bachelors)
        } else if AMBIGUOUS_BACHELORS.contains(&token) {
            in_degree_context(next).then_some(EducationLevel::Bachelors)
        } else if token == "diploma" {
            // "graduate diploma", "postgraduate diploma" are not school-leaving diplomas
            let graduate = matches!(prev, Some("graduate" | "postgraduate"));
            (!graduate).then_some(EducationLevel::HighSchool)
        } else if HIGH_SCHOOL_TERMS.contains(&token) || (token == "high" && next == Some("school")) {
            Some(EducationLevel::HighSchool)
        } else if token == "degree" {
            // A degree with no level word ("degree in computer science required")
            let qualified = prev.is_some_and(|p| is_degree_word(p) || p == "school");
            let stated = in_degree_context(next) || next.is_some_and(|n| REQUIRED_CUES.contains(&n));
            (!qualified && stated).then_some(EducationLevel::Bachelors)
        } else {
            None
        };

        if let Some(level) = level {
            mentions.push((i, level));
        }
    }

    mentions
}

const PREFERRED_CUES: &[&str] = &[
    "preferred", "prefer", "plus", "ideally", "bonus", "desirable", "advantage", "nice",
];

/// Whether one of `cues` appears within `before` tokens ahead of the mention at
/// `index` or `after` tokens behind it. The scan stops at another education mention.
fn cue_near(
    tokens: &[String],
    mention_positions: &[usize],
    index: usize,
    cues: &[&str],
    before: usize,
    after: usize,
) -> bool {
    let is_cue = |i: usize| cues.contains(&tokens[i].as_str());
    let is_mention = |i: &usize| mention_positions.contains(i);

    let after_hit = (index + 1..(index + 1 + after).min(tokens.len()))
        .take_while(|i| !is_mention(i))
        .any(is_cue);
    let before_hit = (index.saturating_sub(before)..index)
        .rev()
        .take_while(|i| !is_mention(i))
        .any(is_cue);

    after_hit || before_hit
}

/// Minimum education a job description asks for.
///
/// A mention counts as required when a requirement cue ("required", "minimum",
/// "at least", ...) sits within four tokens of it and it is not directly followed by
/// a preference cue ("preferred", "a plus"). The lowest required level wins; without
/// any required mention, the lowest level mentioned at all.
pub fn required_education(tokens: &[String]) -> EducationLevel {
    let mentions = education_mentions(tokens);
    let positions: Vec<usize> = mentions.iter().map(|(index, _)| *index).collect();

    let is_required = |index: usize| {
        cue_near(tokens, &positions, index, REQUIRED_CUES, 4, 4)
            && !cue_near(tokens, &positions, index, PREFERRED_CUES, 0, 2)
    };

    mentions
        .iter()
        .filter(|(index, _)| is_required(*index))
        .map(|(_, level)| *level)
        .min()
        .or_else(|| mentions.iter().map(|(_, level)| *level).min())
        .unwrap_or_default()
}

/// Highest education level a resume mentions.
pub fn highest_education(tokens: &[String]) -> EducationLevel {
    education_mentions(tokens)
        .into_iter()
        .map(|(_, level)| level)
        .max()
        .unwrap_or_default()
}

const NUMBER_WORDS: &[(&str, f32)] = &[
    ("one", 1.0), ("two", 2.0), ("three", 3.0), ("four", 4.0), ("five", 5.0),
    ("six", 6.0), ("seven", 7.0), ("eight", 8.0), ("nine", 9.0), ("ten", 10.0),
    ("eleven", 11.0), ("twelve", 12.0), ("fifteen", 15.0), ("twenty", 20.0),
];

fn parse_count(token: &str) -> Option<f32> {
    if token.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return token.parse::<f32>().ok();
    }
    NUMBER_WORDS
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, value)| *value)
}

/// Largest "N years" (or "N months") figure in the tokens, ignoring values above `cap`.
pub fn stated_experience_years(tokens: &[String], cap: f32) -> Option<f32> {
    let mut best: Option<f32> = None;

    for (i, token) in tokens.iter().enumerate() {
        let Some(count) = parse_count(token) else {
            continue;
        };

        // "5 plus years"
        let mut unit_index = i + 1;
        if tokens.get(unit_index).is_some_and(|t| t == "plus") {
            unit_index += 1;
        }

        let years = match tokens.get(unit_index).map(String::as_str) {
            Some("year" | "yr" | "yrs") => count,
            Some("month" | "mo") => count / 12.0,
            _ => continue,
        };

        if years > 0.0 && years <= cap {
            best = Some(best.map_or(years, |b| b.max(years)));
        }
    }

    best
}

const ROLE_NOUNS: &[&str] = &[
    "manager", "developer", "engineer", "analyst", "director", "coordinator", "specialist",
    "assistant", "associate", "consultant", "supervisor", "administrator", "architect",
    "designer", "technician", "officer", "representative", "lead", "head", "scientist",
];

/// Role nouns with their qualifier, e.g. "senior developer".
pub fn job_titles(tokens: &[String]) -> BTreeSet<String> {
    let mut titles = BTreeSet::new();

    for (i, token) in tokens.iter().enumerate() {
        if !ROLE_NOUNS.contains(&token.as_str()) {
            continue;
        }
        match i.checked_sub(1).map(|p| &tokens[p]) {
            Some(prev) if prev.chars().all(|c| c.is_alphabetic()) && !ROLE_NOUNS.contains(&prev.as_str()) => {
                titles.insert(format!("{} {}", prev, token));
            }
            _ => {
                titles.insert(token.clone());
            }
        }
    }

    titles
}
