//! Skill vocabulary: canonical skill names and the synonyms that map onto them

use crate::error::{RankerError, Result};
use crate::processing::text_processor::TextNormalizer;
use aho_corasick::{AhoCorasick, MatchKind};
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Curated mapping of canonical skill name -> known synonyms.
///
/// Passed explicitly to the extractors and the embedding builder so a test can swap
/// in a handful of entries.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillVocabulary {
    entries: BTreeMap<String, BTreeSet<String>>,
}

/// Lowercase a skill name and collapse its whitespace, so "  Machine   Learning" and
/// "machine learning" are the same skill.
pub fn canonicalize_skill(skill: &str) -> String {
    skill.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

impl SkillVocabulary {
    /// Build from `(canonical, synonyms)` pairs. The canonical name always matches itself.
    pub fn new<I, S, V, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
        V: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for (canonical, synonyms) in entries {
            let canonical = canonicalize_skill(canonical.as_ref());
            if canonical.is_empty() {
                continue;
            }
            let entry = map.entry(canonical.clone()).or_default();
            entry.insert(canonical);
            entry.extend(
                synonyms
                    .into_iter()
                    .map(|s| canonicalize_skill(s.as_ref()))
                    .filter(|s| !s.is_empty()),
            );
        }

        Self { entries: map }
    }

    /// The vocabulary shipped with the crate.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_SKILLS
                .iter()
                .map(|(canonical, synonyms)| (*canonical, synonyms.iter().copied())),
        )
    }

    /// Load a vocabulary file. `.toml` files are parsed as TOML, anything else as JSON;
    /// both are a map of canonical name to a list of synonyms.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RankerError::Configuration(format!(
                "Failed to read skill vocabulary {}: {}",
                path.display(),
                e
            ))
        })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let raw: BTreeMap<String, Vec<String>> = if is_toml {
            toml::from_str(&content).map_err(|e| {
                RankerError::Configuration(format!("Invalid skill vocabulary TOML: {}", e))
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                RankerError::Configuration(format!("Invalid skill vocabulary JSON: {}", e))
            })?
        };

        let vocabulary = Self::new(raw);
        if vocabulary.is_empty() {
            return Err(RankerError::Configuration(format!(
                "Skill vocabulary {} has no entries",
                path.display()
            )));
        }
        Ok(vocabulary)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn synonyms(&self, canonical: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(&canonicalize_skill(canonical))
    }

    /// Compile every synonym through the normalizer into a token-boundary matcher.
    pub fn compile(&self, normalizer: &TextNormalizer) -> Result<SkillMatcher> {
        let mut pattern_index: HashMap<String, usize> = HashMap::new();
        let mut patterns: Vec<String> = Vec::new();
        let mut pattern_skills: Vec<Vec<String>> = Vec::new();

        for (canonical, synonyms) in &self.entries {
            for synonym in synonyms {
                let tokens = normalizer.normalize(synonym);
                if tokens.is_empty() {
                    debug!("Synonym '{}' of '{}' normalizes to nothing, skipped", synonym, canonical);
                    continue;
                }

                // Padded with spaces so "java" never matches inside "javascript"
                let pattern = format!(" {} ", tokens.join(" "));
                let id = *pattern_index.entry(pattern.clone()).or_insert_with(|| {
                    patterns.push(pattern);
                    pattern_skills.push(Vec::new());
                    patterns.len() - 1
                });
                if !pattern_skills[id].contains(canonical) {
                    pattern_skills[id].push(canonical.clone());
                }
            }
        }

        if patterns.is_empty() {
            return Err(RankerError::Configuration(
                "Skill vocabulary has no usable synonyms".to_string(),
            ));
        }

        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&patterns)
            .map_err(|e| RankerError::Configuration(format!("Failed to build skill matcher: {}", e)))?;

        debug!(
            "Compiled skill matcher: {} skills, {} patterns",
            self.entries.len(),
            patterns.len()
        );

        Ok(SkillMatcher {
            automaton,
            pattern_skills,
        })
    }
}

/// Finds vocabulary skills in a normalized token sequence.
pub struct SkillMatcher {
    automaton: AhoCorasick,
    pattern_skills: Vec<Vec<String>>,
}

impl SkillMatcher {
    /// Canonical names of every vocabulary entry whose synonym appears as a contiguous
    /// token run. Overlapping phrases all count ("machine learning" and "learning").
    pub fn find_skills(&self, tokens: &[String]) -> BTreeSet<String> {
        let mut skills = BTreeSet::new();
        if tokens.is_empty() {
            return skills;
        }

        let haystack = format!(" {} ", tokens.join(" "));
        for mat in self.automaton.find_overlapping_iter(&haystack) {
            skills.extend(self.pattern_skills[mat.pattern().as_usize()].iter().cloned());
        }

        skills
    }
}

/// Built-in skill vocabulary, canonical name first.
const BUILTIN_SKILLS: &[(&str, &[&str])] = &[
    // Programming languages
    ("python", &["python3", "py"]),
    ("java", &[]),
    ("javascript", &["js", "ecmascript", "es6"]),
    ("typescript", &["ts"]),
    ("c++", &["cplusplus"]),
    ("c#", &["csharp"]),
    ("golang", &["go lang"]),
    ("rust", &[]),
    ("ruby", &[]),
    ("php", &[]),
    ("swift", &[]),
    ("kotlin", &[]),
    ("scala", &[]),
    // Web development
    ("html", &["html5"]),
    ("css", &["css3"]),
    ("react", &["react.js", "reactjs"]),
    ("angular", &["angularjs", "angular.js"]),
    ("vue", &["vue.js", "vuejs"]),
    ("node.js", &["nodejs"]),
    ("express", &["express.js", "expressjs"]),
    ("django", &[]),
    ("flask", &[]),
    ("spring boot", &["spring framework"]),
    ("asp.net", &["aspnet"]),
    (".net", &["dotnet"]),
    ("laravel", &[]),
    ("ruby on rails", &["rails"]),
    // Data science & AI
    ("machine learning", &["ml"]),
    ("deep learning", &["neural networks"]),
    ("nlp", &["natural language processing"]),
    ("data analysis", &["data analytics"]),
    ("tensorflow", &[]),
    ("pytorch", &["torch"]),
    ("scikit-learn", &["sklearn"]),
    ("pandas", &[]),
    ("numpy", &[]),
    ("sql", &["structured query language"]),
    ("nosql", &[]),
    ("postgresql", &["postgres"]),
    ("mysql", &[]),
    ("mongodb", &["mongo"]),
    ("redis", &[]),
    ("statistics", &["statistical analysis"]),
    ("data visualization", &[]),
    ("tableau", &[]),
    ("power bi", &["powerbi"]),
    ("big data", &[]),
    ("hadoop", &[]),
    ("spark", &["apache spark", "pyspark"]),
    ("kafka", &["apache kafka"]),
    ("airflow", &["apache airflow"]),
    // Cloud & DevOps
    ("aws", &["amazon web services"]),
    ("azure", &["microsoft azure"]),
    ("gcp", &["google cloud", "google cloud platform"]),
    ("docker", &[]),
    ("kubernetes", &["k8s"]),
    ("terraform", &[]),
    ("ansible", &[]),
    ("jenkins", &[]),
    ("git", &[]),
    ("github", &[]),
    ("gitlab", &[]),
    ("devops", &[]),
    ("ci/cd", &["cicd", "continuous integration", "continuous delivery"]),
    ("linux", &[]),
    ("unix", &[]),
    // Architecture
    ("rest api", &["restful api", "rest apis", "restful"]),
    ("graphql", &[]),
    ("microservices", &["microservice architecture"]),
    ("blockchain", &[]),
    ("cybersecurity", &["cyber security", "information security", "infosec"]),
    ("networking", &[]),
    // Business & management
    ("project management", &["pmp"]),
    ("agile", &[]),
    ("scrum", &[]),
    ("kanban", &[]),
    ("jira", &[]),
    ("leadership", &[]),
    ("team management", &["people management"]),
    ("product management", &[]),
    ("business analysis", &[]),
    ("marketing", &[]),
    ("sales", &[]),
    ("customer service", &["customer support"]),
    ("communication", &[]),
    // Office & productivity
    ("microsoft office", &["ms office", "office 365"]),
    ("excel", &["microsoft excel", "ms excel"]),
    ("microsoft word", &["ms word"]),
    ("powerpoint", &["ms powerpoint"]),
    ("google workspace", &["gsuite"]),
    // Industry specific
    ("accounting", &[]),
    ("finance", &[]),
    ("human resources", &["hr"]),
    ("healthcare", &[]),
    ("supply chain", &[]),
    ("logistics", &[]),
    ("seo", &["search engine optimization"]),
    ("content marketing", &[]),
    ("social media", &[]),
];
