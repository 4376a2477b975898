//! Text normalization: cleaning, tokenization, stop word removal and lemmatization

use regex::Regex;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Turns free text (job descriptions, resume bodies) into an ordered sequence of
/// lowercase, lemmatized tokens.
pub struct TextNormalizer {
    stop_words: HashSet<&'static str>,
    email_regex: Regex,
    phone_regex: Regex,
    url_regex: Regex,
    whitespace_regex: Regex,
    year_suffix_regex: Regex,
    degree_regex: Regex,
    phd_regex: Regex,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Symbol-bearing terms that would otherwise be destroyed by punctuation removal.
const SYMBOL_FOLDS: &[(&str, &str)] = &[
    ("c++", " cpp "),
    ("c#", " csharp "),
    ("f#", " fsharp "),
    ("asp.net", " aspnet "),
    (".net", " dotnet "),
];

impl TextNormalizer {
    pub fn new() -> Self {
        let email_regex = Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
            .expect("Invalid email regex");

        let phone_regex = Regex::new(r"(?:\+?1[-. ]?)?\(?\b[0-9]{3}\)?[-. ]?[0-9]{3}[-. ]?[0-9]{4}\b")
            .expect("Invalid phone regex");

        let url_regex = Regex::new(r"(?:https?://|www\.)[^\s]+")
            .expect("Invalid URL regex");

        let whitespace_regex = Regex::new(r"\s+").expect("Invalid whitespace regex");

        // "5yrs", "10+years" -> "5 yrs", "10 years"
        let year_suffix_regex = Regex::new(r"(\d)\+?(years?|yrs?)\b")
            .expect("Invalid year suffix regex");

        // "b.s.", "m.a", "b. sc." -> "bachelor", "master", "bsc"
        let degree_regex = Regex::new(r"\b([bm])\.\s?(sc|s|a|eng)\b\.?")
            .expect("Invalid degree regex");

        let phd_regex = Regex::new(r"\bph\.?\s?d\b\.?").expect("Invalid PhD regex");

        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
            email_regex,
            phone_regex,
            url_regex,
            whitespace_regex,
            year_suffix_regex,
            degree_regex,
            phd_regex,
        }
    }

    /// Normalize text into ordered tokens. Empty or whitespace-only input yields no tokens.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let cleaned = self.clean_text(text);
        let mut tokens = Vec::new();

        for word in cleaned.unicode_words() {
            if is_number(word) {
                tokens.push(word.to_string());
                continue;
            }

            // "node.js" and "bachelor's" arrive as single words; split on the inner punctuation
            for part in word.split(|c: char| !c.is_alphanumeric()) {
                if part.is_empty() {
                    continue;
                }
                if is_number(part) {
                    tokens.push(part.to_string());
                    continue;
                }
                if part.chars().count() < 2 || self.stop_words.contains(part) {
                    continue;
                }
                tokens.push(lemmatize(part));
            }
        }

        tokens
    }

    /// Lowercase and strip boilerplate (URLs, emails, phone numbers) while keeping
    /// symbol-bearing skill and degree names recognisable.
    pub fn clean_text(&self, text: &str) -> String {
        let mut cleaned = normalize_unicode(text).to_lowercase();

        cleaned = self.url_regex.replace_all(&cleaned, " ").into_owned();
        cleaned = self.email_regex.replace_all(&cleaned, " ").into_owned();
        cleaned = self.phone_regex.replace_all(&cleaned, " ").into_owned();

        for (symbol, replacement) in SYMBOL_FOLDS {
            cleaned = cleaned.replace(symbol, replacement);
        }

        cleaned = self.phd_regex.replace_all(&cleaned, " phd ").into_owned();
        cleaned = self
            .degree_regex
            .replace_all(&cleaned, |caps: &regex::Captures| {
                format!(" {} ", dotted_degree(&caps[1], &caps[2]))
            })
            .into_owned();
        cleaned = self.year_suffix_regex.replace_all(&cleaned, "$1 $2").into_owned();

        self.whitespace_regex.replace_all(&cleaned, " ").trim().to_string()
    }
}

/// Dotted degree abbreviations become the unambiguous level word, so a bare "ms" or
/// "ma" left in the text can only be a state code, an honorific or an undotted degree.
fn dotted_degree(level: &str, subject: &str) -> String {
    match (level, subject) {
        ("b", "s" | "a") => "bachelor".to_string(),
        ("m", "s" | "a") => "master".to_string(),
        _ => format!("{}{}", level, subject),
    }
}

fn is_number(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_ascii_digit()) && token.parse::<f32>().is_ok()
}

/// Map typographic punctuation onto ASCII so the regexes above see one form.
fn normalize_unicode(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2026}' => '.',
            '\u{00A0}' => ' ',
            _ => c,
        })
        .collect()
}

/// Irregular plurals that the suffix rules below would get wrong.
const LEMMA_EXCEPTIONS: &[(&str, &str)] = &[
    ("analyses", "analysis"),
    ("children", "child"),
    ("criteria", "criterion"),
    ("diagnoses", "diagnosis"),
    ("indices", "index"),
    ("men", "man"),
    ("people", "person"),
    ("series", "series"),
    ("species", "species"),
    ("theses", "thesis"),
    ("women", "woman"),
];

/// Reduce an inflected noun to its base form with suffix rules.
///
/// Tokens that are not purely alphabetic (numbers, "ec2") and very short tokens
/// ("aws", "css") are left alone.
pub fn lemmatize(token: &str) -> String {
    if let Some((_, base)) = LEMMA_EXCEPTIONS.iter().find(|(form, _)| *form == token) {
        return (*base).to_string();
    }

    if token.len() <= 3 || !token.chars().all(|c| c.is_ascii_alphabetic()) {
        return token.to_string();
    }

    if ["ss", "us", "is", "os"].iter().any(|suffix| token.ends_with(suffix)) {
        return token.to_string();
    }

    if let Some(stem) = token.strip_suffix("sses") {
        return format!("{}ss", stem);
    }
    if let Some(stem) = token.strip_suffix("ies") {
        if stem.len() > 1 {
            return format!("{}y", stem);
        }
    }
    for suffix in ["xes", "ches", "shes"] {
        if let Some(stem) = token.strip_suffix(suffix) {
            return format!("{}{}", stem, &suffix[..suffix.len() - 2]);
        }
    }
    if let Some(stem) = token.strip_suffix('s') {
        return stem.to_string();
    }

    token.to_string()
}

/// English stop words. Contraction fragments such as "ma" are deliberately absent
/// so degree abbreviations survive.
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "can", "will", "just",
    "don", "should", "now", "ain", "aren", "couldn", "didn", "doesn", "hadn", "hasn", "haven",
    "isn", "mightn", "mustn", "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
    "ll", "re", "ve",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        let normalizer = TextNormalizer::new();
        let tokens = normalizer.normalize("Rust programming languages are awesome!");

        assert_eq!(tokens, vec!["rust", "programming", "language", "awesome"]);
    }

    #[test]
    fn test_empty_input_yields_no_tokens() {
        let normalizer = TextNormalizer::new();
        assert!(normalizer.normalize("").is_empty());
        assert!(normalizer.normalize("   \n\t ").is_empty());
        assert!(normalizer.normalize("the and of").is_empty());
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let normalizer = TextNormalizer::new();
        let text = "Senior Engineer with 7+ years of Python, SQL and AWS experience.";
        assert_eq!(normalizer.normalize(text), normalizer.normalize(text));
    }

    #[test]
    fn test_numbers_survive() {
        let normalizer = TextNormalizer::new();
        let tokens = normalizer.normalize("5+ years, 2.5yrs and 10 years");

        assert_eq!(tokens, vec!["5", "year", "2.5", "yrs", "10", "year"]);
    }

    #[test]
    fn test_boilerplate_removed() {
        let normalizer = TextNormalizer::new();
        let tokens = normalizer
            .normalize("Contact john.doe@email.com, (555) 123-4567 or https://example.com/cv");

        assert_eq!(tokens, vec!["contact"]);
    }

    #[test]
    fn test_symbol_folding() {
        let normalizer = TextNormalizer::new();
        let tokens = normalizer.normalize("C++, C# and ASP.NET; Node.js");

        assert!(tokens.contains(&"cpp".to_string()));
        assert!(tokens.contains(&"csharp".to_string()));
        assert!(tokens.contains(&"aspnet".to_string()));
        assert!(tokens.contains(&"node".to_string()));
        assert!(tokens.contains(&"js".to_string()));
    }

    #[test]
    fn test_degree_abbreviations() {
        let normalizer = TextNormalizer::new();

        assert_eq!(normalizer.normalize("Ph.D. in Physics"), vec!["phd", "physic"]);
        assert_eq!(normalizer.normalize("B.S. Computer Science"), vec!["bachelor", "computer", "science"]);
        assert_eq!(normalizer.normalize("M.A. English"), vec!["master", "english"]);
        assert_eq!(normalizer.normalize("B. Sc. Physics"), vec!["bsc", "physic"]);
        assert_eq!(normalizer.normalize("Bachelor's degree"), vec!["bachelor", "degree"]);
        // no inner dot, so not a degree
        assert_eq!(normalizer.normalize("Ms. Jane Doe, Boston, MA"), vec!["ms", "jane", "doe", "boston", "ma"]);
    }

    #[test]
    fn test_lemmatize() {
        assert_eq!(lemmatize("years"), "year");
        assert_eq!(lemmatize("technologies"), "technology");
        assert_eq!(lemmatize("processes"), "process");
        assert_eq!(lemmatize("matches"), "match");
        assert_eq!(lemmatize("masters"), "master");
        assert_eq!(lemmatize("business"), "business");
        assert_eq!(lemmatize("analysis"), "analysis");
        assert_eq!(lemmatize("aws"), "aws");
        assert_eq!(lemmatize("people"), "person");
        assert_eq!(lemmatize("ec2"), "ec2");
    }
}
