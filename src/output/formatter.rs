//! Output formatters for ranking reports

use crate::config::OutputFormat;
use crate::error::{RankerError, Result};
use crate::output::report::{RankedCandidate, RankingReport};
use askama::Template;
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for formatting ranking reports
pub trait OutputFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console table with optional colors and per-candidate detail
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

pub struct HtmlFormatter;

/// Picks the formatter for a requested output format
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    html_formatter: HtmlFormatter,
}

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Candidate Ranking Report</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 2rem; color: #222; }
        h1 { color: #1f3a5f; }
        table { border-collapse: collapse; width: 100%; margin-top: 1rem; }
        th, td { border: 1px solid #ddd; padding: 0.5rem; text-align: left; vertical-align: top; }
        th { background: #f0f4f8; }
        .score-high { color: #1b7f3b; font-weight: bold; }
        .score-mid { color: #b7791f; font-weight: bold; }
        .score-low { color: #c53030; font-weight: bold; }
        .missing { color: #c53030; }
        .note { color: #777; font-style: italic; }
        .metadata { margin-top: 2rem; color: #555; font-size: 0.9rem; }
    </style>
</head>
<body>
    <h1>Candidate Ranking Report</h1>
    <h2>Requirements</h2>
    <ul>
        <li><strong>Skills:</strong> {% if required_skills.is_empty() %}none detected{% else %}{{ required_skills }}{% endif %}</li>
        <li><strong>Minimum education:</strong> {{ min_education }}</li>
        <li><strong>Minimum experience:</strong> {{ min_experience }}</li>
        <li><strong>Weights:</strong> skills {{ skills_weight }}, education {{ education_weight }}, experience {{ experience_weight }}</li>
    </ul>
    <h2>Rankings</h2>
    <table>
        <tr>
            <th>#</th><th>Candidate</th><th>Score</th><th>Skills</th><th>Education</th><th>Experience</th><th>Matched</th><th>Missing</th>
        </tr>
        {% for row in rows %}
        <tr>
            <td>{{ row.rank }}</td>
            <td>{{ row.candidate_id }}{% if row.unreadable %} <span class="note">(unreadable)</span>{% endif %}</td>
            <td class="{{ row.score_class }}">{{ row.overall_score }}</td>
            <td>{{ row.skills_score }}</td>
            <td>{{ row.education_score }}</td>
            <td>{{ row.experience_score }}</td>
            <td>{{ row.matched }}</td>
            <td class="missing">{{ row.missing }}</td>
        </tr>
        {% endfor %}
    </table>
    <div class="metadata">
        <p>Generated {{ generated_at }} by resume-ranker v{{ version }} | Job: {{ job_file }} | Embeddings: {{ embedding_source }}</p>
        <p>{{ shown }} of {{ total }} candidates shown</p>
    </div>
</body>
</html>"#, ext = "html")]
struct HtmlTemplate {
    required_skills: String,
    min_education: String,
    min_experience: String,
    skills_weight: String,
    education_weight: String,
    experience_weight: String,
    rows: Vec<HtmlRow>,
    generated_at: String,
    version: String,
    job_file: String,
    embedding_source: String,
    shown: usize,
    total: usize,
}

struct HtmlRow {
    rank: usize,
    candidate_id: String,
    unreadable: bool,
    score_class: &'static str,
    overall_score: String,
    skills_score: String,
    education_score: String,
    experience_score: String,
    matched: String,
    missing: String,
}

fn percent(value: f32) -> String {
    format!("{:.0}%", value * 100.0)
}

fn matched_list(candidate: &RankedCandidate) -> String {
    candidate
        .matched_skills
        .iter()
        .map(|m| match &m.matched {
            Some(skill) if *skill != m.required => format!("{} (via {})", m.required, skill),
            _ => m.required.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        if self.use_colors {
            format!("\n{}\n", title.color(Color::Blue).bold())
        } else {
            format!("\n{}\n", title)
        }
    }

    fn score_color(score: f32) -> Color {
        match score {
            s if s >= 75.0 => Color::Green,
            s if s >= 50.0 => Color::Yellow,
            _ => Color::Red,
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String> {
        let mut output = String::new();
        let requirements = &report.requirements;

        output.push_str(&self.format_header("CANDIDATE RANKING"));
        output.push_str(&format!(
            "Job: {} | Candidates: {} | Embeddings: {}\n",
            report.metadata.job_file, report.metadata.total_candidates, report.metadata.embedding_source
        ));

        output.push_str(&self.format_header("Requirements"));
        let skills = if requirements.required_skills.is_empty() {
            "none detected".to_string()
        } else {
            requirements.required_skills.join(", ")
        };
        output.push_str(&format!("Skills: {}\n", skills));
        output.push_str(&format!("Minimum education: {}\n", requirements.min_education));
        output.push_str(&format!(
            "Minimum experience: {} years\n",
            requirements.min_experience_years
        ));
        output.push_str(&format!(
            "Weights: skills {:.0}%, education {:.0}%, experience {:.0}%\n",
            report.weights.skills() * 100.0,
            report.weights.education() * 100.0,
            report.weights.experience() * 100.0
        ));

        output.push_str(&self.format_header("Rankings"));
        output.push_str(&format!(
            "{:>3}  {:<32} {:>6}  {:>6} {:>6} {:>6}\n",
            "#", "Candidate", "Score", "Skill", "Edu", "Exp"
        ));

        for candidate in &report.rankings {
            let score = format!("{:>6.1}", candidate.overall_score);
            output.push_str(&format!(
                "{:>3}  {:<32} {}  {:>6} {:>6} {:>6}{}\n",
                candidate.rank,
                candidate.candidate_id,
                self.colorize(&score, Self::score_color(candidate.overall_score)),
                percent(candidate.skills_score),
                percent(candidate.education_score),
                percent(candidate.experience_score),
                if candidate.unreadable { "  (unreadable)" } else { "" }
            ));

            if self.detailed {
                output.push_str(&format!("     {}\n", self.colorize(candidate.verdict(), Color::Cyan)));
                if !candidate.matched_skills.is_empty() {
                    output.push_str(&format!("     Matched: {}\n", matched_list(candidate)));
                }
                if !candidate.missing_skills.is_empty() {
                    output.push_str(&format!(
                        "     Missing: {}\n",
                        self.colorize(&candidate.missing_skills.join(", "), Color::Red)
                    ));
                }
                output.push_str(&format!(
                    "     Education: {} | Experience: {} years\n",
                    candidate.education, candidate.experience_years
                ));
                if !candidate.job_titles.is_empty() {
                    output.push_str(&format!("     Titles: {}\n", candidate.job_titles.join(", ")));
                }
            }
        }

        if report.rankings.len() < report.metadata.total_candidates {
            output.push_str(&format!(
                "\n({} of {} candidates shown)\n",
                report.rankings.len(),
                report.metadata.total_candidates
            ));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String> {
        let mut output = String::new();
        let requirements = &report.requirements;

        output.push_str("# Candidate Ranking Report\n\n");

        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Job:** `{}` | **Embeddings:** {}\n\n",
                report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                report.metadata.job_file,
                report.metadata.embedding_source
            ));
        }

        output.push_str("## Requirements\n\n");
        output.push_str(&format!(
            "- **Skills:** {}\n",
            if requirements.required_skills.is_empty() {
                "none detected".to_string()
            } else {
                requirements.required_skills.join(", ")
            }
        ));
        output.push_str(&format!("- **Minimum education:** {}\n", requirements.min_education));
        output.push_str(&format!(
            "- **Minimum experience:** {} years\n\n",
            requirements.min_experience_years
        ));

        output.push_str("## Rankings\n\n");
        output.push_str("| # | Candidate | Score | Skills | Education | Experience | Missing skills |\n");
        output.push_str("|---|-----------|-------|--------|-----------|------------|----------------|\n");
        for candidate in &report.rankings {
            output.push_str(&format!(
                "| {} | {}{} | {:.1} | {} | {} | {} | {} |\n",
                candidate.rank,
                candidate.candidate_id,
                if candidate.unreadable { " *(unreadable)*" } else { "" },
                candidate.overall_score,
                percent(candidate.skills_score),
                percent(candidate.education_score),
                percent(candidate.experience_score),
                candidate.missing_skills.join(", ")
            ));
        }

        if report.rankings.len() < report.metadata.total_candidates {
            output.push_str(&format!(
                "\n*{} of {} candidates shown*\n",
                report.rankings.len(),
                report.metadata.total_candidates
            ));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl HtmlFormatter {
    fn create_template_data(&self, report: &RankingReport) -> HtmlTemplate {
        let rows = report
            .rankings
            .iter()
            .map(|candidate| HtmlRow {
                rank: candidate.rank,
                candidate_id: candidate.candidate_id.clone(),
                unreadable: candidate.unreadable,
                score_class: match candidate.overall_score {
                    s if s >= 75.0 => "score-high",
                    s if s >= 50.0 => "score-mid",
                    _ => "score-low",
                },
                overall_score: format!("{:.1}", candidate.overall_score),
                skills_score: percent(candidate.skills_score),
                education_score: percent(candidate.education_score),
                experience_score: percent(candidate.experience_score),
                matched: matched_list(candidate),
                missing: candidate.missing_skills.join(", "),
            })
            .collect();

        HtmlTemplate {
            required_skills: report.requirements.required_skills.join(", "),
            min_education: report.requirements.min_education.to_string(),
            min_experience: format!("{} years", report.requirements.min_experience_years),
            skills_weight: percent(report.weights.skills()),
            education_weight: percent(report.weights.education()),
            experience_weight: percent(report.weights.experience()),
            rows,
            generated_at: report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            version: report.metadata.ranker_version.clone(),
            job_file: report.metadata.job_file.clone(),
            embedding_source: report.metadata.embedding_source.clone(),
            shown: report.rankings.len(),
            total: report.metadata.total_candidates,
        }
    }
}

impl OutputFormatter for HtmlFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String> {
        self.create_template_data(report)
            .render()
            .map_err(|e| RankerError::OutputFormatting(e.to_string()))
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Html
    }
}

impl ReportGenerator {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter::new(true),
            html_formatter: HtmlFormatter,
        }
    }

    fn formatter(&self, format: OutputFormat) -> &dyn OutputFormatter {
        match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
            OutputFormat::Html => &self.html_formatter,
        }
    }

    pub fn generate_report(&self, report: &RankingReport, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_report(report)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(true, false)
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}

/// `<job stem>_ranking[_<timestamp>].<ext>`
pub fn suggest_filename(format: OutputFormat, job_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(job_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    let extension = match format {
        OutputFormat::Console => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
        OutputFormat::Html => "html",
    };

    format!("{}_ranking{}.{}", base_name, timestamp_suffix, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::report::tests::sample_report;
    use tempfile::TempDir;

    #[test]
    fn test_console_plain() {
        let report = sample_report();
        let output = ConsoleFormatter::new(false, true).format_report(&report).unwrap();

        assert!(output.contains("CANDIDATE RANKING"));
        assert!(output.contains("alice.txt"));
        assert!(output.contains("Missing:"));
        assert!(!output.contains("\u{1b}["));
    }

    #[test]
    fn test_json_round_trip() {
        let report = sample_report();
        let json = JsonFormatter::new(false).format_report(&report).unwrap();
        let parsed: RankingReport = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.rankings.len(), report.rankings.len());
        assert_eq!(parsed.rankings[0].candidate_id, "alice.txt");
    }

    #[test]
    fn test_markdown_table() {
        let report = sample_report().limit(Some(2));
        let output = MarkdownFormatter::new(false).format_report(&report).unwrap();

        assert!(output.starts_with("# Candidate Ranking Report"));
        assert_eq!(output.lines().filter(|l| l.starts_with("| ")).count(), 3);
        assert!(output.contains("2 of 3 candidates shown"));
    }

    #[test]
    fn test_html_escapes_candidate_ids() {
        let mut report = sample_report();
        report.rankings[0].candidate_id = "<script>.txt".to_string();
        let html = HtmlFormatter.format_report(&report).unwrap();

        assert!(html.contains("<table>"));
        assert!(html.contains("script"));
        assert!(!html.contains("<script>.txt"));
    }

    #[test]
    fn test_generator_dispatch() {
        let generator = ReportGenerator::new(false, false);
        let report = sample_report();

        for format in [OutputFormat::Console, OutputFormat::Json, OutputFormat::Markdown, OutputFormat::Html] {
            assert!(!generator.generate_report(&report, format).unwrap().is_empty());
        }
    }

    #[test]
    fn test_save_and_filename() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reports").join(suggest_filename(OutputFormat::Json, "jobs/backend.md", false));

        save_report_to_file("{}", &path).unwrap();
        assert!(path.ends_with("reports/backend_ranking.json"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }
}
