//! CLI interface for the resume ranker

use crate::config::OutputFormat;
use crate::error::{RankerError, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resume-ranker")]
#[command(version)]
#[command(about = "Rank resumes against a job description")]
#[command(long_about = "Extract skills, education and experience from a job description and a batch of resumes, \
score every candidate per category and print a deterministic ranking")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank resumes against a job description
    Rank {
        /// Job description file (TXT, MD, PDF)
        #[arg(short, long)]
        job: PathBuf,

        /// Resume files or directories containing resumes (TXT, MD, PDF)
        #[arg(required = true)]
        resumes: Vec<PathBuf>,

        /// Output format: console, json, markdown, html
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Only show the best N candidates
        #[arg(short, long)]
        top: Option<usize>,

        /// Show matched and missing skills per candidate
        #[arg(short, long)]
        detailed: bool,
    },

    /// Embedding model management
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show or reset configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Inspect the skill vocabulary
    Vocab {
        #[command(subcommand)]
        action: VocabAction,
    },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List known and downloaded models
    List,

    /// Download a model into the models directory
    Download {
        /// Model name or HuggingFace repo ID
        model: String,
    },

    /// Show model information
    Info {
        /// Model name
        model: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

#[derive(Subcommand)]
pub enum VocabAction {
    /// Print canonical skills and their synonyms
    Show {
        /// Only show this skill
        #[arg(long)]
        skill: Option<String>,
    },
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat> {
    match format.to_lowercase().as_str() {
        "console" | "text" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        "html" => Ok(OutputFormat::Html),
        _ => Err(RankerError::InvalidInput(format!(
            "Invalid output format: {}. Supported: console, json, markdown, html",
            format
        ))),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<()> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if allowed_extensions.contains(&ext.to_lowercase().as_str()) => Ok(()),
        Some(ext) => Err(RankerError::UnsupportedFormat(format!(
            ".{} (allowed: {})",
            ext,
            allowed_extensions.join(", ")
        ))),
        None => Err(RankerError::InvalidInput(format!(
            "File has no extension: {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rank_command() {
        let cli = Cli::try_parse_from([
            "resume-ranker", "rank", "--job", "jd.md", "a.pdf", "resumes/", "--top", "3", "-o", "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Rank { job, resumes, top, output, detailed, .. } => {
                assert_eq!(job, PathBuf::from("jd.md"));
                assert_eq!(resumes.len(), 2);
                assert_eq!(top, Some(3));
                assert_eq!(output.as_deref(), Some("json"));
                assert!(!detailed);
            }
            _ => panic!("expected rank command"),
        }
    }

    #[test]
    fn test_rank_requires_resumes() {
        assert!(Cli::try_parse_from(["resume-ranker", "rank", "--job", "jd.md"]).is_err());
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(parse_output_format("md").unwrap(), OutputFormat::Markdown);
        assert!(matches!(parse_output_format("pdf"), Err(RankerError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension(Path::new("jd.TXT"), &["txt", "md"]).is_ok());
        assert!(validate_file_extension(Path::new("jd.docx"), &["txt", "md"]).is_err());
        assert!(validate_file_extension(Path::new("jd"), &["txt"]).is_err());
    }
}
