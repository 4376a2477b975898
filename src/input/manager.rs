//! Loads job descriptions and resumes from disk

use crate::error::{RankerError, Result};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One resume ready for ranking.
#[derive(Debug, Clone)]
pub struct CandidateDocument {
    pub candidate_id: String,
    pub path: PathBuf,
    pub text: String,
    /// False when the file could not be read and `text` is empty.
    pub readable: bool,
}

#[derive(Debug, Default)]
pub struct DocumentLoader;

impl DocumentLoader {
    pub fn new() -> Self {
        Self
    }

    /// Text of a single document. Errors for missing files and unsupported formats.
    pub async fn extract_text(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(RankerError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let text = match FileType::from_path(path) {
            FileType::Pdf => PdfExtractor.extract(path).await?,
            FileType::Text => PlainTextExtractor.extract(path).await?,
            FileType::Markdown => MarkdownExtractor.extract(path).await?,
            FileType::Docx => {
                return Err(RankerError::UnsupportedFormat(format!(
                    "DOCX is not supported: {} (convert it to PDF or plain text)",
                    path.display()
                )));
            }
            FileType::Unknown => {
                return Err(RankerError::UnsupportedFormat(format!(
                    "Unsupported file type for: {} (expected .txt, .md or .pdf)",
                    path.display()
                )));
            }
        };

        debug!("Extracted {} characters from {}", text.len(), path.display());
        Ok(text)
    }

    /// Expand directories (non-recursively) into the supported files they contain.
    /// Explicit file paths are kept as given, even when unsupported, so they still
    /// show up in the ranking.
    pub fn expand_inputs(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for input in inputs {
            if input.is_dir() {
                let mut entries: Vec<PathBuf> = std::fs::read_dir(input)?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|path| path.is_file() && FileType::from_path(path).is_supported())
                    .collect();
                entries.sort();
                info!("Found {} resumes in {}", entries.len(), input.display());
                files.extend(entries);
            } else {
                files.push(input.clone());
            }
        }

        Ok(files)
    }

    /// Load a resume. A document that cannot be read becomes an empty resume.
    pub async fn load_candidate(&self, path: &Path, candidate_id: String) -> CandidateDocument {
        match self.extract_text(path).await {
            Ok(text) => CandidateDocument {
                candidate_id,
                path: path.to_path_buf(),
                text,
                readable: true,
            },
            Err(e) => {
                warn!("Could not read {}: {}. Ranking it as an empty resume", path.display(), e);
                CandidateDocument {
                    candidate_id,
                    path: path.to_path_buf(),
                    text: String::new(),
                    readable: false,
                }
            }
        }
    }
}

/// Candidate ids are file names; paths sharing a file name fall back to the full path.
pub fn candidate_ids(paths: &[PathBuf]) -> Vec<String> {
    let file_name = |path: &PathBuf| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string())
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    for path in paths {
        *counts.entry(file_name(path)).or_default() += 1;
    }

    paths
        .iter()
        .map(|path| {
            let name = file_name(path);
            if counts[&name] > 1 {
                path.display().to_string()
            } else {
                name
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_extract_markdown() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("jd.md");
        std::fs::write(&path, "## Requirements\n\n* 5+ years of **Rust**\n").unwrap();

        let text = DocumentLoader::new().extract_text(&path).await.unwrap();
        assert_eq!(text, "Requirements\n5+ years of Rust");
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resume.docx");
        std::fs::write(&path, "binary").unwrap();

        let result = DocumentLoader::new().extract_text(&path).await;
        match result {
            Err(RankerError::UnsupportedFormat(message)) => {
                assert!(message.contains("DOCX"));
                assert!(message.contains("resume.docx"));
            }
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }

        let path = temp_dir.path().join("resume.rtf");
        std::fs::write(&path, "rich").unwrap();
        let result = DocumentLoader::new().extract_text(&path).await;
        assert!(matches!(result, Err(RankerError::UnsupportedFormat(m)) if m.contains("expected .txt, .md or .pdf")));
    }

    #[tokio::test]
    async fn test_unreadable_candidate_becomes_empty() {
        let loader = DocumentLoader::new();
        let document = loader
            .load_candidate(Path::new("/nonexistent/resume.txt"), "resume.txt".to_string())
            .await;

        assert!(!document.readable);
        assert!(document.text.is_empty());
        assert_eq!(document.candidate_id, "resume.txt");
    }

    #[test]
    fn test_expand_inputs() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["b.txt", "a.md", "c.pdf", "notes.json"] {
            std::fs::write(temp_dir.path().join(name), "x").unwrap();
        }
        let extra = PathBuf::from("/elsewhere/z.txt");

        let files = DocumentLoader::new()
            .expand_inputs(&[temp_dir.path().to_path_buf(), extra.clone()])
            .unwrap();

        let names: Vec<String> = files.iter().map(|p| p.file_name().unwrap().to_string_lossy().to_string()).collect();
        assert_eq!(names, vec!["a.md", "b.txt", "c.pdf", "z.txt"]);
        assert_eq!(files[3], extra);
    }

    #[test]
    fn test_candidate_ids_disambiguate_duplicates() {
        let paths = vec![
            PathBuf::from("2023/jane.pdf"),
            PathBuf::from("2024/jane.pdf"),
            PathBuf::from("2024/john.txt"),
        ];

        assert_eq!(candidate_ids(&paths), vec!["2023/jane.pdf", "2024/jane.pdf", "john.txt"]);
    }
}
