//! File type detection

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Text,
    Markdown,
    /// Recognized so it can be rejected by name; there is no Word extractor.
    Docx,
    Unknown,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => FileType::Pdf,
            "txt" | "text" => FileType::Text,
            "md" | "markdown" => FileType::Markdown,
            "docx" | "doc" => FileType::Docx,
            _ => FileType::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(FileType::Unknown, FileType::from_extension)
    }

    pub fn is_supported(self) -> bool {
        matches!(self, FileType::Pdf | FileType::Text | FileType::Markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection() {
        assert_eq!(FileType::from_path(Path::new("cv.PDF")), FileType::Pdf);
        assert_eq!(FileType::from_path(Path::new("notes/jd.md")), FileType::Markdown);
        assert_eq!(FileType::from_path(Path::new("resume.txt")), FileType::Text);
        assert_eq!(FileType::from_path(Path::new("resume.docx")), FileType::Docx);
        assert!(!FileType::Docx.is_supported());
        assert!(!FileType::from_path(Path::new("README")).is_supported());
    }
}
