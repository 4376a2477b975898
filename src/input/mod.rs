//! Document-to-text conversion for job descriptions and resumes

pub mod file_detector;
pub mod manager;
pub mod text_extractor;

pub use manager::{CandidateDocument, DocumentLoader};
