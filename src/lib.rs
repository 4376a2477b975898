//! Resume ranker library
//!
//! Normalizes a job description and a batch of resumes, extracts skills, education
//! and years of experience from both, and ranks candidates by a weighted score.

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod processing;

pub use config::Config;
pub use error::{RankerError, Result};
pub use processing::pipeline::{RankingEngine, RankingOutcome};
