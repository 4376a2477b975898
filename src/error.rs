//! Error handling for the resume ranker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Model error: {0}")]
    ModelError(String),

    /// Fatal setup problem: invalid weights or a missing vocabulary/embedding resource.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, RankerError>;

/// Convert anyhow errors (model2vec-rs loading) to our custom error type
impl From<anyhow::Error> for RankerError {
    fn from(err: anyhow::Error) -> Self {
        RankerError::Embedding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_message() {
        let err = RankerError::Configuration("weights sum to 0.9".to_string());
        assert_eq!(err.to_string(), "Configuration error: weights sum to 0.9");
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: RankerError = anyhow::anyhow!("missing tokenizer").into();
        assert!(matches!(err, RankerError::Embedding(_)));
    }
}
