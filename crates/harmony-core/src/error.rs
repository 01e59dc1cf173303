//! Typed errors raised by the core library.

use thiserror::Error;

/// A match offset names a partner question that does not exist.
///
/// This means the matching API produced an inconsistent matrix. Callers
/// treat it as fatal to the whole computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error(
        "question {question_index} has a match at offset {offset} for question {partner_index}, which does not exist"
    )]
    MissingPartner {
        question_index: usize,
        offset: usize,
        partner_index: usize,
    },
}

/// Failure building or reading a Harmony import URL.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("questions is not properly formatted - it must be an array of question texts, or an array of objects which each must have a question_text property")]
    MalformedQuestions,

    #[error("not a Harmony import URL: {0}")]
    NotAnImportUrl(String),

    #[error("import payload is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("import payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Invalid result-option values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("threshold bounds must be within 0..=100, got [{0}, {1}]")]
    ThresholdOutOfRange(u8, u8),

    #[error("threshold minimum {0} is greater than maximum {1}")]
    ThresholdInverted(u8, u8),
}
