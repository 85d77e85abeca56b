// ============================================
// src/error.rs
// Error taxonomy shared by the registry, adapter and session
// ============================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuizError {
    /// Required fields or language pools are missing; the quiz is unavailable.
    #[error("quiz '{slug}' is malformed: {reason}")]
    ContentMalformed { slug: String, reason: String },

    #[error("quiz '{0}' not found")]
    ContentNotFound(String),

    /// Stored history could not be read. Callers treat this as an empty history.
    #[error("recent history is unreadable: {0}")]
    PersistenceCorrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl QuizError {
    pub fn malformed(slug: impl Into<String>, reason: impl Into<String>) -> Self {
        QuizError::ContentMalformed {
            slug: slug.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = QuizError> = std::result::Result<T, E>;
