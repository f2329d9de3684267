//! Error types for retrieval and evaluation.
//!
//! Defined in `examprep-core` so adapters in other crates produce the same
//! variants the services classify on, without string matching.

use thiserror::Error;

use crate::model::RecordId;

/// Failures reported by a content-store adapter.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The store answered with a non-success status.
    #[error("store error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    /// The store answered but the body could not be decoded.
    #[error("failed to decode store response: {0}")]
    Decode(String),
}

/// Errors returned by question retrieval and catalog lookups.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Missing or invalid input. Never retried.
    #[error("invalid request: {0}")]
    Validation(String),

    /// No question-type row matched and no fallback applies.
    #[error("unknown question type: {0}")]
    UnknownQuestionType(String),

    /// The query succeeded but matched nothing.
    #[error("no questions found for topic {topic_id} and question type {question_type_id}")]
    NotFound {
        topic_id: RecordId,
        question_type_id: RecordId,
    },

    /// No question with the requested id.
    #[error("question {0} not found")]
    QuestionNotFound(RecordId),

    /// A store call failed and was not retried.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Every retry attempt failed.
    #[error("failed to fetch questions after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: StoreError,
    },
}

impl RetrievalError {
    /// Whether the query ran fine and simply matched nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RetrievalError::NotFound { .. } | RetrievalError::QuestionNotFound(_)
        )
    }
}

/// Errors returned by answer evaluation. None of these are retried.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// Missing input; the grader was not contacted.
    #[error("missing required parameters for evaluation: {0}")]
    Validation(String),

    /// No response was received from the grading endpoint.
    #[error("grading request failed: {0}")]
    Transport(String),

    /// The grading endpoint answered with an error status.
    #[error("grading service error (HTTP {status}): {body}")]
    Remote { status: u16, body: String },

    /// A success status with a body we could not use.
    #[error("invalid response format from grading service: {0}")]
    InvalidResponse(String),
}
