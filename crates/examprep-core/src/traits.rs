//! Core trait definitions for the content store and the grading backend.
//!
//! These async traits are implemented by the `examprep-providers` crate:
//! Supabase for the store and blob resolver, DeepSeek for the grader, and
//! in-memory mocks for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{EvaluationError, StoreError};
use crate::model::{Level, QuestionKind, QuestionType, RecordId, Subject, Topic};
use crate::rows::QuestionRow;

// ---------------------------------------------------------------------------
// Content store
// ---------------------------------------------------------------------------

/// Read-only access to the relational question data.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// First question type whose name contains `pattern`, ignoring case.
    async fn find_question_type(&self, pattern: &str)
        -> Result<Option<QuestionType>, StoreError>;

    /// All rows of `kind`'s table with the given topic and question type.
    async fn questions(
        &self,
        kind: QuestionKind,
        topic_id: &RecordId,
        question_type_id: &RecordId,
    ) -> Result<Vec<QuestionRow>, StoreError>;

    /// A single row of `kind`'s table by primary key.
    async fn question_by_id(
        &self,
        kind: QuestionKind,
        id: &RecordId,
    ) -> Result<Option<QuestionRow>, StoreError>;

    /// All levels, ordered by id.
    async fn levels(&self) -> Result<Vec<Level>, StoreError>;

    /// Subjects of a level, ordered by name.
    async fn subjects(&self, level_id: &RecordId) -> Result<Vec<Subject>, StoreError>;

    /// Topics of a subject, ordered by name.
    async fn topics(&self, subject_id: &RecordId) -> Result<Vec<Topic>, StoreError>;

    /// All question types, ordered by id.
    async fn question_types(&self) -> Result<Vec<QuestionType>, StoreError>;
}

/// Turns a stored diagram key into a URL a client can fetch.
#[async_trait]
pub trait BlobResolver: Send + Sync {
    /// Returns `Ok(None)` when the key does not exist.
    async fn resolve_url(&self, key: &str) -> Result<Option<String>, StoreError>;
}

// ---------------------------------------------------------------------------
// Grader
// ---------------------------------------------------------------------------

/// A chat-completion backend that grades answers.
#[async_trait]
pub trait Grader: Send + Sync {
    /// Human-readable backend name (e.g. "deepseek").
    fn name(&self) -> &str;

    /// Send a single-turn completion and return the first choice's text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, EvaluationError>;
}

/// A single-turn chat completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Fixed instruction sent as the system message.
    pub system_prompt: String,
    /// The user message.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}
