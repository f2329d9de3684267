//! Question retrieval: type lookup, fetch with retry, diagram resolution.

use std::sync::Arc;

use futures::future::join_all;
use tracing::instrument;

use crate::error::RetrievalError;
use crate::model::{Question, QuestionKind, QuestionTypeRef, RecordId};
use crate::retry::{with_retry, RetryPolicy};
use crate::rows::QuestionRow;
use crate::traits::{BlobResolver, ContentStore};

/// Question-type id assumed for structural questions when the store has no
/// row whose name contains "structural".
pub const DEFAULT_STRUCTURAL_TYPE_ID: i64 = 1;

/// Configuration for [`QuestionRetrieval`].
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Backoff applied to the question fetch.
    pub retry: RetryPolicy,
    /// Id returned for "structural" when no type row matches.
    pub structural_type_id: RecordId,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            structural_type_id: RecordId::Int(DEFAULT_STRUCTURAL_TYPE_ID),
        }
    }
}

/// Fetches questions and turns them into presentation-ready [`Question`]s.
pub struct QuestionRetrieval {
    store: Arc<dyn ContentStore>,
    blobs: Arc<dyn BlobResolver>,
    config: RetrievalConfig,
}

impl QuestionRetrieval {
    pub fn new(
        store: Arc<dyn ContentStore>,
        blobs: Arc<dyn BlobResolver>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            blobs,
            config,
        }
    }

    /// Resolve a question-type name (substring, any case) to its id.
    #[instrument(skip(self))]
    pub async fn resolve_question_type_id(
        &self,
        type_name: &str,
    ) -> Result<QuestionTypeRef, RetrievalError> {
        let type_name = type_name.trim();
        if type_name.is_empty() {
            return Err(RetrievalError::Validation(
                "question type name is required".into(),
            ));
        }

        match self.store.find_question_type(type_name).await? {
            Some(found) => {
                tracing::debug!("question type '{type_name}' -> {}", found.type_name);
                Ok(QuestionTypeRef { id: found.id })
            }
            None if type_name.eq_ignore_ascii_case("structural") => {
                tracing::info!(
                    "no question type row matches 'structural', using id {}",
                    self.config.structural_type_id
                );
                Ok(QuestionTypeRef {
                    id: self.config.structural_type_id.clone(),
                })
            }
            None => Err(RetrievalError::UnknownQuestionType(type_name.to_string())),
        }
    }

    /// Fetch every question for a topic and question type.
    ///
    /// `label` picks the table ("Structural" or anything else for MCQ). The
    /// store query is retried per the configured policy; an empty result is
    /// [`RetrievalError::NotFound`] and is not retried. On success the list
    /// is never empty.
    #[instrument(skip(self))]
    pub async fn get_questions_by_topic_and_type(
        &self,
        topic_id: Option<&RecordId>,
        question_type_id: &RecordId,
        label: &str,
    ) -> Result<Vec<Question>, RetrievalError> {
        let topic_id =
            topic_id.ok_or_else(|| RetrievalError::Validation("topic id is required".into()))?;
        let kind = QuestionKind::from_label(label);

        let rows = with_retry(&self.config.retry, move |attempt| {
            tracing::info!("fetching {kind} questions (attempt {attempt})");
            self.store.questions(kind, topic_id, question_type_id)
        })
        .await
        .map_err(|e| {
            tracing::error!(
                "giving up on {kind} questions after {} attempts: {}",
                e.attempts,
                e.last
            );
            RetrievalError::RetriesExhausted {
                attempts: e.attempts,
                source: e.last,
            }
        })?;

        if rows.is_empty() {
            return Err(RetrievalError::NotFound {
                topic_id: topic_id.clone(),
                question_type_id: question_type_id.clone(),
            });
        }

        let questions = self.attach_images(rows, topic_id, question_type_id).await;
        tracing::info!("fetched {} {kind} questions", questions.len());
        Ok(questions)
    }

    /// Fetch one question by id. Not retried.
    #[instrument(skip(self))]
    pub async fn get_question_by_id(
        &self,
        kind: QuestionKind,
        id: &RecordId,
    ) -> Result<Question, RetrievalError> {
        let row = self
            .store
            .question_by_id(kind, id)
            .await?
            .ok_or_else(|| RetrievalError::QuestionNotFound(id.clone()))?;

        let image_url = match row.diagram_key() {
            Some(key) => self.resolve_image(key).await,
            None => None,
        };
        let (topic_id, type_id) = row_ids(&row);
        Ok(row.normalize(&topic_id, &type_id, image_url))
    }

    /// Resolve every row's diagram concurrently and normalize.
    async fn attach_images(
        &self,
        rows: Vec<QuestionRow>,
        topic_id: &RecordId,
        question_type_id: &RecordId,
    ) -> Vec<Question> {
        let urls = join_all(rows.iter().map(|row| async move {
            match row.diagram_key() {
                Some(key) => self.resolve_image(key).await,
                None => None,
            }
        }))
        .await;

        rows.into_iter()
            .zip(urls)
            .map(|(row, url)| row.normalize(topic_id, question_type_id, url))
            .collect()
    }

    /// Per-item resolution. Failures are logged and become `None`.
    async fn resolve_image(&self, key: &str) -> Option<String> {
        match self.blobs.resolve_url(key).await {
            Ok(Some(url)) => Some(url),
            Ok(None) => {
                tracing::warn!("diagram '{key}' does not exist in the blob store");
                None
            }
            Err(e) => {
                tracing::warn!("failed to resolve diagram '{key}': {e}");
                None
            }
        }
    }
}

/// Topic and type ids carried by the row itself, for lookups by primary key.
fn row_ids(row: &QuestionRow) -> (RecordId, RecordId) {
    let (topic, kind) = match row {
        QuestionRow::Structural(r) => (&r.topic_id, &r.question_type_id),
        QuestionRow::Mcq(r) => (&r.topic_id, &r.question_type_id),
    };
    let unknown = || RecordId::Text(String::new());
    (
        topic.clone().unwrap_or_else(unknown),
        kind.clone().unwrap_or_else(unknown),
    )
}
