//! In-memory store and grader for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use examprep_core::error::{EvaluationError, StoreError};
use examprep_core::model::{Level, QuestionKind, QuestionType, RecordId, Subject, Topic};
use examprep_core::rows::{McqRow, QuestionRow, StructuralRow};
use examprep_core::traits::{BlobResolver, CompletionRequest, ContentStore, Grader};

/// A mock content store for exercising retrieval without a network.
///
/// Question fetches can be made to fail a fixed number of times before
/// succeeding, and individual blob keys can be marked missing or broken.
#[derive(Default)]
pub struct MockStore {
    question_types: Vec<QuestionType>,
    structural: Vec<StructuralRow>,
    mcq: Vec<McqRow>,
    levels: Vec<Level>,
    subjects: Vec<Subject>,
    topics: Vec<Topic>,
    /// Blob key → URL.
    blobs: HashMap<String, String>,
    /// Keys whose resolution errors instead of returning `None`.
    broken_blobs: HashSet<String>,
    /// Number of upcoming question fetches that fail.
    failures_remaining: AtomicU32,
    /// Number of question fetches made.
    fetch_count: AtomicU32,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_question_type(mut self, id: i64, type_name: &str) -> Self {
        self.question_types.push(QuestionType {
            id: RecordId::Int(id),
            type_name: type_name.to_string(),
        });
        self
    }

    pub fn with_structural(mut self, row: StructuralRow) -> Self {
        self.structural.push(row);
        self
    }

    pub fn with_mcq(mut self, row: McqRow) -> Self {
        self.mcq.push(row);
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.levels.push(level);
        self
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.topics.push(topic);
        self
    }

    pub fn with_blob(mut self, key: &str, url: &str) -> Self {
        self.blobs.insert(key.to_string(), url.to_string());
        self
    }

    pub fn with_broken_blob(mut self, key: &str) -> Self {
        self.broken_blobs.insert(key.to_string());
        self
    }

    /// Make the next `n` question fetches fail with a network error.
    pub fn failing_first(self, n: u32) -> Self {
        self.failures_remaining.store(n, Ordering::SeqCst);
        self
    }

    /// Number of question fetches made so far.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

fn matches(
    row_topic: &Option<RecordId>,
    row_type: &Option<RecordId>,
    topic_id: &RecordId,
    question_type_id: &RecordId,
) -> bool {
    row_topic.as_ref() == Some(topic_id) && row_type.as_ref() == Some(question_type_id)
}

#[async_trait]
impl ContentStore for MockStore {
    async fn find_question_type(
        &self,
        pattern: &str,
    ) -> Result<Option<QuestionType>, StoreError> {
        let pattern = pattern.to_lowercase();
        Ok(self
            .question_types
            .iter()
            .find(|t| t.type_name.to_lowercase().contains(&pattern))
            .cloned())
    }

    async fn questions(
        &self,
        kind: QuestionKind,
        topic_id: &RecordId,
        question_type_id: &RecordId,
    ) -> Result<Vec<QuestionRow>, StoreError> {
        let attempt = self.fetch_count.fetch_add(1, Ordering::SeqCst) + 1;
        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Network(format!(
                "connection reset (fetch {attempt})"
            )));
        }

        let rows = match kind {
            QuestionKind::Structural => self
                .structural
                .iter()
                .filter(|r| matches(&r.topic_id, &r.question_type_id, topic_id, question_type_id))
                .cloned()
                .map(QuestionRow::Structural)
                .collect(),
            QuestionKind::Mcq => self
                .mcq
                .iter()
                .filter(|r| matches(&r.topic_id, &r.question_type_id, topic_id, question_type_id))
                .cloned()
                .map(QuestionRow::Mcq)
                .collect(),
        };
        Ok(rows)
    }

    async fn question_by_id(
        &self,
        kind: QuestionKind,
        id: &RecordId,
    ) -> Result<Option<QuestionRow>, StoreError> {
        let row = match kind {
            QuestionKind::Structural => self
                .structural
                .iter()
                .find(|r| &r.id == id)
                .cloned()
                .map(QuestionRow::Structural),
            QuestionKind::Mcq => self
                .mcq
                .iter()
                .find(|r| &r.id == id)
                .cloned()
                .map(QuestionRow::Mcq),
        };
        Ok(row)
    }

    async fn levels(&self) -> Result<Vec<Level>, StoreError> {
        Ok(self.levels.clone())
    }

    async fn subjects(&self, level_id: &RecordId) -> Result<Vec<Subject>, StoreError> {
        let mut subjects: Vec<Subject> = self
            .subjects
            .iter()
            .filter(|s| &s.level_id == level_id)
            .cloned()
            .collect();
        subjects.sort_by(|a, b| a.subject_name.cmp(&b.subject_name));
        Ok(subjects)
    }

    async fn topics(&self, subject_id: &RecordId) -> Result<Vec<Topic>, StoreError> {
        let mut topics: Vec<Topic> = self
            .topics
            .iter()
            .filter(|t| &t.subject_id == subject_id)
            .cloned()
            .collect();
        topics.sort_by(|a, b| a.topic_name.cmp(&b.topic_name));
        Ok(topics)
    }

    async fn question_types(&self) -> Result<Vec<QuestionType>, StoreError> {
        Ok(self.question_types.clone())
    }
}

#[async_trait]
impl BlobResolver for MockStore {
    async fn resolve_url(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.broken_blobs.contains(key) {
            return Err(StoreError::Status {
                status: 500,
                message: format!("storage unavailable for {key}"),
            });
        }
        Ok(self.blobs.get(key).cloned())
    }
}

/// A mock grader returning a fixed reply (or error) and recording requests.
pub struct MockGrader {
    reply: Result<String, (u16, String)>,
    call_count: AtomicU32,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockGrader {
    /// Always reply with `reply`.
    pub fn with_fixed_reply(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Always fail with an HTTP error.
    pub fn with_remote_error(status: u16, body: &str) -> Self {
        Self {
            reply: Err((status, body.to_string())),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Get the number of calls made to this grader.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this grader.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Grader for MockGrader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, EvaluationError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err((status, body)) => Err(EvaluationError::Remote {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}
