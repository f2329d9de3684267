//! Browsing the level -> subject -> topic hierarchy.

use std::sync::Arc;

use tracing::instrument;

use crate::error::RetrievalError;
use crate::model::{Level, QuestionType, RecordId, Subject, Topic};
use crate::traits::ContentStore;

/// Read-only views over the content hierarchy. Empty lists are valid results.
pub struct Catalog {
    store: Arc<dyn ContentStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn levels(&self) -> Result<Vec<Level>, RetrievalError> {
        let levels = self.store.levels().await?;
        tracing::debug!("{} levels", levels.len());
        Ok(levels)
    }

    #[instrument(skip(self))]
    pub async fn subjects_by_level(
        &self,
        level_id: &RecordId,
    ) -> Result<Vec<Subject>, RetrievalError> {
        let subjects = self.store.subjects(level_id).await?;
        tracing::debug!("{} subjects for level {level_id}", subjects.len());
        Ok(subjects)
    }

    #[instrument(skip(self))]
    pub async fn topics_by_subject(
        &self,
        subject_id: &RecordId,
    ) -> Result<Vec<Topic>, RetrievalError> {
        let topics = self.store.topics(subject_id).await?;
        tracing::debug!("{} topics for subject {subject_id}", topics.len());
        Ok(topics)
    }

    pub async fn question_types(&self) -> Result<Vec<QuestionType>, RetrievalError> {
        Ok(self.store.question_types().await?)
    }
}
