//! Supabase content store: PostgREST for rows, Storage for diagrams.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use examprep_core::error::StoreError;
use examprep_core::model::{Level, QuestionKind, QuestionType, RecordId, Subject, Topic};
use examprep_core::rows::{McqRow, QuestionRow, StructuralRow};
use examprep_core::traits::{BlobResolver, ContentStore};

pub const DEFAULT_BUCKET: &str = "question-images";
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How diagram keys become URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobUrlMode {
    /// Public bucket URL, built locally.
    Public,
    /// Time-limited signed URL, requested from the Storage API.
    Signed { ttl_secs: u64 },
}

/// Content store over a Supabase project's REST and Storage APIs.
pub struct SupabaseStore {
    base_url: Url,
    api_key: String,
    bucket: String,
    blob_urls: BlobUrlMode,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(
        base_url: &str,
        api_key: &str,
        bucket: Option<String>,
        blob_urls: BlobUrlMode,
    ) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid Supabase URL: {base_url}"))?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "invalid Supabase URL: {base_url}"
        );
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            bucket: bucket.unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            blob_urls,
            client,
        })
    }

    /// `base_url` with `segments` appended, each percent-encoded.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn table_url(&self, table: &str, params: &[(&str, String)]) -> Url {
        let mut url = self.endpoint(["rest", "v1", table]);
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        url
    }

    fn object_segments<'a>(&'a self, action: &'a str, key: &'a str) -> Vec<&'a str> {
        let mut segments = vec!["storage", "v1", "object", action, self.bucket.as_str()];
        segments.extend(key.split('/').filter(|s| !s.is_empty()));
        segments
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let url = self.table_url(table, params);
        tracing::debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, message });
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode(format!("{table}: {e}")))
    }

    async fn select_rows(
        &self,
        kind: QuestionKind,
        params: &[(&str, String)],
    ) -> Result<Vec<QuestionRow>, StoreError> {
        let rows = match kind {
            QuestionKind::Structural => self
                .select::<StructuralRow>(kind.table(), params)
                .await?
                .into_iter()
                .map(QuestionRow::Structural)
                .collect(),
            QuestionKind::Mcq => self
                .select::<McqRow>(kind.table(), params)
                .await?
                .into_iter()
                .map(QuestionRow::Mcq)
                .collect(),
        };
        Ok(rows)
    }

    async fn signed_url(&self, key: &str, ttl_secs: u64) -> Result<Option<String>, StoreError> {
        let url = self.endpoint(self.object_segments("sign", key));

        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&SignRequest {
                expires_in: ttl_secs,
            })
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            if is_missing_object(status, &message) {
                return Ok(None);
            }
            return Err(StoreError::Status { status, message });
        }

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("signed url: {e}")))?;

        let storage_root = self.endpoint(["storage", "v1"]);
        Ok(Some(format!(
            "{}{}",
            storage_root.as_str().trim_end_matches('/'),
            signed.signed_url
        )))
    }
}

#[derive(Serialize)]
struct SignRequest {
    #[serde(rename = "expiresIn")]
    expires_in: u64,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// Storage answers a missing key with 400 "Object not found" (older
/// releases) or 404. A missing bucket, bad key or bad JWT is a real error.
fn is_missing_object(status: u16, body: &str) -> bool {
    let body = body.to_ascii_lowercase();
    if body.contains("bucket") {
        return false;
    }
    match status {
        404 => true,
        400 => body.contains("object not found") || body.contains("not_found"),
        _ => false,
    }
}

fn eq_filter(value: &RecordId) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl ContentStore for SupabaseStore {
    #[instrument(skip(self))]
    async fn find_question_type(
        &self,
        pattern: &str,
    ) -> Result<Option<QuestionType>, StoreError> {
        let rows = self
            .select::<QuestionType>(
                "question_types",
                &[
                    ("select", "id,type_name".to_string()),
                    ("type_name", format!("ilike.*{pattern}*")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn questions(
        &self,
        kind: QuestionKind,
        topic_id: &RecordId,
        question_type_id: &RecordId,
    ) -> Result<Vec<QuestionRow>, StoreError> {
        self.select_rows(
            kind,
            &[
                ("select", "*".to_string()),
                ("topic_id", eq_filter(topic_id)),
                ("question_type_id", eq_filter(question_type_id)),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn question_by_id(
        &self,
        kind: QuestionKind,
        id: &RecordId,
    ) -> Result<Option<QuestionRow>, StoreError> {
        let rows = self
            .select_rows(
                kind,
                &[
                    ("select", "*".to_string()),
                    ("id", eq_filter(id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn levels(&self) -> Result<Vec<Level>, StoreError> {
        self.select(
            "levels",
            &[
                ("select", "*".to_string()),
                ("order", "id.asc".to_string()),
            ],
        )
        .await
    }

    async fn subjects(&self, level_id: &RecordId) -> Result<Vec<Subject>, StoreError> {
        self.select(
            "subjects",
            &[
                ("select", "id,subject_name,level_id".to_string()),
                ("level_id", eq_filter(level_id)),
                ("order", "subject_name.asc".to_string()),
            ],
        )
        .await
    }

    async fn topics(&self, subject_id: &RecordId) -> Result<Vec<Topic>, StoreError> {
        self.select(
            "topics",
            &[
                ("select", "*".to_string()),
                ("subject_id", eq_filter(subject_id)),
                ("order", "topic_name.asc".to_string()),
            ],
        )
        .await
    }

    async fn question_types(&self) -> Result<Vec<QuestionType>, StoreError> {
        self.select(
            "question_types",
            &[
                ("select", "*".to_string()),
                ("order", "id.asc".to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl BlobResolver for SupabaseStore {
    async fn resolve_url(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.blob_urls {
            BlobUrlMode::Public => Ok(Some(
                self.endpoint(self.object_segments("public", key)).to_string(),
            )),
            BlobUrlMode::Signed { ttl_secs } => self.signed_url(key, ttl_secs).await,
        }
    }
}
