//! Configuration loading and service construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examprep_core::evaluation::{GRADING_MAX_TOKENS, GRADING_TEMPERATURE};
use examprep_core::model::RecordId;
use examprep_core::retrieval::DEFAULT_STRUCTURAL_TYPE_ID;
use examprep_core::retry::RetryPolicy;
use examprep_core::traits::Grader;
use examprep_core::{AnswerEvaluator, QuestionRetrieval, RetrievalConfig};

use crate::deepseek::{DeepSeekGrader, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::supabase::{BlobUrlMode, SupabaseStore, DEFAULT_BUCKET, DEFAULT_SIGNED_URL_TTL_SECS};

/// Supabase project settings.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://<ref>.supabase.co`.
    pub url: String,
    /// Anon or service key.
    #[serde(default)]
    pub api_key: String,
    /// Storage bucket holding question diagrams.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// `public` or `signed` diagram URLs.
    #[serde(default)]
    pub blob_urls: BlobUrlKind,
    /// Lifetime of signed URLs in seconds.
    #[serde(default = "default_signed_ttl")]
    pub signed_url_ttl_secs: u64,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("api_key", &"***")
            .field("bucket", &self.bucket)
            .field("blob_urls", &self.blob_urls)
            .field("signed_url_ttl_secs", &self.signed_url_ttl_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobUrlKind {
    Public,
    #[default]
    Signed,
}

impl StoreConfig {
    fn blob_url_mode(&self) -> BlobUrlMode {
        match self.blob_urls {
            BlobUrlKind::Public => BlobUrlMode::Public,
            BlobUrlKind::Signed => BlobUrlMode::Signed {
                ttl_secs: self.signed_url_ttl_secs,
            },
        }
    }
}

/// Grading endpoint settings.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct GraderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_grader_url")]
    pub base_url: String,
    #[serde(default = "default_grader_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GraderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraderConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_grader_url(),
            model: default_grader_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Backoff for question fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// After failed attempt `n` the fetch waits `base_delay_secs * 2^n` seconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay(),
        }
    }
}

/// Top-level examprep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamprepConfig {
    #[serde(default)]
    pub store: Option<StoreConfig>,
    #[serde(default)]
    pub grader: GraderConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Question-type id used when no "structural" type row exists.
    #[serde(default = "default_structural_type_id")]
    pub structural_type_id: RecordId,
}

impl Default for ExamprepConfig {
    fn default() -> Self {
        Self {
            store: None,
            grader: GraderConfig::default(),
            retry: RetryConfig::default(),
            structural_type_id: default_structural_type_id(),
        }
    }
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}
fn default_signed_ttl() -> u64 {
    DEFAULT_SIGNED_URL_TTL_SECS
}
fn default_grader_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_grader_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_temperature() -> f64 {
    GRADING_TEMPERATURE
}
fn default_max_tokens() -> u32 {
    GRADING_MAX_TOKENS
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay() -> u64 {
    1
}
fn default_structural_type_id() -> RecordId {
    RecordId::Int(DEFAULT_STRUCTURAL_TYPE_ID)
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load config from an explicit path, or search the well-known paths.
///
/// Search order:
/// 1. `examprep.toml` in the current directory
/// 2. `~/.config/examprep/config.toml`
///
/// Environment variable overrides: `EXAMPREP_SUPABASE_KEY`, `EXAMPREP_DEEPSEEK_KEY`.
///
/// An explicit `path` that does not exist is an error.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamprepConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examprep.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamprepConfig::default(),
    };

    if let Ok(key) = std::env::var("EXAMPREP_SUPABASE_KEY") {
        if let Some(store) = config.store.as_mut() {
            store.api_key = key;
        }
    }
    if let Ok(key) = std::env::var("EXAMPREP_DEEPSEEK_KEY") {
        config.grader.api_key = key;
    }

    tracing::debug!("loaded config: {config:?}");
    Ok(config)
}

/// Parse TOML and expand `${VAR}` references in URLs and keys.
pub fn parse_config(content: &str) -> Result<ExamprepConfig> {
    let mut config: ExamprepConfig = toml::from_str(content)?;
    if let Some(store) = config.store.as_mut() {
        store.url = resolve_env_vars(&store.url);
        store.api_key = resolve_env_vars(&store.api_key);
    }
    config.grader.api_key = resolve_env_vars(&config.grader.api_key);
    config.grader.base_url = resolve_env_vars(&config.grader.base_url);
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examprep"))
}

impl ExamprepConfig {
    fn store_config(&self) -> Result<&StoreConfig> {
        self.store
            .as_ref()
            .context("no [store] section configured. Run `examprep init` to create a config file.")
    }

    pub fn retrieval_config(&self) -> RetrievalConfig {
        RetrievalConfig {
            retry: RetryPolicy {
                max_attempts: self.retry.max_attempts,
                base: Duration::from_secs(self.retry.base_delay_secs),
            },
            structural_type_id: self.structural_type_id.clone(),
        }
    }

    /// The Supabase store, shared between retrieval and catalog.
    pub fn create_store(&self) -> Result<Arc<SupabaseStore>> {
        let store = self.store_config()?;
        Ok(Arc::new(SupabaseStore::new(
            &store.url,
            &store.api_key,
            Some(store.bucket.clone()),
            store.blob_url_mode(),
        )?))
    }

    pub fn create_retrieval(&self, store: Arc<SupabaseStore>) -> QuestionRetrieval {
        QuestionRetrieval::new(store.clone(), store, self.retrieval_config())
    }

    pub fn create_evaluator(&self) -> Result<AnswerEvaluator> {
        anyhow::ensure!(
            !self.grader.api_key.is_empty(),
            "no grader API key configured (set [grader].api_key or EXAMPREP_DEEPSEEK_KEY)"
        );
        let grader = DeepSeekGrader::new(
            &self.grader.api_key,
            Some(self.grader.base_url.clone()),
            Some(self.grader.model.clone()),
            Some(self.grader.timeout_secs),
        )?;
        tracing::debug!("grading with {} model {}", grader.name(), grader.model());
        Ok(AnswerEvaluator::new(Arc::new(grader))
            .with_sampling(self.grader.temperature, self.grader.max_tokens))
    }
}
