//! examprep-providers: content-store and grader integrations.
//!
//! Implements the `ContentStore` and `BlobResolver` traits for Supabase and
//! the `Grader` trait for DeepSeek, plus configuration loading and in-memory
//! mocks.

pub mod config;
pub mod deepseek;
pub mod mock;
pub mod supabase;

pub use config::{load_config_from, ExamprepConfig};
pub use deepseek::DeepSeekGrader;
pub use supabase::{BlobUrlMode, SupabaseStore};
