//! examprep-core: Question retrieval, answer evaluation, and the data model.
//!
//! This crate defines the question model, the content-store and grader
//! traits, and the retrieval and grading services the rest of examprep
//! builds on.

pub mod catalog;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod retrieval;
pub mod retry;
pub mod rows;
pub mod traits;

pub use error::{EvaluationError, RetrievalError, StoreError};
pub use evaluation::{parse_feedback, AnswerEvaluator};
pub use retrieval::{QuestionRetrieval, RetrievalConfig};
