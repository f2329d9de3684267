//! The `examprep evaluate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examprep_core::model::{EvaluationResult, QuestionKind, RecordId};

/// What to grade the answer against.
pub enum Target {
    /// A stored structural question. With a topic the topic's questions are
    /// fetched (with retries); without, the question is looked up directly.
    Stored {
        topic: Option<RecordId>,
        id: RecordId,
    },
    Inline {
        question: String,
        model_answer: String,
        marks: u32,
    },
}

pub async fn execute(
    target: Target,
    answer: String,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        matches!(format.as_str(), "text" | "json"),
        "unknown format: {format} (expected text or json)"
    );
    let config = examprep_providers::load_config_from(config_path.as_deref())?;
    let evaluator = config.create_evaluator()?;

    let result = match target {
        Target::Inline {
            question,
            model_answer,
            marks,
        } => {
            evaluator
                .evaluate_answer(&question, &model_answer, &answer, marks)
                .await?
        }
        Target::Stored { topic, id } => {
            let retrieval = config.create_retrieval(config.create_store()?);
            let question = match topic {
                Some(topic) => {
                    let type_ref = retrieval.resolve_question_type_id("Structural").await?;
                    retrieval
                        .get_questions_by_topic_and_type(Some(&topic), &type_ref.id, "Structural")
                        .await?
                        .into_iter()
                        .find(|q| q.id == id)
                        .with_context(|| format!("question {id} not found in topic {topic}"))?
                }
                None => {
                    retrieval
                        .get_question_by_id(QuestionKind::Structural, &id)
                        .await?
                }
            };
            evaluator.evaluate_structural(&question, &answer).await?
        }
    };

    print_result(&result, &format)
}

fn print_result(result: &EvaluationResult, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("Score: {}", result.score);
    println!();
    println!("{}", result.explanation);
    if !result.suggestions.is_empty() {
        println!();
        println!("{}", result.suggestions);
    }
    Ok(())
}
