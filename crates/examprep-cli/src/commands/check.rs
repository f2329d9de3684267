//! The `examprep check` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examprep_core::model::{OptionLetter, RecordId};

pub async fn execute(
    topic: RecordId,
    question_type: String,
    question_id: RecordId,
    option: OptionLetter,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = examprep_providers::load_config_from(config_path.as_deref())?;
    let retrieval = config.create_retrieval(config.create_store()?);

    let type_ref = retrieval.resolve_question_type_id(&question_type).await?;
    let questions = retrieval
        .get_questions_by_topic_and_type(Some(&topic), &type_ref.id, &question_type)
        .await?;

    let question = questions
        .iter()
        .find(|q| q.id == question_id)
        .with_context(|| format!("question {question_id} not found in topic {topic}"))?;
    let body = question
        .as_mcq()
        .with_context(|| format!("question {question_id} is not a multiple-choice question"))?;

    println!("{}", question.text);
    println!("Your answer: {option}. {}", body.option_text(option));
    if body.is_correct(option) {
        println!("Correct!");
    } else {
        match body.correct_letter() {
            Some(letter) => println!(
                "Incorrect. The correct answer is {letter}. {}",
                body.option_text(letter)
            ),
            None => println!("Incorrect. The correct answer is {}", body.correct_answer.trim()),
        }
    }
    Ok(())
}
