//! The `examprep questions` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use examprep_core::model::{QuestionBody, RecordId};

use super::truncate;

pub async fn execute(
    topic: RecordId,
    question_type: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = examprep_providers::load_config_from(config_path.as_deref())?;
    let retrieval = config.create_retrieval(config.create_store()?);

    let type_ref = retrieval
        .resolve_question_type_id(&question_type)
        .await
        .with_context(|| format!("failed to resolve question type '{question_type}'"))?;
    let questions = retrieval
        .get_questions_by_topic_and_type(Some(&topic), &type_ref.id, &question_type)
        .await?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Marks / Answer", "Image", "Question"]);
    for question in &questions {
        let detail = match &question.body {
            QuestionBody::Structural(body) => format!("{} marks", body.mark_allocation),
            QuestionBody::Mcq(body) => match body.correct_letter() {
                Some(letter) => letter.to_string(),
                None => body.correct_answer.clone(),
            },
        };
        table.add_row(vec![
            Cell::new(&question.id),
            Cell::new(detail),
            Cell::new(if question.image_url.is_some() { "yes" } else { "" }),
            Cell::new(truncate(&question.text, 80)),
        ]);
    }
    println!("{table}");
    eprintln!("{} question(s)", questions.len());
    Ok(())
}
