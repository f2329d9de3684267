//! Raw content-store row shapes and their normalization.
//!
//! The structural and MCQ tables drifted apart over time: the prompt lives in
//! `question` or `question_text`, the model answer in `model_answer` or
//! `solution`, the diagram key in `diagram` or `image_path`. Everything is
//! folded into [`Question`] here so nothing downstream sees the fallbacks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{
    McqBody, Question, QuestionBody, RecordId, StructuralBody, DEFAULT_MARK_ALLOCATION,
};

/// A row of the `structural_questions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralRow {
    pub id: RecordId,
    #[serde(default)]
    pub topic_id: Option<RecordId>,
    #[serde(default)]
    pub question_type_id: Option<RecordId>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub question_text: Option<String>,
    #[serde(default)]
    pub model_answer: Option<String>,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    /// Stored as a number or a numeric string depending on who inserted it.
    #[serde(default)]
    pub mark_allocation: Option<Value>,
    #[serde(default)]
    pub diagram: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
}

/// A row of the `mcq_questions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McqRow {
    pub id: RecordId,
    #[serde(default)]
    pub topic_id: Option<RecordId>,
    #[serde(default)]
    pub question_type_id: Option<RecordId>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub question_text: Option<String>,
    #[serde(default)]
    pub option_a: Option<String>,
    #[serde(default)]
    pub option_b: Option<String>,
    #[serde(default)]
    pub option_c: Option<String>,
    #[serde(default)]
    pub option_d: Option<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub diagram: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
}

/// A question row from either table.
#[derive(Debug, Clone)]
pub enum QuestionRow {
    Structural(StructuralRow),
    Mcq(McqRow),
}

impl QuestionRow {
    /// Blob key of the attached diagram, if the row has a non-empty one.
    pub fn diagram_key(&self) -> Option<&str> {
        let (diagram, image_path) = match self {
            QuestionRow::Structural(row) => (&row.diagram, &row.image_path),
            QuestionRow::Mcq(row) => (&row.diagram, &row.image_path),
        };
        non_empty(diagram).or_else(|| non_empty(image_path))
    }

    /// Fold the row into the canonical shape.
    ///
    /// `topic_id` and `question_type_id` fill in columns the row omitted
    /// (a narrowed `select` may leave them out).
    pub fn normalize(
        self,
        topic_id: &RecordId,
        question_type_id: &RecordId,
        image_url: Option<String>,
    ) -> Question {
        match self {
            QuestionRow::Structural(row) => {
                let diagram = non_empty(&row.diagram)
                    .or_else(|| non_empty(&row.image_path))
                    .map(str::to_string);
                let model_answer = non_empty(&row.model_answer)
                    .or_else(|| non_empty(&row.solution))
                    .unwrap_or_default()
                    .to_string();
                let explanation = non_empty(&row.explanation)
                    .or_else(|| non_empty(&row.solution))
                    .map(str::to_string);
                Question {
                    id: row.id,
                    topic_id: row.topic_id.unwrap_or_else(|| topic_id.clone()),
                    question_type_id: row
                        .question_type_id
                        .unwrap_or_else(|| question_type_id.clone()),
                    text: question_text(&row.question, &row.question_text),
                    image_url,
                    body: QuestionBody::Structural(StructuralBody {
                        model_answer,
                        mark_allocation: mark_allocation(row.mark_allocation.as_ref()),
                        explanation,
                        diagram,
                    }),
                }
            }
            QuestionRow::Mcq(row) => Question {
                id: row.id,
                topic_id: row.topic_id.unwrap_or_else(|| topic_id.clone()),
                question_type_id: row
                    .question_type_id
                    .unwrap_or_else(|| question_type_id.clone()),
                text: question_text(&row.question, &row.question_text),
                image_url,
                body: QuestionBody::Mcq(McqBody {
                    options: [
                        row.option_a.unwrap_or_default(),
                        row.option_b.unwrap_or_default(),
                        row.option_c.unwrap_or_default(),
                        row.option_d.unwrap_or_default(),
                    ],
                    correct_answer: row.correct_answer.unwrap_or_default(),
                }),
            },
        }
    }
}

fn question_text(question: &Option<String>, question_text: &Option<String>) -> String {
    non_empty(question)
        .or_else(|| non_empty(question_text))
        .unwrap_or_default()
        .to_string()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Read a stored mark allocation, falling back to [`DEFAULT_MARK_ALLOCATION`].
///
/// Numbers are truncated; strings contribute their leading digits.
pub fn mark_allocation(value: Option<&Value>) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 1.0).map(|f| f.trunc() as u64)),
        Some(Value::String(s)) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u64>().ok()
        }
        _ => None,
    };
    parsed
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MARK_ALLOCATION)
}
