//! Grading free-text answers to structural questions.
//!
//! The grader is asked to open its reply with "You've earned X out of N
//! marks." and to write plain paragraphs. [`parse_feedback`] turns that reply
//! into an [`EvaluationResult`]: the score from the first "earned N out of",
//! the first paragraph as the explanation, the rest as suggestions.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::instrument;

use crate::error::EvaluationError;
use crate::model::{EvaluationResult, Question};
use crate::traits::{CompletionRequest, Grader};

/// System message sent with every grading request.
pub const SYSTEM_INSTRUCTION: &str = "You are a CGCE examiner providing direct feedback. Never use asterisks or stars in your responses. Format text normally without any special characters or markdown.";

/// Grading sampling temperature.
pub const GRADING_TEMPERATURE: f64 = 0.5;

/// Upper bound on reply length.
pub const GRADING_MAX_TOKENS: u32 = 800;

static SCORE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"earned ([0-9]+) out of").expect("static regex"));

const EXAMPLE_REPLY: &str = "\"You've earned 3 out of 5 marks. Your explanation of photosynthesis was good, but you didn't mention the role of chlorophyll. Here's the complete answer: Light energy is captured by chlorophyll in chloroplasts and used to convert carbon dioxide and water into glucose, releasing oxygen as a byproduct.

(a) Culture vs. culture medium: A culture refers to the growth of microorganisms, while a culture medium is the nutrient solution used to support their growth. Batch vs. continuous culture: Batch culture is a closed system where nutrients are added at the start and no further additions are made, while continuous culture involves continuously adding fresh medium and removing used medium to maintain a steady state.

(b) Exploiting microbes: For antibiotics, Penicillium produces penicillin through fermentation, including strain selection, fermentation conditions, and downstream processing. For beer production, yeast ferments sugars to produce alcohol and flavor compounds under controlled conditions.\"";

/// Build the user message for one grading request.
pub fn build_grading_prompt(
    question: &str,
    model_answer: &str,
    user_answer: &str,
    mark_allocation: u32,
) -> String {
    format!(
        "As a CGCE examiner, evaluate this answer in a direct way:

Question: {question}
Model Answer: {model_answer}
Student's Answer: {user_answer}
Maximum Marks: {mark_allocation}

Important: Do not use any asterisks (*) or stars in your response.

Provide feedback in this format:
1. Start with the score: \"You've earned X out of {mark_allocation} marks.\"
2. Give a direct explanation of what was good and what was missing
3. Explain the correct answer naturally as part of the feedback
4. Keep the answer length proportional to the marks

Example:
{EXAMPLE_REPLY}"
    )
}

/// Parse a grader reply. Never fails: an unrecognised score is `0`, a score
/// too large for `u32` saturates.
pub fn parse_feedback(reply: &str) -> EvaluationResult {
    let score = SCORE_PATTERN
        .captures(reply)
        .and_then(|caps| caps.get(1))
        // The capture is ASCII digits only, so parsing fails only on overflow.
        .map(|m| m.as_str().parse::<u32>().unwrap_or(u32::MAX))
        .unwrap_or(0);

    let mut paragraphs = reply.split("\n\n");
    let explanation = paragraphs.next().unwrap_or_default().trim().to_string();
    let suggestions = paragraphs.collect::<Vec<_>>().join("\n\n").trim().to_string();

    EvaluationResult {
        score,
        explanation,
        suggestions,
    }
}

/// Grades answers through a [`Grader`]. Failures are returned, never retried.
pub struct AnswerEvaluator {
    grader: Arc<dyn Grader>,
    temperature: f64,
    max_tokens: u32,
}

impl AnswerEvaluator {
    pub fn new(grader: Arc<dyn Grader>) -> Self {
        Self {
            grader,
            temperature: GRADING_TEMPERATURE,
            max_tokens: GRADING_MAX_TOKENS,
        }
    }

    /// Override sampling settings.
    pub fn with_sampling(mut self, temperature: f64, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Grade `user_answer` against `model_answer` out of `mark_allocation`.
    #[instrument(skip_all, fields(grader = self.grader.name(), marks = mark_allocation))]
    pub async fn evaluate_answer(
        &self,
        question: &str,
        model_answer: &str,
        user_answer: &str,
        mark_allocation: u32,
    ) -> Result<EvaluationResult, EvaluationError> {
        let mut missing = Vec::new();
        if question.trim().is_empty() {
            missing.push("question");
        }
        if model_answer.trim().is_empty() {
            missing.push("model answer");
        }
        if user_answer.trim().is_empty() {
            missing.push("user answer");
        }
        if mark_allocation == 0 {
            missing.push("mark allocation");
        }
        if !missing.is_empty() {
            return Err(EvaluationError::Validation(missing.join(", ")));
        }

        let request = CompletionRequest {
            system_prompt: SYSTEM_INSTRUCTION.to_string(),
            prompt: build_grading_prompt(question, model_answer, user_answer, mark_allocation),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        tracing::debug!("sending grading prompt ({} chars)", request.prompt.len());

        let reply = self.grader.complete(&request).await?;
        let result = parse_feedback(&reply);
        tracing::info!("graded {}/{mark_allocation}", result.score);
        Ok(result)
    }

    /// Grade an answer to a structural question using its own model answer
    /// and mark allocation.
    pub async fn evaluate_structural(
        &self,
        question: &Question,
        user_answer: &str,
    ) -> Result<EvaluationResult, EvaluationError> {
        let body = question.as_structural().ok_or_else(|| {
            EvaluationError::Validation(format!(
                "question {} is not a structural question",
                question.id
            ))
        })?;
        self.evaluate_answer(
            &question.text,
            &body.model_answer,
            user_answer,
            body.mark_allocation,
        )
        .await
    }
}
