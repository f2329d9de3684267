//! Core data model types for examprep.
//!
//! Questions come out of the content store in two table shapes; by the time
//! they reach this module they have been normalized into one [`Question`]
//! header with a tagged [`QuestionBody`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mark allocation used when a structural row has none, or an unusable one.
pub const DEFAULT_MARK_ALLOCATION: u32 = 20;

/// Opaque identifier assigned by the content store.
///
/// Rows may carry integer or text keys depending on the table, so both are
/// accepted and rendered verbatim into query filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{id}"),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        id.parse::<i64>()
            .map(RecordId::Int)
            .unwrap_or_else(|_| RecordId::Text(id.to_string()))
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RecordId::from(s))
    }
}

/// The two question families, stored in different tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Mcq,
    Structural,
}

impl QuestionKind {
    /// Classify a free-form question-type label. Only "structural" (any case)
    /// selects the structural table; everything else is treated as MCQ.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("structural") {
            QuestionKind::Structural
        } else {
            QuestionKind::Mcq
        }
    }

    /// Content-store table holding this kind of question.
    pub fn table(&self) -> &'static str {
        match self {
            QuestionKind::Mcq => "mcq_questions",
            QuestionKind::Structural => "structural_questions",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Mcq => write!(f, "mcq"),
            QuestionKind::Structural => write!(f, "structural"),
        }
    }
}

/// One of the four MCQ option slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 4] = [
        OptionLetter::A,
        OptionLetter::B,
        OptionLetter::C,
        OptionLetter::D,
    ];

    fn index(self) -> usize {
        match self {
            OptionLetter::A => 0,
            OptionLetter::B => 1,
            OptionLetter::C => 2,
            OptionLetter::D => 3,
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            OptionLetter::A => "A",
            OptionLetter::B => "B",
            OptionLetter::C => "C",
            OptionLetter::D => "D",
        };
        f.write_str(letter)
    }
}

impl FromStr for OptionLetter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(OptionLetter::A),
            "B" => Ok(OptionLetter::B),
            "C" => Ok(OptionLetter::C),
            "D" => Ok(OptionLetter::D),
            other => Err(format!("unknown option letter: {other}")),
        }
    }
}

/// A question ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: RecordId,
    pub topic_id: RecordId,
    pub question_type_id: RecordId,
    /// Prompt shown to the learner.
    pub text: String,
    /// Displayable diagram URL, resolved at fetch time. Never stored.
    #[serde(default)]
    pub image_url: Option<String>,
    pub body: QuestionBody,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        match self.body {
            QuestionBody::Mcq(_) => QuestionKind::Mcq,
            QuestionBody::Structural(_) => QuestionKind::Structural,
        }
    }

    pub fn as_structural(&self) -> Option<&StructuralBody> {
        match &self.body {
            QuestionBody::Structural(body) => Some(body),
            QuestionBody::Mcq(_) => None,
        }
    }

    pub fn as_mcq(&self) -> Option<&McqBody> {
        match &self.body {
            QuestionBody::Mcq(body) => Some(body),
            QuestionBody::Structural(_) => None,
        }
    }
}

/// Kind-specific question content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QuestionBody {
    Mcq(McqBody),
    Structural(StructuralBody),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqBody {
    /// Option texts in A, B, C, D order.
    pub options: [String; 4],
    /// Either a letter `A`-`D` or the literal text of the correct option.
    pub correct_answer: String,
}

impl McqBody {
    pub fn option_text(&self, letter: OptionLetter) -> &str {
        &self.options[letter.index()]
    }

    /// Whether choosing `letter` answers the question correctly.
    ///
    /// A single-letter `correct_answer` is compared by letter; anything else
    /// is compared against the chosen option's text, both sides trimmed. A
    /// blank `correct_answer` marks no option correct.
    pub fn is_correct(&self, letter: OptionLetter) -> bool {
        let expected = self.correct_answer.trim();
        if expected.is_empty() {
            return false;
        }
        if let Some(correct_letter) = single_letter(expected) {
            return correct_letter == letter;
        }
        self.option_text(letter).trim() == expected
    }

    /// The letter whose option is correct, if one matches.
    pub fn correct_letter(&self) -> Option<OptionLetter> {
        OptionLetter::ALL
            .into_iter()
            .find(|letter| self.is_correct(*letter))
    }
}

/// Exactly one uppercase `A`-`D`. Lowercase letters are option text, not keys.
fn single_letter(s: &str) -> Option<OptionLetter> {
    match s {
        "A" => Some(OptionLetter::A),
        "B" => Some(OptionLetter::B),
        "C" => Some(OptionLetter::C),
        "D" => Some(OptionLetter::D),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralBody {
    pub model_answer: String,
    pub mark_allocation: u32,
    #[serde(default)]
    pub explanation: Option<String>,
    /// Blob-store key of the attached diagram.
    #[serde(default)]
    pub diagram: Option<String>,
}

/// Identifier of a question-type row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTypeRef {
    pub id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionType {
    pub id: RecordId,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: RecordId,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: RecordId,
    pub subject_name: String,
    pub level_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: RecordId,
    pub topic_name: String,
    pub subject_id: RecordId,
}

/// Outcome of grading one free-text submission. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub score: u32,
    pub explanation: String,
    pub suggestions: String,
}
