//! Core data model types for toefl-sim.
//!
//! Generated practice content (passages, questions, writing tasks, essay
//! feedback) and the options that shape it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of choices every multiple-choice question carries.
pub const CHOICES_PER_QUESTION: usize = 4;

/// Allowed range for the number of reading questions.
pub const MIN_QUESTIONS: usize = 4;
pub const MAX_QUESTIONS: usize = 14;
pub const DEFAULT_QUESTIONS: usize = 10;

/// TOEFL reading question categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    FactualInformation,
    NegativeFactualInformation,
    Inference,
    RhetoricalPurpose,
    Vocabulary,
    Reference,
    SentenceInsertion,
    Summary,
    FillInATable,
    ProseSummary,
}

impl QuestionType {
    pub const ALL: [QuestionType; 10] = [
        QuestionType::FactualInformation,
        QuestionType::NegativeFactualInformation,
        QuestionType::Inference,
        QuestionType::RhetoricalPurpose,
        QuestionType::Vocabulary,
        QuestionType::Reference,
        QuestionType::SentenceInsertion,
        QuestionType::Summary,
        QuestionType::FillInATable,
        QuestionType::ProseSummary,
    ];

    /// The selection a new reading session starts with.
    pub const DEFAULTS: [QuestionType; 5] = [
        QuestionType::FactualInformation,
        QuestionType::Inference,
        QuestionType::Vocabulary,
        QuestionType::RhetoricalPurpose,
        QuestionType::Reference,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::FactualInformation => "Factual Information",
            QuestionType::NegativeFactualInformation => "Negative Factual Information",
            QuestionType::Inference => "Inference",
            QuestionType::RhetoricalPurpose => "Rhetorical Purpose",
            QuestionType::Vocabulary => "Vocabulary",
            QuestionType::Reference => "Reference",
            QuestionType::SentenceInsertion => "Sentence Insertion",
            QuestionType::Summary => "Summary",
            QuestionType::FillInATable => "Fill in a Table",
            QuestionType::ProseSummary => "Prose Summary",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    /// Accepts the display label or a compact form ("negative-factual",
    /// "fill_in_a_table"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        QuestionType::ALL
            .iter()
            .copied()
            .find(|t| {
                let label: String = t
                    .label()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_lowercase();
                label == key || label.strip_suffix("information") == Some(key.as_str())
            })
            .ok_or_else(|| format!("unknown question type: {s}"))
    }
}

/// How a reading session should be generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingOptions {
    pub question_types: Vec<QuestionType>,
    pub question_count: usize,
}

impl Default for ReadingOptions {
    fn default() -> Self {
        Self {
            question_types: QuestionType::DEFAULTS.to_vec(),
            question_count: DEFAULT_QUESTIONS,
        }
    }
}

impl ReadingOptions {
    /// Check the options before any model call is made.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.question_types.is_empty(),
            "select at least one question type"
        );
        anyhow::ensure!(
            (MIN_QUESTIONS..=MAX_QUESTIONS).contains(&self.question_count),
            "question count must be between {MIN_QUESTIONS} and {MAX_QUESTIONS}"
        );
        Ok(())
    }
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question category label as returned by the model.
    #[serde(rename = "type")]
    pub kind: String,
    /// Question text.
    pub question: String,
    /// Exactly [`CHOICES_PER_QUESTION`] options after normalization.
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct: usize,
}

impl Question {
    pub fn correct_option(&self) -> &str {
        self.options
            .get(self.correct)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// The two TOEFL writing task kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritingTaskKind {
    Integrated,
    Independent,
}

impl WritingTaskKind {
    pub fn title(&self) -> &'static str {
        match self {
            WritingTaskKind::Integrated => "Integrated Writing Task",
            WritingTaskKind::Independent => "Independent Writing Task",
        }
    }

    /// Prefix used for theme labels of this kind.
    pub fn theme_prefix(&self) -> &'static str {
        match self {
            WritingTaskKind::Integrated => "Integrated",
            WritingTaskKind::Independent => "Independent",
        }
    }
}

impl fmt::Display for WritingTaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WritingTaskKind::Integrated => write!(f, "integrated"),
            WritingTaskKind::Independent => write!(f, "independent"),
        }
    }
}

impl FromStr for WritingTaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "integrated" | "int" => Ok(WritingTaskKind::Integrated),
            "independent" | "ind" => Ok(WritingTaskKind::Independent),
            other => Err(format!("unknown writing task: {other}")),
        }
    }
}

/// A generated writing task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingTask {
    pub kind: WritingTaskKind,
    pub theme: String,
    pub prompt: String,
}

impl WritingTask {
    pub fn title(&self) -> &'static str {
        self.kind.title()
    }
}

/// Scores for the four rubric dimensions, each 0-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricScores {
    pub development: u32,
    pub organization: u32,
    pub language_use: u32,
    pub relevance: u32,
}

impl RubricScores {
    pub const MAX: u32 = 5;

    pub fn total(&self) -> u32 {
        self.development + self.organization + self.language_use + self.relevance
    }
}

/// Structured essay feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssayFeedback {
    pub scores: RubricScores,
    /// Overall score on the 0-30 scale, when the model gave one.
    pub overall: Option<u32>,
    pub recommendations: String,
}

/// Feedback as it is kept in the session: the raw model text plus the parsed
/// form when parsing succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackResult {
    pub raw: String,
    pub parsed: Option<EssayFeedback>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_display_and_parse() {
        assert_eq!(QuestionType::FillInATable.to_string(), "Fill in a Table");
        assert_eq!(
            "Rhetorical Purpose".parse::<QuestionType>().unwrap(),
            QuestionType::RhetoricalPurpose
        );
        assert_eq!(
            "negative-factual".parse::<QuestionType>().unwrap(),
            QuestionType::NegativeFactualInformation
        );
        assert_eq!(
            "prose_summary".parse::<QuestionType>().unwrap(),
            QuestionType::ProseSummary
        );
        assert!("trivia".parse::<QuestionType>().is_err());
    }

    #[test]
    fn reading_options_bounds() {
        assert!(ReadingOptions::default().validate().is_ok());

        let too_few = ReadingOptions {
            question_count: 3,
            ..Default::default()
        };
        assert!(too_few.validate().is_err());

        let no_types = ReadingOptions {
            question_types: vec![],
            ..Default::default()
        };
        assert!(no_types.validate().is_err());
    }

    #[test]
    fn writing_kind_parse() {
        assert_eq!(
            "Integrated".parse::<WritingTaskKind>().unwrap(),
            WritingTaskKind::Integrated
        );
        assert_eq!(
            "ind".parse::<WritingTaskKind>().unwrap(),
            WritingTaskKind::Independent
        );
        assert!("essay".parse::<WritingTaskKind>().is_err());
    }

    #[test]
    fn question_serde_uses_type_key() {
        let json = r#"{"type":"Inference","question":"Why?","options":["a","b","c","d"],"correct":2}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.kind, "Inference");
        assert_eq!(q.correct_option(), "c");
    }
}
