//! Parsers for model output.
//!
//! Models rarely return exactly what was asked for. Question lists are cut
//! out of surrounding prose, repaired when the JSON is sloppy, and normalized
//! so every question has four options and a valid answer index. Essay
//! feedback is read from the line format requested by
//! [`crate::prompts::feedback_prompt`].

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ParseError;
use crate::model::{EssayFeedback, Question, RubricScores, CHOICES_PER_QUESTION};

/// Shown instead of structured feedback when the model's answer can't be read.
pub const FEEDBACK_FALLBACK: &str =
    "Feedback could not be scored automatically. The instructor's full response is shown below.";

static UNQUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").expect("valid unquoted-key pattern")
});

static SCORE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(development|organization|language use|relevance|overall(?: score)?)\s*:\s*(\d+(?:[.,]\d+)?)")
        .expect("valid score-line pattern")
});

static LIST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?\d+[.)]\s*").expect("valid list-number pattern"));

static RECOMMENDATIONS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:specific )?recommendations?\s*:?\s*(.*)$")
        .expect("valid recommendations pattern")
});

/// Questions parsed from a model response, plus anything that had to be
/// patched along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuestions {
    pub questions: Vec<Question>,
    pub warnings: Vec<String>,
}

/// Slice the outermost JSON array out of `raw`.
pub fn extract_json_array(raw: &str) -> Result<&str, ParseError> {
    let trimmed = raw.trim();
    let start = trimmed
        .find("[{")
        .or_else(|| trimmed.find('['))
        .ok_or(ParseError::NoJsonArray)?;
    let rest = &trimmed[start..];

    if let Some(end) = rest.rfind("}]") {
        return Ok(&rest[..end + 2]);
    }
    rest.rfind(']')
        .map(|end| &rest[..=end])
        .ok_or(ParseError::NoJsonArray)
}

/// Patch the most common malformations: single quotes and bare keys.
fn repair_json(json: &str) -> String {
    let quoted = json.replace('\'', "\"");
    UNQUOTED_KEY.replace_all(&quoted, "$1\"$2\":").into_owned()
}

fn parse_array(json: &str) -> Result<Value, ParseError> {
    match serde_json::from_str::<Value>(json) {
        Ok(value) => Ok(value),
        Err(first) => {
            tracing::debug!(error = %first, "question JSON invalid, attempting repair");
            serde_json::from_str::<Value>(&repair_json(json))
                .map_err(|_| ParseError::InvalidJson(first.to_string()))
        }
    }
}

/// Parse and normalize a question list.
///
/// `fallback_type` fills in a missing question type.
pub fn parse_questions(
    raw: &str,
    requested: usize,
    fallback_type: &str,
) -> Result<ParsedQuestions, ParseError> {
    let json = extract_json_array(raw)?;
    let Value::Array(items) = parse_array(json)? else {
        return Err(ParseError::NotAList);
    };
    if items.is_empty() {
        return Err(ParseError::NoQuestions);
    }

    let mut warnings = Vec::new();
    if items.len() < requested {
        warnings.push(format!(
            "only {} questions generated (expected {requested})",
            items.len()
        ));
    }

    let questions = items
        .iter()
        .enumerate()
        .map(|(i, item)| normalize_question(i + 1, item, fallback_type, &mut warnings))
        .collect();

    Ok(ParsedQuestions {
        questions,
        warnings,
    })
}

fn default_option(index: usize) -> String {
    format!("Option {}", char::from(b'A' + index as u8))
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn normalize_question(
    number: usize,
    item: &Value,
    fallback_type: &str,
    warnings: &mut Vec<String>,
) -> Question {
    let field = |name: &str| item.get(name);

    let missing: Vec<&str> = ["type", "question", "options", "correct"]
        .into_iter()
        .filter(|name| field(*name).is_none())
        .collect();
    if !missing.is_empty() {
        warnings.push(format!(
            "question {number} is missing fields: {}",
            missing.join(", ")
        ));
    }

    let kind = field("type")
        .map(value_to_text)
        .unwrap_or_else(|| fallback_type.to_string());
    let question = field("question")
        .map(value_to_text)
        .unwrap_or_else(|| format!("Question {number}"));

    let mut options: Vec<String> = match field("options") {
        Some(Value::Array(opts)) => opts.iter().map(value_to_text).collect(),
        Some(_) => {
            warnings.push(format!("question {number}: 'options' is not a list"));
            Vec::new()
        }
        None => Vec::new(),
    };
    if options.len() < CHOICES_PER_QUESTION && field("options").is_some_and(Value::is_array) {
        warnings.push(format!(
            "question {number} has fewer than {CHOICES_PER_QUESTION} options, padding"
        ));
    }
    while options.len() < CHOICES_PER_QUESTION {
        options.push(default_option(options.len()));
    }
    if options.len() > CHOICES_PER_QUESTION {
        warnings.push(format!(
            "question {number} has more than {CHOICES_PER_QUESTION} options, truncating"
        ));
        options.truncate(CHOICES_PER_QUESTION);
    }

    let correct = match field("correct") {
        Some(value) => {
            let index = value
                .as_u64()
                .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
                .map(|n| n as usize)
                .filter(|n| *n < CHOICES_PER_QUESTION);
            index.unwrap_or_else(|| {
                warnings.push(format!("question {number}: 'correct' is not a valid index"));
                0
            })
        }
        None => 0,
    };

    Question {
        kind,
        question,
        options,
        correct,
    }
}

/// Strip markdown emphasis, bullets and `1.` / `2)` numbering from a feedback line.
fn clean_line(line: &str) -> String {
    let unmarked = line.replace("**", "").replace("__", "");
    let unmarked = unmarked.trim().trim_start_matches(['-', '*', '#', '>']).trim();
    LIST_NUMBER.replace(unmarked, "").trim().to_string()
}

/// Read rubric scores and recommendations out of a feedback response.
pub fn parse_feedback(raw: &str) -> Result<EssayFeedback, ParseError> {
    let mut development = None;
    let mut organization = None;
    let mut language_use = None;
    let mut relevance = None;
    let mut overall = None;
    let mut recommendations: Option<Vec<String>> = None;

    for line in raw.lines() {
        let cleaned = clean_line(line);

        if let Some(lines) = recommendations.as_mut() {
            lines.push(line.trim_end().to_string());
            continue;
        }

        if let Some(caps) = SCORE_LINE.captures(&cleaned) {
            let label = caps[1].to_lowercase();
            let (name, slot) = match label.as_str() {
                "development" => ("Development", &mut development),
                "organization" => ("Organization", &mut organization),
                "language use" => ("Language Use", &mut language_use),
                "relevance" => ("Relevance", &mut relevance),
                _ => ("Overall", &mut overall),
            };
            if slot.is_none() {
                let text = &caps[2];
                let value: u32 = text.parse().map_err(|_| ParseError::NotAWholeNumber {
                    dimension: name,
                    value: text.to_string(),
                })?;
                *slot = Some(value);
            }
            continue;
        }

        if let Some(caps) = RECOMMENDATIONS_LINE.captures(&cleaned) {
            let first = caps[1].trim();
            recommendations = Some(if first.is_empty() {
                Vec::new()
            } else {
                vec![first.to_string()]
            });
        }
    }

    let scores = RubricScores {
        development: dimension("Development", development)?,
        organization: dimension("Organization", organization)?,
        language_use: dimension("Language Use", language_use)?,
        relevance: dimension("Relevance", relevance)?,
    };

    if let Some(value) = overall {
        if value > 30 {
            return Err(ParseError::ScoreOutOfRange {
                dimension: "Overall",
                value,
            });
        }
    }

    let recommendations = recommendations
        .map(|lines| lines.join("\n").trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(ParseError::MissingRecommendations)?;

    Ok(EssayFeedback {
        scores,
        overall,
        recommendations,
    })
}

fn dimension(name: &'static str, value: Option<u32>) -> Result<u32, ParseError> {
    let value = value.ok_or(ParseError::MissingScore(name))?;
    if value > RubricScores::MAX {
        return Err(ParseError::ScoreOutOfRange {
            dimension: name,
            value,
        });
    }
    Ok(value)
}
