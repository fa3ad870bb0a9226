//! Exercise data model: categories, their shape contracts, and the per-category quota table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of exercise. Declaration order here is the default generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MultipleChoice,
    FillInBlank,
    Matching,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::MultipleChoice,
        Category::FillInBlank,
        Category::Matching,
    ];

    /// Wire name, as used in the `type` field of an exercise.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::MultipleChoice => "multiple_choice",
            Category::FillInBlank => "fill_in_blank",
            Category::Matching => "matching",
        }
    }

    /// Human-readable name for status messages.
    pub fn label(self) -> &'static str {
        match self {
            Category::MultipleChoice => "multiple choice",
            Category::FillInBlank => "fill in blank",
            Category::Matching => "matching",
        }
    }

    /// Field instructions handed to the generation oracle.
    pub fn format_hint(self) -> &'static str {
        match self {
            Category::MultipleChoice => r#"Provide "options" (4 strings) and "answer"."#,
            Category::FillInBlank => r#"Provide sentence with _____. "answer" is missing word."#,
            Category::Matching => {
                r#"Provide "pairs" (term/definition). "question" is "Match items"."#
            }
        }
    }

    pub fn shape(self) -> ShapeContract {
        match self {
            Category::MultipleChoice => ShapeContract::OptionsWithAnswer,
            Category::FillInBlank => ShapeContract::Answer,
            Category::Matching => ShapeContract::Pairs,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which fields a well-formed exercise of a category must populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeContract {
    /// Non-empty `options` and an `answer` drawn from them.
    OptionsWithAnswer,
    /// Non-empty `answer`.
    Answer,
    /// Non-empty `pairs`, each with a term and a definition.
    Pairs,
}

impl ShapeContract {
    /// Check an exercise against the contract, returning the first violation.
    pub fn check(self, exercise: &Exercise) -> Result<(), String> {
        if exercise.question.trim().is_empty() {
            return Err("question is empty".to_string());
        }
        match self {
            ShapeContract::OptionsWithAnswer => {
                let options = exercise.options.as_deref().unwrap_or_default();
                if options.is_empty() {
                    return Err("options are missing".to_string());
                }
                let answer = non_empty_answer(exercise)?;
                if !options.iter().any(|option| option == answer) {
                    return Err(format!("answer '{}' is not one of the options", answer));
                }
                Ok(())
            }
            ShapeContract::Answer => non_empty_answer(exercise).map(|_| ()),
            ShapeContract::Pairs => {
                let pairs = exercise.pairs.as_deref().unwrap_or_default();
                if pairs.is_empty() {
                    return Err("pairs are missing".to_string());
                }
                if pairs
                    .iter()
                    .any(|p| p.term.trim().is_empty() || p.definition.trim().is_empty())
                {
                    return Err("pair with empty term or definition".to_string());
                }
                Ok(())
            }
        }
    }
}

fn non_empty_answer(exercise: &Exercise) -> Result<&str, String> {
    match exercise.answer.as_deref() {
        Some(answer) if !answer.trim().is_empty() => Ok(answer),
        _ => Err("answer is missing".to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingPair {
    pub term: String,
    pub definition: String,
}

/// One generated exercise. Also the candidate type while it awaits validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    #[serde(rename = "type")]
    pub category: Category,
    pub question: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub pairs: Option<Vec<MatchingPair>>,
}

/// Verdict of the validation oracle on one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// One row of the ordered quota table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryQuota {
    pub category: Category,
    pub quota: usize,
}

impl CategoryQuota {
    pub fn new(category: Category, quota: usize) -> Self {
        Self { category, quota }
    }
}

pub const DEFAULT_QUOTA: usize = 4;

/// Four of each category, in declaration order.
pub fn default_quotas() -> Vec<CategoryQuota> {
    Category::ALL
        .iter()
        .map(|category| CategoryQuota::new(*category, DEFAULT_QUOTA))
        .collect()
}

/// Deterministic stand-ins returned when the fault-injection topic hits a failing oracle.
pub fn mock_exercises(category: Category, count: usize) -> Vec<Exercise> {
    (1..=count)
        .map(|n| {
            let id = n as i64;
            match category {
                Category::MultipleChoice => Exercise {
                    id,
                    category,
                    question: format!("Mock question {n}: which word means 'house'?"),
                    answer: Some("huis".to_string()),
                    options: Some(vec![
                        "huis".to_string(),
                        "boom".to_string(),
                        "kat".to_string(),
                        "fiets".to_string(),
                    ]),
                    pairs: None,
                },
                Category::FillInBlank => Exercise {
                    id,
                    category,
                    question: format!("Mock sentence {n}: Ik woon in een _____."),
                    answer: Some("huis".to_string()),
                    options: None,
                    pairs: None,
                },
                Category::Matching => Exercise {
                    id,
                    category,
                    question: "Match items".to_string(),
                    answer: None,
                    options: None,
                    pairs: Some(vec![
                        MatchingPair {
                            term: "huis".to_string(),
                            definition: "house".to_string(),
                        },
                        MatchingPair {
                            term: "kat".to_string(),
                            definition: "cat".to_string(),
                        },
                    ]),
                },
            }
        })
        .collect()
}
