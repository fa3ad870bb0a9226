//! Answer checking and end-of-session feedback, with the local fallbacks used when the
//! oracle is unavailable.

use serde::{Deserialize, Serialize};

pub const FALLBACK_SESSION_FEEDBACK: &str =
    "Great job practicing! Keep reviewing the topics you found difficult.";

/// A learner's answer to one exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerCheck {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerVerdict {
    pub is_correct: bool,
    pub feedback: String,
}

/// Case-insensitive comparison of the trimmed answers.
pub fn fallback_verdict(user_answer: &str, correct_answer: &str) -> AnswerVerdict {
    let is_correct = user_answer.trim().to_lowercase() == correct_answer.trim().to_lowercase();
    let feedback = if is_correct {
        "Correct!".to_string()
    } else {
        format!("Incorrect. The correct answer is {}.", correct_answer)
    };
    AnswerVerdict {
        is_correct,
        feedback,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFeedback {
    pub summary: String,
    pub recommendations: String,
}

impl SessionFeedback {
    /// Summary and recommendations as a single message body.
    pub fn message(&self) -> String {
        format!("{}\n\n{}", self.summary, self.recommendations)
    }
}
