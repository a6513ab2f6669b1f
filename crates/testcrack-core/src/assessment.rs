//! Assessment content and the answer payload sent back for grading.

use serde::{Deserialize, Serialize};

use crate::error::ContentError;

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question text. The service calls this field `question`.
    #[serde(rename = "question", alias = "prompt")]
    pub prompt: String,
    pub options: Vec<String>,
}

impl Question {
    pub fn new(prompt: impl Into<String>, options: &[&str]) -> Self {
        Self {
            prompt: prompt.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }
}

/// Reading passage plus the questions asked about it.
///
/// Question order is significant: the index of a question is the identity
/// used for its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentContent {
    pub passage: String,
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl AssessmentContent {
    pub fn new(passage: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            passage: passage.into(),
            questions,
            title: None,
            subject: None,
            level: None,
        }
    }

    /// Built-in passage for trying the flow without the content service.
    pub fn sample() -> Self {
        let mut content = Self::new(
            "This is a test passage to verify the reader works. Functions are \
             mathematical entities that assign exactly one output to each input. \
             A function can be represented as f(x) where x is the input variable.",
            vec![
                Question::new(
                    "What can a function be represented as?",
                    &["f(x)", "g(y)", "h(z)", "None of the above"],
                ),
                Question::new(
                    "How many outputs does a function assign to each input?",
                    &["Zero", "Exactly one", "Two or more", "It varies"],
                ),
            ],
        );
        content.title = Some("Advanced Algebra Concepts".to_string());
        content
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn word_count(&self) -> usize {
        self.passage.split_whitespace().count()
    }

    /// Check the structural rules the session controller relies on.
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.passage.trim().is_empty() {
            return Err(ContentError::EmptyPassage);
        }
        if self.questions.is_empty() {
            return Err(ContentError::NoQuestions);
        }
        for (index, q) in self.questions.iter().enumerate() {
            if q.options.len() < 2 {
                return Err(ContentError::TooFewOptions {
                    index,
                    count: q.options.len(),
                });
            }
        }
        Ok(())
    }
}

/// Optional filters for fetching content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl ContentQuery {
    pub fn new(subject: Option<String>, level: Option<String>) -> Self {
        Self { subject, level }
    }
}

/// The answer set sent to the grading service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    /// Selected option per question, `null` when left unanswered.
    #[serde(rename = "userAnswers")]
    pub answers: Vec<Option<usize>>,
    pub reading_time_seconds: u64,
    pub question_time_seconds: u64,
}

impl SubmissionPayload {
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_content_is_valid() {
        let content = AssessmentContent::sample();
        assert!(content.validate().is_ok());
        assert_eq!(content.question_count(), 2);
        assert!(content.word_count() > 10);
    }

    #[test]
    fn validate_rejects_empty_passage_and_missing_questions() {
        let content = AssessmentContent::new("   ", vec![Question::new("q", &["a", "b"])]);
        assert_eq!(content.validate(), Err(ContentError::EmptyPassage));

        let content = AssessmentContent::new("text", vec![]);
        assert_eq!(content.validate(), Err(ContentError::NoQuestions));
    }

    #[test]
    fn validate_rejects_single_option_question() {
        let content = AssessmentContent::new(
            "text",
            vec![Question::new("ok", &["a", "b"]), Question::new("bad", &["only"])],
        );
        assert_eq!(
            content.validate(),
            Err(ContentError::TooFewOptions { index: 1, count: 1 })
        );
    }

    #[test]
    fn content_parses_service_json() {
        let json = r#"{
            "passage": "Some text",
            "questions": [{"question": "Why?", "options": ["a", "b", "c"]}]
        }"#;
        let content: AssessmentContent = serde_json::from_str(json).unwrap();
        assert_eq!(content.questions[0].prompt, "Why?");
        assert_eq!(content.questions[0].options.len(), 3);
        assert!(content.title.is_none());
    }

    #[test]
    fn payload_uses_service_field_names() {
        let payload = SubmissionPayload {
            answers: vec![Some(1), None],
            reading_time_seconds: 30,
            question_time_seconds: 40,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "userAnswers": [1, null],
                "readingTimeSeconds": 30,
                "questionTimeSeconds": 40
            })
        );
        assert_eq!(payload.answered_count(), 1);
    }
}
