use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::clock::Timestamp;
use crate::assessment::{AssessmentContent, Question};
use crate::error::FailureKind;
use crate::results::ResultMetrics;

/// Stage of an assessment attempt.
///
/// `Loading` is the implicit pre-phase before content arrives; no timers run
/// in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Loading,
    Reading,
    Answering,
    Submitting,
    Done,
    Failed,
}

/// What a `Failed` session can retry without starting over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryTarget {
    /// Content never arrived; reload it.
    Load,
    /// Grading failed; the captured answers can be re-sent or edited.
    Submission,
}

/// Everything the presentation layer needs to render the current phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    pub attempt_id: Uuid,
    pub generation: u64,
    pub content: Option<AssessmentContent>,
    pub answers: Vec<Option<usize>>,
    pub current_question_index: usize,
    pub reading_started_at: Option<Timestamp>,
    pub answering_started_at: Option<Timestamp>,
    pub submission_triggered_at: Option<Timestamp>,
    pub last_error: Option<String>,
    pub last_error_kind: Option<FailureKind>,
    pub retry: Option<RetryTarget>,
    pub result: Option<ResultMetrics>,
}

impl SessionState {
    pub(crate) fn fresh(generation: u64) -> Self {
        Self {
            phase: Phase::Loading,
            attempt_id: Uuid::new_v4(),
            generation,
            content: None,
            answers: Vec::new(),
            current_question_index: 0,
            reading_started_at: None,
            answering_started_at: None,
            submission_triggered_at: None,
            last_error: None,
            last_error_kind: None,
            retry: None,
            result: None,
        }
    }

    pub fn question_count(&self) -> usize {
        self.content.as_ref().map_or(0, |c| c.questions.len())
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.content
            .as_ref()?
            .questions
            .get(self.current_question_index)
    }

    pub fn current_answer(&self) -> Option<usize> {
        self.answers.get(self.current_question_index).copied().flatten()
    }

    pub fn is_last_question(&self) -> bool {
        self.question_count() > 0 && self.current_question_index + 1 == self.question_count()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    /// 0.0 .. 100.0, position of the current question within the quiz.
    pub fn progress_pct(&self) -> f64 {
        let total = self.question_count().max(1);
        ((self.current_question_index + 1) as f64 / total as f64 * 100.0).min(100.0)
    }

    /// Whether user input should be accepted. False while a request is in
    /// flight so the caller can disable controls.
    pub fn accepts_input(&self) -> bool {
        matches!(self.phase, Phase::Reading | Phase::Answering | Phase::Failed)
    }
}
