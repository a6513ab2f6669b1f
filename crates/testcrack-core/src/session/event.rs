//! Events emitted by session transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every applied session transition produces an Event.
/// The presentation layer re-renders from the snapshot after each one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    ContentLoaded {
        attempt_id: Uuid,
        question_count: usize,
        at: DateTime<Utc>,
    },
    LoadFailed {
        message: String,
        at: DateTime<Utc>,
    },
    ReadingFinished {
        reading_time_secs: u64,
        at: DateTime<Utc>,
    },
    AnswerSelected {
        question_index: usize,
        choice: usize,
        at: DateTime<Utc>,
    },
    QuestionChanged {
        from: usize,
        to: usize,
        at: DateTime<Utc>,
    },
    AssessmentCompleted {
        speed_score: f64,
        at: DateTime<Utc>,
    },
    SubmissionFailed {
        message: String,
        at: DateTime<Utc>,
    },
    AnsweringResumed {
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
}
