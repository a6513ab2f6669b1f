//! Metrics returned by the grading service and the helpers that turn them
//! into a score summary.
//!
//! Nothing here computes a score; the service owns that. These helpers only
//! classify and format what it sent back.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Aggregate history for the user, when the service includes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(default)]
    pub total_assessments: u32,
    #[serde(default)]
    pub average_speed_score: f64,
    #[serde(default)]
    pub best_speed_score: f64,
}

/// Graded outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetrics {
    pub speed_score: f64,
    /// Percentage, 0..=100.
    pub accuracy: f64,
    pub words_per_minute: f64,
    /// Percentage, 0..=100.
    pub retention_rate: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
    /// Seconds.
    pub reading_time: u64,
    /// Seconds.
    pub question_time: u64,
    /// Seconds.
    pub total_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_stats: Option<UserStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    Excellent,
    Good,
    Average,
    NeedsImprovement,
}

impl PerformanceLevel {
    pub fn from_speed_score(speed_score: f64) -> Self {
        if speed_score >= 200.0 {
            PerformanceLevel::Excellent
        } else if speed_score >= 150.0 {
            PerformanceLevel::Good
        } else if speed_score >= 100.0 {
            PerformanceLevel::Average
        } else {
            PerformanceLevel::NeedsImprovement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PerformanceLevel::Excellent => "Excellent",
            PerformanceLevel::Good => "Good",
            PerformanceLevel::Average => "Average",
            PerformanceLevel::NeedsImprovement => "Needs Improvement",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            PerformanceLevel::Excellent => "Outstanding reading speed!",
            PerformanceLevel::Good => "Great job! Keep improving.",
            PerformanceLevel::Average => "You're on the right track.",
            PerformanceLevel::NeedsImprovement => "Practice will help you improve.",
        }
    }
}

/// `45s` below a minute, `2m 5s` otherwise.
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{seconds}s")
    } else {
        format!("{}m {}s", seconds / 60, seconds % 60)
    }
}

impl ResultMetrics {
    pub fn performance(&self) -> PerformanceLevel {
        PerformanceLevel::from_speed_score(self.speed_score)
    }

    /// Suggestions for the next attempt, most specific first.
    pub fn improvement_tips(&self) -> Vec<&'static str> {
        let mut tips = Vec::new();
        if self.accuracy < 75.0 {
            tips.push("Focus on comprehension - slow down slightly to improve accuracy");
        }
        if self.words_per_minute < 200.0 {
            tips.push("Practice speed reading techniques to increase your reading pace");
        }
        if self.question_time > 60 {
            tips.push("Work on quick recall - practice answering questions faster");
        }
        tips.push("Regular practice sessions will help improve your overall performance");
        tips.push("Try the assessment again to track your improvement");
        tips
    }

    /// Plain-text score summary for terminal output.
    pub fn summary(&self) -> String {
        let level = self.performance();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "You answered {} out of {} questions correctly.",
            self.correct_answers, self.total_questions
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Speed score:       {}", self.speed_score);
        let _ = writeln!(out, "  {} With time, your learning speed will improve.", level.message());
        let _ = writeln!(out, "Accuracy:          {}%", self.accuracy.round());
        let _ = writeln!(out, "Reading speed:     {} WPM", self.words_per_minute);
        let _ = writeln!(out, "Retention rate:    {}%", self.retention_rate.round());
        let _ = writeln!(out);
        let _ = writeln!(out, "Reading time:      {}", format_duration(self.reading_time));
        let _ = writeln!(out, "Question time:     {}", format_duration(self.question_time));
        let _ = writeln!(out, "Total time:        {}", format_duration(self.total_time));
        let _ = writeln!(out, "Performance level: {}", level.label());

        if let Some(stats) = &self.user_stats {
            let _ = writeln!(out);
            let _ = writeln!(out, "Assessments taken: {}", stats.total_assessments);
            let _ = writeln!(out, "Average score:     {}", stats.average_speed_score);
            let _ = writeln!(out, "Best score:        {}", stats.best_speed_score);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Tips:");
        for tip in self.improvement_tips() {
            let _ = writeln!(out, "  - {tip}");
        }
        out
    }
}
