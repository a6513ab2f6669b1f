//! Assessment session controller.
//!
//! A sans-IO state machine. It never talks to the network itself: operations
//! that need the remote service hand back a [`Ticket`] (and, for submission,
//! the payload) and the caller reports the outcome with `complete_*`.
//!
//! ## State Transitions
//!
//! ```text
//! Loading -> Reading -> Answering -> Submitting -> Done
//!    \          \           \            \
//!     +----------+-----------+------------+--> Failed
//! ```
//!
//! A failed submission keeps its answers and can be re-sent or edited.
//! Any reload or reset bumps the generation, so completions that belong to
//! an earlier attempt are ignored.
//!
//! ## Usage
//!
//! ```ignore
//! let mut ctl = SessionController::new();
//! let ticket = ctl.begin_load();
//! ctl.complete_load(ticket, gateway.fetch_content(&query).await);
//! ctl.advance_to_questions()?;
//! ctl.select_answer(0, 1)?;
//! if let Advance::Submit(pending) = ctl.next_question()? {
//!     let result = gateway.submit_answers(&pending.payload).await;
//!     ctl.complete_submission(pending.ticket, result);
//! }
//! ```

use chrono::Utc;

use super::clock::{Clock, SystemClock};
use super::event::SessionEvent;
use super::state::{Phase, RetryTarget, SessionState};
use crate::assessment::{AssessmentContent, SubmissionPayload};
use crate::error::{GatewayError, TransitionError};
use crate::results::ResultMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TicketKind {
    Load,
    Submission,
}

/// Handle for an outstanding remote request. Only the ticket most recently
/// issued by the controller is accepted back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    id: u64,
    kind: TicketKind,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A submission the caller must send to the grading service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub ticket: Ticket,
    pub payload: SubmissionPayload,
}

/// Outcome of [`SessionController::next_question`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Moved to the next question.
    Moved(SessionEvent),
    /// Last question is unanswered; nothing happened.
    Blocked,
    /// A submission is already in flight; nothing happened.
    AlreadySubmitting,
    /// Entered `Submitting`; the caller must send the payload.
    Submit(PendingSubmission),
}

/// Owns the [`SessionState`] of one assessment attempt at a time.
#[derive(Debug)]
pub struct SessionController<C: Clock = SystemClock> {
    clock: C,
    state: SessionState,
    pending: Option<Ticket>,
    next_ticket_id: u64,
    /// Payload captured when submission was triggered; re-sent on retry.
    submitted: Option<SubmissionPayload>,
}

impl SessionController<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl Default for SessionController<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SessionController<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: SessionState::fresh(0),
            pending: None,
            next_ticket_id: 0,
            submitted: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Owned copy of the state for the presentation layer.
    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn has_pending_request(&self) -> bool {
        self.pending.is_some()
    }

    /// Running `m:ss` reading time while in `Reading`. Display only.
    pub fn reading_ticker(&self) -> Option<String> {
        if self.state.phase != Phase::Reading {
            return None;
        }
        let started = self.state.reading_started_at?;
        Some(self.clock.display_elapsed(started))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Discard the current attempt. Outstanding tickets become stale.
    pub fn reset(&mut self) -> SessionEvent {
        self.start_new_attempt();
        tracing::debug!(generation = self.state.generation, "session reset");
        SessionEvent::SessionReset { at: Utc::now() }
    }

    /// Start a new attempt and wait for content.
    pub fn begin_load(&mut self) -> Ticket {
        self.start_new_attempt();
        let ticket = self.issue_ticket(TicketKind::Load);
        tracing::debug!(generation = ticket.generation, "content load started");
        ticket
    }

    /// Apply the content service's answer. Returns `None` if the ticket is
    /// stale, in which case nothing changes.
    pub fn complete_load(
        &mut self,
        ticket: Ticket,
        result: Result<AssessmentContent, GatewayError>,
    ) -> Option<SessionEvent> {
        if !self.accept_ticket(ticket, TicketKind::Load) {
            return None;
        }
        Some(self.apply_load(result))
    }

    /// Start a new attempt with content already at hand.
    pub fn load_local(&mut self, content: AssessmentContent) -> SessionEvent {
        self.start_new_attempt();
        self.apply_load(Ok(content))
    }

    pub fn advance_to_questions(&mut self) -> Result<SessionEvent, TransitionError> {
        if self.state.phase != Phase::Reading {
            return Err(self.invalid("advance_to_questions"));
        }
        let now = self.clock.start();
        let reading_time_secs = self
            .state
            .reading_started_at
            .map_or(0, |started| started.seconds_until(now));
        self.state.answering_started_at = Some(now);
        self.state.current_question_index = 0;
        self.state.phase = Phase::Answering;
        tracing::debug!(reading_time_secs, "reading finished");
        Ok(SessionEvent::ReadingFinished {
            reading_time_secs,
            at: Utc::now(),
        })
    }

    /// Record `choice` for question `question_index`.
    ///
    /// Out-of-range indices are dropped silently and return `Ok(None)`.
    pub fn select_answer(
        &mut self,
        question_index: usize,
        choice: usize,
    ) -> Result<Option<SessionEvent>, TransitionError> {
        if self.state.phase != Phase::Answering {
            return Err(self.invalid("select_answer"));
        }
        let option_count = self
            .state
            .content
            .as_ref()
            .and_then(|c| c.questions.get(question_index))
            .map(|q| q.options.len());
        match option_count {
            Some(count) if choice < count => {
                self.state.answers[question_index] = Some(choice);
                Ok(Some(SessionEvent::AnswerSelected {
                    question_index,
                    choice,
                    at: Utc::now(),
                }))
            }
            _ => {
                tracing::debug!(question_index, choice, "ignoring out-of-range answer");
                Ok(None)
            }
        }
    }

    pub fn next_question(&mut self) -> Result<Advance, TransitionError> {
        match self.state.phase {
            Phase::Submitting => return Ok(Advance::AlreadySubmitting),
            Phase::Answering => {}
            _ => return Err(self.invalid("next_question")),
        }

        let from = self.state.current_question_index;
        if from + 1 < self.state.question_count() {
            self.state.current_question_index = from + 1;
            return Ok(Advance::Moved(SessionEvent::QuestionChanged {
                from,
                to: from + 1,
                at: Utc::now(),
            }));
        }

        if self.state.current_answer().is_none() {
            return Ok(Advance::Blocked);
        }

        Ok(Advance::Submit(self.trigger_submission()))
    }

    pub fn previous_question(&mut self) -> Result<Option<SessionEvent>, TransitionError> {
        if self.state.phase != Phase::Answering {
            return Err(self.invalid("previous_question"));
        }
        let from = self.state.current_question_index;
        if from == 0 {
            return Ok(None);
        }
        self.state.current_question_index = from - 1;
        Ok(Some(SessionEvent::QuestionChanged {
            from,
            to: from - 1,
            at: Utc::now(),
        }))
    }

    /// Apply the grading service's answer. Returns `None` if the ticket is
    /// stale, in which case nothing changes.
    pub fn complete_submission(
        &mut self,
        ticket: Ticket,
        result: Result<ResultMetrics, GatewayError>,
    ) -> Option<SessionEvent> {
        if !self.accept_ticket(ticket, TicketKind::Submission) {
            return None;
        }
        match result {
            Ok(metrics) => {
                let speed_score = metrics.speed_score;
                self.state.phase = Phase::Done;
                self.state.result = Some(metrics);
                self.state.last_error = None;
                self.state.last_error_kind = None;
                self.state.retry = None;
                tracing::debug!(speed_score, "assessment graded");
                Some(SessionEvent::AssessmentCompleted {
                    speed_score,
                    at: Utc::now(),
                })
            }
            Err(err) => {
                let message = self.fail(&err, RetryTarget::Submission);
                Some(SessionEvent::SubmissionFailed {
                    message,
                    at: Utc::now(),
                })
            }
        }
    }

    /// Re-send the answers captured when the failed submission was triggered.
    pub fn retry_submission(&mut self) -> Result<PendingSubmission, TransitionError> {
        let payload = match (&self.submitted, self.state.retry) {
            (Some(payload), Some(RetryTarget::Submission)) if self.state.phase == Phase::Failed => {
                payload.clone()
            }
            _ => return Err(self.invalid("retry_submission")),
        };
        self.state.phase = Phase::Submitting;
        self.state.retry = None;
        let ticket = self.issue_ticket(TicketKind::Submission);
        tracing::debug!(generation = ticket.generation, "submission retried");
        Ok(PendingSubmission { ticket, payload })
    }

    /// Go back to answering after a failed submission. Answers are kept.
    pub fn resume_answering(&mut self) -> Result<SessionEvent, TransitionError> {
        if self.state.phase != Phase::Failed || self.state.retry != Some(RetryTarget::Submission) {
            return Err(self.invalid("resume_answering"));
        }
        self.state.phase = Phase::Answering;
        self.state.retry = None;
        self.state.submission_triggered_at = None;
        self.submitted = None;
        Ok(SessionEvent::AnsweringResumed { at: Utc::now() })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn start_new_attempt(&mut self) {
        let generation = self.state.generation + 1;
        self.state = SessionState::fresh(generation);
        self.pending = None;
        self.submitted = None;
    }

    fn issue_ticket(&mut self, kind: TicketKind) -> Ticket {
        self.next_ticket_id += 1;
        let ticket = Ticket {
            generation: self.state.generation,
            id: self.next_ticket_id,
            kind,
        };
        self.pending = Some(ticket);
        ticket
    }

    fn accept_ticket(&mut self, ticket: Ticket, kind: TicketKind) -> bool {
        if ticket.kind != kind || self.pending != Some(ticket) {
            tracing::warn!(
                ticket_generation = ticket.generation,
                current_generation = self.state.generation,
                "ignoring stale {:?} completion",
                ticket.kind
            );
            return false;
        }
        self.pending = None;
        true
    }

    fn apply_load(&mut self, result: Result<AssessmentContent, GatewayError>) -> SessionEvent {
        let content = match result.and_then(|content| {
            content
                .validate()
                .map(|()| content)
                .map_err(|e| GatewayError::ContentUnavailable(format!("malformed assessment: {e}")))
        }) {
            Ok(content) => content,
            Err(err) => {
                let message = self.fail(&err, RetryTarget::Load);
                return SessionEvent::LoadFailed {
                    message,
                    at: Utc::now(),
                };
            }
        };

        let question_count = content.questions.len();
        self.state.answers = vec![None; question_count];
        self.state.current_question_index = 0;
        self.state.content = Some(content);
        self.state.reading_started_at = Some(self.clock.start());
        self.state.phase = Phase::Reading;
        tracing::debug!(question_count, attempt = %self.state.attempt_id, "content loaded");
        SessionEvent::ContentLoaded {
            attempt_id: self.state.attempt_id,
            question_count,
            at: Utc::now(),
        }
    }

    fn trigger_submission(&mut self) -> PendingSubmission {
        let now = self.clock.now();
        let answering_started = self.state.answering_started_at.unwrap_or(now);
        let reading_started = self.state.reading_started_at.unwrap_or(answering_started);
        let payload = SubmissionPayload {
            answers: self.state.answers.clone(),
            reading_time_seconds: reading_started.seconds_until(answering_started),
            question_time_seconds: answering_started.seconds_until(now),
        };

        self.state.submission_triggered_at = Some(now);
        self.state.phase = Phase::Submitting;
        self.state.last_error = None;
        self.state.last_error_kind = None;
        self.submitted = Some(payload.clone());
        let ticket = self.issue_ticket(TicketKind::Submission);
        tracing::debug!(
            reading_secs = payload.reading_time_seconds,
            question_secs = payload.question_time_seconds,
            answered = payload.answered_count(),
            "submission triggered"
        );
        PendingSubmission { ticket, payload }
    }

    fn fail(&mut self, err: &GatewayError, retry: RetryTarget) -> String {
        let message = err.to_string();
        tracing::warn!(error = %message, ?retry, "session failed");
        self.state.phase = Phase::Failed;
        self.state.last_error = Some(message.clone());
        self.state.last_error_kind = Some(err.kind());
        self.state.retry = Some(retry);
        message
    }

    fn invalid(&self, operation: &'static str) -> TransitionError {
        let phase = self.state.phase;
        tracing::error!(operation, ?phase, "invalid session transition");
        TransitionError::InvalidTransition { operation, phase }
    }
}
