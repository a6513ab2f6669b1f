//! Runs a [`SessionController`] against a [`ContentGateway`].
//!
//! The controller stays free of IO; this driver performs the requests it
//! asks for and feeds the outcomes back in.

use super::clock::{Clock, SystemClock};
use super::controller::{Advance, PendingSubmission, SessionController};
use super::event::SessionEvent;
use super::state::SessionState;
use crate::assessment::{AssessmentContent, ContentQuery};
use crate::error::TransitionError;
use crate::gateway::ContentGateway;

pub struct AssessmentFlow<G, C: Clock = SystemClock> {
    controller: SessionController<C>,
    gateway: G,
}

impl<G: ContentGateway> AssessmentFlow<G, SystemClock> {
    pub fn new(gateway: G) -> Self {
        Self::with_controller(gateway, SessionController::new())
    }
}

impl<G: ContentGateway, C: Clock> AssessmentFlow<G, C> {
    pub fn with_controller(gateway: G, controller: SessionController<C>) -> Self {
        Self {
            controller,
            gateway,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.controller.state()
    }

    pub fn controller(&self) -> &SessionController<C> {
        &self.controller
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Start a new attempt with content from the service.
    pub async fn load(&mut self, query: &ContentQuery) -> &SessionState {
        let ticket = self.controller.begin_load();
        let result = self.gateway.fetch_content(query).await;
        self.controller.complete_load(ticket, result);
        self.controller.state()
    }

    /// Start a new attempt with local content.
    pub fn load_local(&mut self, content: AssessmentContent) -> SessionEvent {
        self.controller.load_local(content)
    }

    pub fn advance_to_questions(&mut self) -> Result<SessionEvent, TransitionError> {
        self.controller.advance_to_questions()
    }

    pub fn select_answer(
        &mut self,
        question_index: usize,
        choice: usize,
    ) -> Result<Option<SessionEvent>, TransitionError> {
        self.controller.select_answer(question_index, choice)
    }

    pub fn previous_question(&mut self) -> Result<Option<SessionEvent>, TransitionError> {
        self.controller.previous_question()
    }

    /// Move on; from an answered last question this submits and waits for
    /// the grade. Inspect [`state`](Self::state) afterwards for the outcome.
    pub async fn next_question(&mut self) -> Result<Advance, TransitionError> {
        let advance = self.controller.next_question()?;
        if let Advance::Submit(pending) = &advance {
            self.submit(pending).await;
        }
        Ok(advance)
    }

    /// Re-send the answers of a failed submission.
    pub async fn retry_submission(&mut self) -> Result<&SessionState, TransitionError> {
        let pending = self.controller.retry_submission()?;
        self.submit(&pending).await;
        Ok(self.controller.state())
    }

    pub fn resume_answering(&mut self) -> Result<SessionEvent, TransitionError> {
        self.controller.resume_answering()
    }

    pub fn reset(&mut self) -> SessionEvent {
        self.controller.reset()
    }

    async fn submit(&mut self, pending: &PendingSubmission) {
        let result = self.gateway.submit_answers(&pending.payload).await;
        self.controller.complete_submission(pending.ticket, result);
    }
}
