use async_trait::async_trait;

use crate::assessment::{AssessmentContent, ContentQuery, SubmissionPayload};
use crate::error::GatewayError;
use crate::results::ResultMetrics;

/// The remote content and grading service.
///
/// Implementations make a single attempt per call; retrying is the caller's
/// decision.
#[async_trait]
pub trait ContentGateway: Send + Sync {
    /// Fetch a passage and its questions.
    ///
    /// Fails with [`GatewayError::ContentUnavailable`] on transport errors,
    /// server errors or a payload that cannot be understood.
    async fn fetch_content(&self, query: &ContentQuery) -> Result<AssessmentContent, GatewayError>;

    /// Send an answer set for grading.
    ///
    /// Fails with [`GatewayError::SubmissionRejected`] when the service
    /// refuses the answers, [`GatewayError::ContentUnavailable`] on transport
    /// errors.
    async fn submit_answers(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<ResultMetrics, GatewayError>;
}
