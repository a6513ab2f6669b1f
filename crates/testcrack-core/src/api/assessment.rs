use async_trait::async_trait;
use reqwest::{Method, StatusCode};

use super::{ApiClient, RawResponse};
use crate::assessment::{AssessmentContent, ContentQuery, SubmissionPayload};
use crate::error::GatewayError;
use crate::gateway::ContentGateway;
use crate::results::ResultMetrics;

const LOAD_FAILED: &str = "Failed to load assessment";
const SUBMIT_FAILED: &str = "Failed to submit assessment";

#[async_trait]
impl ContentGateway for ApiClient {
    async fn fetch_content(&self, query: &ContentQuery) -> Result<AssessmentContent, GatewayError> {
        let mut url = self.endpoint("assessment/content")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(subject) = query.subject.as_deref().filter(|s| !s.is_empty()) {
                pairs.append_pair("subject", subject);
            }
            if let Some(level) = query.level.as_deref().filter(|l| !l.is_empty()) {
                pairs.append_pair("level", level);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let resp = self
            .send(Method::GET, url, None::<&()>)
            .await
            .map_err(GatewayError::ContentUnavailable)?;
        if resp.status == StatusCode::UNAUTHORIZED {
            return Err(GatewayError::Unauthorized);
        }
        if !resp.status.is_success() {
            return Err(GatewayError::ContentUnavailable(failure_message(&resp, LOAD_FAILED)));
        }
        let Some(envelope) = resp.envelope::<AssessmentContent>() else {
            return Err(GatewayError::ContentUnavailable(
                "service returned an unreadable assessment".to_string(),
            ));
        };
        match (envelope.success, envelope.data) {
            (true, Some(content)) => {
                tracing::debug!(questions = content.question_count(), "assessment content received");
                Ok(content)
            }
            (true, None) => Err(GatewayError::ContentUnavailable(
                "service response had no assessment".to_string(),
            )),
            (false, _) => Err(GatewayError::ContentUnavailable(
                envelope.message.unwrap_or_else(|| LOAD_FAILED.to_string()),
            )),
        }
    }

    async fn submit_answers(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<ResultMetrics, GatewayError> {
        let url = self.endpoint("assessment/submit")?;
        let resp = self
            .send(Method::POST, url, Some(payload))
            .await
            .map_err(GatewayError::ContentUnavailable)?;

        if resp.status == StatusCode::UNAUTHORIZED {
            return Err(GatewayError::Unauthorized);
        }
        if resp.status.is_client_error() {
            return Err(GatewayError::SubmissionRejected(failure_message(&resp, SUBMIT_FAILED)));
        }
        if !resp.status.is_success() {
            return Err(GatewayError::ContentUnavailable(failure_message(&resp, SUBMIT_FAILED)));
        }
        let Some(envelope) = resp.envelope::<ResultMetrics>() else {
            return Err(GatewayError::ContentUnavailable(
                "service returned unreadable results".to_string(),
            ));
        };
        match (envelope.success, envelope.data) {
            (true, Some(metrics)) => {
                tracing::debug!(speed_score = metrics.speed_score, "assessment graded");
                Ok(metrics)
            }
            (true, None) => Err(GatewayError::ContentUnavailable(
                "service response had no results".to_string(),
            )),
            (false, _) => Err(GatewayError::SubmissionRejected(
                envelope.message.unwrap_or_else(|| SUBMIT_FAILED.to_string()),
            )),
        }
    }
}

fn failure_message(resp: &RawResponse, fallback: &str) -> String {
    resp.message()
        .unwrap_or_else(|| format!("{fallback} ({})", resp.status))
}
