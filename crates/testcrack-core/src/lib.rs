//! # Test Crack Core Library
//!
//! Core logic for the Test Crack reading assessment client: a timed
//! read-then-answer session whose answers are graded by a remote service.
//! The CLI is a thin adapter that maps keyboard input onto the session
//! operations exposed here.
//!
//! ## Architecture
//!
//! - **Session**: an IO-free state machine ([`SessionController`]) that owns
//!   phase, answers and timing, plus an async driver ([`AssessmentFlow`])
//!   that runs it against a [`ContentGateway`]
//! - **API**: reqwest-based [`ApiClient`] for content, grading, auth and
//!   progress endpoints
//! - **Auth**: [`AuthSession`], the explicit signed-in user, persisted
//!   through a [`CredentialStore`]
//! - **Storage**: TOML configuration and credential stores
//!
//! ## Key Components
//!
//! - [`SessionController`]: phase transitions, answer tracking, timestamps
//! - [`Clock`]: time source, swappable for [`ManualClock`] in tests
//! - [`ResultMetrics`]: graded outcome and its presentation helpers
//! - [`Config`]: application configuration management

pub mod api;
pub mod assessment;
pub mod auth;
pub mod error;
pub mod gateway;
pub mod results;
pub mod session;
pub mod storage;

pub use api::{ApiClient, AuthGrant};
pub use assessment::{AssessmentContent, ContentQuery, Question, SubmissionPayload};
pub use auth::{validate_signup, AuthSession, MIN_PASSWORD_LEN};
pub use error::{
    AuthError, ConfigError, ContentError, CoreError, CredentialError, FailureKind, GatewayError,
    TransitionError, ValidationError,
};
pub use gateway::ContentGateway;
pub use results::{format_duration, PerformanceLevel, ResultMetrics, UserStats};
pub use session::{
    format_ticker, Advance, AssessmentFlow, Clock, ManualClock, PendingSubmission, Phase,
    RetryTarget, SessionController, SessionEvent, SessionState, SystemClock, Ticket, Timestamp,
};
pub use storage::{
    Config, CredentialBackend, CredentialStore, Credentials, FileCredentialStore,
    KeyringCredentialStore, MemoryCredentialStore, Preferences, UserProfile,
};
