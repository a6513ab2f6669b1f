//! The assessment session flow: reading, answering, submitting.

mod clock;
mod controller;
mod event;
mod flow;
mod state;

#[cfg(test)]
mod proptests;

pub use clock::{format_ticker, Clock, ManualClock, SystemClock, Timestamp};
pub use controller::{Advance, PendingSubmission, SessionController, Ticket};
pub use event::SessionEvent;
pub use flow::AssessmentFlow;
pub use state::{Phase, RetryTarget, SessionState};
