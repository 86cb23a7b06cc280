//! Automation scorecard audit: question bank, session state machine,
//! score evaluation, and submission recording.

pub mod backend;
pub mod bank;
pub mod evaluation;
pub mod rest;
pub mod router;
pub mod service;
pub mod session;
pub mod submission;
pub mod views;

#[cfg(test)]
mod tests;

pub use backend::{AuthContext, BackendError, Collection, DataBackend, RecordId, Role};
pub use bank::{AuditOption, BankError, QuestionBank, QuestionStep, StepKind};
pub use evaluation::{display_score, message_of, AuditResult, ScoreTier};
pub use rest::RestBackend;
pub use router::{audit_router, SelectRequest};
pub use service::{AuditService, AuditServiceError, SessionId, DEFAULT_SESSION_TTL};
pub use session::{Answer, AnswerSet, AuditSession, RejectReason, SessionState, Transition};
pub use submission::{AuditSubmission, SubmissionRecorder, UNKNOWN_ANSWER};
pub use views::{AuditSessionView, OptionView, StepView};
