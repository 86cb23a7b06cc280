use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::backend::{Collection, DataBackend};
use super::bank::{INTEGRATION_STEP, MANUAL_STEP, TEAM_STEP, TOOLS_STEP};
use super::evaluation::display_score;
use super::session::{AnswerSet, AuditSession};

/// Placeholder persisted for a mapped step the user never answered.
pub const UNKNOWN_ANSWER: &str = "unknown";

/// Persisted record for a completed audit; immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSubmission {
    pub team_size: String,
    pub tech_stack: Vec<String>,
    pub manual_hours: String,
    pub integration_level: String,
    pub score: u8,
    pub answers: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditSubmission {
    pub fn from_answers(
        answers: &AnswerSet,
        running_score: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        let label_or_unknown = |step_id: &str| {
            answers
                .single(step_id)
                .unwrap_or(UNKNOWN_ANSWER)
                .to_string()
        };

        Self {
            team_size: label_or_unknown(TEAM_STEP),
            tech_stack: answers.multi(TOOLS_STEP).to_vec(),
            manual_hours: label_or_unknown(MANUAL_STEP),
            integration_level: label_or_unknown(INTEGRATION_STEP),
            score: display_score(running_score),
            answers: answers.to_json(),
            created_at,
        }
    }

    pub fn from_session(session: &AuditSession, created_at: DateTime<Utc>) -> Self {
        Self::from_answers(session.answers(), session.running_score(), created_at)
    }
}

/// Persists completed sessions to the backend in a detached task.
pub struct SubmissionRecorder<B: ?Sized> {
    backend: Arc<B>,
}

impl<B: ?Sized> Clone for SubmissionRecorder<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B> SubmissionRecorder<B>
where
    B: DataBackend + ?Sized + 'static,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Called on every render of a session. Spawns the backend write the
    /// first time the session is seen complete and returns its handle; every
    /// other call returns `None`. Must run inside a tokio runtime.
    pub fn record(&self, session: &mut AuditSession) -> Option<JoinHandle<()>> {
        if !session.claim_completion() {
            return None;
        }
        let submission = AuditSubmission::from_session(session, Utc::now());
        Some(self.dispatch(submission))
    }

    fn dispatch(&self, submission: AuditSubmission) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let score = submission.score;
            let record = match serde_json::to_value(&submission) {
                Ok(record) => record,
                Err(err) => {
                    warn!(error = %err, "unable to encode audit submission");
                    return;
                }
            };

            match backend.create(Collection::AuditSubmissions, record).await {
                Ok(record_id) => info!(%record_id, score, "audit submission recorded"),
                Err(err) => warn!(error = %err, score, "failed to record audit submission"),
            }
        })
    }
}
