use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use super::backend::{AuthContext, BackendError, Collection, DataBackend};
use super::bank::QuestionBank;
use super::session::{AuditSession, Transition};
use super::submission::SubmissionRecorder;
use super::views::AuditSessionView;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Idle time after which a session counts as abandoned.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

struct LiveSession {
    session: AuditSession,
    touched: Instant,
}

/// Hosts live audit sessions and records each completion once.
///
/// Operations that can complete a session spawn the submission onto the
/// ambient tokio runtime. Sessions untouched for longer than the TTL are
/// dropped whenever a new one starts.
pub struct AuditService<B: ?Sized> {
    bank: Arc<QuestionBank>,
    sessions: Mutex<HashMap<SessionId, LiveSession>>,
    session_ttl: Duration,
    recorder: SubmissionRecorder<B>,
    backend: Arc<B>,
}

impl<B> AuditService<B>
where
    B: DataBackend + ?Sized + 'static,
{
    pub fn new(bank: Arc<QuestionBank>, backend: Arc<B>) -> Self {
        Self {
            bank,
            sessions: Mutex::new(HashMap::new()),
            session_ttl: DEFAULT_SESSION_TTL,
            recorder: SubmissionRecorder::new(Arc::clone(&backend)),
            backend,
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn live_sessions(&self) -> usize {
        self.sessions().len()
    }

    pub fn start(&self) -> AuditSessionView {
        let id = SessionId::generate();
        let session = AuditSession::new(Arc::clone(&self.bank));
        let view = AuditSessionView::capture(&id, &session, None);

        let ttl = self.session_ttl;
        let mut sessions = self.sessions();
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, live| now.duration_since(live.touched) < ttl);
        let expired = before - sessions.len();
        if expired > 0 {
            debug!(expired, "idle audit sessions dropped");
        }
        sessions.insert(
            id.clone(),
            LiveSession {
                session,
                touched: now,
            },
        );
        drop(sessions);

        info!(session_id = %id, "audit session started");
        view
    }

    /// Renders the session. Also the point where a completed session gets
    /// recorded, so a repeated render never submits twice.
    pub fn view(&self, id: &SessionId) -> Result<AuditSessionView, AuditServiceError> {
        self.apply(id, |_| None)
    }

    pub fn select(
        &self,
        id: &SessionId,
        step_id: &str,
        option: &str,
    ) -> Result<AuditSessionView, AuditServiceError> {
        self.apply(id, |session| Some(session.select(step_id, option)))
    }

    pub fn advance(&self, id: &SessionId) -> Result<AuditSessionView, AuditServiceError> {
        self.apply(id, |session| Some(session.advance()))
    }

    pub fn retreat(&self, id: &SessionId) -> Result<AuditSessionView, AuditServiceError> {
        self.apply(id, |session| Some(session.retreat()))
    }

    pub fn reset(&self, id: &SessionId) -> Result<AuditSessionView, AuditServiceError> {
        self.apply(id, |session| Some(session.reset()))
    }

    pub fn abandon(&self, id: &SessionId) -> Result<(), AuditServiceError> {
        match self.sessions().remove(id) {
            Some(_) => {
                debug!(session_id = %id, "audit session abandoned");
                Ok(())
            }
            None => Err(AuditServiceError::UnknownSession(id.clone())),
        }
    }

    pub async fn authenticate(&self, token: &str) -> Result<AuthContext, AuditServiceError> {
        self.backend
            .resolve_session(token)
            .await?
            .ok_or(AuditServiceError::Unauthorized)
    }

    /// Stored submissions, newest first. Admins only.
    pub async fn submissions(&self, auth: &AuthContext) -> Result<Vec<Value>, AuditServiceError> {
        if !auth.is_admin() {
            return Err(AuditServiceError::Forbidden);
        }
        Ok(self
            .backend
            .list(Collection::AuditSubmissions, auth)
            .await?)
    }

    fn apply<F>(&self, id: &SessionId, operation: F) -> Result<AuditSessionView, AuditServiceError>
    where
        F: FnOnce(&mut AuditSession) -> Option<Transition>,
    {
        let mut sessions = self.sessions();
        let now = Instant::now();
        let expired = match sessions.get(id) {
            Some(live) => now.duration_since(live.touched) >= self.session_ttl,
            None => return Err(AuditServiceError::UnknownSession(id.clone())),
        };
        if expired {
            sessions.remove(id);
            debug!(session_id = %id, "idle audit session dropped");
            return Err(AuditServiceError::UnknownSession(id.clone()));
        }
        let live = sessions
            .get_mut(id)
            .ok_or_else(|| AuditServiceError::UnknownSession(id.clone()))?;
        live.touched = now;
        let session = &mut live.session;

        let transition = operation(session);
        if let Some(Transition::Rejected(reason)) = transition {
            debug!(session_id = %id, ?reason, "audit transition rejected");
        }

        if self.recorder.record(session).is_some() {
            let result = session.result();
            info!(
                session_id = %id,
                score = result.map(|r| r.display_score),
                tier = result.map(|r| r.tier_label),
                "audit session completed"
            );
        }

        Ok(AuditSessionView::capture(id, session, transition))
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, LiveSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditServiceError {
    #[error("audit session '{0}' not found")]
    UnknownSession(SessionId),
    #[error("missing or invalid session token")]
    Unauthorized,
    #[error("admin role required")]
    Forbidden,
    #[error(transparent)]
    Backend(#[from] BackendError),
}
