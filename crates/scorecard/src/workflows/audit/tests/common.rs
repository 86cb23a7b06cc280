use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::audit::backend::{
    AuthContext, BackendError, Collection, DataBackend, RecordId, Role,
};
use crate::workflows::audit::bank::{QuestionBank, QuestionStep};

/// Bank from the walkthrough scenario: intro, team, tools, manual.
pub(super) fn scenario_bank() -> Arc<QuestionBank> {
    let bank = QuestionBank::new(vec![
        QuestionStep::intro("intro", "System Audit", "Let's begin."),
        QuestionStep::single_select(
            "team",
            "Team Structure",
            "How large is your team?",
            &[("Solo Founder", 10), ("2-10 Employees", 20)],
        ),
        QuestionStep::multi_select(
            "tools",
            "Tech Stack",
            "Which tools do you use?",
            &[("CRM", 15), ("Spreadsheets", -10)],
        ),
        QuestionStep::single_select(
            "manual",
            "Manual Workload",
            "How much manual entry?",
            &[("Less than 2 hours/week", 30), ("20+ hours/week", -30)],
        ),
    ])
    .expect("scenario bank is valid");
    Arc::new(bank)
}

pub(super) fn standard_bank() -> Arc<QuestionBank> {
    Arc::new(QuestionBank::standard().expect("standard bank is valid"))
}

#[derive(Default)]
pub(super) struct MemoryBackend {
    records: Mutex<Vec<(Collection, Value)>>,
    tokens: Mutex<HashMap<String, AuthContext>>,
    creates: AtomicUsize,
    list_bearers: Mutex<Vec<String>>,
}

impl MemoryBackend {
    pub(super) fn with_token(self, token: &str, role: Role) -> Self {
        self.tokens.lock().expect("token mutex").insert(
            token.to_string(),
            AuthContext {
                user_id: format!("user-{token}"),
                role,
                token: token.to_string(),
            },
        );
        self
    }

    pub(super) fn records(&self) -> Vec<Value> {
        self.records
            .lock()
            .expect("record mutex")
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    pub(super) fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Bearer tokens that `list` was called with, in call order.
    pub(super) fn list_bearers(&self) -> Vec<String> {
        self.list_bearers.lock().expect("bearer mutex").clone()
    }
}

#[async_trait]
impl DataBackend for MemoryBackend {
    async fn create(&self, collection: Collection, record: Value) -> Result<RecordId, BackendError> {
        let sequence = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        self.records
            .lock()
            .expect("record mutex")
            .push((collection, record));
        Ok(RecordId(format!("rec-{sequence}")))
    }

    async fn list(
        &self,
        collection: Collection,
        caller: &AuthContext,
    ) -> Result<Vec<Value>, BackendError> {
        self.list_bearers
            .lock()
            .expect("bearer mutex")
            .push(caller.token.clone());
        let guard = self.records.lock().expect("record mutex");
        Ok(guard
            .iter()
            .rev()
            .filter(|(stored, _)| *stored == collection)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<AuthContext>, BackendError> {
        Ok(self.tokens.lock().expect("token mutex").get(token).cloned())
    }
}

/// Backend whose writes always fail, as during a network outage.
#[derive(Default)]
pub(super) struct FailingBackend {
    attempts: AtomicUsize,
}

impl FailingBackend {
    pub(super) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataBackend for FailingBackend {
    async fn create(
        &self,
        _collection: Collection,
        _record: Value,
    ) -> Result<RecordId, BackendError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::Unavailable("connection refused".to_string()))
    }

    async fn list(
        &self,
        _collection: Collection,
        _caller: &AuthContext,
    ) -> Result<Vec<Value>, BackendError> {
        Err(BackendError::Unavailable("connection refused".to_string()))
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<AuthContext>, BackendError> {
        Ok(Some(AuthContext {
            user_id: "admin".to_string(),
            role: Role::Admin,
            token: token.to_string(),
        }))
    }
}

/// Polls until `probe` reports at least `expected`, giving detached tasks
/// time to run.
pub(super) async fn wait_for(expected: usize, probe: impl Fn() -> usize) -> usize {
    for _ in 0..100 {
        let observed = probe();
        if observed >= expected {
            return observed;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    probe()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
