use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use scorecard::config::BackendConfig;
use scorecard::workflows::audit::{
    AuthContext, BackendError, Collection, DataBackend, RecordId, RestBackend, Role,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local backend used when no hosted backend is configured.
/// Records vanish with the process.
#[derive(Default)]
pub(crate) struct InMemoryBackend {
    records: Mutex<HashMap<Collection, Vec<Value>>>,
    tokens: Mutex<HashMap<String, AuthContext>>,
    sequence: AtomicU64,
}

impl InMemoryBackend {
    pub(crate) fn register_token(&self, token: &str, auth: AuthContext) {
        lock(&self.tokens).insert(token.to_string(), auth);
    }

    fn next_id(&self) -> RecordId {
        let value = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        RecordId(format!("audit-{value:06}"))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl DataBackend for InMemoryBackend {
    async fn create(&self, collection: Collection, mut record: Value) -> Result<RecordId, BackendError> {
        let id = self.next_id();
        match record.as_object_mut() {
            Some(fields) => {
                fields.insert("id".to_string(), Value::String(id.0.clone()));
            }
            None => {
                return Err(BackendError::Rejected(format!(
                    "{collection} records must be JSON objects"
                )))
            }
        }
        lock(&self.records).entry(collection).or_default().push(record);
        Ok(id)
    }

    async fn list(
        &self,
        collection: Collection,
        _caller: &AuthContext,
    ) -> Result<Vec<Value>, BackendError> {
        Ok(lock(&self.records)
            .get(&collection)
            .map(|records| records.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<AuthContext>, BackendError> {
        Ok(lock(&self.tokens).get(token).cloned())
    }
}

/// Hosted backend when `BACKEND_URL` is set, otherwise in-memory storage
/// honoring `ADMIN_TOKEN` as the only admin session.
pub(crate) fn build_backend(config: &BackendConfig) -> Arc<dyn DataBackend> {
    if let Some((url, api_key)) = config.rest_credentials() {
        info!(%url, "using hosted data backend");
        return Arc::new(RestBackend::new(url, api_key));
    }

    let backend = InMemoryBackend::default();
    if let Some(token) = &config.admin_token {
        backend.register_token(
            token,
            AuthContext {
                user_id: "local-admin".to_string(),
                role: Role::Admin,
                token: token.clone(),
            },
        );
    }
    info!(
        admin_token = config.admin_token.is_some(),
        "using in-memory data backend"
    );
    Arc::new(backend)
}
