use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use super::backend::{AuthContext, BackendError, Collection, DataBackend, RecordId, Role};

/// HTTP adapter for a hosted PostgREST/GoTrue style backend.
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            api_key: api_key.into(),
        }
    }

    pub fn table_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.as_str())
    }

    fn user_url(&self) -> String {
        format!("{}/auth/v1/user", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder, bearer: &str) -> RequestBuilder {
        request.header("apikey", &self.api_key).bearer_auth(bearer)
    }

    async fn send(request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|err| BackendError::Unavailable(err.to_string()))?;
        Self::check(response).await
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = format!("{status}: {body}");
        if status.is_client_error() {
            Err(BackendError::Rejected(detail))
        } else {
            Err(BackendError::Unavailable(detail))
        }
    }

    async fn rows(response: Response) -> Result<Vec<Value>, BackendError> {
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))
    }

    async fn profile_role(&self, user_id: &str, token: &str) -> Result<Role, BackendError> {
        let filter = format!("eq.{user_id}");
        let request = self
            .client
            .get(self.table_url(Collection::Profiles))
            .query(&[("select", "role"), ("id", filter.as_str())]);
        let rows = Self::rows(Self::send(self.authorized(request, token)).await?).await?;

        Ok(rows
            .first()
            .and_then(|row| row.get("role"))
            .and_then(Value::as_str)
            .and_then(Role::parse)
            .unwrap_or(Role::Client))
    }
}

pub(crate) fn record_id_from(row: &Value) -> Option<RecordId> {
    match row.get("id")? {
        Value::String(id) => Some(RecordId(id.clone())),
        Value::Number(id) => Some(RecordId(id.to_string())),
        _ => None,
    }
}

#[async_trait]
impl DataBackend for RestBackend {
    async fn create(&self, collection: Collection, record: Value) -> Result<RecordId, BackendError> {
        let request = self
            .client
            .post(self.table_url(collection))
            .header("Prefer", "return=representation")
            .json(&[record]);
        let rows = Self::rows(Self::send(self.authorized(request, &self.api_key)).await?).await?;

        rows.first()
            .and_then(record_id_from)
            .ok_or_else(|| BackendError::Decode(format!("{collection} insert returned no id")))
    }

    /// Reads with the caller's session so the backend's row policies apply.
    async fn list(
        &self,
        collection: Collection,
        caller: &AuthContext,
    ) -> Result<Vec<Value>, BackendError> {
        let request = self
            .client
            .get(self.table_url(collection))
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        Self::rows(Self::send(self.authorized(request, &caller.token)).await?).await
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<AuthContext>, BackendError> {
        let response = self
            .authorized(self.client.get(self.user_url()), token)
            .send()
            .await
            .map_err(|err| BackendError::Unavailable(err.to_string()))?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }
        let response = Self::check(response).await?;

        let user: Value = response
            .json()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))?;
        let Some(user_id) = user.get("id").and_then(Value::as_str) else {
            return Ok(None);
        };

        let role = self.profile_role(user_id, token).await?;
        Ok(Some(AuthContext {
            user_id: user_id.to_string(),
            role,
            token: token.to_string(),
        }))
    }
}
