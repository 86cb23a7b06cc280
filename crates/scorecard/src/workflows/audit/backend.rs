use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Record collections the audit engine touches on the hosted backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    AuditSubmissions,
    Profiles,
}

impl Collection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuditSubmissions => "audit_submissions",
            Self::Profiles => "profiles",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Client,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "client" => Some(Self::Client),
            _ => None,
        }
    }
}

/// Caller identity resolved once per request and passed explicitly to
/// whichever operation needs it. `token` is the bearer it was resolved
/// from; reads made on the caller's behalf reuse it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    pub user_id: String,
    pub role: Role,
    #[serde(skip)]
    pub token: String,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Hosted auth & data backend: record CRUD plus session resolution.
#[async_trait]
pub trait DataBackend: Send + Sync {
    async fn create(&self, collection: Collection, record: Value) -> Result<RecordId, BackendError>;

    /// Records in the collection visible to `caller`, newest first.
    async fn list(
        &self,
        collection: Collection,
        caller: &AuthContext,
    ) -> Result<Vec<Value>, BackendError>;

    /// `Ok(None)` when the token is unknown or expired.
    async fn resolve_session(&self, token: &str) -> Result<Option<AuthContext>, BackendError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend rejected request: {0}")]
    Rejected(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected backend response: {0}")]
    Decode(String),
}
