//! Seam between the sync protocol and the hosting service's HTTP API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Credentials;
use crate::util::compact_text;

/// The request never produced a response (DNS, TLS, timeout, reset).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Raw status and body of a hosting API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    pub const fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Human-readable error message from the body, falling back to the status.
    pub fn message(&self) -> String {
        if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(&self.body) {
            if let Some(message) = payload.message.or(payload.error) {
                return message.trim().to_string();
            }
        }

        let trimmed = compact_text(&self.body);
        if trimmed.is_empty() {
            format!("HTTP {}", self.status)
        } else {
            trimmed
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Body of a repository creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRepository {
    pub name: String,
    pub description: String,
    pub private: bool,
    pub auto_init: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_template: Option<String>,
}

/// Body of a file create-or-update request.
///
/// `sha` must be present when replacing an existing file and absent when
/// creating one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutContents {
    pub message: String,
    /// Base64 (standard alphabet) of the file bytes
    pub content: String,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// The parts of a contents lookup the protocol reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentsResponse {
    pub sha: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Authenticated operations against the hosting service.
///
/// Implementations only report transport failures as errors; every HTTP
/// response, including 4xx and 5xx, comes back as an [`ApiReply`].
#[async_trait]
pub trait HostingApi: Send + Sync {
    async fn get_user(&self, auth: &Credentials) -> Result<ApiReply, TransportError>;

    async fn get_repository(
        &self,
        auth: &Credentials,
        owner: &str,
        repository: &str,
    ) -> Result<ApiReply, TransportError>;

    async fn create_repository(
        &self,
        auth: &Credentials,
        request: &CreateRepository,
    ) -> Result<ApiReply, TransportError>;

    async fn get_contents(
        &self,
        auth: &Credentials,
        owner: &str,
        repository: &str,
        path: &str,
        branch: &str,
    ) -> Result<ApiReply, TransportError>;

    async fn put_contents(
        &self,
        auth: &Credentials,
        owner: &str,
        repository: &str,
        path: &str,
        request: &PutContents,
    ) -> Result<ApiReply, TransportError>;
}
