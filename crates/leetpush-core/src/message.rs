//! Page ↔ backend message contract and the in-process channel carrying it.
//!
//! The watcher sends a [`Request`] through a [`BackendHandle`] and awaits the
//! [`Response`]; [`serve`] drains the other end one request at a time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::models::SubmissionEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    SubmissionSuccess {
        problem_identifier: String,
        code: String,
        language_tag: String,
    },
    TestConnection,
}

impl From<&SubmissionEvent> for Request {
    fn from(event: &SubmissionEvent) -> Self {
        Self::SubmissionSuccess {
            problem_identifier: event.problem_identifier().to_string(),
            code: event.source_code().to_string(),
            language_tag: event.language_tag().to_string(),
        }
    }
}

/// Result of a `submission_success` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    Success,
    Error { error: String },
}

/// Result of a `test_connection` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionReport {
    pub fn passed(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Submission(SubmissionStatus),
    Connection(ConnectionReport),
}

/// The backend could not be reached or went away before replying.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Backend channel is closed")]
    Closed,
    #[error("Backend dropped the request without replying")]
    NoReply,
}

/// Sends requests to the backend and waits for the reply.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, request: Request) -> Result<Response, ChannelError>;
}

/// Backend side of the channel.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, request: Request) -> Response;
}

struct Envelope {
    request: Request,
    reply: oneshot::Sender<Response>,
}

/// Cloneable sending half of the backend channel.
#[derive(Clone)]
pub struct BackendHandle {
    sender: mpsc::Sender<Envelope>,
}

/// Receiving half of the backend channel, consumed by [`serve`].
pub struct Inbox {
    receiver: mpsc::Receiver<Envelope>,
}

/// Create a bounded request channel.
pub fn channel(capacity: usize) -> (BackendHandle, Inbox) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (BackendHandle { sender }, Inbox { receiver })
}

#[async_trait]
impl Dispatcher for BackendHandle {
    async fn dispatch(&self, request: Request) -> Result<Response, ChannelError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Envelope { request, reply })
            .await
            .map_err(|_| ChannelError::Closed)?;
        response.await.map_err(|_| ChannelError::NoReply)
    }
}

/// Handle requests until every [`BackendHandle`] is dropped.
pub async fn serve<H: RequestHandler>(mut inbox: Inbox, handler: H) {
    while let Some(Envelope { request, reply }) = inbox.receiver.recv().await {
        let response = handler.handle(request).await;
        if reply.send(response).is_err() {
            tracing::debug!("Requester went away before the reply was ready");
        }
    }
    tracing::debug!("Backend channel closed");
}
