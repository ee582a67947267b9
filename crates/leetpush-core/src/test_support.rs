//! Hand-written fakes for the collaborator traits.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::time::Instant;

use crate::config::{ConfigError, CredentialStore, Credentials};
use crate::formatter::{CodeFormatter, FormatError, FormatResult};
use crate::message::{ChannelError, Dispatcher, Request, Response, SubmissionStatus};
use crate::page::{EditorModel, Element, PageHost, PageSnapshot};
use crate::sync::{
    ApiReply, CreateRepository, HostingApi, NotificationLevel, Notifier, PutContents,
    TransportError,
};

pub fn credentials() -> Credentials {
    Credentials {
        username: "octocat".to_string(),
        access_token: "ghp_test".to_string(),
        formatter_key: None,
    }
}

pub struct FakeStore(pub Option<Credentials>);

impl CredentialStore for FakeStore {
    fn load_credentials(&self) -> Result<Option<Credentials>, ConfigError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Default)]
pub struct ApiLog {
    pub calls: Vec<String>,
    pub created: Vec<CreateRepository>,
    pub written: Vec<(String, PutContents)>,
}

/// Scripted hosting API. Defaults describe an existing repository without
/// the solution file.
pub struct FakeApi {
    pub user: ApiReply,
    pub repository: ApiReply,
    pub create: ApiReply,
    pub contents: ApiReply,
    pub put: ApiReply,
    pub log: Arc<Mutex<ApiLog>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            user: ApiReply::new(200, r#"{"login":"octocat"}"#),
            repository: ApiReply::new(200, r#"{"full_name":"octocat/leetcode"}"#),
            create: ApiReply::new(201, r#"{"full_name":"octocat/leetcode"}"#),
            contents: ApiReply::new(404, r#"{"message":"Not Found"}"#),
            put: ApiReply::new(201, r#"{"content":{"sha":"new"}}"#),
            log: Arc::default(),
        }
    }
}

impl FakeApi {
    pub fn log(&self) -> Arc<Mutex<ApiLog>> {
        Arc::clone(&self.log)
    }

    pub fn file_reply(sha: &str, content: &str) -> ApiReply {
        let body = serde_json::json!({
            "sha": sha,
            "content": STANDARD.encode(content),
            "encoding": "base64",
        });
        ApiReply::new(200, body.to_string())
    }

    fn record(&self, call: String) {
        self.log.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl HostingApi for FakeApi {
    async fn get_user(&self, _auth: &Credentials) -> Result<ApiReply, TransportError> {
        self.record("get_user".to_string());
        Ok(self.user.clone())
    }

    async fn get_repository(
        &self,
        _auth: &Credentials,
        owner: &str,
        repository: &str,
    ) -> Result<ApiReply, TransportError> {
        self.record(format!("get_repository {owner}/{repository}"));
        Ok(self.repository.clone())
    }

    async fn create_repository(
        &self,
        _auth: &Credentials,
        request: &CreateRepository,
    ) -> Result<ApiReply, TransportError> {
        self.record(format!("create_repository {}", request.name));
        self.log.lock().unwrap().created.push(request.clone());
        Ok(self.create.clone())
    }

    async fn get_contents(
        &self,
        _auth: &Credentials,
        owner: &str,
        repository: &str,
        path: &str,
        branch: &str,
    ) -> Result<ApiReply, TransportError> {
        self.record(format!("get_contents {owner}/{repository}/{path}@{branch}"));
        Ok(self.contents.clone())
    }

    async fn put_contents(
        &self,
        _auth: &Credentials,
        owner: &str,
        repository: &str,
        path: &str,
        request: &PutContents,
    ) -> Result<ApiReply, TransportError> {
        self.record(format!("put_contents {owner}/{repository}/{path}"));
        self.log
            .lock()
            .unwrap()
            .written
            .push((path.to_string(), request.clone()));
        Ok(self.put.clone())
    }
}

pub enum FakeFormatter {
    Prefix(&'static str),
    Fail,
}

#[async_trait]
impl CodeFormatter for FakeFormatter {
    async fn format(&self, code: &str, _language: &str, _problem: &str) -> FormatResult<String> {
        match self {
            Self::Prefix(prefix) => Ok(format!("{prefix}{code}")),
            Self::Fail => Err(FormatError::Api("model overloaded (503)".to_string())),
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<(NotificationLevel, String)>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(NotificationLevel, String)> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}

/// Page host that serves queued snapshots, then repeats `fallback`.
pub struct FakeHost {
    pages: VecDeque<PageSnapshot>,
    fallback: PageSnapshot,
    reads: Arc<Mutex<Vec<Instant>>>,
    attached: Arc<AtomicBool>,
}

impl FakeHost {
    pub fn new(fallback: PageSnapshot) -> Self {
        Self {
            pages: VecDeque::new(),
            fallback,
            reads: Arc::default(),
            attached: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_pages(mut self, pages: impl IntoIterator<Item = PageSnapshot>) -> Self {
        self.pages.extend(pages);
        self
    }

    /// Time of every snapshot read, in order.
    pub fn reads(&self) -> Arc<Mutex<Vec<Instant>>> {
        Arc::clone(&self.reads)
    }

    pub fn attached(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.attached)
    }
}

impl PageHost for FakeHost {
    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn snapshot(&mut self) -> PageSnapshot {
        self.reads.lock().unwrap().push(Instant::now());
        self.pages
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[derive(Clone, Default)]
pub struct FakeDispatcher {
    requests: Arc<Mutex<Vec<Request>>>,
    pub fail: bool,
}

impl FakeDispatcher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dispatcher for FakeDispatcher {
    async fn dispatch(&self, request: Request) -> Result<Response, ChannelError> {
        self.requests.lock().unwrap().push(request);
        if self.fail {
            Err(ChannelError::Closed)
        } else {
            Ok(Response::Submission(SubmissionStatus::Success))
        }
    }
}

/// An accepted submission page for `two-sum`, with `code` in the editor model.
pub fn accepted_page(code: Option<&str>) -> PageSnapshot {
    PageSnapshot {
        url: "https://leetcode.com/problems/two-sum/submissions/".to_string(),
        body_text: "Accepted 63 / 63 testcases passed".to_string(),
        elements: vec![Element {
            tag: "span".to_string(),
            classes: vec!["text-green-500".to_string()],
            text: "Accepted".to_string(),
            ..Default::default()
        }],
        editors: code
            .map(|code| EditorModel {
                value: Some(code.to_string()),
                language_id: None,
            })
            .into_iter()
            .collect(),
        ..Default::default()
    }
}
