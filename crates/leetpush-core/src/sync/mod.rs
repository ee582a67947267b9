//! Remote sync protocol.
//!
//! One run per accepted submission: make sure the repository exists, format
//! the code, look up the current file, then create or update it. Every run
//! ends with a user notification.

mod api;
mod error;

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub use api::{
    ApiReply, ContentsResponse, CreateRepository, HostingApi, PutContents, TransportError,
};
pub use error::{SyncError, SyncResult};

use crate::config::{CredentialStore, Credentials, RepoSettings};
use crate::formatter::{format_or_original, CodeFormatter, FormatterSettings, OpenRouterFormatter};
use crate::language::extension_for;
use crate::message::{ConnectionReport, Request, RequestHandler, Response, SubmissionStatus};
use crate::models::{RemoteFile, SubmissionEvent};
use crate::util::sanitize;

const SOLUTIONS_DIR: &str = "solutions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// User-facing notification sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotificationLevel, message: &str);
}

/// What a successful sync did to the remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Created { path: String },
    Updated { path: String },
    /// Remote content already matched; nothing was written.
    Unchanged { path: String },
}

impl SyncOutcome {
    pub fn path(&self) -> &str {
        match self {
            Self::Created { path } | Self::Updated { path } | Self::Unchanged { path } => path,
        }
    }
}

/// Repository-relative path of a solution file.
pub fn solution_path(problem_identifier: &str, language_tag: &str) -> String {
    format!(
        "{SOLUTIONS_DIR}/{problem_identifier}.{}",
        extension_for(language_tag)
    )
}

pub struct SyncService<A, S, N> {
    api: A,
    store: S,
    notifier: N,
    settings: RepoSettings,
    formatter_settings: FormatterSettings,
    formatter: Option<Arc<dyn CodeFormatter>>,
}

impl<A, S, N> SyncService<A, S, N>
where
    A: HostingApi,
    S: CredentialStore,
    N: Notifier,
{
    pub fn new(api: A, store: S, notifier: N, settings: RepoSettings) -> Self {
        Self {
            api,
            store,
            notifier,
            settings,
            formatter_settings: FormatterSettings::default(),
            formatter: None,
        }
    }

    /// Endpoint and model used when the credentials carry a formatter key.
    #[must_use]
    pub fn with_formatter_settings(mut self, settings: FormatterSettings) -> Self {
        self.formatter_settings = settings;
        self
    }

    /// Use `formatter` regardless of the configured formatter key.
    #[must_use]
    pub fn with_formatter(mut self, formatter: Arc<dyn CodeFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub const fn settings(&self) -> &RepoSettings {
        &self.settings
    }

    /// Push one accepted solution and notify the user about the result.
    pub async fn sync_solution(&self, event: &SubmissionEvent) -> SyncResult<SyncOutcome> {
        let problem = event.problem_identifier();
        match self.push(event).await {
            Ok(outcome) => {
                tracing::info!(problem, path = outcome.path(), ?outcome, "Solution synced");
                let message = match outcome {
                    SyncOutcome::Unchanged { .. } => {
                        format!("{problem} is already up to date on GitHub")
                    }
                    SyncOutcome::Created { .. } | SyncOutcome::Updated { .. } => {
                        format!("Successfully pushed {problem} to GitHub!")
                    }
                };
                self.notifier.notify(NotificationLevel::Success, &message);
                Ok(outcome)
            }
            Err(error) => {
                tracing::error!(problem, error = %error, "Sync failed");
                self.notifier.notify(
                    NotificationLevel::Error,
                    &format!("Failed to push to GitHub: {error}"),
                );
                Err(error)
            }
        }
    }

    /// Check the token and repository access without writing anything.
    pub async fn test_connection(&self) -> ConnectionReport {
        let credentials = match self.store.load_credentials() {
            Ok(Some(credentials)) => credentials,
            Ok(None) => return ConnectionReport::failed("GitHub credentials not configured"),
            Err(error) => return ConnectionReport::failed(error.to_string()),
        };

        let user = match self.api.get_user(&credentials).await {
            Ok(reply) => reply,
            Err(error) => return ConnectionReport::failed(SyncError::from(error).to_string()),
        };
        if !user.is_success() {
            if user.status == 401 {
                return ConnectionReport::failed(SyncError::InvalidToken.to_string());
            }
            return ConnectionReport::failed(format!(
                "Token validation failed: {} {}",
                user.status,
                user.message()
            ));
        }

        let repository = &self.settings.repository;
        let reply = match self
            .api
            .get_repository(&credentials, &credentials.username, repository)
            .await
        {
            Ok(reply) => reply,
            Err(error) => return ConnectionReport::failed(SyncError::from(error).to_string()),
        };
        if reply.is_success() {
            return ConnectionReport::passed("Connection successful! Repository is accessible.");
        }

        let message = reply.message();
        let error = match reply.status {
            404 => format!(
                "Repository \"{repository}\" not found. It is created on the first push, or create it at https://github.com/new"
            ),
            403 if message.contains("Resource not accessible") => {
                "Token does not have \"repo\" scope. Please regenerate your token with \"repo\" permissions."
                    .to_string()
            }
            403 => format!("Access denied: {message}. Check token permissions."),
            401 => "Invalid or expired token. Please regenerate your token.".to_string(),
            _ => SyncError::from_reply(&reply, "access the repository", repository).to_string(),
        };
        ConnectionReport::failed(error)
    }

    async fn push(&self, event: &SubmissionEvent) -> SyncResult<SyncOutcome> {
        let credentials = self
            .store
            .load_credentials()?
            .ok_or(SyncError::NotConfigured)?;
        self.ensure_repository(&credentials).await?;

        let problem = event.problem_identifier();
        let language = event.language_tag();
        let formatter = self.formatter_for(&credentials);
        let code = format_or_original(formatter.as_deref(), event.source_code(), language, problem)
            .await;

        let path = solution_path(problem, language);
        let existing = self.fetch_file(&credentials, &path).await?;
        if existing
            .as_ref()
            .is_some_and(|file| file.has_content(code.as_bytes()))
        {
            tracing::info!(path = %path, "Remote file already up to date");
            return Ok(SyncOutcome::Unchanged { path });
        }

        let revision = existing.and_then(|file| file.revision);
        let message = if revision.is_some() {
            format!("Update solution for {problem}")
        } else {
            format!("Add solution for {problem}")
        };
        let request = PutContents {
            message,
            content: STANDARD.encode(code.as_bytes()),
            branch: self.settings.branch.clone(),
            sha: revision,
        };

        tracing::info!(path = %path, update = request.sha.is_some(), "Uploading solution");
        let reply = self
            .api
            .put_contents(
                &credentials,
                &credentials.username,
                &self.settings.repository,
                &path,
                &request,
            )
            .await?;
        if !reply.is_success() {
            return Err(SyncError::from_reply(
                &reply,
                "write to the repository",
                &self.settings.repository,
            ));
        }

        Ok(if request.sha.is_some() {
            SyncOutcome::Updated { path }
        } else {
            SyncOutcome::Created { path }
        })
    }

    async fn ensure_repository(&self, credentials: &Credentials) -> SyncResult<()> {
        let repository = &self.settings.repository;
        let reply = self
            .api
            .get_repository(credentials, &credentials.username, repository)
            .await?;
        if reply.is_success() {
            tracing::debug!(repository = %repository, "Repository exists");
            return Ok(());
        }
        if !reply.is_not_found() {
            return Err(SyncError::from_reply(
                &reply,
                "access the repository",
                repository,
            ));
        }

        tracing::info!(repository = %repository, "Repository not found, creating it");
        let request = CreateRepository {
            name: repository.clone(),
            description: self.settings.description.clone(),
            private: self.settings.private,
            auto_init: true,
            license_template: self.settings.license_template.clone(),
        };
        let reply = self.api.create_repository(credentials, &request).await?;
        if reply.is_success() {
            tracing::info!(repository = %repository, "Repository created");
            return Ok(());
        }

        match reply.status {
            422 if reply.body.contains("already exists") => {
                tracing::info!(repository = %repository, "Repository already exists, continuing");
                Ok(())
            }
            422 => Err(SyncError::RepositoryCreation(reply.message())),
            401 | 403 => Err(SyncError::InsufficientScope(
                "create repositories".to_string(),
            )),
            status => Err(SyncError::Api {
                status,
                message: reply.message(),
            }),
        }
    }

    async fn fetch_file(
        &self,
        credentials: &Credentials,
        path: &str,
    ) -> SyncResult<Option<RemoteFile>> {
        let reply = self
            .api
            .get_contents(
                credentials,
                &credentials.username,
                &self.settings.repository,
                path,
                &self.settings.branch,
            )
            .await?;
        if reply.is_not_found() {
            tracing::debug!(path, "File does not exist yet");
            return Ok(None);
        }
        if !reply.is_success() {
            return Err(SyncError::from_reply(
                &reply,
                "read the repository",
                &self.settings.repository,
            ));
        }

        let payload = reply
            .json::<ContentsResponse>()
            .map_err(|error| SyncError::InvalidPayload(sanitize(&error)))?;
        let content = decode_content(payload.content.as_deref().unwrap_or_default())?;
        Ok(Some(RemoteFile {
            path: path.to_string(),
            content,
            revision: Some(payload.sha),
        }))
    }

    fn formatter_for(&self, credentials: &Credentials) -> Option<Arc<dyn CodeFormatter>> {
        if let Some(formatter) = &self.formatter {
            return Some(Arc::clone(formatter));
        }

        let key = credentials.formatter_key.as_deref()?;
        match OpenRouterFormatter::new(key, self.formatter_settings.clone()) {
            Ok(formatter) => Some(Arc::new(formatter)),
            Err(error) => {
                tracing::warn!(error = %sanitize(&error), "Formatter unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl<A, S, N> RequestHandler for SyncService<A, S, N>
where
    A: HostingApi,
    S: CredentialStore,
    N: Notifier,
{
    async fn handle(&self, request: Request) -> Response {
        match request {
            Request::SubmissionSuccess {
                problem_identifier,
                code,
                language_tag,
            } => {
                let status = match SubmissionEvent::new(problem_identifier, code, &language_tag) {
                    Ok(event) => match self.sync_solution(&event).await {
                        Ok(_) => SubmissionStatus::Success,
                        Err(error) => SubmissionStatus::Error {
                            error: error.to_string(),
                        },
                    },
                    Err(error) => SubmissionStatus::Error {
                        error: error.to_string(),
                    },
                };
                Response::Submission(status)
            }
            Request::TestConnection => Response::Connection(self.test_connection().await),
        }
    }
}

/// Decode a contents payload; the API wraps base64 at 60 columns.
fn decode_content(encoded: &str) -> SyncResult<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|error| SyncError::InvalidPayload(sanitize(&error)))
}
