//! Optional AI reformatting of solutions before they are pushed.
//!
//! Formatting is best-effort: [`format_or_original`] swallows every failure
//! and hands back the code it was given.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::{compact_text, is_http_url, normalize_text_option, sanitize};

pub const DEFAULT_FORMATTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_FORMATTER_MODEL: &str = "mistralai/devstral-2512:free";
const DEFAULT_FORMATTER_TIMEOUT_SECS: u64 = 60;
const REFERER: &str = "https://github.com";
const TITLE: &str = "leetpush";
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 2000;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Invalid formatter configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Formatter HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Formatter API error: {0}")]
    Api(String),
    #[error("Formatter returned an empty response")]
    Empty,
}

pub type FormatResult<T> = Result<T, FormatError>;

/// Rewrites a solution's layout and comments without changing its logic.
#[async_trait]
pub trait CodeFormatter: Send + Sync {
    async fn format(&self, code: &str, language: &str, problem: &str) -> FormatResult<String>;
}

/// Endpoint and model of the chat-completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterSettings {
    pub base_url: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl Default for FormatterSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FORMATTER_BASE_URL.to_string(),
            model: DEFAULT_FORMATTER_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_FORMATTER_TIMEOUT_SECS),
        }
    }
}

impl FormatterSettings {
    pub fn with_overrides(
        base_url: Option<String>,
        model: Option<String>,
    ) -> FormatResult<Self> {
        let mut settings = Self::default();
        if let Some(url) = normalize_text_option(base_url) {
            if !is_http_url(&url) {
                return Err(FormatError::InvalidConfiguration(
                    "base URL must include http:// or https://".to_string(),
                ));
            }
            settings.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = normalize_text_option(model) {
            settings.model = model;
        }
        Ok(settings)
    }
}

/// OpenRouter chat-completion client.
#[derive(Clone)]
pub struct OpenRouterFormatter {
    api_key: String,
    settings: FormatterSettings,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenRouterFormatter {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("OpenRouterFormatter")
            .field("api_key", &"[REDACTED]")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatErrorBody {
    error: Option<ChatErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ChatErrorDetail {
    message: Option<String>,
}

impl OpenRouterFormatter {
    pub fn new(api_key: impl Into<String>, settings: FormatterSettings) -> FormatResult<Self> {
        let api_key = normalize_text_option(Some(api_key.into())).ok_or_else(|| {
            FormatError::InvalidConfiguration("API key must not be empty".to_string())
        })?;
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            api_key,
            settings,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url)
    }
}

#[async_trait]
impl CodeFormatter for OpenRouterFormatter {
    async fn format(&self, code: &str, language: &str, problem: &str) -> FormatResult<String> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(code, language, problem),
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FormatError::Api(parse_api_error(status, &body)));
        }

        let payload = response.json::<ChatResponse>().await?;
        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .map(|message| message.content)
            .unwrap_or_default();

        let formatted = unwrap_code_fence(&content);
        if formatted.is_empty() {
            return Err(FormatError::Empty);
        }
        Ok(formatted)
    }
}

/// Format with `formatter` when one is configured; on any failure keep `code`.
pub async fn format_or_original(
    formatter: Option<&dyn CodeFormatter>,
    code: &str,
    language: &str,
    problem: &str,
) -> String {
    let Some(formatter) = formatter else {
        return code.to_string();
    };

    match formatter.format(code, language, problem).await {
        Ok(formatted) if !formatted.trim().is_empty() => {
            tracing::info!(problem, "Code formatted");
            formatted
        }
        Ok(_) => {
            tracing::warn!(problem, "Formatter returned empty code, using original");
            code.to_string()
        }
        Err(error) => {
            tracing::warn!(problem, error = %sanitize(&error), "Formatting failed, using original");
            code.to_string()
        }
    }
}

/// Body of the first fenced block, or the whole reply when there is none.
pub fn unwrap_code_fence(reply: &str) -> String {
    code_fence()
        .captures(reply)
        .and_then(|captures| captures.get(1))
        .map_or(reply, |body| body.as_str())
        .trim()
        .to_string()
}

fn code_fence() -> &'static Regex {
    static CODE_FENCE: OnceLock<Regex> = OnceLock::new();
    CODE_FENCE.get_or_init(|| {
        Regex::new(r"```[\w+#-]*[ \t]*\r?\n([\s\S]*?)```").expect("Invalid regex")
    })
}

fn build_prompt(code: &str, language: &str, problem: &str) -> String {
    format!(
        "Reformat this {language} solution to the LeetCode problem \"{problem}\".\n\
         \n\
         Keep the logic, statements, identifiers and signatures exactly as they are.\n\
         Only adjust indentation, spacing and line breaks to the usual {language} style.\n\
         Add a comment block at the top that describes the approach and states the\n\
         time and space complexity, plus short comments on any non-obvious lines.\n\
         Reply with the code only.\n\
         \n\
         ```{language}\n\
         {code}\n\
         ```"
    )
}

fn parse_api_error(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ChatErrorBody>(body) {
        if let Some(message) = payload.error.and_then(|error| error.message) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
