//! GitHub REST implementation of [`HostingApi`].

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder};

use crate::config::{Credentials, RepoSettings};
use crate::sync::{ApiReply, CreateRepository, HostingApi, PutContents, TransportError};
use crate::util::{is_http_url, sanitize};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = "leetpush";

#[derive(Debug, Clone)]
pub struct GitHubClient {
    base_url: String,
    client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(settings: &RepoSettings) -> Result<Self, TransportError> {
        let base_url = settings.api_base_url.trim().trim_end_matches('/').to_string();
        if !is_http_url(&base_url) {
            return Err(TransportError(
                "API base URL must include http:// or https://".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| TransportError(sanitize(&error)))?;

        Ok(Self { base_url, client })
    }

    fn request(&self, method: Method, path: &str, auth: &Credentials) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&auth.access_token)
            .header(ACCEPT, GITHUB_ACCEPT)
    }

    async fn send(request: RequestBuilder) -> Result<ApiReply, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|error| TransportError(sanitize(&error)))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|error| TransportError(sanitize(&error)))?;
        Ok(ApiReply { status, body })
    }
}

#[async_trait]
impl HostingApi for GitHubClient {
    async fn get_user(&self, auth: &Credentials) -> Result<ApiReply, TransportError> {
        Self::send(self.request(Method::GET, "/user", auth)).await
    }

    async fn get_repository(
        &self,
        auth: &Credentials,
        owner: &str,
        repository: &str,
    ) -> Result<ApiReply, TransportError> {
        let path = repository_path(owner, repository);
        Self::send(self.request(Method::GET, &path, auth)).await
    }

    async fn create_repository(
        &self,
        auth: &Credentials,
        request: &CreateRepository,
    ) -> Result<ApiReply, TransportError> {
        Self::send(self.request(Method::POST, "/user/repos", auth).json(request)).await
    }

    async fn get_contents(
        &self,
        auth: &Credentials,
        owner: &str,
        repository: &str,
        path: &str,
        branch: &str,
    ) -> Result<ApiReply, TransportError> {
        let path = contents_lookup_path(owner, repository, path, branch);
        Self::send(self.request(Method::GET, &path, auth)).await
    }

    async fn put_contents(
        &self,
        auth: &Credentials,
        owner: &str,
        repository: &str,
        path: &str,
        request: &PutContents,
    ) -> Result<ApiReply, TransportError> {
        let path = contents_path(owner, repository, path);
        Self::send(self.request(Method::PUT, &path, auth).json(request)).await
    }
}

fn repository_path(owner: &str, repository: &str) -> String {
    format!(
        "/repos/{}/{}",
        urlencoding::encode(owner),
        urlencoding::encode(repository)
    )
}

/// Contents endpoint for a repository-relative file path; `/` separators are
/// kept, every segment is percent-encoded.
fn contents_path(owner: &str, repository: &str, path: &str) -> String {
    let encoded = path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/contents/{encoded}", repository_path(owner, repository))
}

/// Contents lookup pinned to the branch that writes go to.
fn contents_lookup_path(owner: &str, repository: &str, path: &str, branch: &str) -> String {
    format!(
        "{}?ref={}",
        contents_path(owner, repository, path),
        urlencoding::encode(branch)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_path_keeps_separators() {
        assert_eq!(
            contents_path("octocat", "leetcode", "solutions/two_sum.py"),
            "/repos/octocat/leetcode/contents/solutions/two_sum.py"
        );
        assert_eq!(
            contents_path("octocat", "leetcode", "solutions/c#.cs"),
            "/repos/octocat/leetcode/contents/solutions/c%23.cs"
        );
    }

    #[test]
    fn contents_lookup_carries_branch() {
        assert_eq!(
            contents_lookup_path("octocat", "leetcode", "solutions/two_sum.py", "dev"),
            "/repos/octocat/leetcode/contents/solutions/two_sum.py?ref=dev"
        );
        assert_eq!(
            contents_lookup_path("octocat", "leetcode", "solutions/two_sum.py", "feature/x"),
            "/repos/octocat/leetcode/contents/solutions/two_sum.py?ref=feature%2Fx"
        );
    }

    #[test]
    fn new_rejects_invalid_base_url() {
        let settings = RepoSettings {
            api_base_url: "api.github.com".to_string(),
            ..RepoSettings::default()
        };
        assert!(GitHubClient::new(&settings).is_err());
        assert!(GitHubClient::new(&RepoSettings::default()).is_ok());
    }
}
