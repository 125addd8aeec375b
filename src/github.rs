//! Draft releases on GitHub.
//!
//! Each shipped repository gets a draft release for its new tag. The body is
//! the changelog excerpt for releases and empty for candidates, which are
//! flagged as prereleases.

use std::env;

use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::error::{ReleaseError, Result};

/// Default GitHub API base URL.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "release-tool";

/// Environment variable holding a personal access token.
pub const TOKEN_ENV: &str = "GH_TOKEN";

/// Body of a create-release request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseRequest {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

impl ReleaseRequest {
    /// A draft release titled after its tag
    pub fn draft(tag: impl Into<String>, body: impl Into<String>, prerelease: bool) -> Self {
        let tag = tag.into();
        ReleaseRequest {
            name: tag.clone(),
            tag_name: tag,
            body: body.into(),
            draft: true,
            prerelease,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedRelease {
    html_url: String,
}

/// Somewhere releases can be published to
pub trait ReleasePublisher {
    /// Create a release in `remote` (`owner/repo`).
    ///
    /// # Returns
    /// * `Ok(String)` - URL of the created release
    fn create_release(&self, remote: &str, request: &ReleaseRequest) -> Result<String>;
}

/// GitHub REST implementation of [`ReleasePublisher`]
pub struct GitHubReleases {
    client: Client,
    token: String,
    api_base: String,
}

impl GitHubReleases {
    pub fn new(token: impl Into<String>) -> Self {
        GitHubReleases {
            client: Client::new(),
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Point the client at another API host (GitHub Enterprise, test servers)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn releases_url(&self, remote: &str) -> String {
        format!("{}/repos/{}/releases", self.api_base, remote)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| ReleaseError::remote("GitHub token contains invalid characters"))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }
}

impl ReleasePublisher for GitHubReleases {
    fn create_release(&self, remote: &str, request: &ReleaseRequest) -> Result<String> {
        let url = self.releases_url(remote);
        debug!("POST {} ({})", url, request.tag_name);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .map_err(|e| ReleaseError::remote(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(ReleaseError::remote(format!(
                "creating release {} in {} failed ({}): {}",
                request.tag_name, remote, status, message
            )));
        }

        let created: CreatedRelease = response
            .json()
            .map_err(|e| ReleaseError::remote(format!("Failed to parse response: {}", e)))?;
        info!("created draft release {}", created.html_url);
        Ok(created.html_url)
    }
}

/// Read the token from `GH_TOKEN`, or ask for it with hidden input.
pub fn resolve_token() -> Result<String> {
    if let Some(token) = token_from_env() {
        return Ok(token);
    }

    println!(
        "Please enter your GitHub personal access token.\n\
         You can also set the {} environment variable to skip this prompt.",
        TOKEN_ENV
    );
    let token = rpassword::prompt_password("token: ")?;
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(ReleaseError::remote("Token cannot be empty"));
    }
    Ok(token)
}

fn token_from_env() -> Option<String> {
    env::var(TOKEN_ENV)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
