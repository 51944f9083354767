//! gm provider client
//!
//! A small, type-safe HTTP client for reading workflow runs from a CI
//! provider. The [`CiProvider`] trait is the seam the monitor depends on;
//! [`GitHubClient`] implements it against the GitHub Actions REST API.
//!
//! # Example
//!
//! ```no_run
//! use gm_client::{CiProvider, ClientOptions, GitHubClient};
//! use gm_core::domain::target::WatchTarget;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GitHubClient::new(ClientOptions::default().with_token("ghp_..."))?;
//!
//!     let runs = client.fetch_runs(&WatchTarget::new("acme", "api")).await?;
//!     for run in runs {
//!         println!("{} {}", run.name, run.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod provider;
mod runs;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use provider::CiProvider;

use reqwest::{Client, RequestBuilder, Url};
use std::time::Duration;

/// Public GitHub REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// REST API version pinned in every request
pub const API_VERSION: &str = "2022-11-28";

const USER_AGENT: &str = concat!("gm/", env!("CARGO_PKG_VERSION"));

/// Settings for [`GitHubClient`]
#[derive(Clone)]
pub struct ClientOptions {
    /// API base URL (e.g., "https://api.github.com")
    pub base_url: String,

    /// Pre-obtained credential, sent as a bearer token when present
    pub token: Option<String>,

    /// Maximum time to establish a connection
    pub connect_timeout: Duration,

    /// Maximum time to wait on any single read from the connection
    pub read_timeout: Duration,

    /// Number of most recent runs requested per repository
    pub per_page: u8,
}

impl ClientOptions {
    /// Sets the credential
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Points the client at another API endpoint (GitHub Enterprise, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            per_page: 10,
        }
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("per_page", &self.per_page)
            .finish()
    }
}

/// HTTP client for the GitHub Actions API
///
/// One instance is shared by every poll task; `reqwest::Client` pools
/// connections internally, so cloning is cheap.
#[derive(Clone)]
pub struct GitHubClient {
    /// Base URL without a trailing slash
    base_url: String,
    /// `base_url` parsed, for building request paths
    root: Url,
    token: Option<String>,
    per_page: u8,
    /// HTTP client instance
    client: Client,
}

impl GitHubClient {
    /// Create a client with its own connection pool and timeouts
    ///
    /// # Arguments
    /// * `options` - Endpoint, credential, timeouts and page size
    pub fn new(options: ClientOptions) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .read_timeout(options.read_timeout)
            .build()?;

        Self::with_client(options, client)
    }

    /// Create a client around a pre-configured reqwest client
    ///
    /// Timeouts in `options` are ignored; the given client's apply.
    pub fn with_client(options: ClientOptions, client: Client) -> Result<Self> {
        let base_url = options.base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ClientError::InvalidBaseUrl(options.base_url));
        }

        let root = match Url::parse(&base_url) {
            Ok(root) if !root.cannot_be_a_base() => root,
            _ => return Err(ClientError::InvalidBaseUrl(options.base_url)),
        };

        Ok(Self {
            base_url,
            root,
            token: options.token.filter(|token| !token.is_empty()),
            per_page: options.per_page,
            client,
        })
    }

    /// Get the API base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether requests carry a credential
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Build a GET request with the headers every API call needs
    fn get(&self, url: Url) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION);

        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .field("has_token", &self.token.is_some())
            .field("per_page", &self.per_page)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GitHubClient::new(ClientOptions::default()).unwrap();
        assert_eq!(client.base_url(), DEFAULT_API_URL);
        assert!(!client.has_token());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let options = ClientOptions::default().with_base_url("http://localhost:8080/");
        let client = GitHubClient::new(options).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_rejects_invalid_base_url() {
        for base_url in ["localhost:8080", "http://", "https://exa mple.com"] {
            let options = ClientOptions::default().with_base_url(base_url);
            assert!(
                matches!(
                    GitHubClient::new(options),
                    Err(ClientError::InvalidBaseUrl(_))
                ),
                "{}",
                base_url
            );
        }
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let client = GitHubClient::new(ClientOptions::default().with_token("")).unwrap();
        assert!(!client.has_token());
    }

    #[test]
    fn test_debug_redacts_token() {
        let options = ClientOptions::default().with_token("ghp_secret");
        assert!(!format!("{:?}", options).contains("ghp_secret"));

        let client = GitHubClient::new(options).unwrap();
        assert!(!format!("{:?}", client).contains("ghp_secret"));
    }
}
