//! GitHub REST implementation of the release store.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::store::ReleaseStore;
use super::types::{Asset, Release, ReleaseSpec};
use crate::error::{CliError, ConfigError, ReleaseError, RemoteError, Result};

/// Public GitHub API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com/";

/// Deadline for establishing a connection to the API or upload host
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size for list endpoints (GitHub maximum)
const PER_PAGE: &str = "100";

/// One-time initialization guard for the rustls crypto provider
static RUSTLS_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Release store backed by the GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: Url,
    owner: String,
    repo: String,
}

impl GitHubClient {
    /// Create a client for `owner/repo` against `api_url`
    pub fn new(owner: &str, repo: &str, token: &str, api_url: &str) -> Result<Self> {
        RUSTLS_INITIALIZED.get_or_init(|| {
            if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
                log::debug!("rustls crypto provider already installed: {:?}", e);
            }
        });

        if owner.is_empty() {
            return Err(ConfigError::OwnerNotFound {
                reason: "missing GitHub repository owner".to_string(),
            }
            .into());
        }
        if repo.is_empty() {
            return Err(ConfigError::RepoNotFound {
                reason: "missing GitHub repository name".to_string(),
            }
            .into());
        }
        if token.is_empty() {
            return Err(ConfigError::TokenNotFound.into());
        }

        let api_url = parse_api_url(api_url)?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            ReleaseError::Cli(CliError::InvalidArguments {
                reason: "GitHub token contains characters not allowed in an HTTP header"
                    .to_string(),
            })
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        let http = reqwest::Client::builder()
            .user_agent(concat!("kodegen_ghr/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                ReleaseError::Cli(CliError::ExecutionFailed {
                    command: "github_client_init".to_string(),
                    reason: e.to_string(),
                })
            })?;

        log::debug!("GitHub API: {} ({}/{})", api_url, owner, repo);

        Ok(Self {
            http,
            api_url,
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Build `{api}/repos/{owner}/{repo}/{segments...}` with each segment escaped
    fn repo_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| ConfigError::InvalidApiUrl {
                url: self.api_url.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?;
            path.pop_if_empty();
            path.extend(["repos", self.owner.as_str(), self.repo.as_str()]);
            path.extend(segments);
        }
        Ok(url)
    }

    /// Fetch every page of a list endpoint by following `Link: rel="next"`
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        mut url: Url,
        operation: &str,
    ) -> Result<Vec<T>> {
        url.query_pairs_mut().append_pair("per_page", PER_PAGE);

        let mut items = Vec::new();
        let mut page = 1;
        loop {
            log::debug!("{}: fetching page {} ({})", operation, page, url);
            let response = self.http.get(url.clone()).send().await?;
            if response.status() != StatusCode::OK {
                return Err(status_error(response, operation).await.into());
            }

            let next = next_page_url(response.headers());
            let batch: Vec<T> = decode(response, operation).await?;
            items.extend(batch);

            match next {
                Some(next) if next != url => {
                    url = next;
                    page += 1;
                }
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl ReleaseStore for GitHubClient {
    async fn create_release(&self, spec: &ReleaseSpec) -> Result<Release> {
        let operation = "create release";
        let url = self.repo_url(&["releases"])?;

        let response = self.http.post(url).json(spec).send().await?;
        if response.status() != StatusCode::CREATED {
            return Err(status_error(response, operation).await.into());
        }

        decode(response, operation).await
    }

    async fn get_release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        let operation = "get release by tag";
        let mut segments = vec!["releases", "tags"];
        segments.extend(tag.split('/'));
        let url = self.repo_url(&segments)?;

        let response = self.http.get(url).send().await?;
        match response.status() {
            StatusCode::OK => decode(response, operation).await.map(Some),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(status_error(response, operation).await.into()),
        }
    }

    async fn delete_release(&self, release_id: u64) -> Result<()> {
        let id = release_id.to_string();
        let url = self.repo_url(&["releases", &id])?;

        let response = self.http.delete(url).send().await?;
        if response.status() != StatusCode::NO_CONTENT {
            return Err(status_error(response, "delete release").await.into());
        }
        Ok(())
    }

    async fn delete_tag(&self, tag: &str) -> Result<()> {
        let mut segments = vec!["git", "refs", "tags"];
        segments.extend(tag.split('/'));
        let url = self.repo_url(&segments)?;

        let response = self.http.delete(url).send().await?;
        if response.status() != StatusCode::NO_CONTENT {
            return Err(status_error(response, "delete tag").await.into());
        }
        Ok(())
    }

    async fn upload_asset(&self, release: &Release, path: &Path) -> Result<Asset> {
        let operation = "upload release asset";
        let name = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
            ReleaseError::Cli(CliError::InvalidArguments {
                reason: format!("Invalid asset filename: {:?}", path),
            })
        })?;

        let mut url = upload_endpoint(&release.upload_url)?;
        url.query_pairs_mut().append_pair("name", name);

        // Reopened on every attempt so a retry streams the file from the start
        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(tokio_util::io::ReaderStream::new(file));

        let response = self
            .http
            .post(url)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(header::CONTENT_LENGTH, size)
            .body(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => decode(response, operation).await,
            StatusCode::UNPROCESSABLE_ENTITY => Err(RemoteError::Conflict {
                operation: operation.to_string(),
                status: response.status().to_string(),
                hint: "asset likely already exists".to_string(),
            }
            .into()),
            _ => Err(status_error(response, operation).await.into()),
        }
    }

    async fn delete_asset(&self, asset_id: u64) -> Result<()> {
        let id = asset_id.to_string();
        let url = self.repo_url(&["releases", "assets", &id])?;

        let response = self.http.delete(url).send().await?;
        if response.status() != StatusCode::NO_CONTENT {
            return Err(status_error(response, "delete release asset").await.into());
        }
        Ok(())
    }

    async fn list_assets(&self, release_id: u64) -> Result<Vec<Asset>> {
        let id = release_id.to_string();
        let url = self.repo_url(&["releases", &id, "assets"])?;
        self.get_paginated(url, "list release assets").await
    }

    async fn publish_release(&self, release_id: u64) -> Result<Release> {
        let operation = "publish release";
        let id = release_id.to_string();
        let url = self.repo_url(&["releases", &id])?;

        let response = self
            .http
            .patch(url)
            .json(&serde_json::json!({ "draft": false }))
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(status_error(response, operation).await.into());
        }

        decode(response, operation).await
    }

    async fn list_releases(&self) -> Result<Vec<Release>> {
        let url = self.repo_url(&["releases"])?;
        self.get_paginated(url, "list releases").await
    }
}

/// Parse the API base URL, normalizing it to end with `/`
fn parse_api_url(raw: &str) -> Result<Url> {
    let invalid = |reason: String| ConfigError::InvalidApiUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an http(s) URL".to_string()).into());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Strip the RFC 6570 template suffix from a release `upload_url`
fn upload_endpoint(upload_url: &str) -> Result<Url> {
    let base = upload_url.split('{').next().unwrap_or(upload_url);
    Url::parse(base).map_err(|e| {
        RemoteError::Decode {
            operation: "parse upload URL".to_string(),
            reason: format!("'{}': {}", upload_url, e),
        }
        .into()
    })
}

/// Extract the `rel="next"` target from a `Link` header
fn next_page_url(headers: &HeaderMap) -> Option<Url> {
    let link = headers.get(header::LINK)?.to_str().ok()?;

    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|param| param.trim().replace(' ', "") == "rel=\"next\"");
        if !is_next {
            return None;
        }
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Url::parse(target).ok()
    })
}

/// Decode a JSON response body
async fn decode<T: DeserializeOwned>(response: Response, operation: &str) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        RemoteError::Decode {
            operation: operation.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Classify an unexpected response, keeping the status line and GitHub's message
async fn status_error(response: Response, operation: &str) -> RemoteError {
    let status = response.status();
    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body.get("message").and_then(|m| m.as_str()).map(String::from));

    let status_line = match message {
        Some(message) => format!("{} ({})", status, message),
        None => status.to_string(),
    };

    classify_status(status, status_line, operation)
}

fn classify_status(status: StatusCode, status_line: String, operation: &str) -> RemoteError {
    let operation = operation.to_string();
    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound {
            what: format!("{} ({})", operation, status_line),
        },
        StatusCode::UNPROCESSABLE_ENTITY => RemoteError::Conflict {
            operation,
            status: status_line,
            hint: "validation failed, the resource likely already exists".to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => RemoteError::Transient {
            operation,
            reason: status_line,
        },
        s if s.is_server_error() => RemoteError::Transient {
            operation,
            reason: status_line,
        },
        _ => RemoteError::Status {
            operation,
            status: status_line,
        },
    }
}
