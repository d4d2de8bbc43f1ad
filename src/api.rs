use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode, Url};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{Clip, ClipPage, ClipQuery, ClipUpdate, NewClip, TagCount};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API base URL '{0}'")]
    BaseUrl(String),
    #[error("failed to reach API: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid request: {0}")]
    Invalid(&'static str),
}

/// The REST collaborator. `ApiClient` talks HTTP; tests substitute recording fakes.
#[async_trait]
pub trait ClipService: Send + Sync {
    async fn list_clips(&self, query: &ClipQuery) -> Result<ClipPage, ApiError>;

    async fn create_clip(&self, clip: &NewClip) -> Result<Clip, ApiError>;

    async fn update_clip(&self, id: i64, update: &ClipUpdate) -> Result<Clip, ApiError>;

    async fn delete_clip(&self, id: i64) -> Result<(), ApiError>;

    async fn list_tags(&self) -> Result<Vec<TagCount>, ApiError>;

    /// Full, unfiltered batch used by every export.
    async fn fetch_export(&self) -> Result<Vec<Clip>, ApiError>;

    /// PDF rendered by the server itself.
    async fn fetch_export_pdf(&self) -> Result<Vec<u8>, ApiError>;

    /// Look one clip up by id. The API has no single-clip route, so this
    /// scans the export batch.
    async fn find_clip(&self, id: i64) -> Result<Option<Clip>, ApiError> {
        let clips = self.fetch_export().await?;
        Ok(clips.into_iter().find(|c| c.id == id))
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = normalize_base(base_url)?;
        let http = Client::builder()
            .user_agent(concat!("clip-saver/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|_| ApiError::BaseUrl(self.base_url.to_string()))
    }

    pub fn build_list_request(&self, query: &ClipQuery) -> Result<reqwest::Request, ApiError> {
        let url = self.endpoint("clips")?;
        Ok(self.http.get(url).query(&query.to_pairs()).build()?)
    }

    pub fn build_create_request(&self, clip: &NewClip) -> Result<reqwest::Request, ApiError> {
        let url = self.endpoint("clips")?;
        Ok(self.http.post(url).json(clip).build()?)
    }

    pub fn build_update_request(
        &self,
        id: i64,
        update: &ClipUpdate,
    ) -> Result<reqwest::Request, ApiError> {
        let url = self.endpoint(&format!("clips/{}", id))?;
        Ok(self.http.put(url).json(update).build()?)
    }

    pub fn build_request(&self, method: Method, path: &str) -> Result<reqwest::Request, ApiError> {
        let url = self.endpoint(path)?;
        Ok(self.http.request(method, url).build()?)
    }

    async fn execute(&self, request: reqwest::Request) -> Result<Response, ApiError> {
        debug!(method=%request.method(), url=%request.url(), "sending api request");
        let res = self.http.execute(request).await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!(%status, %body, "api request failed");
            return Err(ApiError::Status { status, body });
        }
        Ok(res)
    }
}

#[async_trait]
impl ClipService for ApiClient {
    async fn list_clips(&self, query: &ClipQuery) -> Result<ClipPage, ApiError> {
        let request = self.build_list_request(query)?;
        Ok(self.execute(request).await?.json().await?)
    }

    async fn create_clip(&self, clip: &NewClip) -> Result<Clip, ApiError> {
        if clip.title.trim().is_empty() {
            return Err(ApiError::Invalid("title must be non-empty"));
        }
        let request = self.build_create_request(clip)?;
        Ok(self.execute(request).await?.json().await?)
    }

    async fn update_clip(&self, id: i64, update: &ClipUpdate) -> Result<Clip, ApiError> {
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ApiError::Invalid("title cannot be empty"));
        }
        let request = self.build_update_request(id, update)?;
        Ok(self.execute(request).await?.json().await?)
    }

    async fn delete_clip(&self, id: i64) -> Result<(), ApiError> {
        let request = self.build_request(Method::DELETE, &format!("clips/{}", id))?;
        self.execute(request).await?;
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<TagCount>, ApiError> {
        let request = self.build_request(Method::GET, "tags")?;
        Ok(self.execute(request).await?.json().await?)
    }

    async fn fetch_export(&self) -> Result<Vec<Clip>, ApiError> {
        let request = self.build_request(Method::GET, "export")?;
        Ok(self.execute(request).await?.json().await?)
    }

    async fn fetch_export_pdf(&self) -> Result<Vec<u8>, ApiError> {
        let request = self.build_request(Method::GET, "export/pdf")?;
        Ok(self.execute(request).await?.bytes().await?.to_vec())
    }
}

/// `Url::join` replaces the last path segment unless the base ends with `/`,
/// so `http://host/api` must become `http://host/api/`.
fn normalize_base(base_url: &str) -> Result<Url, ApiError> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash).map_err(|_| ApiError::BaseUrl(trimmed.to_string()))
}
