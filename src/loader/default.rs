//! The stock [`ResourceLoader`].
//!
//! # Supported locators
//!
//! - `data:<media-type>;base64,<payload>` - decoded in place
//! - `http://...` / `https://...` - fetched with `reqwest`
//! - `file://...` or any other string - read from the filesystem

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::{LocatorRequest, ResourceLoader};
use crate::error::{Result, WatermarkError};
use crate::resource::{data_url, ImageHandle};

/// Default timeout for HTTP fetches.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest locator echoed back in error messages; data URLs can be huge.
const MAX_LOCATOR_IN_ERROR: usize = 64;

/// Where a locator points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorKind {
    DataUrl,
    Http(String),
    File(PathBuf),
}

impl LocatorKind {
    pub fn parse(locator: &str) -> Self {
        if locator.starts_with("data:") {
            LocatorKind::DataUrl
        } else if locator.starts_with("http://") || locator.starts_with("https://") {
            LocatorKind::Http(locator.to_string())
        } else if let Some(path) = locator.strip_prefix("file://") {
            LocatorKind::File(PathBuf::from(path))
        } else {
            LocatorKind::File(PathBuf::from(locator))
        }
    }
}

/// Loads locators from data URLs, HTTP(S) and the local filesystem.
///
/// The HTTP client is built on first use, so constructing a loader never fails.
#[derive(Debug, Default)]
pub struct DefaultLoader {
    http_client: OnceCell<reqwest::Client>,
    timeout: Option<Duration>,
}

impl DefaultLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the default HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn http_client(&self) -> Result<&reqwest::Client> {
        self.http_client
            .get_or_try_init(|| async {
                reqwest::Client::builder()
                    .timeout(self.timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT))
                    .build()
                    .map_err(|e| {
                        WatermarkError::Config(format!("Failed to create HTTP client: {}", e))
                    })
            })
            .await
    }

    async fn fetch_http(&self, url: &str, request: &LocatorRequest) -> Result<ImageHandle> {
        let client = self.http_client().await?;

        let mut builder = client.get(url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| WatermarkError::load(url, format!("HTTP fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WatermarkError::load(
                url,
                format!("HTTP request failed with status: {}", response.status()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WatermarkError::load(url, format!("Failed to read HTTP body: {e}")))?;

        ImageHandle::decode(&bytes, url)
    }

    async fn read_file(&self, path: PathBuf) -> Result<ImageHandle> {
        let display = path.display().to_string();
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| WatermarkError::load(display.as_str(), e))?;

        ImageHandle::decode(&data, &display)
    }
}

#[async_trait]
impl ResourceLoader for DefaultLoader {
    async fn load_locator(&self, request: LocatorRequest) -> Result<ImageHandle> {
        let kind = LocatorKind::parse(&request.locator);
        tracing::debug!(
            locator = %shorten(&request.locator),
            kind = ?kind,
            "loading locator"
        );

        match kind {
            LocatorKind::DataUrl => {
                let parts = data_url::split(&request.locator).ok_or_else(|| {
                    WatermarkError::load(shorten(&request.locator), "malformed data URL")
                })?;
                let bytes = data_url::decode(parts.payload)?;
                ImageHandle::decode(&bytes, parts.media_type)
            }
            LocatorKind::Http(url) => self.fetch_http(&url, &request).await,
            LocatorKind::File(path) => self.read_file(path).await,
        }
    }
}

fn shorten(locator: &str) -> String {
    match locator.char_indices().nth(MAX_LOCATOR_IN_ERROR) {
        Some((idx, _)) => format!("{}...", &locator[..idx]),
        None => locator.to_string(),
    }
}
