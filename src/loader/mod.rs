//! Resource loading.
//!
//! Maps a batch of heterogeneous [`Resource`]s to decoded [`ImageHandle`]s.
//!
//! # Contract
//!
//! - Every resource in a batch loads concurrently.
//! - The output is index-stable: `out[i]` comes from `resources[i]` no matter
//!   which load finished first.
//! - All-or-nothing: the first failure fails the batch and no partial result
//!   is surfaced.
//! - The [`Initializer`] runs on each locator request before it is loaded. It
//!   never sees blobs or pre-loaded handles.

mod default;

pub use default::{DefaultLoader, LocatorKind};

use async_trait::async_trait;
use futures::future::try_join_all;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::resource::{Blob, ImageHandle, Resource};

/// A locator load that has been constructed but not started yet.
///
/// This is what an [`Initializer`] gets to adjust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorRequest {
    /// The locator string (URL, data URL or path)
    pub locator: String,
    /// Extra request headers (HTTP locators only)
    pub headers: Vec<(String, String)>,
    /// Per-request timeout overriding the loader's default (HTTP locators only)
    pub timeout: Option<Duration>,
}

impl LocatorRequest {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

type InitFn = dyn Fn(&mut LocatorRequest) + Send + Sync;

/// Hook invoked synchronously on every locator request before its load begins.
///
/// The default initializer does nothing.
#[derive(Clone, Default)]
pub struct Initializer(Option<Arc<InitFn>>);

impl Initializer {
    pub fn new(init: impl Fn(&mut LocatorRequest) + Send + Sync + 'static) -> Self {
        Self(Some(Arc::new(init)))
    }

    pub fn is_noop(&self) -> bool {
        self.0.is_none()
    }

    pub fn apply(&self, request: &mut LocatorRequest) {
        if let Some(init) = &self.0 {
            init(request);
        }
    }
}

impl<F> From<F> for Initializer
where
    F: Fn(&mut LocatorRequest) + Send + Sync + 'static,
{
    fn from(init: F) -> Self {
        Self::new(init)
    }
}

impl fmt::Debug for Initializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Initializer(<fn>)"),
            None => f.write_str("Initializer(noop)"),
        }
    }
}

/// Turns locators and blobs into decoded images.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Load an image named by a locator string.
    async fn load_locator(&self, request: LocatorRequest) -> Result<ImageHandle>;

    /// Decode an in-memory blob.
    async fn load_blob(&self, blob: Blob) -> Result<ImageHandle> {
        ImageHandle::decode(blob.bytes(), blob.media_type())
    }
}

/// Load a batch of resources in parallel, preserving input order.
pub async fn load(
    loader: &dyn ResourceLoader,
    resources: Vec<Resource>,
    init: &Initializer,
) -> Result<Vec<ImageHandle>> {
    tracing::debug!(count = resources.len(), "loading resource batch");

    let pending = resources
        .into_iter()
        .map(|resource| load_one(loader, resource, init));

    try_join_all(pending).await
}

async fn load_one(
    loader: &dyn ResourceLoader,
    resource: Resource,
    init: &Initializer,
) -> Result<ImageHandle> {
    match resource {
        Resource::Locator(locator) => {
            let mut request = LocatorRequest::new(locator);
            init.apply(&mut request);
            loader.load_locator(request).await
        }
        Resource::Blob(blob) => loader.load_blob(blob).await,
        Resource::Handle(handle) => Ok(handle),
    }
}
