//! The deferred watermark pipeline.
//!
//! A [`Pipeline`] is an immutable value wrapping a re-invokable computation
//! together with the context it was built with (resources, options, pool and
//! loader). Chain methods never touch the receiver; each returns a new
//! pipeline that runs the previous computation and then its own step.
//!
//! Nothing happens until a pipeline is awaited. Every await runs the whole
//! chain again from the first load, so two awaits mean two loads and two
//! draws. Wrap a pipeline with [`Pipeline::memoize`] to share one evaluation.
//!
//! ```no_run
//! use watermark::{style, watermark, Options};
//!
//! # async fn example() -> watermark::Result<()> {
//! let url = watermark(["photo.png"], Options::default())
//!     .load(["logo.png"], None)
//!     .data_url(style::image::lower_right(0.5))
//!     .await?;
//! assert!(url.starts_with("data:image/png;base64,"));
//! # Ok(())
//! # }
//! ```

use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::{Future, IntoFuture};
use std::sync::Arc;

use crate::config::Options;
use crate::error::{Result, WatermarkError};
use crate::loader::{self, DefaultLoader, Initializer, ResourceLoader};
use crate::resource::{data_url, Blob, ImageHandle, Resource};
use crate::style::{DrawResult, Drawer};
use crate::surface::pool::SurfacePool;

type Thunk<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

struct PipelineContext {
    resources: Vec<Resource>,
    options: Options,
    pool: SurfacePool,
    loader: Arc<dyn ResourceLoader>,
}

/// A lazily evaluated, re-runnable chain of load, draw and encode steps.
pub struct Pipeline<T> {
    run: Thunk<T>,
    context: Arc<PipelineContext>,
}

impl<T> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Self {
            run: self.run.clone(),
            context: self.context.clone(),
        }
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("resources", &self.context.resources.len())
            .field("options", &self.context.options)
            .field("pool", &self.context.pool)
            .finish()
    }
}

fn collect_resources<R>(resources: impl IntoIterator<Item = R>) -> Vec<Resource>
where
    R: Into<Resource>,
{
    resources.into_iter().map(Into::into).collect()
}

impl Pipeline<Vec<ImageHandle>> {
    /// Build a pipeline that loads `resources` and draws with `pool`.
    ///
    /// The resources are loaded with `options.loader`, or a [`DefaultLoader`]
    /// when none is set.
    pub fn new<R>(
        resources: impl IntoIterator<Item = R>,
        options: Options,
        pool: SurfacePool,
    ) -> Self
    where
        R: Into<Resource>,
    {
        let loader = options
            .loader
            .clone()
            .unwrap_or_else(|| Arc::new(DefaultLoader::new()));
        let context = Arc::new(PipelineContext {
            resources: collect_resources(resources),
            options,
            pool,
            loader,
        });

        let ctx = context.clone();
        let run: Thunk<Vec<ImageHandle>> = Arc::new(move || {
            let ctx = ctx.clone();
            async move {
                loader::load(&*ctx.loader, ctx.resources.clone(), &ctx.options.init).await
            }
            .boxed()
        });

        Self { run, context }
    }

    /// Load more resources after the ones this pipeline resolves to.
    ///
    /// The result is `previous ++ extra`, in that order.
    ///
    /// `init` runs on the locator requests in `extra`. With `None` the
    /// initializer captured in the pipeline's options is used, so a header set
    /// through `Options::with_init` follows every load of the chain. Pass
    /// `Some(Initializer::default())` to load `extra` with no initializer.
    pub fn load<R>(&self, extra: impl IntoIterator<Item = R>, init: Option<Initializer>) -> Self
    where
        R: Into<Resource>,
    {
        let extra = collect_resources(extra);
        let init = init.unwrap_or_else(|| self.context.options.init.clone());

        self.chain(move |handles, ctx| {
            let mut resources: Vec<Resource> = handles.into_iter().map(Resource::Handle).collect();
            resources.extend(extra.iter().cloned());
            let init = init.clone();
            async move { loader::load(&*ctx.loader, resources, &init).await }
        })
    }

    /// Resolve to the loaded handles without drawing anything.
    pub fn render(&self) -> Self {
        self.chain(|handles, ctx| async move {
            let resources = handles.into_iter().map(Resource::Handle).collect();
            loader::load(&*ctx.loader, resources, &Initializer::default()).await
        })
    }

    /// Draw and encode to a `data:` URL.
    ///
    /// Each handle is rasterized onto a pooled surface; the first is the
    /// target and the rest are handed to `drawer` as sources. Sources go back
    /// to the pool after encoding; the target does not.
    pub fn data_url(&self, drawer: impl Drawer + 'static) -> Pipeline<String> {
        let drawer: Arc<dyn Drawer> = Arc::new(drawer);

        self.chain(move |handles, ctx| {
            let drawer = drawer.clone();
            async move {
                tracing::debug!(surfaces = handles.len(), "drawing pipeline");
                DrawResult::compose(&ctx.pool, &handles, &*drawer)?.finish(&ctx.options)
            }
        })
    }

    /// Draw, encode and return the bytes with their media type.
    pub fn blob(&self, drawer: impl Drawer + 'static) -> Pipeline<Blob> {
        self.data_url(drawer).then(|url| async move {
            data_url::to_blob(&url).ok_or(WatermarkError::MalformedDataUrl)
        })
    }

    /// Draw, encode and decode the result into a new handle.
    pub fn image(&self, drawer: impl Drawer + 'static) -> Pipeline<ImageHandle> {
        self.data_url(drawer)
            .then(|url| async move { ImageHandle::from_data_url(&url) })
    }
}

impl<T: Send + 'static> Pipeline<T> {
    fn chain<U, F, Fut>(&self, step: F) -> Pipeline<U>
    where
        F: Fn(T, Arc<PipelineContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U>> + Send + 'static,
        U: Send + 'static,
    {
        let previous = self.run.clone();
        let step = Arc::new(step);
        let ctx = self.context.clone();

        let run: Thunk<U> = Arc::new(move || {
            let previous = previous.clone();
            let step = step.clone();
            let ctx = ctx.clone();
            async move {
                let value = previous().await?;
                step(value, ctx).await
            }
            .boxed()
        });

        Pipeline {
            run,
            context: self.context.clone(),
        }
    }

    /// Map the resolved value through an async continuation.
    pub fn then<U, F, Fut>(&self, f: F) -> Pipeline<U>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U>> + Send + 'static,
        U: Send + 'static,
    {
        self.chain(move |value, _| f(value))
    }

    /// Start one full evaluation of the chain.
    pub fn run(&self) -> BoxFuture<'static, Result<T>> {
        (self.run)()
    }

    /// Share a single evaluation across every run of the returned pipeline.
    ///
    /// The first await drives the chain; later and concurrent awaits get a
    /// clone of the same outcome, errors included.
    pub fn memoize(&self) -> Self
    where
        T: Clone + Sync,
    {
        let shared = (self.run)().shared();
        Pipeline {
            run: Arc::new(move || shared.clone().boxed()),
            context: self.context.clone(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.context.options
    }

    pub fn pool(&self) -> &SurfacePool {
        &self.context.pool
    }

    /// The resources this pipeline was created with.
    pub fn resources(&self) -> &[Resource] {
        &self.context.resources
    }
}

impl<T: Send + 'static> IntoFuture for Pipeline<T> {
    type Output = Result<T>;
    type IntoFuture = BoxFuture<'static, Result<T>>;

    fn into_future(self) -> Self::IntoFuture {
        self.run()
    }
}

impl<T: Send + 'static> IntoFuture for &Pipeline<T> {
    type Output = Result<T>;
    type IntoFuture = BoxFuture<'static, Result<T>>;

    fn into_future(self) -> Self::IntoFuture {
        self.run()
    }
}
