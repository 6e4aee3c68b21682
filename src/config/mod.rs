// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Result, WatermarkError};
use crate::loader::{Initializer, ResourceLoader};
use crate::surface::pool::SurfacePool;

/// Default compression quality handed to lossy encoders.
pub const DEFAULT_ENCODER_OPTIONS: f32 = 0.92;

fn default_encoder_options() -> f32 {
    DEFAULT_ENCODER_OPTIONS
}

/// Output encoding of a finished surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/jpeg")]
    Jpeg,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content_type())
    }
}

impl FromStr for OutputFormat {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "image/png" | "png" => Ok(OutputFormat::Png),
            "image/jpeg" | "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            other => Err(WatermarkError::Config(format!(
                "unsupported output type: {} (expected image/png or image/jpeg)",
                other
            ))),
        }
    }
}

/// Pipeline options, merged over defaults.
///
/// The serializable part (`type`, `encoder_options`, `pool_size`) can come from
/// YAML; `init`, `pool` and `loader` are runtime values set through the
/// builder methods.
#[derive(Clone, Serialize, Deserialize)]
pub struct Options {
    /// Called on every locator request before it is loaded.
    #[serde(skip)]
    pub init: Initializer,

    /// Encoding used by terminal operations (default: image/png)
    #[serde(default, rename = "type")]
    pub output_type: OutputFormat,

    /// Compression quality from 0 to 1 (default: 0.92)
    #[serde(default = "default_encoder_options")]
    pub encoder_options: f32,

    /// Maximum number of free surfaces retained by an isolated pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<usize>,

    /// Pool to draw with; overrides `pool_size` when set
    #[serde(skip)]
    pub pool: Option<SurfacePool>,

    /// Loader used to resolve resources (default: `DefaultLoader`)
    #[serde(skip)]
    pub loader: Option<Arc<dyn ResourceLoader>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            init: Initializer::default(),
            output_type: OutputFormat::default(),
            encoder_options: DEFAULT_ENCODER_OPTIONS,
            pool_size: None,
            pool: None,
            loader: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("init", &self.init)
            .field("output_type", &self.output_type)
            .field("encoder_options", &self.encoder_options)
            .field("pool_size", &self.pool_size)
            .field("pool", &self.pool)
            .field("loader", &self.loader.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_init(mut self, init: impl Into<Initializer>) -> Self {
        self.init = init.into();
        self
    }

    pub fn with_type(mut self, output_type: OutputFormat) -> Self {
        self.output_type = output_type;
        self
    }

    pub fn with_encoder_options(mut self, quality: f32) -> Self {
        self.encoder_options = quality;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = Some(pool_size);
        self
    }

    pub fn with_pool(mut self, pool: SurfacePool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// JPEG quality on the encoder's 1..=100 scale.
    pub fn jpeg_quality(&self) -> u8 {
        (self.encoder_options.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// The pool these options ask for, if any.
    ///
    /// An explicit `pool` wins; otherwise a fresh pool capped at `pool_size`.
    /// `None` means the caller picks (the crate root uses the shared default).
    pub fn requested_pool(&self) -> Option<SurfacePool> {
        match (&self.pool, self.pool_size) {
            (Some(pool), _) => Some(pool.clone()),
            (None, Some(size)) => Some(SurfacePool::with_capacity(size)),
            (None, None) => None,
        }
    }

    pub fn from_yaml_with_env(yaml: &str) -> Result<Self> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| WatermarkError::Config(e.to_string()))?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                WatermarkError::Config(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        let options: Options = serde_yaml::from_str(&substituted)
            .map_err(|e| WatermarkError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| WatermarkError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.encoder_options.is_finite() || !(0.0..=1.0).contains(&self.encoder_options) {
            return Err(WatermarkError::Config(format!(
                "encoder_options must be between 0 and 1, got {}",
                self.encoder_options
            )));
        }

        if self.pool.is_none() && self.pool_size == Some(0) {
            tracing::warn!("pool_size is 0: released surfaces will never be reused");
        }

        Ok(())
    }
}
