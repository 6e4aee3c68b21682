//! Drawing strategies.
//!
//! A [`Drawer`] mutates a target surface in place from zero or more source
//! surfaces. When the target has no drawing context (zero area) a drawer does
//! nothing; that is not an error.
//!
//! The positional drawers in [`image`] and [`text`] place their content
//! relative to one of five [`Anchor`]s with a fixed [`MARGIN`].

pub mod image;
pub mod text;

use std::fmt;
use std::str::FromStr;

use crate::config::Options;
use crate::encode;
use crate::error::{Result, WatermarkError};
use crate::resource::ImageHandle;
use crate::surface::pool::{SurfaceLease, SurfacePool};
use crate::surface::Surface;

/// Distance in pixels between anchored content and the target's edges.
pub const MARGIN: f32 = 10.0;

/// Opacity used when a drawer is built without an explicit alpha.
pub const DEFAULT_ALPHA: f32 = 1.0;

/// Strategy compositing sources onto a target.
pub trait Drawer: Send + Sync {
    fn draw(&self, target: &mut Surface, sources: &[&Surface]);
}

impl<F> Drawer for F
where
    F: Fn(&mut Surface, &[&Surface]) + Send + Sync,
{
    fn draw(&self, target: &mut Surface, sources: &[&Surface]) {
        self(target, sources)
    }
}

/// Where anchored content goes on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    LowerRight,
    UpperRight,
    LowerLeft,
    UpperLeft,
    Center,
}

impl Anchor {
    pub const ALL: [Anchor; 5] = [
        Anchor::LowerRight,
        Anchor::UpperRight,
        Anchor::LowerLeft,
        Anchor::UpperLeft,
        Anchor::Center,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Anchor::LowerRight => "lower-right",
            Anchor::UpperRight => "upper-right",
            Anchor::LowerLeft => "lower-left",
            Anchor::UpperLeft => "upper-left",
            Anchor::Center => "center",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Anchor {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.to_lowercase().replace('_', "-");
        Anchor::ALL
            .into_iter()
            .find(|anchor| anchor.as_str() == normalized)
            .ok_or_else(|| {
                WatermarkError::Config(format!(
                    "unknown position '{}' (expected one of lower-right, upper-right, lower-left, upper-left, center)",
                    s
                ))
            })
    }
}

pub(crate) fn resolve_alpha(alpha: Option<f32>) -> f32 {
    match alpha {
        Some(a) if a.is_finite() => a.clamp(0.0, 1.0),
        _ => DEFAULT_ALPHA,
    }
}

/// Surfaces produced by one draw step.
///
/// `target` holds the composited pixels; `sources` are the overlays that were
/// drawn onto it. Every lease returns its surface to the pool when dropped.
#[derive(Debug)]
pub struct DrawResult {
    pub target: SurfaceLease,
    pub sources: Vec<SurfaceLease>,
}

impl DrawResult {
    /// Rasterize each handle onto a leased surface and run `drawer` with the
    /// first as target and the rest as sources.
    pub fn compose(
        pool: &SurfacePool,
        handles: &[ImageHandle],
        drawer: &dyn Drawer,
    ) -> Result<Self> {
        let mut leases: Vec<SurfaceLease> = handles
            .iter()
            .map(|handle| {
                let mut lease = pool.lease();
                lease.rasterize(handle);
                lease
            })
            .collect();

        if leases.is_empty() {
            return Err(WatermarkError::NothingToDraw);
        }
        let mut target = leases.remove(0);
        let sources = leases;

        {
            let source_refs: Vec<&Surface> = sources.iter().map(|lease| &**lease).collect();
            drawer.draw(&mut target, &source_refs);
        }

        Ok(Self { target, sources })
    }

    /// Encode the target, release every source and detach the target.
    ///
    /// The target never goes back to the pool. On failure all leases are
    /// dropped, which releases them.
    pub fn finish(self, options: &Options) -> Result<String> {
        let url = encode::to_data_url(&self.target, options)?;

        let released = self.sources.len();
        for source in self.sources {
            source.release();
        }
        let target = self.target.detach();
        tracing::debug!(surface = %target.id(), released, "draw step finished");

        Ok(url)
    }
}
