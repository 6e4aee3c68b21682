//! Drawing surfaces and their canvas-like drawing context.
//!
//! A [`Surface`] is a resizable straight-alpha RGBA8 pixel buffer with a
//! stable identity. Surfaces are meant to be recycled through a
//! [`pool::SurfacePool`]; their content is overwritten on each use.

mod blend;
pub mod pool;
pub mod text;

use image::RgbaImage;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::resource::ImageHandle;
use text::{Color, Font, TextMetrics};

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    fn next() -> Self {
        Self(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Anything whose pixels can be drawn onto a surface.
pub trait Drawable {
    fn pixels(&self) -> &RgbaImage;
}

impl Drawable for RgbaImage {
    fn pixels(&self) -> &RgbaImage {
        self
    }
}

impl Drawable for ImageHandle {
    fn pixels(&self) -> &RgbaImage {
        self.image()
    }
}

/// A mutable rectangular drawing target.
pub struct Surface {
    id: SurfaceId,
    pixels: RgbaImage,
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.id)
            .field("dimensions", &(self.width(), self.height()))
            .finish()
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    /// A new 0×0 surface.
    pub fn new() -> Self {
        Self {
            id: SurfaceId::next(),
            pixels: RgbaImage::new(0, 0),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Resize to `width`×`height` and clear to transparent.
    pub fn set_size(&mut self, width: u32, height: u32) {
        if self.width() == width && self.height() == height {
            self.clear();
        } else {
            self.pixels = RgbaImage::new(width, height);
        }
    }

    /// Clear every pixel to transparent, keeping the size.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Size the surface to `image` and copy its pixels in.
    pub fn rasterize(&mut self, image: &impl Drawable) {
        let source = image.pixels();
        if self.width() == source.width() && self.height() == source.height() {
            self.pixels.copy_from_slice(source.as_raw());
        } else {
            self.pixels = source.clone();
        }
    }

    /// Snapshot of the current pixels as an immutable handle.
    pub fn snapshot(&self) -> ImageHandle {
        ImageHandle::new(self.pixels.clone())
    }

    /// Canvas-like drawing context, or `None` when the surface has no area.
    pub fn context(&mut self) -> Option<DrawingContext<'_>> {
        if self.is_empty() {
            return None;
        }
        Some(DrawingContext {
            pixels: &mut self.pixels,
            state: DrawState::default(),
            saved: Vec::new(),
        })
    }
}

impl Drawable for Surface {
    fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Horizontal anchor of `fill_text`'s x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical anchor of `fill_text`'s y coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    #[default]
    Alphabetic,
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone)]
struct DrawState {
    global_alpha: f32,
    fill_style: Color,
    font: Option<Font>,
    text_align: TextAlign,
    text_baseline: TextBaseline,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            global_alpha: 1.0,
            fill_style: Color::default(),
            font: None,
            text_align: TextAlign::default(),
            text_baseline: TextBaseline::default(),
        }
    }
}

/// Stateful drawing API over a surface's pixels.
///
/// State set through the setters applies to subsequent draw calls until it is
/// changed or a [`restore`](Self::restore) pops it.
pub struct DrawingContext<'a> {
    pixels: &'a mut RgbaImage,
    state: DrawState,
    saved: Vec<DrawState>,
}

impl<'a> DrawingContext<'a> {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn global_alpha(&self) -> f32 {
        self.state.global_alpha
    }

    /// Alpha multiplier for subsequent draws, clamped to `0..=1`.
    pub fn set_global_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() {
            self.state.global_alpha = alpha.clamp(0.0, 1.0);
        }
    }

    pub fn set_fill_style(&mut self, color: Color) {
        self.state.fill_style = color;
    }

    pub fn set_font(&mut self, font: Font) {
        self.state.font = Some(font);
    }

    pub fn set_text_align(&mut self, align: TextAlign) {
        self.state.text_align = align;
    }

    pub fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.state.text_baseline = baseline;
    }

    pub fn save(&mut self) {
        self.saved.push(self.state.clone());
    }

    /// Pop the most recently saved state. Does nothing when nothing was saved.
    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    /// Draw `source` with its top-left corner at `(x, y)`.
    ///
    /// Fractional coordinates are floored to whole pixels.
    pub fn draw_image(&mut self, source: &impl Drawable, x: f32, y: f32) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        blend::blend_image(
            self.pixels,
            source.pixels(),
            x.floor() as i64,
            y.floor() as i64,
            self.state.global_alpha,
        );
    }

    /// Metrics of `text` in the current font; all zero when no font is set.
    pub fn measure_text(&self, text: &str) -> TextMetrics {
        match &self.state.font {
            Some(font) => text::measure(font, text),
            None => TextMetrics::default(),
        }
    }

    /// Fill `text` anchored at `(x, y)` per the current align and baseline.
    ///
    /// Does nothing when no font is set.
    pub fn fill_text(&mut self, content: &str, x: f32, y: f32) {
        let Some(font) = &self.state.font else {
            return;
        };

        let metrics = text::measure(font, content);
        let left = match self.state.text_align {
            TextAlign::Left => x,
            TextAlign::Center => x - metrics.width / 2.0,
            TextAlign::Right => x - metrics.width,
        };
        let baseline = match self.state.text_baseline {
            TextBaseline::Alphabetic => y,
            TextBaseline::Top => y + metrics.ascent,
            TextBaseline::Middle => y + (metrics.ascent + metrics.descent) / 2.0,
            TextBaseline::Bottom => y + metrics.descent,
        };

        text::fill(
            self.pixels,
            font,
            content,
            left,
            baseline,
            self.state.fill_style,
            self.state.global_alpha,
        );
    }
}
