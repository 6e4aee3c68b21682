//! Text overlays.
//!
//! x is derived from the measured text width; y is an alphabetic baseline.
//! Font ascent/descent metrics vary too much between faces to place text
//! vertically from them alone, so the corner drawers take an optional manual
//! baseline (`y`) that replaces the default.
//!
//! | factory       | x                  | baseline            |
//! |---------------|--------------------|---------------------|
//! | `lower_right` | `tw - (width + 10)`| `y` or `th - 10`    |
//! | `upper_right` | `tw - (width + 10)`| `y` or `20`         |
//! | `lower_left`  | `10`               | `y` or `th - 10`    |
//! | `upper_left`  | `10`               | `y` or `20`         |
//! | `center`      | centered on `tw/2` | middle at `th / 2`  |
//!
//! A `y` of `Some(0.0)` is a real baseline at the top edge, not a request for
//! the default; only `None` selects the default. Likewise an `alpha` of
//! `Some(0.0)` draws nothing, while `None` draws fully opaque.

use super::{resolve_alpha, Anchor, Drawer, MARGIN};
use crate::surface::text::{Color, Font};
use crate::surface::{Surface, TextAlign, TextBaseline};

/// Default baseline of text anchored to the top edge.
pub const UPPER_BASELINE: f32 = 20.0;

/// Writes a line of text at an anchored position.
#[derive(Debug, Clone)]
pub struct TextDrawer {
    anchor: Anchor,
    text: String,
    font: Font,
    fill_style: Color,
    alpha: f32,
    y: Option<f32>,
}

impl TextDrawer {
    /// `alpha` follows [`ImageDrawer::new`](super::image::ImageDrawer::new);
    /// `y` replaces the default baseline whenever it is `Some`, zero included.
    pub fn new(
        anchor: Anchor,
        text: impl Into<String>,
        font: Font,
        fill_style: Color,
        alpha: impl Into<Option<f32>>,
        y: Option<f32>,
    ) -> Self {
        Self {
            anchor,
            text: text.into(),
            font,
            fill_style,
            alpha: resolve_alpha(alpha.into()),
            y,
        }
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

/// Anchor point handed to `fill_text`, plus the align/baseline it is meant for.
pub(crate) fn placement(
    anchor: Anchor,
    target: (u32, u32),
    text_width: f32,
    y: Option<f32>,
) -> (f32, f32, TextAlign, TextBaseline) {
    let (tw, th) = (target.0 as f32, target.1 as f32);
    let right = tw - (text_width + MARGIN);
    let lower = th - MARGIN;

    match anchor {
        Anchor::LowerRight => (right, y.unwrap_or(lower), TextAlign::Left, TextBaseline::Alphabetic),
        Anchor::UpperRight => (right, y.unwrap_or(UPPER_BASELINE), TextAlign::Left, TextBaseline::Alphabetic),
        Anchor::LowerLeft => (MARGIN, y.unwrap_or(lower), TextAlign::Left, TextBaseline::Alphabetic),
        Anchor::UpperLeft => (MARGIN, y.unwrap_or(UPPER_BASELINE), TextAlign::Left, TextBaseline::Alphabetic),
        Anchor::Center => (tw / 2.0, th / 2.0, TextAlign::Center, TextBaseline::Middle),
    }
}

impl Drawer for TextDrawer {
    fn draw(&self, target: &mut Surface, _sources: &[&Surface]) {
        let size = (target.width(), target.height());
        let Some(mut ctx) = target.context() else {
            return;
        };

        ctx.save();
        ctx.set_global_alpha(self.alpha);
        ctx.set_fill_style(self.fill_style);
        ctx.set_font(self.font.clone());

        let metrics = ctx.measure_text(&self.text);
        let (x, y, align, baseline) = placement(self.anchor, size, metrics.width, self.y);
        ctx.set_text_align(align);
        ctx.set_text_baseline(baseline);
        ctx.fill_text(&self.text, x, y);

        ctx.restore();
    }
}

pub fn lower_right(
    text: impl Into<String>,
    font: Font,
    fill_style: Color,
    alpha: impl Into<Option<f32>>,
    y: Option<f32>,
) -> TextDrawer {
    TextDrawer::new(Anchor::LowerRight, text, font, fill_style, alpha, y)
}

pub fn upper_right(
    text: impl Into<String>,
    font: Font,
    fill_style: Color,
    alpha: impl Into<Option<f32>>,
    y: Option<f32>,
) -> TextDrawer {
    TextDrawer::new(Anchor::UpperRight, text, font, fill_style, alpha, y)
}

pub fn lower_left(
    text: impl Into<String>,
    font: Font,
    fill_style: Color,
    alpha: impl Into<Option<f32>>,
    y: Option<f32>,
) -> TextDrawer {
    TextDrawer::new(Anchor::LowerLeft, text, font, fill_style, alpha, y)
}

pub fn upper_left(
    text: impl Into<String>,
    font: Font,
    fill_style: Color,
    alpha: impl Into<Option<f32>>,
    y: Option<f32>,
) -> TextDrawer {
    TextDrawer::new(Anchor::UpperLeft, text, font, fill_style, alpha, y)
}

/// Centered text. `y` is accepted for symmetry and ignored.
pub fn center(
    text: impl Into<String>,
    font: Font,
    fill_style: Color,
    alpha: impl Into<Option<f32>>,
    y: Option<f32>,
) -> TextDrawer {
    TextDrawer::new(Anchor::Center, text, font, fill_style, alpha, y)
}
