//! Image overlays.
//!
//! Each factory returns a drawer that draws the first source onto the target
//! at a fixed position with the given opacity. Offsets for a target of
//! `tw`×`th` and a mark of `mw`×`mh`:
//!
//! | factory       | x                    | y                    |
//! |---------------|----------------------|----------------------|
//! | `lower_right` | `tw - (mw + 10)`     | `th - (mh + 10)`     |
//! | `upper_right` | `tw - (mw + 10)`     | `10`                 |
//! | `lower_left`  | `10`                 | `th - (mh + 10)`     |
//! | `upper_left`  | `10`                 | `10`                 |
//! | `center`      | `(tw - mw) / 2`      | `(th - mh) / 2`      |

use super::{resolve_alpha, Anchor, Drawer, MARGIN};
use crate::surface::Surface;

/// Draws the first source at an anchored position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageDrawer {
    anchor: Anchor,
    alpha: f32,
}

impl ImageDrawer {
    /// `alpha` is clamped to `0..=1`; `None` or NaN means fully opaque.
    ///
    /// An explicit `Some(0.0)` is kept and draws nothing. Pass `None` for
    /// the opaque default.
    pub fn new(anchor: Anchor, alpha: impl Into<Option<f32>>) -> Self {
        Self {
            anchor,
            alpha: resolve_alpha(alpha.into()),
        }
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl Default for ImageDrawer {
    fn default() -> Self {
        Self::new(Anchor::default(), None)
    }
}

/// Top-left corner of a `mark` sized overlay on a `target` sized surface.
pub fn offset(anchor: Anchor, target: (u32, u32), mark: (u32, u32)) -> (f32, f32) {
    let (tw, th) = (target.0 as f32, target.1 as f32);
    let (mw, mh) = (mark.0 as f32, mark.1 as f32);

    match anchor {
        Anchor::LowerRight => (tw - (mw + MARGIN), th - (mh + MARGIN)),
        Anchor::UpperRight => (tw - (mw + MARGIN), MARGIN),
        Anchor::LowerLeft => (MARGIN, th - (mh + MARGIN)),
        Anchor::UpperLeft => (MARGIN, MARGIN),
        Anchor::Center => ((tw - mw) / 2.0, (th - mh) / 2.0),
    }
}

impl Drawer for ImageDrawer {
    fn draw(&self, target: &mut Surface, sources: &[&Surface]) {
        let Some(mark) = sources.first() else {
            return;
        };
        let (x, y) = offset(
            self.anchor,
            (target.width(), target.height()),
            (mark.width(), mark.height()),
        );

        let Some(mut ctx) = target.context() else {
            return;
        };
        ctx.save();
        ctx.set_global_alpha(self.alpha);
        ctx.draw_image(*mark, x, y);
        ctx.restore();
    }
}

/// Mark in the lower-right corner. See [`ImageDrawer::new`] for how `alpha` is read.
pub fn lower_right(alpha: impl Into<Option<f32>>) -> ImageDrawer {
    ImageDrawer::new(Anchor::LowerRight, alpha)
}

pub fn upper_right(alpha: impl Into<Option<f32>>) -> ImageDrawer {
    ImageDrawer::new(Anchor::UpperRight, alpha)
}

pub fn lower_left(alpha: impl Into<Option<f32>>) -> ImageDrawer {
    ImageDrawer::new(Anchor::LowerLeft, alpha)
}

pub fn upper_left(alpha: impl Into<Option<f32>>) -> ImageDrawer {
    ImageDrawer::new(Anchor::UpperLeft, alpha)
}

pub fn center(alpha: impl Into<Option<f32>>) -> ImageDrawer {
    ImageDrawer::new(Anchor::Center, alpha)
}
