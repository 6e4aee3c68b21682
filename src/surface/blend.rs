//! Alpha compositing of pixel buffers.

use image::{Rgba, RgbaImage};

/// Blend `source` onto `target` with its top-left corner at `(x, y)`.
///
/// Parts of the source falling outside the target are clipped. `opacity`
/// scales the source alpha on top of its own alpha channel.
pub(crate) fn blend_image(target: &mut RgbaImage, source: &RgbaImage, x: i64, y: i64, opacity: f32) {
    let target_width = i64::from(target.width());
    let target_height = i64::from(target.height());

    // Calculate the visible region (clamp to target bounds)
    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = x.saturating_add(i64::from(source.width())).min(target_width);
    let y_end = y.saturating_add(i64::from(source.height())).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let sx = (tx - x) as u32;
            let sy = (ty - y) as u32;

            let src_pixel = source.get_pixel(sx, sy);
            let dst_pixel = target.get_pixel(tx as u32, ty as u32);

            let blended = blend_pixels(*dst_pixel, *src_pixel, opacity);
            target.put_pixel(tx as u32, ty as u32, blended);
        }
    }
}

/// Blend one pixel at integer coordinates, ignoring out-of-bounds writes.
pub(crate) fn blend_pixel_at(target: &mut RgbaImage, x: i32, y: i32, pixel: Rgba<u8>) {
    if x < 0 || y < 0 || x >= target.width() as i32 || y >= target.height() as i32 {
        return;
    }
    let existing = target.get_pixel(x as u32, y as u32);
    let blended = blend_pixels(*existing, pixel, 1.0);
    target.put_pixel(x as u32, y as u32, blended);
}

/// Blend two pixels using alpha compositing with additional opacity.
///
/// Uses the "over" operator: result = foreground + background * (1 - foreground.alpha)
pub(crate) fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let fg_alpha = (foreground[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0) as u8,
    ])
}
