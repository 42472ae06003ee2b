//! Pixel-level filters used to mangle album covers before compositing.

use image::{Rgba, RgbaImage};

/// Multiply the colour channels by `factor`, leaving alpha alone.
pub fn brighten(img: &RgbaImage, factor: f32) -> RgbaImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = (*channel as f32 * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Rotate counter-clockwise by `degrees` around the centre.
///
/// The output grows to the rotated bounding box; corners not covered by the
/// source are fully transparent. Sampling is nearest-neighbour.
pub fn rotate_expand(img: &RgbaImage, degrees: f64) -> RgbaImage {
    let (w, h) = (img.width() as f64, img.height() as f64);
    let (sin, cos) = degrees.to_radians().sin_cos();

    let out_w = (w * cos.abs() + h * sin.abs()).round().max(1.0) as u32;
    let out_h = (w * sin.abs() + h * cos.abs()).round().max(1.0) as u32;

    let (cx, cy) = (out_w as f64 / 2.0, out_h as f64 / 2.0);

    RgbaImage::from_fn(out_w, out_h, |dx, dy| {
        let x = dx as f64 + 0.5 - cx;
        let y = dy as f64 + 0.5 - cy;

        let sx = (x * cos - y * sin + w / 2.0).floor();
        let sy = (x * sin + y * cos + h / 2.0).floor();

        if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
            *img.get_pixel(sx as u32, sy as u32)
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// Invert every colour channel at or above `threshold`.
///
/// Alpha takes no part in the inversion and comes out unchanged.
pub fn solarize(img: &mut RgbaImage, threshold: u8) {
    for pixel in img.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            if *channel >= threshold {
                *channel = 255 - *channel;
            }
        }
    }
}

/// Alpha-blend `tile` onto `canvas` with its top-left corner at `(x, y)`.
///
/// Each tile pixel contributes `opacity * alpha / 255`; parts that fall
/// outside the canvas are clipped.
pub fn blend_onto(canvas: &mut RgbaImage, tile: &RgbaImage, x: u32, y: u32, opacity: u8) {
    for (tx, ty, src) in tile.enumerate_pixels() {
        let (cx, cy) = (x + tx, y + ty);
        if cx >= canvas.width() || cy >= canvas.height() {
            continue;
        }

        let a = opacity as u32 * src.0[3] as u32 / 255;
        if a == 0 {
            continue;
        }

        let dst = canvas.get_pixel_mut(cx, cy);
        for i in 0..3 {
            dst.0[i] = ((src.0[i] as u32 * a + dst.0[i] as u32 * (255 - a)) / 255) as u8;
        }
        dst.0[3] = (a + dst.0[3] as u32 * (255 - a) / 255).min(255) as u8;
    }
}

/// Strong edge enhancement: 3x3 kernel with 9 in the centre and -1 around it.
///
/// Border pixels reuse their nearest neighbour; alpha is copied through.
pub fn edge_enhance_more(img: &RgbaImage) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }

    RgbaImage::from_fn(w, h, |x, y| {
        let centre = img.get_pixel(x, y);
        let mut acc = [0i32; 3];

        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let sx = (x as i64 + dx).clamp(0, w as i64 - 1) as u32;
                let sy = (y as i64 + dy).clamp(0, h as i64 - 1) as u32;
                let weight = if dx == 0 && dy == 0 { 9 } else { -1 };
                let p = img.get_pixel(sx, sy);
                for (i, sum) in acc.iter_mut().enumerate() {
                    *sum += weight * p.0[i] as i32;
                }
            }
        }

        Rgba([
            acc[0].clamp(0, 255) as u8,
            acc[1].clamp(0, 255) as u8,
            acc[2].clamp(0, 255) as u8,
            centre.0[3],
        ])
    })
}
