//! Software rasterizer
//!
//! Fills affine-transformed boxes with a half-plane inside test, clears the
//! framebuffer and blits arena-backed bitmaps. Writes are opaque overwrites:
//! nothing here blends with what is already in the buffer.

use super::gamma::GammaTables;
use super::pixel_buffer::{pack_rgba, PixelBuffer};
use crate::math::{BBox2, Transform2, V2};
use crate::memory::Arena;
use crate::texture::Bitmap;

/// Linear-space color, every channel in [0, 1], alpha not premultiplied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const GREEN: Self = Self::rgba(0.0, 1.0, 0.0, 1.0);

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Linear [0, 1] channel to an 8-bit level, rounded
#[inline]
fn quantize(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Owns the conversion tables every draw call needs
pub struct Renderer {
    gamma: GammaTables,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            gamma: GammaTables::default(),
        }
    }

    #[inline]
    pub fn gamma(&self) -> &GammaTables {
        &self.gamma
    }

    /// Premultiply, gamma-encode and pack a linear color
    pub fn encode_color(&self, color: Color) -> u32 {
        let a = color.a.clamp(0.0, 1.0);
        pack_rgba(
            self.gamma.encode(quantize(color.r * a)),
            self.gamma.encode(quantize(color.g * a)),
            self.gamma.encode(quantize(color.b * a)),
            quantize(a),
        )
    }

    /// Fill the whole buffer with one color
    pub fn clear(&self, target: &mut PixelBuffer, color: Color) {
        target.clear(self.encode_color(color));
    }

    /// Fill `local_box` mapped through `transform` into pixel space.
    ///
    /// The box corners become a convex quad. Every integer pixel coordinate in
    /// the quad's clamped bounding rectangle `[floor(min), ceil(max))` is
    /// kept when it lies on the inner side of all four edges. No sub-pixel
    /// coverage, no anti-aliasing. Quads with zero or negative area
    /// (degenerate or mirroring transforms) draw nothing.
    pub fn draw_oriented_box(
        &self,
        target: &mut PixelBuffer,
        transform: &Transform2,
        local_box: &BBox2,
        color: Color,
    ) {
        let corners = local_box.corners().map(|c| transform.apply(c));

        let mut normals = [V2::ZERO; 4];
        for (i, normal) in normals.iter_mut().enumerate() {
            *normal = (corners[(i + 1) % 4] - corners[i]).perp();
        }

        let area = (corners[1] - corners[0]).cross(corners[2] - corners[1]);
        if !(area > 0.0) {
            return;
        }

        let (lo, hi) = corners
            .iter()
            .fold((corners[0], corners[0]), |(lo, hi), &c| (lo.min(c), hi.max(c)));

        let min_x = (lo.x.floor() as i32).max(0);
        let min_y = (lo.y.floor() as i32).max(0);
        let max_x = (hi.x.ceil() as i32).min(target.width() as i32);
        let max_y = (hi.y.ceil() as i32).min(target.height() as i32);
        if min_x >= max_x || min_y >= max_y {
            return;
        }

        let pixel = self.encode_color(color);
        for y in min_y..max_y {
            let span = target.span_mut(y as u32, min_x as u32, max_x as u32);
            for (x, dst) in (min_x..max_x).zip(span.iter_mut()) {
                let p = V2::new(x as f32, y as f32);
                let inside = corners
                    .iter()
                    .zip(normals.iter())
                    .all(|(&corner, &normal)| (p - corner).dot(normal) >= 0.0);
                if inside {
                    *dst = pixel;
                }
            }
        }
    }

    /// Copy a bitmap into the top-left corner of `target`, unscaled.
    ///
    /// Rows or columns that fall outside the target are dropped. A bitmap
    /// whose storage no longer resolves in `arena` is skipped.
    pub fn draw_bitmap(&self, target: &mut PixelBuffer, bitmap: &Bitmap, arena: &Arena) {
        let Some(src) = arena.get(bitmap.pixels()) else {
            return;
        };

        let src_w = bitmap.width() as usize;
        let copy_w = src_w.min(target.width() as usize);
        let copy_h = bitmap.height().min(target.height());

        for row in 0..copy_h {
            let start = row as usize * src_w;
            target.memory_row_mut(row)[..copy_w].copy_from_slice(&src[start..start + copy_w]);
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
