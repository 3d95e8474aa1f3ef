//! Software raster canvas used as the rendering handle for sketches.
//!
//! The drawing engine is deliberately small: fill/stroke state, axis-aligned
//! rectangles with src-over alpha blending, and raw pixel access. It renders
//! into an RGBA8 buffer so sketches run headless and tests can assert pixels.

use serde::{Deserialize, Serialize};

/// An RGBA color with 8-bit channels. This is the handle-native color type:
/// stored Color parameters yield one of these, and all canvas state uses it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn gray(v: u8) -> Self {
        Self::new(v, v, v, 255)
    }

    /// Build a color from unclamped integer channels. Channels are clamped to
    /// [0, 255] on write.
    pub fn from_clamped(r: i64, g: i64, b: i64, a: i64) -> Self {
        let clamp = |v: i64| v.clamp(0, 255) as u8;
        Self::new(clamp(r), clamp(g), clamp(b), clamp(a))
    }

    /// Scale the alpha channel by `mult / 255`, leaving color channels alone.
    pub fn scale_alpha(self, mult: u8) -> Self {
        let a = (self.a as u32 * mult as u32 / 255) as u8;
        Self { a, ..self }
    }
}

/// Stroke state: color plus pen weight in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgba,
    pub weight: f32,
}

/// Largest allowed surface dimension. Size requests clamp to this, keeping
/// buffer allocation and pixel indexing safely inside `usize`.
pub const MAX_DIM: u32 = 4096;

fn buffer_for(width: u32, height: u32) -> Vec<u8> {
    vec![0; width as usize * height as usize * 4]
}

/// 2D raster surface with p5-style fill/stroke state.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    fill: Option<Rgba>,
    stroke: Option<Stroke>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.min(MAX_DIM);
        let height = height.min(MAX_DIM);
        Self {
            width,
            height,
            pixels: buffer_for(width, height),
            fill: Some(Rgba::WHITE),
            stroke: Some(Stroke {
                color: Rgba::BLACK,
                weight: 1.0,
            }),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Replace the surface with a fresh transparent buffer of the given size,
    /// clamped to [`MAX_DIM`]. Fill/stroke state is preserved.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.min(MAX_DIM);
        self.height = height.min(MAX_DIM);
        self.pixels = buffer_for(self.width, self.height);
    }

    pub fn set_fill(&mut self, color: Rgba) {
        self.fill = Some(color);
    }

    pub fn no_fill(&mut self) {
        self.fill = None;
    }

    pub fn set_stroke(&mut self, color: Rgba) {
        let weight = self.stroke.map_or(1.0, |s| s.weight);
        self.stroke = Some(Stroke { color, weight });
    }

    pub fn set_stroke_weight(&mut self, weight: f32) {
        let color = self.stroke.map_or(Rgba::BLACK, |s| s.color);
        self.stroke = Some(Stroke { color, weight });
    }

    pub fn no_stroke(&mut self) {
        self.stroke = None;
    }

    /// Flood the whole surface with a color (raw write, no blending).
    pub fn background(&mut self, color: Rgba) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    /// Read a pixel. Out-of-bounds reads yield transparent black.
    pub fn pixel(&self, x: i32, y: i32) -> Rgba {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return Rgba::default();
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Rgba::new(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        )
    }

    /// Raw pixel write (no blending). Out-of-bounds writes are dropped.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[i..i + 4].copy_from_slice(&[color.r, color.g, color.b, color.a]);
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let sa = color.a as u32;
        let da = self.pixels[i + 3] as u32;
        let blend = |src: u8, dst: u8| -> u8 {
            ((src as u32 * sa + dst as u32 * (255 - sa)) / 255) as u8
        };
        self.pixels[i] = blend(color.r, self.pixels[i]);
        self.pixels[i + 1] = blend(color.g, self.pixels[i + 1]);
        self.pixels[i + 2] = blend(color.b, self.pixels[i + 2]);
        self.pixels[i + 3] = (sa + da * (255 - sa) / 255).min(255) as u8;
    }

    fn blend_region(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba) {
        if color.a == 0 {
            return;
        }
        for y in y0.max(0)..y1.min(self.height as i32) {
            for x in x0.max(0)..x1.min(self.width as i32) {
                self.blend_pixel(x, y, color);
            }
        }
    }

    /// Draw an axis-aligned rectangle by origin + extent using the current
    /// fill and stroke state. The stroke is a band of `weight` pixels centred
    /// on the rectangle outline, as in p5.
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let (x0, y0) = (x.round() as i32, y.round() as i32);
        let (x1, y1) = ((x + w).round() as i32, (y + h).round() as i32);

        if let Some(fill) = self.fill {
            self.blend_region(x0, y0, x1, y1, fill);
        }

        let stroke = match self.stroke {
            Some(s) if s.weight > 0.0 => s,
            _ => return,
        };
        let half_out = (stroke.weight / 2.0).round() as i32;
        let half_in = (stroke.weight - half_out as f32).ceil() as i32;
        let (ox0, oy0, ox1, oy1) = (x0 - half_out, y0 - half_out, x1 + half_out, y1 + half_out);
        let (ix0, iy0, ix1, iy1) = (x0 + half_in, y0 + half_in, x1 - half_in, y1 - half_in);

        if ix0 >= ix1 || iy0 >= iy1 {
            // Stroke band swallows the interior entirely.
            self.blend_region(ox0, oy0, ox1, oy1, stroke.color);
            return;
        }
        self.blend_region(ox0, oy0, ox1, iy0, stroke.color); // top
        self.blend_region(ox0, iy1, ox1, oy1, stroke.color); // bottom
        self.blend_region(ox0, iy0, ix0, iy1, stroke.color); // left
        self.blend_region(ix1, iy0, ox1, iy1, stroke.color); // right
    }

    /// Snapshot the surface as an `image` buffer, for writing frames to disk.
    pub fn to_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .expect("pixel buffer matches canvas dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_clamped_on_write() {
        let c = Rgba::from_clamped(300, -5, 128, 999);
        assert_eq!(c, Rgba::new(255, 0, 128, 255));
    }

    #[test]
    fn test_scale_alpha() {
        let c = Rgba::new(10, 20, 30, 200);
        assert_eq!(c.scale_alpha(255), c);
        assert_eq!(c.scale_alpha(0).a, 0);
        let half = c.scale_alpha(128);
        assert!(half.a > 90 && half.a < 110);
        assert_eq!((half.r, half.g, half.b), (10, 20, 30));
    }

    #[test]
    fn test_filled_rect_pixels() {
        let mut canvas = Canvas::new(20, 20);
        canvas.background(Rgba::BLACK);
        canvas.set_fill(Rgba::opaque(255, 0, 0));
        canvas.no_stroke();
        canvas.rect(5.0, 5.0, 10.0, 10.0);

        assert_eq!(canvas.pixel(6, 6), Rgba::opaque(255, 0, 0));
        assert_eq!(canvas.pixel(14, 14), Rgba::opaque(255, 0, 0));
        assert_eq!(canvas.pixel(4, 4), Rgba::BLACK);
        assert_eq!(canvas.pixel(15, 15), Rgba::BLACK);
    }

    #[test]
    fn test_no_fill_leaves_interior() {
        let mut canvas = Canvas::new(20, 20);
        canvas.background(Rgba::BLACK);
        canvas.no_fill();
        canvas.set_stroke(Rgba::opaque(0, 255, 0));
        canvas.set_stroke_weight(2.0);
        canvas.rect(5.0, 5.0, 10.0, 10.0);

        // Interior untouched, outline painted.
        assert_eq!(canvas.pixel(10, 10), Rgba::BLACK);
        assert_eq!(canvas.pixel(5, 5), Rgba::opaque(0, 255, 0));
    }

    #[test]
    fn test_alpha_blend_half() {
        let mut canvas = Canvas::new(4, 4);
        canvas.background(Rgba::BLACK);
        canvas.set_fill(Rgba::new(255, 255, 255, 128));
        canvas.no_stroke();
        canvas.rect(0.0, 0.0, 4.0, 4.0);

        let px = canvas.pixel(1, 1);
        assert!(px.r > 120 && px.r < 136, "expected ~50% blend, got {px:?}");
    }

    #[test]
    fn test_pixel_access_out_of_bounds() {
        let mut canvas = Canvas::new(4, 4);
        canvas.set_pixel(-1, 0, Rgba::WHITE);
        canvas.set_pixel(4, 4, Rgba::WHITE);
        assert_eq!(canvas.pixel(-1, 0), Rgba::default());
        assert_eq!(canvas.pixel(100, 100), Rgba::default());
    }

    #[test]
    fn test_resize_clears_buffer() {
        let mut canvas = Canvas::new(4, 4);
        canvas.background(Rgba::WHITE);
        canvas.resize(8, 8);
        assert_eq!(canvas.width(), 8);
        assert_eq!(canvas.pixel(0, 0), Rgba::default());
    }

    #[test]
    fn test_oversize_dimensions_clamp() {
        // 100k x 100k would overflow a u32 byte count if left unclamped.
        let mut canvas = Canvas::new(100_000, 100_000);
        assert_eq!(canvas.width(), MAX_DIM);
        assert_eq!(canvas.height(), MAX_DIM);

        canvas.resize(u32::MAX, 3);
        assert_eq!(canvas.width(), MAX_DIM);
        assert_eq!(canvas.height(), 3);
        canvas.set_pixel(MAX_DIM as i32 - 1, 2, Rgba::WHITE);
        assert_eq!(canvas.pixel(MAX_DIM as i32 - 1, 2), Rgba::WHITE);
    }
}
