use super::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

// ============================================================================
// Pixel Layout
// ============================================================================

// Bit pattern of a stored pixel: 0xRRGGBBAA, sRGB encoded
pub const PIXEL_RED_SHIFT: u32 = 24;
pub const PIXEL_GREEN_SHIFT: u32 = 16;
pub const PIXEL_BLUE_SHIFT: u32 = 8;
pub const PIXEL_ALPHA_SHIFT: u32 = 0;

/// Pack 8-bit channels into a stored pixel
#[inline]
pub const fn pack_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((r as u32) << PIXEL_RED_SHIFT)
        | ((g as u32) << PIXEL_GREEN_SHIFT)
        | ((b as u32) << PIXEL_BLUE_SHIFT)
        | ((a as u32) << PIXEL_ALPHA_SHIFT)
}

/// Split a stored pixel into (r, g, b, a)
#[inline]
pub const fn unpack_rgba(pixel: u32) -> (u8, u8, u8, u8) {
    (
        (pixel >> PIXEL_RED_SHIFT) as u8,
        (pixel >> PIXEL_GREEN_SHIFT) as u8,
        (pixel >> PIXEL_BLUE_SHIFT) as u8,
        (pixel >> PIXEL_ALPHA_SHIFT) as u8,
    )
}

// ============================================================================
// PixelBuffer
// ============================================================================

/// RGBA8888 framebuffer for software rendering.
///
/// Coordinates are y-up: (0, 0) is the bottom-left pixel. Rows are stored
/// bottom-up, so logical row 0 is the *last* row in memory and memory row 0
/// is the top of the screen. That is also the order the display surface
/// expects, so `as_bytes` can be uploaded verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: Vec<u32>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Create a new pixel buffer with default resolution (960x540)
    pub fn new() -> Self {
        Self::with_size(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    /// Create a zeroed (transparent black) buffer
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; width as usize * height as usize],
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per memory row
    #[inline]
    pub fn pitch(&self) -> usize {
        self.width as usize * 4
    }

    /// Check if coordinates are within bounds
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    /// Index into `pixels` of logical pixel (x, y)
    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        (self.height - 1 - y) as usize * self.width as usize + x as usize
    }

    /// Fill every pixel with one stored value
    pub fn clear(&mut self, pixel: u32) {
        self.pixels.fill(pixel);
    }

    /// Read a pixel (bounds checked)
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<u32> {
        if self.in_bounds(x, y) {
            Some(self.pixels[self.pixel_index(x as u32, y as u32)])
        } else {
            None
        }
    }

    /// Write a pixel (bounds checked)
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, pixel: u32) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            self.pixels[idx] = pixel;
        }
    }

    /// Pixels `x0..x1` of logical row `y`. The caller clamps to the buffer.
    #[inline]
    pub fn span_mut(&mut self, y: u32, x0: u32, x1: u32) -> &mut [u32] {
        let start = self.pixel_index(x0, y);
        &mut self.pixels[start..start + (x1 - x0) as usize]
    }

    /// Memory row `row` (0 = top of the screen)
    #[inline]
    pub fn memory_row_mut(&mut self, row: u32) -> &mut [u32] {
        let start = row as usize * self.width as usize;
        &mut self.pixels[start..start + self.width as usize]
    }

    /// Pixels in memory order
    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Raw bytes for display texture upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
