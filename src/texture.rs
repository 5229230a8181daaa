//! Bitmap assets
//!
//! Decodes uncompressed 32-bit BMP files into arena-owned pixels in the
//! framebuffer's own format: gamma encoded, premultiplied alpha, 0xRRGGBBAA,
//! top row first in memory. The bitmap lives exactly as long as its arena.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::display::{pack_rgba, GammaTables};
use crate::memory::{Arena, ArenaError, ArenaSlice};

const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_MIN_SIZE: usize = 40;

const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;

/// Channel masks of a 32-bit BI_RGB pixel: bytes B, G, R, A in file order
const DEFAULT_MASKS: ChannelMasks = ChannelMasks {
    red: 0x00FF_0000,
    green: 0x0000_FF00,
    blue: 0x0000_00FF,
    alpha: 0xFF00_0000,
};

#[derive(Debug)]
pub enum BitmapError {
    Io(io::Error),
    /// The file ends before its headers or pixel data do
    Truncated,
    /// Missing "BM" signature or nonsensical dimensions
    NotBitmap,
    UnsupportedDepth(u16),
    UnsupportedCompression(u32),
    Arena(ArenaError),
}

impl fmt::Display for BitmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitmapError::Io(e) => write!(f, "bitmap i/o error: {}", e),
            BitmapError::Truncated => write!(f, "bitmap data is truncated"),
            BitmapError::NotBitmap => write!(f, "not a bitmap file"),
            BitmapError::UnsupportedDepth(bpp) => {
                write!(f, "unsupported bitmap depth: {} bits per pixel (need 32)", bpp)
            },
            BitmapError::UnsupportedCompression(c) => {
                write!(f, "unsupported bitmap compression: {}", c)
            },
            BitmapError::Arena(e) => write!(f, "no room for bitmap: {}", e),
        }
    }
}

impl std::error::Error for BitmapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BitmapError::Io(e) => Some(e),
            BitmapError::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for BitmapError {
    fn from(e: io::Error) -> Self {
        BitmapError::Io(e)
    }
}

impl From<ArenaError> for BitmapError {
    fn from(e: ArenaError) -> Self {
        BitmapError::Arena(e)
    }
}

/// Decoded image; pixels are resolved through the arena that owns them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: ArenaSlice<u32>,
}

impl Bitmap {
    /// Wrap pixels already laid out top row first, `width * height` long
    pub fn from_parts(width: u32, height: u32, pixels: ArenaSlice<u32>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
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

    #[inline]
    pub fn pixels(&self) -> ArenaSlice<u32> {
        self.pixels
    }
}

#[derive(Debug, Clone, Copy)]
struct ChannelMasks {
    red: u32,
    green: u32,
    blue: u32,
    alpha: u32,
}

/// Extract a masked channel and rescale it to 8 bits
#[inline]
fn channel(pixel: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }
    let max = u64::from(mask >> mask.trailing_zeros());
    let value = u64::from((pixel & mask) >> mask.trailing_zeros());
    ((value * 255 + max / 2) / max) as u8
}

fn read_u16(bytes: &[u8], at: usize) -> Result<u16, BitmapError> {
    bytes
        .get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(BitmapError::Truncated)
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32, BitmapError> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(BitmapError::Truncated)
}

fn read_i32(bytes: &[u8], at: usize) -> Result<i32, BitmapError> {
    read_u32(bytes, at).map(|v| v as i32)
}

/// Decode an in-memory BMP file into `arena`.
///
/// Only 32 bits per pixel are accepted, uncompressed (`BI_RGB`) or with
/// explicit channel masks (`BI_BITFIELDS`). Files whose alpha channel is
/// entirely zero are treated as opaque, since many writers leave it unset.
pub fn decode_bitmap(
    arena: &mut Arena,
    gamma: &GammaTables,
    bytes: &[u8],
) -> Result<Bitmap, BitmapError> {
    if bytes.len() < 2 {
        return Err(BitmapError::Truncated);
    }
    if &bytes[..2] != b"BM" {
        return Err(BitmapError::NotBitmap);
    }

    let data_offset = read_u32(bytes, 10)? as usize;
    let header_size = read_u32(bytes, FILE_HEADER_SIZE)? as usize;
    if header_size < INFO_HEADER_MIN_SIZE {
        return Err(BitmapError::NotBitmap);
    }

    let width = read_i32(bytes, 18)?;
    let height = read_i32(bytes, 22)?;
    let bits_per_pixel = read_u16(bytes, 28)?;
    let compression = read_u32(bytes, 30)?;

    if bits_per_pixel != 32 {
        return Err(BitmapError::UnsupportedDepth(bits_per_pixel));
    }

    let masks = match compression {
        BI_RGB => DEFAULT_MASKS,
        BI_BITFIELDS => {
            let at = FILE_HEADER_SIZE + INFO_HEADER_MIN_SIZE;
            ChannelMasks {
                red: read_u32(bytes, at)?,
                green: read_u32(bytes, at + 4)?,
                blue: read_u32(bytes, at + 8)?,
                // Plain 40-byte headers carry no alpha mask
                alpha: if header_size >= INFO_HEADER_MIN_SIZE + 16 {
                    read_u32(bytes, at + 12)?
                } else {
                    0
                },
            }
        },
        other => return Err(BitmapError::UnsupportedCompression(other)),
    };

    if width <= 0 || height == 0 {
        return Err(BitmapError::NotBitmap);
    }
    let width = width.unsigned_abs();
    // Positive height: rows stored bottom row first
    let bottom_up = height > 0;
    let height = height.unsigned_abs();

    let count = (width as usize)
        .checked_mul(height as usize)
        .ok_or(BitmapError::NotBitmap)?;
    let data = count
        .checked_mul(4)
        .and_then(|len| data_offset.checked_add(len))
        .and_then(|end| bytes.get(data_offset..end))
        .ok_or(BitmapError::Truncated)?;

    let source: Vec<u32> = data
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    let has_alpha = masks.alpha != 0 && source.iter().any(|&p| p & masks.alpha != 0);

    let slice = arena.push_slice::<u32>(count)?;
    let name = arena.name();
    let Some(pixels) = arena.get_mut(slice) else {
        return Err(BitmapError::Arena(ArenaError::OutOfMemory {
            arena: name,
            requested: count * 4,
            remaining: 0,
        }));
    };

    let row_len = width as usize;
    for (row, src_row) in source.chunks_exact(row_len).enumerate() {
        let dst_row = if bottom_up {
            height as usize - 1 - row
        } else {
            row
        };
        let dst = &mut pixels[dst_row * row_len..(dst_row + 1) * row_len];
        for (out, &px) in dst.iter_mut().zip(src_row) {
            let a = if has_alpha { channel(px, masks.alpha) } else { 255 };
            let coverage = f32::from(a) / 255.0;
            let premultiply = |c: u8| gamma.encode_linear(gamma.decode(c) * coverage);
            *out = pack_rgba(
                premultiply(channel(px, masks.red)),
                premultiply(channel(px, masks.green)),
                premultiply(channel(px, masks.blue)),
                a,
            );
        }
    }

    Ok(Bitmap::from_parts(width, height, slice))
}

/// Read and decode a BMP file into `arena`
pub fn load_bitmap(
    arena: &mut Arena,
    gamma: &GammaTables,
    path: impl AsRef<Path>,
) -> Result<Bitmap, BitmapError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let bitmap = decode_bitmap(arena, gamma, &bytes)?;
    log::info!(
        "loaded bitmap {} ({}x{})",
        path.display(),
        bitmap.width(),
        bitmap.height()
    );
    Ok(bitmap)
}
