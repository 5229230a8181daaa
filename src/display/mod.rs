mod gamma;
mod pixel_buffer;
mod raster;
#[cfg(feature = "sdl")]
mod window;

pub use gamma::{GammaTables, GAMMA};
pub use pixel_buffer::{pack_rgba, unpack_rgba, PixelBuffer};
pub use raster::{Color, Renderer};
#[cfg(feature = "sdl")]
pub use window::{Display, RenderTarget};

pub const DEFAULT_WIDTH: u32 = 960;
pub const DEFAULT_HEIGHT: u32 = 540;
