//! SDL2 host surface
//!
//! The framebuffer's memory layout already matches a streaming RGBA8888
//! texture (row 0 at the top, one `0xRRGGBBAA` word per pixel), so a frame
//! is a single texture update and copy. Only the events the framework has an
//! `InputEvent` for survive translation.

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::mouse::MouseButton;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;

use super::PixelBuffer;
use crate::config::WindowConfig;
use crate::input::{InputEvent, Key, MouseButtonKind};

pub struct Display {
    canvas: Canvas<Window>,
    events: EventPump,
    size: (u32, u32),
}

/// Streaming texture sized to the framebuffer
pub struct RenderTarget<'a> {
    texture: Texture<'a>,
    size: (u32, u32),
}

impl Display {
    /// Open a centred window for `config`. The texture creator is handed
    /// back separately because render targets borrow it.
    pub fn open(
        config: &WindowConfig,
        vsync: bool,
    ) -> Result<(Self, TextureCreator<WindowContext>), String> {
        let sdl = sdl2::init()?;
        let window = sdl
            .video()?
            .window(&config.title, config.width, config.height)
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;

        let builder = window.into_canvas().accelerated();
        let builder = if vsync { builder.present_vsync() } else { builder };
        let canvas = builder.build().map_err(|e| e.to_string())?;

        let creator = canvas.texture_creator();
        let display = Self {
            canvas,
            events: sdl.event_pump()?,
            size: (config.width, config.height),
        };
        Ok((display, creator))
    }

    pub fn width(&self) -> u32 {
        self.size.0
    }

    pub fn height(&self) -> u32 {
        self.size.1
    }

    pub fn present(&mut self, target: &mut RenderTarget, buffer: &PixelBuffer) -> Result<(), String> {
        target.upload(buffer)?;
        self.canvas.copy(&target.texture, None, None)?;
        self.canvas.present();
        Ok(())
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        self.events.poll_iter().filter_map(translate).collect()
    }
}

impl<'a> RenderTarget<'a> {
    pub fn with_size(
        creator: &'a TextureCreator<WindowContext>,
        width: u32,
        height: u32,
    ) -> Result<Self, String> {
        let texture = creator
            .create_texture_streaming(PixelFormatEnum::RGBA8888, width, height)
            .map_err(|e| e.to_string())?;
        Ok(Self {
            texture,
            size: (width, height),
        })
    }

    fn upload(&mut self, buffer: &PixelBuffer) -> Result<(), String> {
        let frame = (buffer.width(), buffer.height());
        if frame != self.size {
            return Err(format!(
                "framebuffer is {}x{}, render target is {}x{}",
                frame.0, frame.1, self.size.0, self.size.1
            ));
        }
        self.texture
            .update(None, buffer.as_bytes(), buffer.pitch())
            .map_err(|e| e.to_string())
    }
}

fn translate(event: Event) -> Option<InputEvent> {
    let event = match event {
        Event::Quit { .. } => InputEvent::Quit,
        Event::KeyDown {
            keycode: Some(code), ..
        } => InputEvent::KeyDown(key(code)?),
        Event::KeyUp {
            keycode: Some(code), ..
        } => InputEvent::KeyUp(key(code)?),
        Event::MouseMotion { x, y, .. } => InputEvent::MouseMove { x, y },
        Event::MouseButtonDown {
            x, y, mouse_btn, ..
        } => InputEvent::MouseDown {
            x,
            y,
            button: button(mouse_btn)?,
        },
        Event::MouseButtonUp {
            x, y, mouse_btn, ..
        } => InputEvent::MouseUp {
            x,
            y,
            button: button(mouse_btn)?,
        },
        _ => return None,
    };
    Some(event)
}

fn key(code: Keycode) -> Option<Key> {
    Some(match code {
        Keycode::W => Key::W,
        Keycode::A => Key::A,
        Keycode::S => Key::S,
        Keycode::D => Key::D,
        Keycode::P => Key::P,
        Keycode::Space => Key::Space,
        Keycode::Escape => Key::Escape,
        _ => return None,
    })
}

fn button(btn: MouseButton) -> Option<MouseButtonKind> {
    match btn {
        MouseButton::Left => Some(MouseButtonKind::Left),
        MouseButton::Right => Some(MouseButtonKind::Right),
        _ => None,
    }
}
