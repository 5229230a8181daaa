//! Game lifecycle and the per-frame driver
//!
//! A host (the SDL binary, or a test) owns an `App`, feeds it one `Input`
//! per frame and presents the framebuffer it hands back. The app decides
//! when the transient arena is recycled: at the start of every frame, before
//! the game runs.

use std::error::Error;
use std::fmt;

use crate::config::Config;
use crate::display::PixelBuffer;
use crate::input::Input;
use crate::memory::{ArenaError, GameMemory};

/// What a game exposes to the framework
pub trait Game {
    /// Game name for logs
    fn name(&self) -> &str;

    /// Adjust the configuration before any window or memory exists
    fn configure(&self, _config: &mut Config) {}

    /// One-time setup after both arenas are allocated
    fn init(&mut self, memory: &mut GameMemory) -> Result<(), Box<dyn Error>>;

    /// Advance one frame and draw it into `framebuffer`
    fn update_and_render(
        &mut self,
        memory: &mut GameMemory,
        input: &Input,
        framebuffer: &mut PixelBuffer,
    );
}

#[derive(Debug)]
pub enum AppError {
    /// A zero-sized window leaves nothing to draw into
    InvalidWindow { width: u32, height: u32 },
    /// The configured arenas could not be allocated
    Memory(ArenaError),
    Init(Box<dyn Error>),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidWindow { width, height } => {
                write!(f, "invalid window size {}x{}", width, height)
            },
            AppError::Memory(e) => write!(f, "{}", e),
            AppError::Init(e) => write!(f, "game init failed: {}", e),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Init(e) => Some(e.as_ref()),
            AppError::Memory(e) => Some(e),
            AppError::InvalidWindow { .. } => None,
        }
    }
}

/// Resolve a game's configuration from the defaults
pub fn configure<G: Game>(game: &G) -> Config {
    let mut config = Config::default();
    game.configure(&mut config);
    config
}

pub struct App<G: Game> {
    config: Config,
    memory: GameMemory,
    framebuffer: PixelBuffer,
    game: G,
    frame_count: u64,
}

impl<G: Game> App<G> {
    /// Build with the configuration the game asks for
    pub fn new(game: G) -> Result<Self, AppError> {
        let config = configure(&game);
        Self::with_config(game, config)
    }

    /// Build with an explicit configuration, e.g. one overlaid from a file
    pub fn with_config(mut game: G, config: Config) -> Result<Self, AppError> {
        let (width, height) = (config.window.width, config.window.height);
        if width == 0 || height == 0 {
            return Err(AppError::InvalidWindow { width, height });
        }

        let mut memory =
            GameMemory::new(config.permanent_memory_size, config.transient_memory_size)
                .map_err(AppError::Memory)?;
        log::info!(
            "{}: {}x{}, permanent arena {} bytes, transient arena {} bytes",
            game.name(),
            width,
            height,
            memory.permanent.size(),
            memory.transient.size()
        );

        game.init(&mut memory).map_err(AppError::Init)?;
        log::debug!("permanent arena after init: {} bytes used", memory.permanent.used());

        Ok(Self {
            config,
            memory,
            framebuffer: PixelBuffer::with_size(width, height),
            game,
            frame_count: 0,
        })
    }

    /// Run one frame: recycle scratch memory, then update and draw
    pub fn frame(&mut self, input: &Input) -> &PixelBuffer {
        self.memory.transient.reset();
        self.game
            .update_and_render(&mut self.memory, input, &mut self.framebuffer);
        self.frame_count += 1;
        &self.framebuffer
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn framebuffer(&self) -> &PixelBuffer {
        &self.framebuffer
    }

    pub fn memory(&self) -> &GameMemory {
        &self.memory
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
