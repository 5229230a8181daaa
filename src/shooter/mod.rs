//! Archery sample game
//!
//! The player rides a rope up and down the left edge, charges a shot by
//! holding the left mouse button or space, and releases to fire an arrow at
//! the cursor. Arrows fall under gravity, stick in the ground and knock out
//! the targets drifting in from the right.

mod entity;
mod world;

pub use entity::{Entity, EntityFlags, EntityId, EntityKind, EntityStore, StoreError, TargetKind};
pub use world::World;

use std::error::Error;
use std::path::PathBuf;

use crate::app::Game;
use crate::config::Config;
use crate::display::{PixelBuffer, Renderer};
use crate::input::Input;
use crate::math::V2;
use crate::memory::{megabytes, GameMemory};
use crate::texture::{load_bitmap, Bitmap};

// ============================================================================
// Tunables
// ============================================================================

pub const WINDOW_WIDTH: u32 = 960;
pub const WINDOW_HEIGHT: u32 = 540;
pub const MAX_ENTITY_COUNT: usize = 1024;

pub const PIXELS_PER_METER: f32 = 32.0;
pub const METERS_PER_PIXEL: f32 = 1.0 / PIXELS_PER_METER;

/// m/s²
pub const GRAVITY: f32 = -9.8;

pub const ROPE_SPEED: f32 = 10.0;
/// Band the rope's bottom edge is kept in, metres
pub const ROPE_TRAVEL_MIN: f32 = 2.0;
pub const ROPE_TRAVEL_MAX: f32 = 15.0;

pub const SHOOTER_SIZE: V2 = V2::new(0.6, 1.4);

/// Charge gained per frame while the trigger is held
pub const CHARGE_RATE: f32 = 0.05;
/// Arrow speed at full charge
pub const ARROW_SPEED: f32 = 30.0;
pub const ARROW_SIZE: V2 = V2::new(0.08, 0.08);
/// Seconds an arrow stays stuck in the ground
pub const ARROW_LIFETIME: f32 = 2.0;
pub const ARROW_LENGTH_PX: f32 = 32.0;
pub const ARROW_THICKNESS_PX: f32 = 4.0;

pub const TARGET_SIZE: V2 = V2::new(0.6, 1.2);
pub const TARGET_SPEED: f32 = 2.0;
pub const FLYING_AMPLITUDE: f32 = 2.0;
/// rad/s
pub const FLYING_RATE: f32 = 2.0;

pub const AIM_LENGTH_PX: f32 = 32.0;
pub const AIM_THICKNESS_PX: f32 = 4.0;
/// Metres the aim bar is drawn back at full charge
pub const AIM_PULLBACK: f32 = 0.4;

pub const HERO_PATH: &str = "asset/hero.bmp";

// ============================================================================
// Game
// ============================================================================

struct GameState {
    world: World,
    hero: Option<Bitmap>,
}

pub struct Shooter {
    renderer: Renderer,
    hero_path: Option<PathBuf>,
    state: Option<GameState>,
}

impl Shooter {
    pub fn new() -> Self {
        Self::with_hero(Some(PathBuf::from(HERO_PATH)))
    }

    /// `None` skips the hero bitmap entirely
    pub fn with_hero(hero_path: Option<PathBuf>) -> Self {
        Self {
            renderer: Renderer::new(),
            hero_path,
            state: None,
        }
    }

    /// Game state, once `init` has run
    pub fn world(&self) -> Option<&World> {
        self.state.as_ref().map(|s| &s.world)
    }

    pub fn hero(&self) -> Option<&Bitmap> {
        self.state.as_ref().and_then(|s| s.hero.as_ref())
    }
}

impl Default for Shooter {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for Shooter {
    fn name(&self) -> &str {
        "Shooter"
    }

    fn configure(&self, config: &mut Config) {
        config.window.title = "Shooter".to_string();
        config.window.width = WINDOW_WIDTH;
        config.window.height = WINDOW_HEIGHT;
        config.permanent_memory_size = megabytes(64);
        config.transient_memory_size = megabytes(128);
        config.exit_on_escape = true;
    }

    fn init(&mut self, memory: &mut GameMemory) -> Result<(), Box<dyn Error>> {
        let world = World::new(&mut memory.permanent, MAX_ENTITY_COUNT)?;

        let hero = match &self.hero_path {
            Some(path) => {
                match load_bitmap(&mut memory.permanent, self.renderer.gamma(), path) {
                    Ok(bitmap) => Some(bitmap),
                    Err(e) => {
                        log::warn!("running without {}: {}", path.display(), e);
                        None
                    },
                }
            },
            None => None,
        };

        self.state = Some(GameState { world, hero });
        Ok(())
    }

    fn update_and_render(
        &mut self,
        memory: &mut GameMemory,
        input: &Input,
        framebuffer: &mut PixelBuffer,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        state
            .world
            .update_and_render(input, memory, &self.renderer, framebuffer);
        if state.world.is_paused() {
            return;
        }

        if let Some(hero) = &state.hero {
            self.renderer
                .draw_bitmap(framebuffer, hero, &memory.permanent);
        }
    }
}
