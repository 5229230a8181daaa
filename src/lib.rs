//! Hammer: a small 2D game framework that renders in software.
//!
//! The framework owns the frame loop contract (`app`), memory (`memory`),
//! input snapshots (`input`), 2D math and ray casts (`math`, `geometry`) and
//! a rasterizer that writes straight into an RGBA framebuffer (`display`).
//! A game implements `app::Game`; the `shooter` module is the sample game.
//! The SDL2 window shell lives behind the `sdl` feature.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod app;
pub mod config;
pub mod display;
pub mod geometry;
pub mod input;
pub mod math;
pub mod memory;
pub mod shooter;
pub mod texture;

pub use app::{App, AppError, Game};
pub use config::Config;
pub use memory::GameMemory;
