use std::path::PathBuf;

use hammer::app::{configure, App};
use hammer::display::{Display, RenderTarget};
use hammer::input::{InputTracker, Key};
use hammer::shooter::Shooter;

/// Simulation step handed to the game every frame, seconds
const FRAME_DT: f32 = 1.0 / 60.0;

struct Args {
    config: Option<PathBuf>,
    vsync: bool,
}

/// Parse command line arguments
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut config = None;
    let mut vsync = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => vsync = false,
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            },
            "--help" => {
                println!("Usage: shooter [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --config PATH, -c PATH  Overlay settings from a JSON config file");
                println!("  --no-vsync              Disable VSync for uncapped framerate");
                println!("  --help                  Show this help message");
                println!();
                println!("Controls:");
                println!("  W/S            - Move the rope up/down");
                println!("  Mouse          - Aim");
                println!("  Left click     - Hold to charge, release to shoot");
                println!("  Space          - Same as left click");
                println!("  P              - Pause");
                println!("  Escape         - Quit");
                std::process::exit(0);
            },
            other => log::warn!("ignoring unknown argument {}", other),
        }
        i += 1;
    }

    Args { config, vsync }
}

fn run() -> Result<(), String> {
    let args = parse_args();

    let game = Shooter::new();
    let mut config = configure(&game);
    if let Some(path) = &args.config {
        match config.overlay_file(path) {
            Ok(overlaid) => config = overlaid,
            Err(e) => log::warn!("ignoring {}: {}", path.display(), e),
        }
    }
    log::info!(
        "{} {}x{}, vsync {}",
        config.window.title,
        config.window.width,
        config.window.height,
        if args.vsync { "on" } else { "off" }
    );

    let (mut display, texture_creator) = Display::open(&config.window, args.vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, display.width(), display.height())?;

    let exit_on_escape = config.exit_on_escape;
    let mut app = App::with_config(game, config).map_err(|e| e.to_string())?;
    let mut tracker = InputTracker::new();

    loop {
        tracker.begin_frame(FRAME_DT);
        for event in display.poll_events() {
            tracker.apply(event);
        }

        if tracker.quit_requested()
            || (exit_on_escape && tracker.input().keyboard.is_pressed(Key::Escape))
        {
            break;
        }

        let buffer = app.frame(tracker.input());
        display.present(&mut target, buffer)?;
    }

    log::info!("quit after {} frames", app.frame_count());
    Ok(())
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    run().map_err(|e| {
        log::error!("{}", e);
        e
    })
}
