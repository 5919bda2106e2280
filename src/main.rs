/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use sim::event::GameEvent;
use sim::level::{load_level, mars_level};
use sim::save::{self, FileStorage, Persistence};
use sim::step;
use sim::world::WorldState;
use ui::input::InputState;
use ui::renderer::Renderer;

const LOG_FILE: &str = "mars-explorer.log";
const EVENT_MESSAGE_MS: f32 = 1800.0;
/// Longest single tick fed to the simulation (window drags, suspend).
const MAX_TICK_MS: f32 = 100.0;

fn main() {
    init_logging();
    let config = GameConfig::load();

    let seed = match config.seed {
        0 => clock_seed(),
        s => s,
    };
    let mut world = WorldState::new(config.tuning.clone(), seed);
    load_level(&mut world, &mars_level());

    let storage = match &config.save_dir {
        Some(dir) => FileStorage::new(dir),
        None => FileStorage::discover(),
    };
    info!(save_dir = %storage.dir().display(), seed, "starting");
    let mut persistence = Persistence::new(Box::new(storage));
    save::resume(&mut world, &persistence);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &mut persistence, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    if let Err(e) = persistence.save(&save::capture_snapshot(&world)) {
        warn!(error = %e, "final save failed");
    }

    println!();
    println!("Thanks for exploring Mars!");
    println!("Stations: {} / {}   Score: {}", world.completed_count(), world.stations.len(), world.score);
    let badges = world.badges.earned_names();
    if !badges.is_empty() {
        println!("Badges: {}", badges.join(", "));
    }
}

/// Raw mode owns the terminal, so logs go to a file (or nowhere).
fn init_logging() {
    let writer = match OpenOptions::new().create(true).append(true).open(LOG_FILE) {
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(_) => BoxMakeWriter::new(std::io::sink),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    persistence: &mut Persistence,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let frame = Duration::from_millis(config.frame_ms);
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();
        if kb.quit_pressed() {
            info!(tick = world.tick, "quit requested");
            break;
        }

        let now = Instant::now();
        let elapsed = now.duration_since(last_tick);
        if elapsed >= frame {
            last_tick = now;
            let elapsed_ms = (elapsed.as_secs_f32() * 1000.0).min(MAX_TICK_MS);
            let input = kb.frame_input(world.active_step(), elapsed_ms);
            let events = step::step(world, input, persistence);
            announce_events(world, &events);
            renderer.render(world)?;
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    Ok(())
}

/// Queue event announcements behind the message line.
/// Completion handlers already set their own messages.
fn announce_events(world: &mut WorldState, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::DoorUnlocked => world.queue_message("All stations complete! The airlock is open", EVENT_MESSAGE_MS),
            GameEvent::BadgeEarned { name } => world.queue_message(&format!("Badge earned: {}", name), EVENT_MESSAGE_MS),
            GameEvent::ChallengeSuperseded { .. } => world.queue_message("Challenge abandoned", EVENT_MESSAGE_MS),
            GameEvent::SaveFailed => world.queue_message("Progress could not be saved", EVENT_MESSAGE_MS),
            _ => {}
        }
    }
}
