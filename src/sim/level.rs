/// Level layout: the built-in Mars level as static data.
///
/// ## Coordinates
///   World is 3000 × 600 units, y grows downward.
///   Platforms are authored by center like the sprite sheet they came from
///   (200 × 40 each). Ladders, stations, door and flag are authored as boxes.
///
/// ## Routes
///   Stations on the upper platforms form the high route; everything
///   reachable from the ground strip is the low route.

use crate::domain::entity::{Door, Flag, Player, Rect, Route, Station};
use crate::sim::world::WorldState;

pub const WORLD_W: f32 = 3000.0;
pub const WORLD_H: f32 = 600.0;

const PLATFORM_W: f32 = 200.0;
const PLATFORM_H: f32 = 40.0;
const STATION_SIZE: f32 = 48.0;

pub struct StationDef {
    pub id: u32,
    pub title: &'static str,
    /// Center x, and the y of the surface the station sits on.
    pub x: f32,
    pub floor_y: f32,
    pub route: Route,
    pub facts: &'static [&'static str],
}

pub struct LevelDef {
    pub name: &'static str,
    pub width: f32,
    pub height: f32,
    pub spawn: (f32, f32),
    /// Platform centers.
    pub platforms: Vec<(f32, f32)>,
    pub ladders: Vec<Rect>,
    pub stations: Vec<StationDef>,
    pub door: Rect,
    pub flag: Rect,
}

// ══════════════════════════════════════════════════════════════
// Built-in level
// ══════════════════════════════════════════════════════════════

pub fn mars_level() -> LevelDef {
    // Ground strip along the bottom edge
    let mut platforms: Vec<(f32, f32)> = (0..(WORLD_W as usize / 200))
        .map(|i| (i as f32 * 200.0 + 100.0, WORLD_H - 20.0))
        .collect();
    platforms.extend_from_slice(&[
        (400.0, 480.0),
        (800.0, 520.0),
        (1200.0, 500.0),
        (1600.0, 520.0),
        (600.0, 300.0),
        (1000.0, 320.0),
        (1400.0, 340.0),
        (2000.0, 300.0),
    ]);

    LevelDef {
        name: "Mars Explorer",
        width: WORLD_W,
        height: WORLD_H,
        spawn: (86.0, 400.0),
        platforms,
        ladders: vec![
            Rect::new(580.0, 270.0, 40.0, 290.0),
            Rect::new(980.0, 290.0, 40.0, 270.0),
            Rect::new(1980.0, 270.0, 40.0, 290.0),
        ],
        stations: vec![
            StationDef {
                id: 1, title: "Atmosphere", x: 400.0, floor_y: 460.0, route: Route::Low,
                facts: &[
                    "The atmosphere is about 95% carbon dioxide",
                    "Surface pressure is under 1% of Earth's",
                    "Dust storms can cover the whole planet",
                ],
            },
            StationDef {
                id: 2, title: "Water", x: 800.0, floor_y: 500.0, route: Route::Low,
                facts: &[
                    "The polar caps hold frozen water",
                    "Ancient riverbeds show water once flowed",
                    "Liquid water cannot last long on the surface",
                ],
            },
            StationDef {
                id: 3, title: "Geology", x: 1000.0, floor_y: 300.0, route: Route::High,
                facts: &[
                    "Iron oxide in the dust makes Mars red",
                    "Valles Marineris is over 4000 km long",
                    "Basalt covers much of the surface",
                ],
            },
            StationDef {
                id: 4, title: "Olympus Mons", x: 1200.0, floor_y: 480.0, route: Route::Low,
                facts: &[
                    "Olympus Mons is the tallest volcano known",
                    "It rises about 22 km above the plains",
                    "It is a shield volcano like those in Hawaii",
                ],
            },
            StationDef {
                id: 5, title: "Missions", x: 1600.0, floor_y: 500.0, route: Route::Low,
                facts: &[
                    "Rovers have explored Mars since 1997",
                    "Curiosity landed in Gale Crater in 2012",
                    "Ingenuity made the first powered flight on another planet",
                ],
            },
            StationDef {
                id: 6, title: "Radiation", x: 2000.0, floor_y: 280.0, route: Route::High,
                facts: &[
                    "Mars has no global magnetic field to block radiation",
                    "Surface radiation is far higher than on Earth",
                    "Future explorers will need shielded habitats",
                ],
            },
        ],
        // Airlock gate: taller than any jump
        door: Rect::new(2370.0, 0.0, 60.0, WORLD_H - PLATFORM_H),
        flag: Rect::centered(2800.0, WORLD_H - PLATFORM_H - 40.0, 40.0, 80.0),
    }
}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

/// Load a level into the world state. Resets all runtime progress.
pub fn load_level(world: &mut WorldState, def: &LevelDef) {
    world.width = def.width;
    world.height = def.height;
    world.platforms = def.platforms.iter()
        .map(|&(cx, cy)| Rect::centered(cx, cy, PLATFORM_W, PLATFORM_H))
        .collect();
    world.ladders = def.ladders.clone();
    world.player_spawn = def.spawn;
    world.player = Player::new(def.spawn.0, def.spawn.1);

    world.stations = def.stations.iter()
        .map(|s| Station::new(
            s.id,
            s.title,
            Rect::new(s.x - STATION_SIZE / 2.0, s.floor_y - STATION_SIZE, STATION_SIZE, STATION_SIZE),
            s.route,
            s.facts,
        ))
        .collect();

    world.door = Door { bounds: def.door, present: true };
    world.flag = Flag { bounds: def.flag, reached: false };
    world.challenge = None;
    world.score = 0;
    world.badges = Default::default();
    world.tick = 0;
    world.save_timer_ms = 0.0;
    world.save_requested = false;
    world.logbook_visible = false;
    world.message_queue.clear();
    world.set_message(def.name, 2000.0);
}
