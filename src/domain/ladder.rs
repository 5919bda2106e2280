/// Ladder zone tracker.
///
/// Zone membership is rebuilt from scratch every tick: the caller passes the
/// ladder the body overlaps this tick (or none), so leaving a ladder without
/// a new overlap always drops the player out of climb mode.
///
/// ┌───────────────────────────────┬──────────────────────────────┐
/// │ Condition                      │ Effect                       │
/// ├───────────────────────────────┼──────────────────────────────┤
/// │ not in zone                    │ gravity on                   │
/// │ in zone, up held               │ gravity off, vy = -climb     │
/// │ in zone, down held (not up)    │ gravity off, vy = +climb     │
/// │ down held, feet at ladder foot │ gravity on, vy = 0 (stand)   │
/// │ in zone, no key, climbing      │ vy = 0, gravity stays off    │
/// │ in zone, no key, not climbing  │ unchanged (walking past)     │
/// └───────────────────────────────┴──────────────────────────────┘
///
/// A descending climber never passes the ladder's bottom edge: climb mode
/// ignores one-way platforms, so `clamp_to_foot` holds the feet there after
/// integration and the next tick stands the body on whatever lies below.

use super::entity::{Player, Rect};

/// Update ladder state for this tick. Returns true while climbing.
pub fn track(player: &mut Player, zone: Option<&Rect>, up: bool, down: bool, climb_speed: f32) -> bool {
    let ladder = match zone {
        Some(l) => l,
        None => {
            player.on_ladder = false;
            player.gravity_enabled = true;
            return false;
        }
    };
    player.on_ladder = true;

    if player.movement_locked {
        return player.is_climbing();
    }

    if up {
        player.gravity_enabled = false;
        player.vy = -climb_speed;
    } else if down && at_foot(player, ladder) {
        player.gravity_enabled = true;
        player.vy = 0.0;
    } else if down {
        player.gravity_enabled = false;
        player.vy = climb_speed;
    } else if !player.gravity_enabled {
        player.vy = 0.0;
    }

    player.is_climbing()
}

/// Keep a climbing body's feet at or above the ladder's bottom edge.
pub fn clamp_to_foot(player: &mut Player, ladder: &Rect) {
    if !player.is_climbing() || !at_foot(player, ladder) { return; }
    player.y = ladder.bottom() - player.bounds().h;
    if player.vy > 0.0 { player.vy = 0.0; }
}

fn at_foot(player: &Player, ladder: &Rect) -> bool {
    player.bounds().bottom() >= ladder.bottom()
}
