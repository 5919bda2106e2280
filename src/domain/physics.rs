/// Collision collaborator: integrates the player body and reports contacts.
///
/// ## Architecture
///
/// Two distinct concepts:
///   1. SOLIDS:   what blocks the body (platforms, door, world bounds)
///   2. OVERLAPS: which trigger regions the body touches (ladders,
///                 stations, flag); they never block
///
/// The core only ever sees the results: a grounded flag and a list of
/// overlap events. Everything here is deliberately arcade-simple.
///
/// ## Solid kinds
///
/// ┌────────────┬──────────────────────────────────────────────┐
/// │ Kind        │ Blocks                                        │
/// ├────────────┼──────────────────────────────────────────────┤
/// │ OneWay      │ only a falling body whose feet were above the │
/// │             │ top edge last step; ignored while climbing    │
/// │ Full        │ every axis (the door)                         │
/// │ World edges │ left/right clamp, bottom edge = floor         │
/// └────────────┴──────────────────────────────────────────────┘
///
/// Movement is resolved per axis: X first, then Y.

use super::entity::{Player, Rect, PLAYER_H, PLAYER_W};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SolidKind {
    OneWay,
    Full,
}

#[derive(Clone, Copy, Debug)]
pub struct Solid {
    pub bounds: Rect,
    pub kind: SolidKind,
}

/// Advance the body by `elapsed_ms`. Returns whether it rests on a surface.
pub fn integrate(
    player: &mut Player,
    solids: &[Solid],
    world_w: f32,
    world_h: f32,
    gravity: f32,
    elapsed_ms: f32,
) -> bool {
    let dt = elapsed_ms / 1000.0;

    if player.gravity_enabled {
        player.vy += gravity * dt;
    }

    // ── X axis ──
    player.x += player.vx * dt;
    for s in solids.iter().filter(|s| s.kind == SolidKind::Full) {
        if !player.bounds().intersects(&s.bounds) { continue; }
        if player.vx > 0.0 {
            player.x = s.bounds.x - PLAYER_W;
        } else if player.vx < 0.0 {
            player.x = s.bounds.right();
        }
    }
    player.x = player.x.clamp(0.0, (world_w - PLAYER_W).max(0.0));

    // ── Y axis ──
    let prev_bottom = player.y + PLAYER_H;
    player.y += player.vy * dt;
    let mut grounded = false;

    for s in solids {
        if !player.bounds().intersects(&s.bounds) { continue; }
        match s.kind {
            SolidKind::OneWay => {
                if player.vy > 0.0 && prev_bottom <= s.bounds.y && !player.is_climbing() {
                    player.y = s.bounds.y - PLAYER_H;
                    player.vy = 0.0;
                    grounded = true;
                }
            }
            SolidKind::Full => {
                if player.vy > 0.0 {
                    player.y = s.bounds.y - PLAYER_H;
                    player.vy = 0.0;
                    grounded = true;
                } else if player.vy < 0.0 {
                    player.y = s.bounds.bottom();
                    player.vy = 0.0;
                }
            }
        }
    }

    if player.y < 0.0 {
        player.y = 0.0;
        if player.vy < 0.0 { player.vy = 0.0; }
    }
    if player.y + PLAYER_H >= world_h {
        player.y = world_h - PLAYER_H;
        if player.vy > 0.0 { player.vy = 0.0; }
        grounded = true;
    }

    grounded
}

/// Indices of `regions` currently overlapping `body`, in input order.
pub fn overlapping(body: &Rect, regions: &[Rect]) -> Vec<usize> {
    regions.iter()
        .enumerate()
        .filter(|(_, r)| body.intersects(r))
        .map(|(i, _)| i)
        .collect()
}
