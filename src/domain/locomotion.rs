/// Locomotion controller: input + ground contact → velocity commands.
///
/// ## Per-tick truth table
///
/// ┌──────────────────────────────┬──────────────────────────────┐
/// │ Condition                     │ Effect                       │
/// ├──────────────────────────────┼──────────────────────────────┤
/// │ movement_locked               │ vx = vy = 0, buffer cleared, │
/// │                               │ nothing else evaluated       │
/// │ left held (right or not)      │ vx = -walk, facing Left      │
/// │ right held only               │ vx = +walk, facing Right     │
/// │ neither                       │ vx = 0                       │
/// │ grounded                      │ coyote = max                 │
/// │ airborne                      │ coyote -= dt (may go < 0)    │
/// │ jump edge                     │ buffer = max                 │
/// │ no edge                       │ buffer -= dt                 │
/// │ buffer > 0 && coyote > 0      │ vy = jump_velocity,          │
/// │   && !climbing                │ buffer = coyote = 0          │
/// └──────────────────────────────┴──────────────────────────────┘
///
/// Left wins when both directions are held (if/else-if order).
/// Pure functions, no world access.

use crate::config::TuningConfig;
use super::entity::{Facing, Player};

/// Inputs the controller reads each tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocomotionInput {
    pub move_left: bool,
    pub move_right: bool,
    pub jump_pressed: bool,
    pub grounded: bool,
    pub elapsed_ms: f32,
}

/// Apply one tick of locomotion. Returns true if a jump fired.
pub fn apply(player: &mut Player, input: LocomotionInput, tuning: &TuningConfig) -> bool {
    if player.movement_locked {
        player.vx = 0.0;
        player.vy = 0.0;
        player.jump_buffer_ms = 0.0;
        return false;
    }

    apply_horizontal(player, input.move_left, input.move_right, tuning.walk_speed);
    tick_coyote(player, input.grounded, input.elapsed_ms, tuning.coyote_time_ms);
    tick_jump_buffer(player, input.jump_pressed, input.elapsed_ms, tuning.jump_buffer_ms);
    try_jump(player, tuning.jump_velocity)
}

fn apply_horizontal(player: &mut Player, left: bool, right: bool, walk_speed: f32) {
    if left {
        player.vx = -walk_speed;
        player.facing = Facing::Left;
    } else if right {
        player.vx = walk_speed;
        player.facing = Facing::Right;
    } else {
        player.vx = 0.0;
    }
}

fn tick_coyote(player: &mut Player, grounded: bool, elapsed_ms: f32, max_ms: f32) {
    if grounded {
        player.coyote_ms = max_ms;
    } else {
        player.coyote_ms -= elapsed_ms;
    }
}

fn tick_jump_buffer(player: &mut Player, pressed: bool, elapsed_ms: f32, max_ms: f32) {
    if pressed {
        player.jump_buffer_ms = max_ms;
    } else {
        player.jump_buffer_ms -= elapsed_ms;
    }
}

fn try_jump(player: &mut Player, jump_velocity: f32) -> bool {
    if player.jump_buffer_ms <= 0.0 || player.coyote_ms <= 0.0 { return false; }
    if player.is_climbing() { return false; }

    player.vy = jump_velocity;
    player.jump_buffer_ms = 0.0;
    player.coyote_ms = 0.0;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 16.0;

    fn tuning() -> TuningConfig { TuningConfig::default() }

    fn input(grounded: bool, jump: bool) -> LocomotionInput {
        LocomotionInput {
            move_left: false,
            move_right: false,
            jump_pressed: jump,
            grounded,
            elapsed_ms: DT,
        }
    }

    // ── Horizontal ──

    #[test]
    fn walk_right_and_left() {
        let t = tuning();
        let mut p = Player::new(0.0, 0.0);
        apply(&mut p, LocomotionInput { move_right: true, ..input(true, false) }, &t);
        assert_eq!(p.vx, 220.0);
        assert_eq!(p.facing, Facing::Right);

        apply(&mut p, LocomotionInput { move_left: true, ..input(true, false) }, &t);
        assert_eq!(p.vx, -220.0);
        assert_eq!(p.facing, Facing::Left);

        apply(&mut p, input(true, false), &t);
        assert_eq!(p.vx, 0.0);
        assert_eq!(p.facing, Facing::Left); // facing sticks
    }

    #[test]
    fn both_directions_left_wins() {
        let mut p = Player::new(0.0, 0.0);
        apply(&mut p, LocomotionInput { move_left: true, move_right: true, ..input(true, false) }, &tuning());
        assert_eq!(p.vx, -220.0);
        assert_eq!(p.facing, Facing::Left);
    }

    // ── Jump ──

    #[test]
    fn grounded_press_jumps_once() {
        let t = tuning();
        let mut p = Player::new(0.0, 0.0);
        assert!(apply(&mut p, input(true, true), &t));
        assert_eq!(p.vy, -420.0);
        assert_eq!(p.jump_buffer_ms, 0.0);
        assert_eq!(p.coyote_ms, 0.0);

        // Still reported grounded next tick (body not yet moved): no edge → no jump
        p.vy = 0.0;
        assert!(!apply(&mut p, input(true, false), &t));
        assert_eq!(p.vy, 0.0);
    }

    #[test]
    fn coyote_window_honors_late_press() {
        let t = tuning();
        let mut p = Player::new(0.0, 0.0);
        apply(&mut p, input(true, false), &t);
        // 6 airborne ticks = 96ms < 120ms
        for _ in 0..6 { apply(&mut p, input(false, false), &t); }
        assert!(apply(&mut p, input(false, true), &t)); // 112ms elapsed at check
    }

    #[test]
    fn expired_coyote_press_is_ignored() {
        let t = tuning();
        let mut p = Player::new(0.0, 0.0);
        apply(&mut p, input(true, false), &t);
        for _ in 0..8 { apply(&mut p, input(false, false), &t); } // 128ms
        p.vy = 55.0;
        assert!(!apply(&mut p, input(false, true), &t));
        assert_eq!(p.vy, 55.0);
    }

    #[test]
    fn buffered_press_fires_on_landing() {
        let t = tuning();
        let mut p = Player::new(0.0, 0.0);
        p.coyote_ms = -500.0;
        assert!(!apply(&mut p, input(false, true), &t));
        for _ in 0..5 { assert!(!apply(&mut p, input(false, false), &t)); } // 80ms
        assert!(apply(&mut p, input(true, false), &t));
        assert_eq!(p.vy, -420.0);
    }

    #[test]
    fn stale_buffer_does_not_fire_on_landing() {
        let t = tuning();
        let mut p = Player::new(0.0, 0.0);
        p.coyote_ms = -500.0;
        apply(&mut p, input(false, true), &t);
        for _ in 0..10 { apply(&mut p, input(false, false), &t); } // 160ms
        assert!(!apply(&mut p, input(true, false), &t));
        assert_eq!(p.vy, 0.0);
    }

    #[test]
    fn negative_timers_still_reset() {
        let t = tuning();
        let mut p = Player::new(0.0, 0.0);
        p.coyote_ms = -10_000.0;
        p.jump_buffer_ms = -10_000.0;
        assert!(apply(&mut p, input(true, true), &t));
    }

    #[test]
    fn single_press_never_double_jumps() {
        let t = tuning();
        let mut p = Player::new(0.0, 0.0);
        let mut jumps = 0;
        if apply(&mut p, input(true, true), &t) { jumps += 1; }
        for i in 0..20 {
            // land again inside the original buffer window
            if apply(&mut p, input(i % 2 == 0, false), &t) { jumps += 1; }
        }
        assert_eq!(jumps, 1);
    }

    #[test]
    fn no_jump_while_climbing() {
        let t = tuning();
        let mut p = Player::new(0.0, 0.0);
        p.on_ladder = true;
        p.gravity_enabled = false;
        assert!(!apply(&mut p, input(true, true), &t));
        assert_eq!(p.vy, 0.0);
    }

    #[test]
    fn locked_player_is_frozen() {
        let t = tuning();
        let mut p = Player::new(0.0, 0.0);
        p.movement_locked = true;
        p.vx = 100.0;
        p.vy = 100.0;
        assert!(!apply(&mut p, LocomotionInput { move_right: true, ..input(true, true) }, &t));
        assert_eq!(p.vx, 0.0);
        assert_eq!(p.vy, 0.0);

        // Press made during the lock does not leak past it
        p.movement_locked = false;
        assert!(!apply(&mut p, input(true, false), &t));
    }
}
