/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Message timer
///   2. Logbook toggle
///   3. Challenge answer (may complete a station and unlock movement)
///   4. Ladder tracking from the current pose
///   5. Locomotion (walk, coyote/buffer timers, jump)
///   6. Body integration via the collision collaborator
///   7. Overlap dispatch (stations, flag)
///   8. Badge sweep
///   9. Persistence (completion-triggered or interval)
///
/// Ladder tracking runs before locomotion so climb mode blocks a jump in
/// the same tick. Locomotion reads `grounded` from the previous tick's
/// integration.

use tracing::{debug, warn};

use crate::domain::entity::FrameInput;
use crate::domain::{ladder, locomotion, physics};
use crate::domain::locomotion::LocomotionInput;
use super::event::{GameEvent, Overlap};
use super::progress;
use super::save::{self, Persistence};
use super::world::WorldState;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput, persistence: &mut Persistence) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    let elapsed = input.elapsed_ms.max(0.0);
    world.tick += 1;

    world.tick_message(elapsed);

    if input.logbook_toggled {
        world.logbook_visible = !world.logbook_visible;
        events.push(GameEvent::LogbookToggled { visible: world.logbook_visible });
    }

    if let Some(answer) = input.answer {
        progress::on_answer(world, answer, &mut events);
    }

    resolve_movement(world, &input, elapsed, &mut events);

    for overlap in collect_overlaps(world) {
        match overlap {
            Overlap::Station { id } => progress::on_station_overlap(world, id, &mut events),
            Overlap::Flag => { progress::on_flag_overlap(world, &mut events); }
            Overlap::Ladder => {}
        }
    }

    progress::evaluate_badges(world, &mut events);
    resolve_persistence(world, persistence, elapsed, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Movement: ladder → locomotion → integration
// ══════════════════════════════════════════════════════════════

fn resolve_movement(world: &mut WorldState, input: &FrameInput, elapsed: f32, events: &mut Vec<GameEvent>) {
    let zone = physics::overlapping(&world.player.bounds(), &world.ladders)
        .first()
        .map(|&i| world.ladders[i]);
    ladder::track(
        &mut world.player,
        zone.as_ref(),
        input.climb_up,
        input.climb_down,
        world.tuning.ladder_climb_speed,
    );

    let loco = LocomotionInput {
        move_left: input.move_left,
        move_right: input.move_right,
        jump_pressed: input.jump_pressed,
        grounded: world.player.grounded,
        elapsed_ms: elapsed,
    };
    if locomotion::apply(&mut world.player, loco, &world.tuning) {
        debug!(tick = world.tick, x = world.player.x, y = world.player.y, "jump");
        events.push(GameEvent::Jumped);
    }

    // A locked body holds its pose for the whole challenge.
    if world.player.movement_locked { return; }

    let solids = world.solids();
    world.player.grounded = physics::integrate(
        &mut world.player,
        &solids,
        world.width,
        world.height,
        world.tuning.gravity,
        elapsed,
    );
    if let Some(l) = zone {
        ladder::clamp_to_foot(&mut world.player, &l);
    }
}

/// Trigger regions the player touches after integration.
/// Stations come out in layout order.
fn collect_overlaps(world: &WorldState) -> Vec<Overlap> {
    let body = world.player.bounds();
    let mut out = Vec::new();

    if !physics::overlapping(&body, &world.ladders).is_empty() {
        out.push(Overlap::Ladder);
    }
    out.extend(
        world.stations.iter()
            .filter(|s| body.intersects(&s.bounds))
            .map(|s| Overlap::Station { id: s.id }),
    );
    if body.intersects(&world.flag.bounds) {
        out.push(Overlap::Flag);
    }
    out
}

// ══════════════════════════════════════════════════════════════
// Persistence
// ══════════════════════════════════════════════════════════════

fn resolve_persistence(world: &mut WorldState, persistence: &mut Persistence, elapsed: f32, events: &mut Vec<GameEvent>) {
    world.save_timer_ms += elapsed;
    let interval_due = world.save_timer_ms >= world.tuning.save_interval_ms;
    if !world.save_requested && !interval_due { return; }

    world.save_requested = false;
    if interval_due { world.save_timer_ms = 0.0; }

    match persistence.save(&save::capture_snapshot(world)) {
        Ok(()) => events.push(GameEvent::ProgressSaved),
        Err(e) => {
            warn!(error = %e, tick = world.tick, "progress save failed, continuing");
            events.push(GameEvent::SaveFailed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TuningConfig;
    use crate::domain::entity::{ChallengeAnswer, StationStatus, PLAYER_H};
    use crate::sim::level::{load_level, mars_level, WORLD_H};
    use crate::sim::save::{MemoryStorage, STORAGE_KEY};

    const DT: f32 = 16.0;

    fn setup() -> (WorldState, Persistence, MemoryStorage) {
        let mut w = WorldState::new(TuningConfig::default(), 11);
        load_level(&mut w, &mars_level());
        let mem = MemoryStorage::new();
        (w, Persistence::new(Box::new(mem.clone())), mem)
    }

    fn idle() -> FrameInput {
        FrameInput { elapsed_ms: DT, ..Default::default() }
    }

    fn answer(a: ChallengeAnswer) -> FrameInput {
        FrameInput { answer: Some(a), ..idle() }
    }

    /// Stand the player on the ground strip at `x`.
    fn stand_at(w: &mut WorldState, x: f32) {
        w.player.x = x;
        w.player.y = WORLD_H - 40.0 - PLAYER_H;
        w.player.vx = 0.0;
        w.player.vy = 0.0;
        w.player.grounded = true;
    }

    /// Stand the player on top of station `idx`.
    fn stand_on_station(w: &mut WorldState, idx: usize) {
        let b = w.stations[idx].bounds;
        w.player.x = b.center_x() - 14.0;
        w.player.y = b.bottom() - PLAYER_H;
        w.player.vx = 0.0;
        w.player.vy = 0.0;
        w.player.grounded = true;
    }

    #[test]
    fn walking_moves_player() {
        let (mut w, mut p, _) = setup();
        stand_at(&mut w, 100.0);
        for _ in 0..10 {
            step(&mut w, FrameInput { move_right: true, ..idle() }, &mut p);
        }
        assert!(w.player.x > 100.0);
        assert!(w.player.grounded);
        assert_eq!(w.player.y, WORLD_H - 40.0 - PLAYER_H);
    }

    #[test]
    fn grounded_jump_emits_event() {
        let (mut w, mut p, _) = setup();
        stand_at(&mut w, 100.0);
        let ev = step(&mut w, FrameInput { jump_pressed: true, ..idle() }, &mut p);
        assert!(ev.contains(&GameEvent::Jumped));
        assert!(w.player.vy < 0.0);
        assert!(!w.player.grounded);
    }

    #[test]
    fn climbing_ladder_blocks_jump() {
        let (mut w, mut p, _) = setup();
        let ladder = w.ladders[0];
        stand_at(&mut w, ladder.x + 4.0);
        let y0 = w.player.y;

        let ev = step(&mut w, FrameInput { climb_up: true, jump_pressed: true, ..idle() }, &mut p);
        assert!(!ev.contains(&GameEvent::Jumped));
        assert!(w.player.is_climbing());
        assert!(w.player.y < y0);
    }

    #[test]
    fn down_at_ladder_foot_stays_on_ground() {
        let (mut w, mut p, _) = setup();
        let ladder = w.ladders[0];
        stand_at(&mut w, ladder.x + 4.0);
        let ground_top = WORLD_H - 40.0;

        for _ in 0..30 {
            step(&mut w, FrameInput { climb_down: true, ..idle() }, &mut p);
        }
        assert_eq!(w.player.bounds().bottom(), ground_top);
        assert!(w.player.grounded);
        assert!(!w.player.is_climbing());
    }

    #[test]
    fn climbing_down_lands_on_ground_at_foot() {
        let (mut w, mut p, _) = setup();
        let ladder = w.ladders[0];
        stand_at(&mut w, ladder.x + 4.0);
        for _ in 0..40 {
            step(&mut w, FrameInput { climb_up: true, ..idle() }, &mut p);
        }
        assert!(w.player.is_climbing());
        assert!(w.player.bounds().bottom() < ladder.bottom());

        for _ in 0..80 {
            step(&mut w, FrameInput { climb_down: true, ..idle() }, &mut p);
        }
        assert_eq!(w.player.bounds().bottom(), ladder.bottom());
        step(&mut w, idle(), &mut p);
        assert!(w.player.grounded);
        assert_eq!(w.player.bounds().bottom(), WORLD_H - 40.0);
    }

    #[test]
    fn station_challenge_through_overlap() {
        let (mut w, mut p, mem) = setup();
        stand_on_station(&mut w, 0);

        let ev = step(&mut w, idle(), &mut p);
        assert!(ev.contains(&GameEvent::ChallengeStarted { station_id: 1 }));
        assert_eq!(w.stations[0].status, StationStatus::InChallenge);
        assert!(w.player.movement_locked);

        // Locked: movement input is ignored
        let x0 = w.player.x;
        step(&mut w, FrameInput { move_right: true, ..idle() }, &mut p);
        assert_eq!(w.player.x, x0);

        let ev = step(&mut w, answer(ChallengeAnswer::Choice(0)), &mut p);
        assert!(ev.contains(&GameEvent::ChallengeAdvanced { station_id: 1, step: 1 }));

        let ev = step(&mut w, answer(ChallengeAnswer::TrueFalse(false)), &mut p);
        assert!(ev.iter().any(|e| matches!(e,
            GameEvent::StationCompleted { station_id: 1, answered_correctly: false, .. })));
        assert!(ev.contains(&GameEvent::ProgressSaved));
        assert_eq!(w.score, 100);
        assert!(!w.player.movement_locked);
        assert!(mem.raw(STORAGE_KEY).is_some());

        // Still standing on it: completed stations never restart
        let ev = step(&mut w, idle(), &mut p);
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::ChallengeStarted { .. })));
        assert_eq!(w.score, 100);
    }

    #[test]
    fn answers_without_challenge_are_ignored() {
        let (mut w, mut p, _) = setup();
        stand_at(&mut w, 100.0);
        let ev = step(&mut w, answer(ChallengeAnswer::TrueFalse(true)), &mut p);
        assert!(ev.is_empty());
        assert_eq!(w.score, 0);
    }

    #[test]
    fn interval_save() {
        let (mut w, mut p, mem) = setup();
        stand_at(&mut w, 100.0);
        let tick = FrameInput { elapsed_ms: 500.0, ..Default::default() };

        for _ in 0..3 {
            let ev = step(&mut w, tick, &mut p);
            assert!(!ev.contains(&GameEvent::ProgressSaved));
        }
        let ev = step(&mut w, tick, &mut p);
        assert!(ev.contains(&GameEvent::ProgressSaved));
        assert_eq!(w.save_timer_ms, 0.0);
        assert!(mem.raw(STORAGE_KEY).is_some());
    }

    #[test]
    fn save_failure_keeps_playing() {
        let (mut w, _, _) = setup();
        let mut p = Persistence::unavailable();
        stand_on_station(&mut w, 1);
        step(&mut w, idle(), &mut p);
        step(&mut w, answer(ChallengeAnswer::Choice(1)), &mut p);
        let ev = step(&mut w, answer(ChallengeAnswer::TrueFalse(true)), &mut p);
        assert!(ev.contains(&GameEvent::SaveFailed));
        assert_eq!(w.score, 100);
        assert!(w.stations[1].completed());
        assert!(!w.save_requested);
    }

    #[test]
    fn flag_needs_every_station() {
        let (mut w, mut p, _) = setup();
        w.door.present = false;
        let flag = w.flag.bounds;
        stand_at(&mut w, flag.x);

        let ev = step(&mut w, idle(), &mut p);
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::LevelCompleted { .. })));
        assert_eq!(w.score, 0);

        for s in &mut w.stations { s.complete(); }
        let ev = step(&mut w, idle(), &mut p);
        assert!(ev.contains(&GameEvent::LevelCompleted { bonus: 500 }));
        assert!(ev.contains(&GameEvent::ProgressSaved));
        assert_eq!(w.score, 500);
        assert!(w.badges.all_complete);

        // Standing on the flag does not pay twice
        let ev = step(&mut w, idle(), &mut p);
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::LevelCompleted { .. })));
        assert_eq!(w.score, 500);
    }

    #[test]
    fn door_blocks_walking_to_flag() {
        let (mut w, mut p, _) = setup();
        let door = w.door.bounds;
        stand_at(&mut w, door.x - 40.0);
        for _ in 0..60 {
            step(&mut w, FrameInput { move_right: true, ..idle() }, &mut p);
        }
        assert!(w.player.bounds().right() <= door.x);

        w.door.present = false;
        for _ in 0..60 {
            step(&mut w, FrameInput { move_right: true, ..idle() }, &mut p);
        }
        assert!(w.player.x > door.right());
    }

    #[test]
    fn high_route_badge_latches_via_sweep() {
        let (mut w, mut p, _) = setup();
        stand_at(&mut w, 100.0);
        for s in w.stations.iter_mut().filter(|s| s.route == crate::domain::entity::Route::High) {
            s.complete();
        }
        let ev = step(&mut w, idle(), &mut p);
        assert!(ev.contains(&GameEvent::BadgeEarned { name: "High Route Pioneer" }));
        assert!(w.badges.high_route_complete);
        let ev = step(&mut w, idle(), &mut p);
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::BadgeEarned { .. })));
    }

    #[test]
    fn logbook_toggle_and_message_expiry() {
        let (mut w, mut p, _) = setup();
        stand_at(&mut w, 100.0);
        assert!(!w.message.is_empty());

        let ev = step(&mut w, FrameInput { logbook_toggled: true, ..idle() }, &mut p);
        assert!(ev.contains(&GameEvent::LogbookToggled { visible: true }));
        assert!(w.logbook_visible);

        step(&mut w, FrameInput { elapsed_ms: 2500.0, ..Default::default() }, &mut p);
        assert!(w.message.is_empty());
    }

    #[test]
    fn score_never_decreases() {
        let (mut w, mut p, _) = setup();
        let mut last = 0;
        for idx in 0..w.stations.len() {
            stand_on_station(&mut w, idx);
            step(&mut w, idle(), &mut p);
            step(&mut w, answer(ChallengeAnswer::Choice(0)), &mut p);
            step(&mut w, answer(ChallengeAnswer::TrueFalse(true)), &mut p);
            assert!(w.score >= last);
            last = w.score;
        }
        assert_eq!(w.score, 600);
        assert!(!w.door.present);
        assert!(w.badges.all_complete && w.badges.high_route_complete);
    }

    #[test]
    fn completion_message_outlives_same_tick_announcements() {
        let (mut w, mut p, _) = setup();
        let last = w.stations.len() - 1;
        for idx in 0..last {
            w.stations[idx].status = StationStatus::Completed;
        }
        stand_on_station(&mut w, last);
        step(&mut w, idle(), &mut p);
        step(&mut w, answer(ChallengeAnswer::Choice(0)), &mut p);
        let ev = step(&mut w, answer(ChallengeAnswer::TrueFalse(true)), &mut p);
        assert!(ev.contains(&GameEvent::DoorUnlocked));
        let done = w.message.clone();
        assert!(done.starts_with('✔'));

        w.queue_message("airlock open", 1000.0);
        assert_eq!(w.message, done);

        step(&mut w, FrameInput { elapsed_ms: 2000.0, ..Default::default() }, &mut p);
        assert_eq!(w.message, "airlock open");
    }
}
