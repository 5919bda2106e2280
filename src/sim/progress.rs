/// Station progression state machine.
///
/// ## Per-station transitions
///
/// ┌──────────────┬──────────────────────────┬──────────────┐
/// │ From          │ Trigger                   │ To           │
/// ├──────────────┼──────────────────────────┼──────────────┤
/// │ Pending       │ player overlaps station   │ InChallenge  │
/// │ InChallenge   │ re-overlap                │ (no-op)      │
/// │ InChallenge   │ other station overlapped  │ Pending      │
/// │ InChallenge   │ true/false step answered  │ Completed    │
/// │ Completed     │ anything                  │ (terminal)   │
/// └──────────────┴──────────────────────────┴──────────────┘
///
/// ## Aggregate one-shots
///   - every station done → door removed, `all_complete` badge
///   - flag overlapped with every station done and `flag.reached` unset →
///     level bonus, `all_complete` badge. Guarded by `reached` only.
///   - `high_route_complete` re-evaluated every tick until it latches
///
/// The true/false step completes the station whatever the reply; the
/// reply's correctness is only reported in the event.

use tracing::{debug, info};

use crate::domain::challenge::{ChallengeSession, StepOutcome};
use crate::domain::entity::{ChallengeAnswer, StationStatus};
use super::event::GameEvent;
use super::world::WorldState;

const MESSAGE_MS: f32 = 1800.0;

// ══════════════════════════════════════════════════════════════
// Station overlap → challenge
// ══════════════════════════════════════════════════════════════

/// Player touched a station this tick.
pub fn on_station_overlap(world: &mut WorldState, station_id: u32, events: &mut Vec<GameEvent>) {
    let idx = match world.station_index(station_id) {
        Some(i) => i,
        None => return,
    };
    if world.stations[idx].status != StationStatus::Pending { return; }

    if let Some(prev) = world.challenge.take() {
        if let Some(p) = world.station_index(prev.station_id) {
            if world.stations[p].status == StationStatus::InChallenge {
                world.stations[p].status = StationStatus::Pending;
            }
        }
        debug!(station = prev.station_id, by = station_id, "challenge superseded");
        events.push(GameEvent::ChallengeSuperseded { station_id: prev.station_id });
    }

    let session = ChallengeSession::for_station(&world.stations[idx], &mut world.rng);
    world.stations[idx].status = StationStatus::InChallenge;
    world.challenge = Some(session);
    world.player.movement_locked = true;
    world.player.vx = 0.0;
    world.player.vy = 0.0;

    debug!(station = station_id, "challenge started");
    events.push(GameEvent::ChallengeStarted { station_id });
}

// ══════════════════════════════════════════════════════════════
// Challenge answers
// ══════════════════════════════════════════════════════════════

/// Feed the challenge UI's answer. Returns true if a station completed.
pub fn on_answer(world: &mut WorldState, answer: ChallengeAnswer, events: &mut Vec<GameEvent>) -> bool {
    let session = match world.challenge.as_mut() {
        Some(s) => s,
        None => return false,
    };
    let station_id = session.station_id;

    match session.answer(answer) {
        StepOutcome::Ignored => false,
        StepOutcome::Advanced => {
            events.push(GameEvent::ChallengeAdvanced { station_id, step: session.index() });
            false
        }
        StepOutcome::Finished { correct } => {
            world.challenge = None;
            world.player.movement_locked = false;
            complete_station(world, station_id, correct, events)
        }
    }
}

fn complete_station(world: &mut WorldState, station_id: u32, correct: bool, events: &mut Vec<GameEvent>) -> bool {
    let idx = match world.station_index(station_id) {
        Some(i) => i,
        None => return false,
    };
    if !world.stations[idx].complete() { return false; }

    world.score += world.tuning.station_reward;
    world.save_requested = true;

    let title = world.stations[idx].title.clone();
    info!(station = station_id, title = %title, correct, score = world.score, "station completed");
    world.set_message(&format!("✔ {}  +{}", title, world.tuning.station_reward), MESSAGE_MS);
    events.push(GameEvent::StationCompleted { station_id, title, answered_correctly: correct });

    check_all_complete(world, events);
    true
}

// ══════════════════════════════════════════════════════════════
// Aggregate completion
// ══════════════════════════════════════════════════════════════

fn check_all_complete(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.all_stations_completed() { return; }

    if world.door.present {
        world.door.present = false;
        info!("all stations complete, door unlocked");
        events.push(GameEvent::DoorUnlocked);
    }
    earn_all_complete(world, events);
}

fn earn_all_complete(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.badges.all_complete { return; }
    world.badges.all_complete = true;
    info!(badge = "Martian Explorer", "badge earned");
    events.push(GameEvent::BadgeEarned { name: "Martian Explorer" });
}

/// Player touched the flag. Returns true if this completed the level.
pub fn on_flag_overlap(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if world.flag.reached || !world.all_stations_completed() { return false; }

    world.flag.reached = true;
    let bonus = world.tuning.level_complete_bonus;
    world.score += bonus;
    world.save_requested = true;
    earn_all_complete(world, events);

    info!(bonus, score = world.score, "level complete");
    world.set_message(&format!("MISSION COMPLETE  +{}", bonus), MESSAGE_MS * 2.0);
    events.push(GameEvent::LevelCompleted { bonus });
    true
}

/// Per-tick badge sweep. Both badges latch; once true they are never revisited.
pub fn evaluate_badges(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.badges.all_complete && world.all_stations_completed() {
        earn_all_complete(world, events);
    }
    if !world.badges.high_route_complete && world.high_route_completed() {
        world.badges.high_route_complete = true;
        info!(badge = "High Route Pioneer", "badge earned");
        events.push(GameEvent::BadgeEarned { name: "High Route Pioneer" });
    }
}
