/// WorldState: the single simulation context.
///
/// Everything the tick mutates lives here and is passed explicitly to every
/// component. Nothing is global.
///
/// ## Layers
///   - layout: platforms, ladders, door/flag regions. Fixed after load.
///   - runtime: player, station status, challenge, score, badges
///   - pacing: save timer, message timer, tick counter
///
/// The frontend only reads: player pose, station status, the active
/// challenge step, door presence, logbook visibility.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::TuningConfig;
use crate::domain::challenge::{ChallengeSession, ChallengeStep};
use crate::domain::entity::{Badges, Door, Flag, Player, Rect, Route, Station};
use crate::domain::physics::{Solid, SolidKind};

pub struct WorldState {
    // ── Layout ──
    pub width: f32,
    pub height: f32,
    pub platforms: Vec<Rect>,
    pub ladders: Vec<Rect>,
    pub player_spawn: (f32, f32),

    // ── Entities ──
    pub player: Player,
    pub stations: Vec<Station>,
    pub door: Door,
    pub flag: Flag,

    // ── Progress ──
    pub challenge: Option<ChallengeSession>,
    pub score: u32,
    pub badges: Badges,

    // ── Config / RNG ──
    pub tuning: TuningConfig,
    pub rng: Pcg32,

    // ── Pacing ──
    pub tick: u64,
    /// Accumulated ms since the last interval save.
    pub save_timer_ms: f32,
    /// Set by completion handlers; the step flushes it once per tick.
    pub save_requested: bool,

    // ── UI ──
    pub logbook_visible: bool,
    pub message: String,
    pub message_timer_ms: f32,
    /// Shown one after another once the current message expires.
    pub message_queue: VecDeque<(String, f32)>,
}

// ── Construction ──

impl WorldState {
    pub fn new(tuning: TuningConfig, seed: u64) -> Self {
        WorldState {
            width: 0.0,
            height: 0.0,
            platforms: vec![],
            ladders: vec![],
            player_spawn: (0.0, 0.0),
            player: Player::new(0.0, 0.0),
            stations: vec![],
            door: Door { bounds: Rect::new(0.0, 0.0, 0.0, 0.0), present: false },
            flag: Flag { bounds: Rect::new(0.0, 0.0, 0.0, 0.0), reached: false },
            challenge: None,
            score: 0,
            badges: Badges::default(),
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            tick: 0,
            save_timer_ms: 0.0,
            save_requested: false,
            logbook_visible: false,
            message: String::new(),
            message_timer_ms: 0.0,
            message_queue: VecDeque::new(),
        }
    }

    pub fn set_message(&mut self, msg: &str, duration_ms: f32) {
        self.message = msg.to_string();
        self.message_timer_ms = duration_ms;
    }

    /// Show `msg` now if the message line is free, else after the ones ahead of it.
    pub fn queue_message(&mut self, msg: &str, duration_ms: f32) {
        if self.message.is_empty() {
            self.set_message(msg, duration_ms);
        } else {
            self.message_queue.push_back((msg.to_string(), duration_ms));
        }
    }

    /// Advance the message line by `elapsed_ms`.
    pub fn tick_message(&mut self, elapsed_ms: f32) {
        if self.message_timer_ms <= 0.0 { return; }
        self.message_timer_ms -= elapsed_ms;
        if self.message_timer_ms > 0.0 { return; }

        match self.message_queue.pop_front() {
            Some((msg, ms)) => self.set_message(&msg, ms),
            None => {
                self.message_timer_ms = 0.0;
                self.message.clear();
            }
        }
    }
}

// ── Queries ──

impl WorldState {
    pub fn station_index(&self, id: u32) -> Option<usize> {
        self.stations.iter().position(|s| s.id == id)
    }

    pub fn completed_count(&self) -> usize {
        self.stations.iter().filter(|s| s.completed()).count()
    }

    /// Vacuously false for a level without stations.
    pub fn all_stations_completed(&self) -> bool {
        !self.stations.is_empty() && self.stations.iter().all(|s| s.completed())
    }

    /// True iff at least one high-route station exists and all are done.
    pub fn high_route_completed(&self) -> bool {
        let mut high = self.stations.iter().filter(|s| s.route == Route::High).peekable();
        high.peek().is_some() && high.all(|s| s.completed())
    }

    pub fn active_step(&self) -> Option<&ChallengeStep> {
        self.challenge.as_ref().map(|c| c.current())
    }

    /// Everything that blocks the body this tick.
    pub fn solids(&self) -> Vec<Solid> {
        let mut solids: Vec<Solid> = self.platforms.iter()
            .map(|&bounds| Solid { bounds, kind: SolidKind::OneWay })
            .collect();
        if self.door.present {
            solids.push(Solid { bounds: self.door.bounds, kind: SolidKind::Full });
        }
        solids
    }
}
