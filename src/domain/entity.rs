/// Entities: Player, Station, Door, Flag.
/// Station status is a three-state machine; Completed is terminal.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// Axis-aligned box in world units. `(x, y)` is the top-left corner,
/// y grows downward.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    /// Build from a center point, the way level data is authored.
    pub fn centered(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Rect { x: cx - w / 2.0, y: cy - h / 2.0, w, h }
    }

    pub fn right(&self) -> f32 { self.x + self.w }
    pub fn bottom(&self) -> f32 { self.y + self.h }
    pub fn center_x(&self) -> f32 { self.x + self.w / 2.0 }

    /// Strict overlap: touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Per-tick input, already reduced to signals by the frontend.
/// Movement keys are level-triggered; jump and logbook are edges.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub move_left: bool,
    pub move_right: bool,
    pub climb_up: bool,
    pub climb_down: bool,
    pub jump_pressed: bool,
    /// Raw held state. Jumps are edge-triggered, so the sim reads `jump_pressed`.
    pub jump_held: bool,
    pub logbook_toggled: bool,
    pub answer: Option<ChallengeAnswer>,
    pub elapsed_ms: f32,
}

/// A reply from the challenge UI for the current step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChallengeAnswer {
    /// Index into the Sequence step's options.
    Choice(usize),
    TrueFalse(bool),
}

pub const PLAYER_W: f32 = 28.0;
pub const PLAYER_H: f32 = 44.0;

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub facing: Facing,
    pub grounded: bool,
    pub gravity_enabled: bool,
    pub on_ladder: bool,
    /// Remaining coyote time in ms; expired when <= 0.
    pub coyote_ms: f32,
    /// Remaining jump buffer in ms; expired when <= 0.
    pub jump_buffer_ms: f32,
    /// True while a challenge session is open.
    pub movement_locked: bool,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Player {
            x, y,
            vx: 0.0,
            vy: 0.0,
            facing: Facing::Right,
            grounded: false,
            gravity_enabled: true,
            on_ladder: false,
            coyote_ms: 0.0,
            jump_buffer_ms: 0.0,
            movement_locked: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, PLAYER_W, PLAYER_H)
    }

    /// In a ladder zone with gravity suspended.
    pub fn is_climbing(&self) -> bool {
        self.on_ladder && !self.gravity_enabled
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Route {
    High,
    Low,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StationStatus {
    Pending,
    InChallenge,
    Completed,
}

/// The fact retained in the logbook once a station is completed.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnedFact {
    pub key_fact: String,
}

#[derive(Clone, Debug)]
pub struct Station {
    pub id: u32,
    pub title: String,
    pub bounds: Rect,
    pub route: Route,
    pub facts: Vec<String>,
    pub status: StationStatus,
    pub learned: Option<LearnedFact>,
}

impl Station {
    pub fn new(id: u32, title: &str, bounds: Rect, route: Route, facts: &[&str]) -> Self {
        Station {
            id,
            title: title.to_string(),
            bounds,
            route,
            facts: facts.iter().map(|f| f.to_string()).collect(),
            status: StationStatus::Pending,
            learned: None,
        }
    }

    pub fn completed(&self) -> bool {
        self.status == StationStatus::Completed
    }

    /// Terminal transition. Returns false if the station was already done.
    pub fn complete(&mut self) -> bool {
        if self.completed() { return false; }
        self.status = StationStatus::Completed;
        self.learned = self.facts.first().map(|f| LearnedFact { key_fact: f.clone() });
        true
    }
}

/// Solid obstacle in front of the flag; removed once every station is done.
#[derive(Clone, Debug)]
pub struct Door {
    pub bounds: Rect,
    pub present: bool,
}

#[derive(Clone, Debug)]
pub struct Flag {
    pub bounds: Rect,
    /// One-shot guard for the level-complete bonus.
    pub reached: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badges {
    pub all_complete: bool,
    pub high_route_complete: bool,
}

impl Badges {
    pub fn earned_names(&self) -> Vec<&'static str> {
        let mut names = vec![];
        if self.all_complete { names.push("Martian Explorer"); }
        if self.high_route_complete { names.push("High Route Pioneer"); }
        names
    }
}
