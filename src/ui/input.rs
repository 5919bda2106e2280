/// Keyboard tracker and FrameInput builder.
///
/// Terminals report presses (and repeats) but often not releases, so a key
/// counts as held until HOLD_TIMEOUT passes without a new Press/Repeat.
/// Release events are honored only when keyboard enhancement is active.
///
/// ## Bindings
///   ←/A →/D       walk            ↑/W ↓/S    climb
///   Space         jump (edge)     Tab/L      logbook (edge)
///   1-9           sequence option T/Y F/N    true / false
///   Esc/Q, Ctrl-C quit
///
/// Answer keys are only turned into answers while a challenge step is
/// showing, and only for the kind of step showing.
///
/// Events are drained far more often than the simulation steps, so every
/// fresh press is also latched until the next `frame_input` consumes it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::challenge::ChallengeStep;
use crate::domain::entity::{ChallengeAnswer, FrameInput};

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key Constants ──

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
pub const KEYS_JUMP: &[KeyCode] = &[KeyCode::Char(' ')];
pub const KEYS_LOGBOOK: &[KeyCode] = &[KeyCode::Tab, KeyCode::Char('l'), KeyCode::Char('L')];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,
    /// Fresh presses since the last `frame_input`, across drains.
    latched: Vec<KeyCode>,
    raw_events: Vec<KeyEvent>,
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            latched: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per loop pass.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key);
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Apply one key event to the tracker.
    fn record(&mut self, key: KeyEvent) {
        self.raw_events.push(key);

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(key.code);
                    self.latched.push(key.code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    pub fn quit_pressed(&self) -> bool {
        self.ctrl_c_pressed() || self.any_pressed(KEYS_QUIT)
    }

    fn any_latched(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.latched.contains(c))
    }

    /// Reduce the keys seen since the last step to the simulation's input
    /// signals, consuming the latched presses.
    pub fn frame_input(&mut self, step: Option<&ChallengeStep>, elapsed_ms: f32) -> FrameInput {
        // A latched press always counts, even if the hold already expired.
        let down = |codes: &[KeyCode]| self.any_held(codes) || self.any_latched(codes);
        let input = FrameInput {
            move_left: down(KEYS_LEFT),
            move_right: down(KEYS_RIGHT),
            climb_up: down(KEYS_UP),
            climb_down: down(KEYS_DOWN),
            jump_pressed: self.any_latched(KEYS_JUMP),
            jump_held: self.any_held(KEYS_JUMP),
            logbook_toggled: self.any_latched(KEYS_LOGBOOK),
            answer: step.and_then(|s| {
                self.latched.iter().find_map(|&code| answer_for_key(code, s))
            }),
            elapsed_ms,
        };
        self.latched.clear();
        input
    }
}

/// Map one key to an answer for the given step, if it means anything there.
pub fn answer_for_key(code: KeyCode, step: &ChallengeStep) -> Option<ChallengeAnswer> {
    match (step, code) {
        (ChallengeStep::Sequence { .. }, KeyCode::Char(c @ '1'..='9')) => {
            Some(ChallengeAnswer::Choice(c as usize - '1' as usize))
        }
        (ChallengeStep::TrueFalse { .. }, KeyCode::Char('t' | 'T' | 'y' | 'Y')) => {
            Some(ChallengeAnswer::TrueFalse(true))
        }
        (ChallengeStep::TrueFalse { .. }, KeyCode::Char('f' | 'F' | 'n' | 'N')) => {
            Some(ChallengeAnswer::TrueFalse(false))
        }
        _ => None,
    }
}
