/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tuning: TuningConfig,
    pub frame_ms: u64,
    /// Challenge shuffle seed. 0 means "derive from the clock".
    pub seed: u64,
    pub save_dir: Option<PathBuf>,
}

/// Gameplay constants. Units are world pixels, seconds and milliseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct TuningConfig {
    pub walk_speed: f32,
    pub jump_velocity: f32,      // negative = up
    pub coyote_time_ms: f32,
    pub jump_buffer_ms: f32,
    pub ladder_climb_speed: f32,
    pub gravity: f32,
    pub station_reward: u32,
    pub level_complete_bonus: u32,
    pub save_interval_ms: f32,
}

impl Default for TuningConfig {
    fn default() -> Self {
        let t = TomlTuning::default();
        TuningConfig {
            walk_speed: t.walk_speed,
            jump_velocity: t.jump_velocity,
            coyote_time_ms: t.coyote_time_ms,
            jump_buffer_ms: t.jump_buffer_ms,
            ladder_climb_speed: t.ladder_climb_speed,
            gravity: t.gravity,
            station_reward: t.station_reward,
            level_complete_bonus: t.level_complete_bonus,
            save_interval_ms: t.save_interval_ms,
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    tuning: TomlTuning,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTuning {
    #[serde(default = "default_walk_speed")]
    walk_speed: f32,
    #[serde(default = "default_jump_velocity")]
    jump_velocity: f32,
    #[serde(default = "default_coyote")]
    coyote_time_ms: f32,
    #[serde(default = "default_jump_buffer")]
    jump_buffer_ms: f32,
    #[serde(default = "default_climb_speed")]
    ladder_climb_speed: f32,
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_station_reward")]
    station_reward: u32,
    #[serde(default = "default_level_bonus")]
    level_complete_bonus: u32,
    #[serde(default = "default_save_interval")]
    save_interval_ms: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    save_dir: Option<String>,
}

// ── Defaults ──

fn default_walk_speed() -> f32 { 220.0 }
fn default_jump_velocity() -> f32 { -420.0 }
fn default_coyote() -> f32 { 120.0 }
fn default_jump_buffer() -> f32 { 150.0 }
fn default_climb_speed() -> f32 { 120.0 }
fn default_gravity() -> f32 { 700.0 }
fn default_station_reward() -> u32 { 100 }
fn default_level_bonus() -> u32 { 500 }
fn default_save_interval() -> f32 { 2000.0 }
fn default_frame_ms() -> u64 { 16 }

impl Default for TomlTuning {
    fn default() -> Self {
        TomlTuning {
            walk_speed: default_walk_speed(),
            jump_velocity: default_jump_velocity(),
            coyote_time_ms: default_coyote(),
            jump_buffer_ms: default_jump_buffer(),
            ladder_climb_speed: default_climb_speed(),
            gravity: default_gravity(),
            station_reward: default_station_reward(),
            level_complete_bonus: default_level_bonus(),
            save_interval_ms: default_save_interval(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            frame_ms: default_frame_ms(),
            seed: 0,
            save_dir: None,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());
        Self::from_toml(toml_cfg)
    }

    /// Parse config text directly. Invalid text yields the defaults.
    #[allow(dead_code)]
    pub fn from_toml_str(text: &str) -> Self {
        let toml_cfg = toml::from_str::<TomlConfig>(text).unwrap_or_else(|e| {
            warn!(error = %e, "config parse error, using defaults");
            TomlConfig::default()
        });
        Self::from_toml(toml_cfg)
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        let t = cfg.tuning;
        GameConfig {
            tuning: TuningConfig {
                walk_speed: t.walk_speed,
                jump_velocity: t.jump_velocity,
                coyote_time_ms: t.coyote_time_ms,
                jump_buffer_ms: t.jump_buffer_ms,
                ladder_climb_speed: t.ladder_climb_speed,
                gravity: t.gravity,
                station_reward: t.station_reward,
                level_complete_bonus: t.level_complete_bonus,
                save_interval_ms: t.save_interval_ms,
            },
            frame_ms: cfg.general.frame_ms.max(1),
            seed: cfg.general.seed,
            save_dir: cfg.general.save_dir.map(PathBuf::from),
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "config.toml parse error, using defaults");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not read config.toml");
                }
            }
        }
    }
    TomlConfig::default()
}
