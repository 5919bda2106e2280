/// Events crossing the simulation boundary.
///
/// `Overlap` flows in: the collision collaborator reports what the player
/// touches this tick. `GameEvent` flows out: the presentation layer consumes
/// them for transient messages.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Overlap {
    Ladder,
    Station { id: u32 },
    Flag,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Jumped,
    ChallengeStarted { station_id: u32 },
    ChallengeSuperseded { station_id: u32 },
    ChallengeAdvanced { station_id: u32, step: usize },
    StationCompleted { station_id: u32, title: String, answered_correctly: bool },
    DoorUnlocked,
    BadgeEarned { name: &'static str },
    LevelCompleted { bonus: u32 },
    LogbookToggled { visible: bool },
    ProgressSaved,
    SaveFailed,
}
