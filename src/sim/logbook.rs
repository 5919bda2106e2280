/// Logbook and HUD text: read-only views over station progress.
///
/// Pure functions of the world's stations, score and badges. The renderer
/// draws whatever these return; nothing here mutates state.

use crate::domain::entity::{Badges, Station};

pub fn hud_line(stations: &[Station]) -> String {
    let done = stations.iter().filter(|s| s.completed()).count();
    format!("Stations: {} / {}", done, stations.len())
}

/// Lines of the logbook overlay, top to bottom.
pub fn logbook_lines(stations: &[Station], score: u32, badges: &Badges) -> Vec<String> {
    let mut lines = Vec::with_capacity(stations.len() * 2 + 6);
    lines.push("MISSION LOGBOOK".to_string());
    lines.push(String::new());

    for s in stations {
        let status = if s.completed() { "Completed" } else { "Pending" };
        lines.push(format!("{}: {}", s.title, status));
        if let Some(fact) = s.learned.as_ref().filter(|_| s.completed()) {
            lines.push(format!("  Learned: {}", fact.key_fact));
        }
    }

    let done = stations.iter().filter(|s| s.completed()).count();
    lines.push(String::new());
    lines.push(format!("Progress: {} / {} stations", done, stations.len()));
    lines.push(format!("Score: {}", score));

    let names = badges.earned_names();
    let badge_text = if names.is_empty() { "none".to_string() } else { names.join(", ") };
    lines.push(format!("Badges: {}", badge_text));
    lines
}
