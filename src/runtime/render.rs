//! Plain-text rendering for the stdin command surface.

use crate::catalog::{Track, format_duration_hint};
use crate::player::{PlayerState, PlaybackStatus};
use crate::queue::QueueManager;

pub fn track_line(track: &Track, current: bool) -> String {
    let marker = if current { '>' } else { ' ' };
    let mut line = format!(
        "{marker}{:>4}  {} - {} [{}]",
        track.id, track.artist, track.title, track.duration_hint
    );
    if let Some(vault) = &track.vault_id {
        line.push_str(&format!("  ({vault})"));
    }
    line
}

pub fn status_line(state: &PlayerState) -> String {
    let now = match &state.current_track {
        Some(t) => format!("{} - {}", t.artist, t.title),
        None => "nothing loaded".to_string(),
    };
    let mut line = format!(
        "[{}] {now}  {}/{}  vol {:.0}%  shuffle {}  repeat {}  view {}",
        state.status,
        format_duration_hint(state.current_time),
        format_duration_hint(state.total_duration),
        state.volume * 100.0,
        if state.shuffled { "on" } else { "off" },
        state.repeat_mode.label(),
        state.context,
    );
    if state.status == PlaybackStatus::Error {
        if let Some(err) = &state.last_error {
            line.push_str(&format!("\n  error: {err}"));
        }
    }
    line
}

/// The "play next" queue followed by the rest of the context queue.
pub fn queue_lines(queue: &QueueManager) -> Vec<String> {
    let mut lines = Vec::new();
    if !queue.user_queue().is_empty() {
        lines.push("next up:".to_string());
        lines.extend(queue.user_queue().iter().map(|t| track_line(t, false)));
    }
    let upcoming = queue.upcoming();
    if upcoming.is_empty() {
        lines.push("end of queue".to_string());
    } else {
        lines.push("then:".to_string());
        lines.extend(upcoming.iter().map(|t| track_line(t, false)));
    }
    lines
}
