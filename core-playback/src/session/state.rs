//! Observable session state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{ContentId, NarrationItem};

/// Duration reported while nothing is loaded or the length is still unknown.
pub const DURATION_SENTINEL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Loading,
    Playing,
    Paused,
}

/// Position-slider interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "position", rename_all = "snake_case")]
pub enum ScrubState {
    #[default]
    Reset,
    /// User is dragging; progress sampling must not overwrite `time_elapsed`.
    ScrubStarted,
    /// User released at the given position.
    ScrubEnded(Duration),
}

/// Everything an observer of the session can see, as one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub item: Option<NarrationItem>,
    pub time_elapsed: Duration,
    pub duration: Duration,
    pub time_elapsed_string: String,
    pub duration_string: String,
    pub scrub_state: ScrubState,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: PlaybackState::Stopped,
            item: None,
            time_elapsed: Duration::ZERO,
            duration: DURATION_SENTINEL,
            time_elapsed_string: format_time(Duration::ZERO),
            duration_string: format_time(DURATION_SENTINEL),
            scrub_state: ScrubState::Reset,
        }
    }
}

impl SessionSnapshot {
    pub fn content_id(&self) -> Option<&ContentId> {
        self.item.as_ref().map(|item| &item.id)
    }

    pub fn is_loading_item(&self, id: &ContentId) -> bool {
        self.state == PlaybackState::Loading && self.content_id() == Some(id)
    }

    pub fn is_playing_item(&self, id: &ContentId) -> bool {
        self.state == PlaybackState::Playing && self.content_id() == Some(id)
    }
}

/// Positional, zero-padded time: `MM:SS` below one hour, `HH:MM:SS` from
/// one hour on. Fractions are truncated.
pub fn format_time(time: Duration) -> String {
    let total = time.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_below_one_hour() {
        assert_eq!(format_time(Duration::ZERO), "00:00");
        assert_eq!(format_time(Duration::from_millis(65_900)), "01:05");
        assert_eq!(format_time(Duration::from_secs(3599)), "59:59");
    }

    #[test]
    fn formats_from_one_hour() {
        assert_eq!(format_time(Duration::from_secs(3600)), "01:00:00");
        assert_eq!(format_time(Duration::from_secs(3 * 3600 + 62)), "03:01:02");
    }

    #[test]
    fn default_snapshot_is_stopped_with_sentinel() {
        let snapshot = SessionSnapshot::default();
        assert_eq!(snapshot.state, PlaybackState::Stopped);
        assert_eq!(snapshot.duration, DURATION_SENTINEL);
        assert_eq!(snapshot.duration_string, "00:01");
    }

    #[test]
    fn item_queries_match_state() {
        let item = NarrationItem::new("a");
        let snapshot = SessionSnapshot {
            state: PlaybackState::Loading,
            item: Some(item.clone()),
            ..Default::default()
        };
        assert!(snapshot.is_loading_item(&item.id));
        assert!(!snapshot.is_playing_item(&item.id));
        assert!(!snapshot.is_loading_item(&ContentId::new("b")));
    }
}
