//! Session script format
//!
//! A script declares named timelines, then a list of steps applied in order:
//!
//! ```toml
//! [[timelines]]
//! name = "main"
//!
//! [[timelines.windows]]
//! default_position_ms = 0
//! periods = [
//!     { id = "episode", duration_ms = 60000, ad_groups = [{ time_ms = 0, count = 1 }, { count = 1 }] },
//! ]
//!
//! [[steps]]
//! action = "player"
//! timeline = "main"
//! position_ms = 1500
//!
//! [[steps]]
//! action = "queue_updated"
//! queue = [{ period = "episode", next_ad_group = 1 }]
//! reading = 0
//! ```
//!
//! Period ids are labels. The same label in two timelines names the same period.

use mpa_common::events::payloads::{DiscontinuityReason, PlaybackState, TimelineChangeReason};
use serde::Deserialize;
use std::path::Path;

use super::ReplayError;

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub timelines: Vec<TimelineScript>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ReplayError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ReplayError> {
        let toml_str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&toml_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineScript {
    pub name: String,
    pub windows: Vec<WindowScript>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowScript {
    #[serde(default)]
    pub default_position_ms: u64,
    pub periods: Vec<PeriodScript>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodScript {
    pub id: String,
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub ad_groups: Vec<AdGroupScript>,
}

/// Ad break; no `time_ms` means post-roll
#[derive(Debug, Clone, Deserialize)]
pub struct AdGroupScript {
    pub time_ms: Option<u64>,
    pub count: Option<usize>,
    #[serde(default)]
    pub played: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AdScript {
    pub group: usize,
    pub index: usize,
}

/// Media period reference inside a step
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodRef {
    pub period: String,
    pub ad: Option<AdScript>,
    pub next_ad_group: Option<usize>,
    #[serde(default)]
    pub window_sequence: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Replace the live player state; no event is emitted
    Player {
        /// Timeline name, or none for the empty timeline
        timeline: Option<String>,
        #[serde(default)]
        period_index: usize,
        #[serde(default)]
        media_item_index: usize,
        #[serde(default)]
        position_ms: u64,
        /// Defaults to `position_ms`
        content_position_ms: Option<u64>,
        ad: Option<AdScript>,
        #[serde(default)]
        buffered_ms: u64,
    },
    QueueUpdated {
        queue: Vec<PeriodRef>,
        /// Index into `queue`
        reading: Option<usize>,
    },
    TimelineChanged {
        #[serde(default = "default_timeline_change_reason")]
        reason: TimelineChangeReason,
    },
    PositionDiscontinuity {
        reason: DiscontinuityReason,
        #[serde(default)]
        from_ms: u64,
    },
    SeekStarted,
    PlaybackStateChanged {
        state: PlaybackState,
    },
    IsPlayingChanged {
        is_playing: bool,
    },
    LoadStarted {
        #[serde(default)]
        window_index: usize,
        period: Option<PeriodRef>,
        uri: String,
    },
    LoadCompleted {
        #[serde(default)]
        window_index: usize,
        period: Option<PeriodRef>,
        uri: String,
        #[serde(default)]
        bytes_loaded: u64,
        #[serde(default)]
        load_duration_ms: u64,
    },
    DroppedFrames {
        count: u32,
        #[serde(default)]
        elapsed_ms: u64,
    },
    PlayerError {
        code: i32,
        message: String,
        period: Option<PeriodRef>,
    },
    Release,
}

fn default_timeline_change_reason() -> TimelineChangeReason {
    TimelineChangeReason::PlaylistChanged
}
