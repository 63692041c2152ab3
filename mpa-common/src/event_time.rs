//! Resolved event times
//!
//! An [`EventTime`] is the unit of record attached to every dispatched analytics event:
//! when the event happened, which timeline/window/media period it is reported against,
//! and a parallel snapshot of what the player was doing at the same instant.

use crate::media_period::MediaPeriodId;
use crate::timeline::Timeline;
use chrono::{DateTime, Utc};

/// Live player state captured alongside an event, for correlation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSnapshot {
    /// Timeline the player was using
    pub timeline: Timeline,
    /// Window (media item) index the player was in
    pub window_index: usize,
    /// Media period the player was in, if resolved
    pub media_period_id: Option<MediaPeriodId>,
    /// Player position in the current window or ad
    pub position_ms: u64,
    /// Total buffered duration ahead of the playback position
    pub total_buffered_duration_ms: u64,
}

/// Immutable, fully resolved playback context of one event
///
/// An event is never attributed to a period inside an empty timeline: constructing an
/// `EventTime` against an empty timeline drops the media period id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTime {
    realtime: DateTime<Utc>,
    timeline: Timeline,
    window_index: usize,
    media_period_id: Option<MediaPeriodId>,
    event_playback_position_ms: u64,
    current: PlayerSnapshot,
}

impl EventTime {
    pub fn new(
        realtime: DateTime<Utc>,
        timeline: Timeline,
        window_index: usize,
        media_period_id: Option<MediaPeriodId>,
        event_playback_position_ms: u64,
        current: PlayerSnapshot,
    ) -> Self {
        let media_period_id = if timeline.is_empty() {
            None
        } else {
            media_period_id
        };
        Self {
            realtime,
            timeline,
            window_index,
            media_period_id,
            event_playback_position_ms,
            current,
        }
    }

    /// Wall-clock time at which the event was resolved
    pub fn realtime(&self) -> DateTime<Utc> {
        self.realtime
    }

    /// Timeline the event is reported against
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Window index in [`EventTime::timeline`]
    pub fn window_index(&self) -> usize {
        self.window_index
    }

    /// Media period the event concerns, `None` when unknown or not period-specific
    pub fn media_period_id(&self) -> Option<&MediaPeriodId> {
        self.media_period_id.as_ref()
    }

    /// Position in the window (or ad) at which the event happened
    pub fn event_playback_position_ms(&self) -> u64 {
        self.event_playback_position_ms
    }

    /// Player state at the time of the event
    pub fn current(&self) -> &PlayerSnapshot {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_period::PeriodUid;
    use crate::timeline::PeriodSpec;

    fn snapshot(timeline: Timeline) -> PlayerSnapshot {
        PlayerSnapshot {
            timeline,
            window_index: 0,
            media_period_id: None,
            position_ms: 0,
            total_buffered_duration_ms: 0,
        }
    }

    #[test]
    fn test_empty_timeline_drops_media_period_id() {
        let id = MediaPeriodId::content(PeriodUid::random(), 0, None);
        let event_time = EventTime::new(
            Utc::now(),
            Timeline::empty(),
            0,
            Some(id),
            0,
            snapshot(Timeline::empty()),
        );
        assert!(event_time.media_period_id().is_none());
    }

    #[test]
    fn test_non_empty_timeline_keeps_media_period_id() {
        let uid = PeriodUid::random();
        let timeline = Timeline::builder()
            .window(0, [PeriodSpec::new(uid)])
            .build()
            .unwrap();
        let id = MediaPeriodId::content(uid, 0, None);
        let event_time = EventTime::new(
            Utc::now(),
            timeline.clone(),
            0,
            Some(id),
            1234,
            snapshot(timeline),
        );
        assert_eq!(event_time.media_period_id(), Some(&id));
        assert_eq!(event_time.event_playback_position_ms(), 1234);
        assert_eq!(event_time.window_index(), 0);
    }
}
