//! Event time resolution
//!
//! Turns "which media period is this event about" into a fully resolved [`EventTime`].
//! The resolver keeps no state of its own: every call recomputes from the tracker and
//! live player queries, so it is built on demand around borrowed collaborators.

use crate::tracker::MediaPeriodQueueTracker;
use mpa_common::{Clock, EventTime, MediaPeriodId, Player, PlayerSnapshot, Timeline};

/// Builds [`EventTime`]s from tracker state and live player state
pub struct EventTimeResolver<'a> {
    clock: &'a dyn Clock,
    tracker: &'a MediaPeriodQueueTracker,
    player: &'a dyn Player,
}

impl<'a> EventTimeResolver<'a> {
    pub fn new(
        clock: &'a dyn Clock,
        tracker: &'a MediaPeriodQueueTracker,
        player: &'a dyn Player,
    ) -> Self {
        Self {
            clock,
            tracker,
            player,
        }
    }

    /// Resolve an event about `media_period_id`
    ///
    /// An id that is absent, or whose timeline the tracker no longer knows, is reported
    /// against the live timeline and window with no media period.
    pub fn resolve(&self, media_period_id: Option<&MediaPeriodId>) -> EventTime {
        let known = media_period_id
            .and_then(|id| self.tracker.timeline_for(id).map(|timeline| (id, timeline)));

        match known {
            Some((id, timeline)) => {
                let window_index = timeline
                    .period_by_uid(&id.period_uid)
                    .map_or(0, |period| period.window_index);
                self.generate(timeline.clone(), window_index, Some(*id))
            }
            None => {
                let window_index = self.player.current_media_item_index();
                let live = self.player.current_timeline();
                let timeline = if window_index < live.window_count() {
                    live
                } else {
                    Timeline::empty()
                };
                self.generate(timeline, window_index, None)
            }
        }
    }

    /// Resolve an event reported by a collaborator as (window index, media period)
    ///
    /// A known id resolves as in [`EventTimeResolver::resolve`]. An id unknown to the
    /// tracker resolves against the empty timeline rather than a guessed live window.
    /// Without an id, the event is reported against the live timeline at `window_index`
    /// when that window exists.
    pub fn resolve_in(
        &self,
        window_index: usize,
        media_period_id: Option<&MediaPeriodId>,
    ) -> EventTime {
        match media_period_id {
            Some(id) => match self.tracker.timeline_for(id) {
                Some(_) => self.resolve(Some(id)),
                None => self.generate(Timeline::empty(), window_index, None),
            },
            None => {
                let live = self.player.current_timeline();
                let timeline = if window_index < live.window_count() {
                    live
                } else {
                    Timeline::empty()
                };
                self.generate(timeline, window_index, None)
            }
        }
    }

    /// Event about the period the player is positioned in
    pub fn current(&self) -> EventTime {
        self.resolve(self.tracker.current_player_period())
    }

    /// Event about the period at the front of the queue
    pub fn playing(&self) -> EventTime {
        self.resolve(self.tracker.playing_period())
    }

    /// Event about the period renderers are reading
    pub fn reading(&self) -> EventTime {
        self.resolve(self.tracker.reading_period())
    }

    /// Event about the period being loaded
    pub fn loading(&self) -> EventTime {
        self.resolve(self.tracker.loading_period())
    }

    /// Event about a player error, attributed to the failing period when known
    pub fn for_error(&self, media_period_id: Option<&MediaPeriodId>) -> EventTime {
        match media_period_id {
            Some(id) => self.resolve(Some(id)),
            None => self.current(),
        }
    }

    fn generate(
        &self,
        timeline: Timeline,
        window_index: usize,
        media_period_id: Option<MediaPeriodId>,
    ) -> EventTime {
        let media_period_id = media_period_id.filter(|_| !timeline.is_empty());
        let live_timeline = self.player.current_timeline();
        let live_window = self.player.current_media_item_index();
        let in_current_window = timeline == live_timeline && window_index == live_window;

        let position_ms = match media_period_id.as_ref().and_then(|id| id.ad) {
            Some(ad) => {
                if in_current_window && self.player.current_ad() == Some(ad) {
                    self.player.current_position_ms()
                } else {
                    0
                }
            }
            None if in_current_window => self.player.content_position_ms(),
            None => timeline
                .window(window_index)
                .map_or(0, |window| window.default_position_ms),
        };

        let current = PlayerSnapshot {
            timeline: live_timeline,
            window_index: live_window,
            media_period_id: self.tracker.current_player_period().copied(),
            position_ms: self.player.current_position_ms(),
            total_buffered_duration_ms: self.player.total_buffered_duration_ms(),
        };

        EventTime::new(
            self.clock.now(),
            timeline,
            window_index,
            media_period_id,
            position_ms,
            current,
        )
    }
}
