//! Media period queue tracking
//!
//! Keeps the player's queue of media periods, the sticky playing/reading pointers, the
//! media period matching the live player position, and the most recent timeline known to
//! describe each period of interest.
//!
//! The tracker is a pure state machine: no I/O, no threading. It is mutated only through
//! [`MediaPeriodQueueTracker::on_queue_updated`],
//! [`MediaPeriodQueueTracker::on_timeline_changed`] and
//! [`MediaPeriodQueueTracker::on_position_discontinuity`].

use mpa_common::{AdSlot, Error, MediaPeriodId, PeriodUid, Player, Result, Timeline};
use std::collections::HashMap;
use tracing::debug;

/// Live player position reduced to what period matching needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LivePosition {
    period_uid: Option<PeriodUid>,
    ad: Option<AdSlot>,
    next_ad_group_index: Option<usize>,
}

impl LivePosition {
    fn of(player: &dyn Player) -> Self {
        let timeline = player.current_timeline();
        Self {
            period_uid: timeline.uid_of_period(player.current_period_index()),
            ad: player.current_ad(),
            next_ad_group_index: player.next_ad_group_index(),
        }
    }

    /// Whether `id` is the media period the player is positioned in
    ///
    /// Period identity alone is not enough once ads are inserted: an ad must match the
    /// playing ad slot, and content must have no ad and the same next ad group.
    fn matches(&self, id: &MediaPeriodId) -> bool {
        if self.period_uid != Some(id.period_uid) {
            return false;
        }
        match self.ad {
            Some(playing_ad) => id.ad == Some(playing_ad),
            None => id.ad.is_none() && id.next_ad_group_index == self.next_ad_group_index,
        }
    }
}

/// Tracks the active media periods and which one the player is in
#[derive(Debug, Default)]
pub struct MediaPeriodQueueTracker {
    /// Front = playing, back = loading frontier
    queue: Vec<MediaPeriodId>,

    /// Last known timeline per period of interest
    ///
    /// Every entry's timeline contains the entry's period.
    timelines: HashMap<MediaPeriodId, Timeline>,

    current_player_period: Option<MediaPeriodId>,

    /// Sticky: keeps the last front of the queue once the queue empties
    playing_period: Option<MediaPeriodId>,

    /// Sticky: keeps the last reading period once the queue empties
    reading_period: Option<MediaPeriodId>,
}

impl MediaPeriodQueueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Media period matching the live player position
    ///
    /// `None` until a queued period matching the player has been seen.
    pub fn current_player_period(&self) -> Option<&MediaPeriodId> {
        self.current_player_period.as_ref()
    }

    /// Front of the queue, or the last front if the queue is now empty
    pub fn playing_period(&self) -> Option<&MediaPeriodId> {
        self.playing_period.as_ref()
    }

    /// Period being read by renderers, or the last one if the queue is now empty
    pub fn reading_period(&self) -> Option<&MediaPeriodId> {
        self.reading_period.as_ref()
    }

    /// Back of the queue (loading or next to load), or the sticky playing period
    pub fn loading_period(&self) -> Option<&MediaPeriodId> {
        self.queue.last().or(self.playing_period.as_ref())
    }

    /// Most recent timeline known to contain `id`'s period
    pub fn timeline_for(&self, id: &MediaPeriodId) -> Option<&Timeline> {
        self.timelines.get(id)
    }

    pub fn queue(&self) -> &[MediaPeriodId] {
        &self.queue
    }

    /// Replace the tracked queue
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if `queue` is non-empty but no reading period is given.
    /// The tracker is left unchanged in that case.
    pub fn on_queue_updated(
        &mut self,
        queue: Vec<MediaPeriodId>,
        reading_period: Option<MediaPeriodId>,
        player: &dyn Player,
    ) -> Result<()> {
        if !queue.is_empty() && reading_period.is_none() {
            return Err(Error::InvalidState(format!(
                "queue of {} media periods updated without a reading period",
                queue.len()
            )));
        }

        self.queue = queue;
        if let Some(front) = self.queue.first() {
            self.playing_period = Some(*front);
            self.reading_period = reading_period;
        }
        if self.current_player_period.is_none() {
            self.current_player_period = self.find_current_player_period(player);
        }
        self.refresh_timelines(&player.current_timeline());

        debug!(
            queue_len = self.queue.len(),
            playing = ?self.playing_period,
            reading = ?self.reading_period,
            current = ?self.current_player_period,
            "Media period queue updated"
        );
        Ok(())
    }

    /// Re-match the player position against a new live timeline
    pub fn on_timeline_changed(&mut self, player: &dyn Player) {
        self.current_player_period = self.find_current_player_period(player);
        self.refresh_timelines(&player.current_timeline());
        debug!(current = ?self.current_player_period, "Timeline changed");
    }

    /// Re-match the player position after a seek or other discontinuity
    ///
    /// The queue and timeline map are left untouched.
    pub fn on_position_discontinuity(&mut self, player: &dyn Player) {
        self.current_player_period = self.find_current_player_period(player);
        debug!(current = ?self.current_player_period, "Position discontinuity");
    }

    /// First queued period matching the live position (queue order wins)
    ///
    /// With an empty queue the sticky playing period is tried instead.
    fn find_current_player_period(&self, player: &dyn Player) -> Option<MediaPeriodId> {
        let live = LivePosition::of(player);
        if self.queue.is_empty() {
            return self.playing_period.filter(|id| live.matches(id));
        }
        self.queue.iter().find(|id| live.matches(id)).copied()
    }

    fn refresh_timelines(&mut self, preferred: &Timeline) {
        let mut ids: Vec<MediaPeriodId> = Vec::with_capacity(self.queue.len() + 3);
        if self.queue.is_empty() {
            ids.extend(self.playing_period);
            ids.extend(self.reading_period);
        } else {
            ids.extend(self.queue.iter().copied());
        }
        ids.extend(self.current_player_period);

        let mut refreshed = HashMap::with_capacity(ids.len());
        for id in ids {
            if refreshed.contains_key(&id) {
                continue;
            }
            if preferred.contains_period(&id.period_uid) {
                refreshed.insert(id, preferred.clone());
            } else if let Some(previous) = self.timelines.get(&id) {
                refreshed.insert(id, previous.clone());
            }
        }
        self.timelines = refreshed;
    }
}
