//! Playback engine collaborator interface
//!
//! The analytics core never drives playback. It only queries the live player state
//! through [`Player`] while resolving event times and matching queued media periods.

use crate::media_period::AdSlot;
use crate::time::ms_to_us;
use crate::timeline::Timeline;
use std::sync::{Arc, PoisonError, RwLock};

/// Live state queries the analytics core needs from the playback engine
pub trait Player: Send + Sync {
    /// Current timeline snapshot
    fn current_timeline(&self) -> Timeline;

    /// Index of the period being played in [`Player::current_timeline`]
    fn current_period_index(&self) -> usize;

    /// Index of the window (media item) being played
    fn current_media_item_index(&self) -> usize;

    /// Playback position in the current window, or in the ad while one is playing
    fn current_position_ms(&self) -> u64;

    /// Content position in the current window (the resume point while an ad plays)
    fn content_position_ms(&self) -> u64;

    /// Ad currently playing, `None` while content is playing
    fn current_ad(&self) -> Option<AdSlot>;

    /// Buffered media ahead of the playback position
    fn total_buffered_duration_ms(&self) -> u64;

    fn is_playing_ad(&self) -> bool {
        self.current_ad().is_some()
    }

    /// Index of the next ad group to play after the current content position
    ///
    /// `None` while an ad is playing, when the timeline is empty, or when no ad group
    /// follows.
    fn next_ad_group_index(&self) -> Option<usize> {
        if self.is_playing_ad() {
            return None;
        }
        let timeline = self.current_timeline();
        let period = timeline.period(self.current_period_index())?;
        let position_in_period_us =
            ms_to_us(self.current_position_ms()).saturating_sub(period.position_in_window_us);
        period.ad_group_index_after_position_us(position_in_period_us)
    }
}

/// Plain snapshot of player state
///
/// Used by scripted sessions and tests to stand in for a playback engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerState {
    pub timeline: Timeline,
    pub period_index: usize,
    pub media_item_index: usize,
    pub position_ms: u64,
    pub content_position_ms: u64,
    pub ad: Option<AdSlot>,
    pub total_buffered_duration_ms: u64,
}

impl Player for PlayerState {
    fn current_timeline(&self) -> Timeline {
        self.timeline.clone()
    }

    fn current_period_index(&self) -> usize {
        self.period_index
    }

    fn current_media_item_index(&self) -> usize {
        self.media_item_index
    }

    fn current_position_ms(&self) -> u64 {
        self.position_ms
    }

    fn content_position_ms(&self) -> u64 {
        self.content_position_ms
    }

    fn current_ad(&self) -> Option<AdSlot> {
        self.ad
    }

    fn total_buffered_duration_ms(&self) -> u64 {
        self.total_buffered_duration_ms
    }
}

/// Shared, updatable player state
///
/// Cloning shares the same state. Uses RwLock for concurrent reads with rare writes.
#[derive(Debug, Clone, Default)]
pub struct SharedPlayerState {
    inner: Arc<RwLock<PlayerState>>,
}

impl SharedPlayerState {
    pub fn new(state: PlayerState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> PlayerState {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the whole state
    pub fn set(&self, state: PlayerState) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Mutate the state in place
    pub fn update(&self, f: impl FnOnce(&mut PlayerState)) {
        f(&mut self.inner.write().unwrap_or_else(PoisonError::into_inner));
    }

    fn read<T>(&self, f: impl FnOnce(&PlayerState) -> T) -> T {
        f(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Player for SharedPlayerState {
    fn current_timeline(&self) -> Timeline {
        self.read(|state| state.timeline.clone())
    }

    fn current_period_index(&self) -> usize {
        self.read(|state| state.period_index)
    }

    fn current_media_item_index(&self) -> usize {
        self.read(|state| state.media_item_index)
    }

    fn current_position_ms(&self) -> u64 {
        self.read(|state| state.position_ms)
    }

    fn content_position_ms(&self) -> u64 {
        self.read(|state| state.content_position_ms)
    }

    fn current_ad(&self) -> Option<AdSlot> {
        self.read(|state| state.ad)
    }

    fn total_buffered_duration_ms(&self) -> u64 {
        self.read(|state| state.total_buffered_duration_ms)
    }

    fn next_ad_group_index(&self) -> Option<usize> {
        self.snapshot().next_ad_group_index()
    }
}
