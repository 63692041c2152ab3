//! Test Helper Utilities
//!
//! Shared fixtures for mpa-collector integration tests: a recording listener, a
//! scripted player and a deterministic clock.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use mpa_collector::{AnalyticsCollector, AnalyticsListener, ExecutionContext};
use mpa_common::config::{CollectorConfig, ThreadCheck};
use mpa_common::events::payloads::{
    DiscontinuityReason, LoadEventInfo, MediaLoadData, PlaybackError, PlaybackState,
    PositionInfo, RepeatMode, TimelineChangeReason,
};
use mpa_common::{
    AdGroup, EventTime, Events, ManualClock, MediaPeriodId, PeriodSpec, PeriodUid, Player,
    PlayerState, SharedPlayerState, Timeline,
};
use std::sync::{Arc, Mutex};

/// One callback as observed by a listener
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub callback: String,
    pub media_period_id: Option<MediaPeriodId>,
    pub position_ms: u64,
    pub window_index: usize,
    pub empty_timeline: bool,
}

/// Listener that records every callback it receives, in order
#[derive(Default)]
pub struct RecordingListener {
    log: Mutex<Vec<Recorded>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn callbacks(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.callback.clone())
            .collect()
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self, callback: &str) -> Option<Recorded> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.callback == callback)
            .cloned()
    }

    /// Flag names of every `on_events` batch received
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    fn record(&self, callback: &str, et: &EventTime) {
        self.log.lock().unwrap().push(Recorded {
            callback: callback.to_string(),
            media_period_id: et.media_period_id().copied(),
            position_ms: et.event_playback_position_ms(),
            window_index: et.window_index(),
            empty_timeline: et.timeline().is_empty(),
        });
    }
}

#[allow(deprecated)]
impl AnalyticsListener for RecordingListener {
    fn on_timeline_changed(&self, et: &EventTime, _reason: TimelineChangeReason) {
        self.record("timeline_changed", et);
    }

    fn on_position_discontinuity(
        &self,
        et: &EventTime,
        _old: &PositionInfo,
        _new: &PositionInfo,
        _reason: DiscontinuityReason,
    ) {
        self.record("position_discontinuity", et);
    }

    fn on_position_discontinuity_legacy(&self, et: &EventTime, _reason: DiscontinuityReason) {
        self.record("position_discontinuity_legacy", et);
    }

    fn on_seek_started(&self, et: &EventTime) {
        self.record("seek_started", et);
    }

    fn on_is_loading_changed(&self, et: &EventTime, _is_loading: bool) {
        self.record("is_loading_changed", et);
    }

    fn on_loading_changed_legacy(&self, et: &EventTime, _is_loading: bool) {
        self.record("loading_changed_legacy", et);
    }

    fn on_playback_state_changed(&self, et: &EventTime, _state: PlaybackState) {
        self.record("playback_state_changed", et);
    }

    fn on_player_state_changed_legacy(&self, et: &EventTime, _pwr: bool, _state: PlaybackState) {
        self.record("player_state_changed_legacy", et);
    }

    fn on_is_playing_changed(&self, et: &EventTime, _is_playing: bool) {
        self.record("is_playing_changed", et);
    }

    fn on_repeat_mode_changed(&self, et: &EventTime, _mode: RepeatMode) {
        self.record("repeat_mode_changed", et);
    }

    fn on_player_error(&self, et: &EventTime, _error: &PlaybackError) {
        self.record("player_error", et);
    }

    fn on_player_error_changed(&self, et: &EventTime, _error: Option<&PlaybackError>) {
        self.record("player_error_changed", et);
    }

    fn on_load_started(&self, et: &EventTime, _info: &LoadEventInfo, _data: &MediaLoadData) {
        self.record("load_started", et);
    }

    fn on_audio_enabled(&self, et: &EventTime, _counters: &mpa_common::events::payloads::DecoderCounters) {
        self.record("audio_enabled", et);
    }

    fn on_audio_disabled(&self, et: &EventTime, _counters: &mpa_common::events::payloads::DecoderCounters) {
        self.record("audio_disabled", et);
    }

    fn on_dropped_video_frames(&self, et: &EventTime, _dropped: u32, _elapsed_ms: u64) {
        self.record("dropped_video_frames", et);
    }

    fn on_bandwidth_estimate(&self, et: &EventTime, _time: u64, _bytes: u64, _bitrate: u64) {
        self.record("bandwidth_estimate", et);
    }

    fn on_drm_keys_loaded(&self, et: &EventTime) {
        self.record("drm_keys_loaded", et);
    }

    fn on_player_released(&self, et: &EventTime) {
        self.record("player_released", et);
    }

    fn on_events(&self, _player: &dyn Player, events: &Events) {
        let flags = events.iter().map(|flag| flag.name().to_string()).collect();
        self.batches.lock().unwrap().push(flags);
    }
}

/// Timeline with one content period per window
///
/// Window 0 carries a mid-roll at 10s; window 1 starts at 1s by default.
pub struct Fixture {
    pub clock: Arc<ManualClock>,
    pub player: SharedPlayerState,
    pub timeline: Timeline,
    pub first: PeriodUid,
    pub second: PeriodUid,
}

impl Fixture {
    pub fn new() -> Self {
        let first = PeriodUid::random();
        let second = PeriodUid::random();
        let timeline = Timeline::builder()
            .window(
                0,
                [PeriodSpec::new(first)
                    .duration_ms(30_000)
                    .ad_groups(vec![AdGroup::at(10_000_000, 1)])],
            )
            .window(1_000, [PeriodSpec::new(second).duration_ms(30_000)])
            .build()
            .unwrap();
        let player = SharedPlayerState::new(PlayerState {
            timeline: timeline.clone(),
            position_ms: 2_000,
            content_position_ms: 2_000,
            ..Default::default()
        });
        Self {
            clock: Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            )),
            player,
            timeline,
            first,
            second,
        }
    }

    /// Content of window 0 before the mid-roll
    pub fn first_content(&self) -> MediaPeriodId {
        MediaPeriodId::content(self.first, 0, Some(0))
    }

    pub fn mid_roll(&self) -> MediaPeriodId {
        MediaPeriodId::ad(self.first, 0, 0, 0)
    }

    pub fn second_content(&self) -> MediaPeriodId {
        MediaPeriodId::content(self.second, 1, None)
    }

    /// Collector with a bound player and one recording listener
    pub fn collector(&self, config: CollectorConfig) -> (AnalyticsCollector, Arc<RecordingListener>) {
        let mut collector = AnalyticsCollector::new(self.clock.clone(), config).unwrap();
        let context = ExecutionContext::spawn("player").unwrap();
        collector
            .set_player(Arc::new(self.player.clone()), context)
            .unwrap();
        let listener = RecordingListener::new();
        collector.add_listener(listener.clone()).unwrap();
        (collector, listener)
    }
}

pub fn strict_config() -> CollectorConfig {
    CollectorConfig {
        thread_check: ThreadCheck::Strict,
        ..Default::default()
    }
}
