//! JSON Lines output for replayed sessions
//!
//! One object per delivered event. Media periods are printed with their script labels.

use crate::listener::AnalyticsListener;
use mpa_common::events::payloads::{
    DiscontinuityReason, LoadEventInfo, MediaLoadData, PlaybackError, PlaybackState,
    PositionInfo, TimelineChangeReason,
};
use mpa_common::{EventTime, Events, MediaPeriodId, PeriodUid, Player};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Writes every event it receives as one JSON object per line
pub struct JsonLinesListener<W: Write + Send> {
    out: Mutex<W>,
    labels: HashMap<PeriodUid, String>,
}

impl<W: Write + Send> JsonLinesListener<W> {
    pub fn new(out: W, labels: HashMap<PeriodUid, String>) -> Self {
        Self {
            out: Mutex::new(out),
            labels,
        }
    }

    fn period(&self, id: Option<&MediaPeriodId>) -> Value {
        let Some(id) = id else {
            return Value::Null;
        };
        let label = self
            .labels
            .get(&id.period_uid)
            .cloned()
            .unwrap_or_else(|| id.period_uid.to_string());
        json!({
            "period": label,
            "ad_group": id.ad_group_index(),
            "ad_index": id.ad_index_in_ad_group(),
            "next_ad_group": id.next_ad_group_index,
            "window_sequence": id.window_sequence_number,
        })
    }

    fn event_time(&self, et: &EventTime) -> Value {
        json!({
            "realtime": et.realtime().to_rfc3339(),
            "window_index": et.window_index(),
            "empty_timeline": et.timeline().is_empty(),
            "media_period": self.period(et.media_period_id()),
            "position_ms": et.event_playback_position_ms(),
            "current_media_period": self.period(et.current().media_period_id.as_ref()),
            "current_position_ms": et.current().position_ms,
            "buffered_ms": et.current().total_buffered_duration_ms,
        })
    }

    fn emit(&self, event: &str, et: Option<&EventTime>, payload: Value) {
        let mut line = json!({ "event": event, "payload": payload });
        if let Some(et) = et {
            line["time"] = self.event_time(et);
        }
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            warn!("Failed to write replay event {}: {}", event, e);
        }
    }

    fn load(&self, event: &str, et: &EventTime, info: &LoadEventInfo, data: &MediaLoadData) {
        self.emit(event, Some(et), json!({ "info": info, "data": data }));
    }
}

impl<W: Write + Send> AnalyticsListener for JsonLinesListener<W> {
    fn on_timeline_changed(&self, et: &EventTime, reason: TimelineChangeReason) {
        self.emit("timeline_changed", Some(et), json!({ "reason": reason }));
    }

    fn on_position_discontinuity(
        &self,
        et: &EventTime,
        old_position: &PositionInfo,
        new_position: &PositionInfo,
        reason: DiscontinuityReason,
    ) {
        self.emit(
            "position_discontinuity",
            Some(et),
            json!({ "old": old_position, "new": new_position, "reason": reason }),
        );
    }

    fn on_seek_started(&self, et: &EventTime) {
        self.emit("seek_started", Some(et), Value::Null);
    }

    fn on_playback_state_changed(&self, et: &EventTime, state: PlaybackState) {
        self.emit("playback_state_changed", Some(et), json!({ "state": state }));
    }

    fn on_is_playing_changed(&self, et: &EventTime, is_playing: bool) {
        self.emit("is_playing_changed", Some(et), json!({ "is_playing": is_playing }));
    }

    fn on_load_started(&self, et: &EventTime, info: &LoadEventInfo, data: &MediaLoadData) {
        self.load("load_started", et, info, data);
    }

    fn on_load_completed(&self, et: &EventTime, info: &LoadEventInfo, data: &MediaLoadData) {
        self.load("load_completed", et, info, data);
    }

    fn on_dropped_video_frames(&self, et: &EventTime, dropped_frames: u32, elapsed_ms: u64) {
        self.emit(
            "dropped_video_frames",
            Some(et),
            json!({ "dropped_frames": dropped_frames, "elapsed_ms": elapsed_ms }),
        );
    }

    fn on_player_error(&self, et: &EventTime, error: &PlaybackError) {
        self.emit(
            "player_error",
            Some(et),
            json!({ "code": error.error_code, "message": error.message }),
        );
    }

    fn on_player_released(&self, et: &EventTime) {
        self.emit("player_released", Some(et), Value::Null);
    }

    fn on_events(&self, _player: &dyn Player, events: &Events) {
        let flags: Vec<&str> = events.iter().map(|flag| flag.name()).collect();
        self.emit("events", None, json!({ "flags": flags }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mpa_common::{PeriodSpec, PlayerSnapshot, Timeline};

    #[test]
    fn test_event_line_uses_period_labels() {
        let uid = PeriodUid::random();
        let timeline = Timeline::builder()
            .window(0, [PeriodSpec::new(uid).duration_ms(10_000)])
            .build()
            .unwrap();
        let id = MediaPeriodId::content(uid, 0, None);
        let current = PlayerSnapshot {
            timeline: timeline.clone(),
            window_index: 0,
            media_period_id: Some(id),
            position_ms: 250,
            total_buffered_duration_ms: 0,
        };
        let et = EventTime::new(Utc::now(), timeline, 0, Some(id), 250, current);

        let listener = JsonLinesListener::new(
            Vec::new(),
            HashMap::from([(uid, "episode".to_string())]),
        );
        listener.on_is_playing_changed(&et, true);

        let out = listener.out.into_inner().unwrap();
        let line: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(line["event"], "is_playing_changed");
        assert_eq!(line["payload"]["is_playing"], true);
        assert_eq!(line["time"]["media_period"]["period"], "episode");
        assert_eq!(line["time"]["position_ms"], 250);
    }
}
