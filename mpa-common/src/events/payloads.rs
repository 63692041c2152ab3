//! Payloads forwarded to analytics listeners
//!
//! The collector never interprets these beyond what it needs for event-time resolution
//! (only [`PlaybackError::media_period_id`] is consulted). Format- and container-level
//! objects that this crate has no model for travel as [`OpaquePayload`].

use crate::media_period::MediaPeriodId;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

/// Payload forwarded unexamined (media items, tracks, metadata, cues, ...)
pub type OpaquePayload = Arc<dyn Any + Send + Sync>;

/// Error object reported by a collaborator (sink/codec/DRM/load errors)
pub type ErrorPayload = Arc<dyn std::error::Error + Send + Sync>;

/// Decoder statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderCounters {
    pub decoder_inits: u32,
    pub decoder_releases: u32,
    pub queued_input_buffers: u64,
    pub rendered_output_buffers: u64,
    pub skipped_output_buffers: u64,
    pub dropped_buffers: u64,
    pub max_consecutive_dropped_buffers: u32,
}

/// Media format description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Format {
    pub id: Option<String>,
    pub sample_mime_type: Option<String>,
    pub codecs: Option<String>,
    pub bitrate: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f32>,
    pub channel_count: Option<u32>,
    pub sample_rate: Option<u32>,
    pub language: Option<String>,
}

/// Outcome of deciding whether a decoder can be reused for a new format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecoderReuseResult {
    No,
    YesWithFlush,
    YesWithReconfiguration,
    YesWithoutReconfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderReuseEvaluation {
    pub decoder_name: String,
    pub result: DecoderReuseResult,
}

/// Description of one load task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadEventInfo {
    pub load_task_id: u64,
    pub uri: String,
    pub elapsed_realtime_ms: u64,
    pub load_duration_ms: u64,
    pub bytes_loaded: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    #[default]
    Unknown,
    Media,
    MediaInitialization,
    Drm,
    Manifest,
    TimeSynchronization,
    Ad,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackType {
    #[default]
    Unknown,
    Default,
    Audio,
    Video,
    Text,
    Image,
    Metadata,
}

/// What a load task was loading
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaLoadData {
    pub data_type: DataType,
    pub track_type: TrackType,
    pub track_format: Option<Format>,
    pub media_start_time_ms: Option<u64>,
    pub media_end_time_ms: Option<u64>,
}

/// Rendered video dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
    pub unapplied_rotation_degrees: u32,
    pub pixel_width_height_ratio: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackParameters {
    pub speed: f32,
    pub pitch: f32,
}

impl Default for PlaybackParameters {
    fn default() -> Self {
        Self {
            speed: 1.0,
            pitch: 1.0,
        }
    }
}

/// Player position on one side of a discontinuity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub media_item_index: usize,
    pub period_index: usize,
    pub position_ms: u64,
    pub content_position_ms: u64,
    pub ad_group_index: Option<usize>,
    pub ad_index_in_ad_group: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscontinuityReason {
    AutoTransition,
    Seek,
    SeekAdjustment,
    Skip,
    Remove,
    Internal,
    SilenceSkip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineChangeReason {
    PlaylistChanged,
    SourceUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaItemTransitionReason {
    Repeat,
    Auto,
    Seek,
    PlaylistChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Buffering,
    Ready,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayWhenReadyChangeReason {
    UserRequest,
    AudioFocusLoss,
    AudioBecomingNoisy,
    Remote,
    EndOfMediaItem,
    SuppressedTooLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackSuppressionReason {
    None,
    TransientAudioFocusLoss,
    UnsuitableAudioOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    Off,
    One,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrmSessionState {
    Released,
    Error,
    Opening,
    Opened,
    OpenedWithKeys,
}

/// Fatal or recoverable playback failure reported by the player
///
/// When the failure is attributable to a media period, the event is reported against
/// that period instead of the player's current one.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("playback error {error_code}: {message}")]
pub struct PlaybackError {
    pub error_code: i32,
    pub message: String,
    pub media_period_id: Option<MediaPeriodId>,
}

impl PlaybackError {
    pub fn new(error_code: i32, message: impl Into<String>) -> Self {
        Self {
            error_code,
            message: message.into(),
            media_period_id: None,
        }
    }

    pub fn with_media_period_id(mut self, media_period_id: MediaPeriodId) -> Self {
        self.media_period_id = Some(media_period_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_period::PeriodUid;

    #[test]
    fn test_playback_error_display() {
        let error = PlaybackError::new(2001, "network unavailable");
        assert_eq!(error.to_string(), "playback error 2001: network unavailable");
        assert!(error.media_period_id.is_none());
    }

    #[test]
    fn test_playback_error_with_media_period() {
        let id = MediaPeriodId::content(PeriodUid::random(), 0, None);
        let error = PlaybackError::new(4001, "decoder failed").with_media_period_id(id);
        assert_eq!(error.media_period_id, Some(id));
    }

    #[test]
    fn test_discontinuity_reason_serde() {
        let reason: DiscontinuityReason = serde_json::from_str("\"seek_adjustment\"").unwrap();
        assert_eq!(reason, DiscontinuityReason::SeekAdjustment);
    }

    #[test]
    fn test_playback_parameters_default() {
        let params = PlaybackParameters::default();
        assert_eq!(params.speed, 1.0);
        assert_eq!(params.pitch, 1.0);
    }
}
