//! Event flags and aggregate event batches
//!
//! Every per-event listener callback is tagged with an [`EventFlag`]. After a batch of
//! callbacks caused by one real-world trigger, listeners receive a single [`Events`]
//! value naming the flags that fired, with the most recent [`EventTime`] per flag.

pub mod payloads;

use crate::event_time::EventTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

// ========================================
// Event Flags
// ========================================

/// Kind of an analytics event
///
/// Player-level events use codes below 1000; media source, renderer and DRM events
/// use codes from 1000 upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum EventFlag {
    TimelineChanged = 0,
    MediaItemTransition = 1,
    TracksChanged = 2,
    IsLoadingChanged = 3,
    PlaybackStateChanged = 4,
    PlayWhenReadyChanged = 5,
    PlaybackSuppressionReasonChanged = 6,
    IsPlayingChanged = 7,
    RepeatModeChanged = 8,
    ShuffleModeEnabledChanged = 9,
    PlayerError = 10,
    PositionDiscontinuity = 11,
    PlaybackParametersChanged = 12,
    AvailableCommandsChanged = 13,
    MediaMetadataChanged = 14,
    PlaylistMetadataChanged = 15,
    SeekBackIncrementChanged = 16,
    SeekForwardIncrementChanged = 17,
    MaxSeekToPreviousPositionChanged = 18,
    TrackSelectionParametersChanged = 19,
    AudioAttributesChanged = 20,
    AudioSessionId = 21,
    VolumeChanged = 22,
    SkipSilenceEnabledChanged = 23,
    SurfaceSizeChanged = 24,
    VideoSizeChanged = 25,
    RenderedFirstFrame = 26,
    Cues = 27,
    Metadata = 28,
    DeviceInfoChanged = 29,
    DeviceVolumeChanged = 30,
    LoadStarted = 1000,
    LoadCompleted = 1001,
    LoadCanceled = 1002,
    LoadError = 1003,
    DownstreamFormatChanged = 1004,
    UpstreamDiscarded = 1005,
    BandwidthEstimate = 1006,
    AudioEnabled = 1007,
    AudioDecoderInitialized = 1008,
    AudioInputFormatChanged = 1009,
    AudioPositionAdvancing = 1010,
    AudioUnderrun = 1011,
    AudioDecoderReleased = 1012,
    AudioDisabled = 1013,
    AudioSinkError = 1014,
    VideoEnabled = 1015,
    VideoDecoderInitialized = 1016,
    VideoInputFormatChanged = 1017,
    DroppedVideoFrames = 1018,
    VideoDecoderReleased = 1019,
    VideoDisabled = 1020,
    VideoFrameProcessingOffset = 1021,
    DrmSessionAcquired = 1022,
    DrmKeysLoaded = 1023,
    DrmSessionManagerError = 1024,
    DrmKeysRestored = 1025,
    DrmKeysRemoved = 1026,
    DrmSessionReleased = 1027,
    PlayerReleased = 1028,
    AudioCodecError = 1029,
    VideoCodecError = 1030,
}

impl EventFlag {
    /// Stable numeric code of the flag
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Event type string (for logs and serialized output)
    pub fn name(self) -> &'static str {
        match self {
            EventFlag::TimelineChanged => "timeline_changed",
            EventFlag::MediaItemTransition => "media_item_transition",
            EventFlag::TracksChanged => "tracks_changed",
            EventFlag::IsLoadingChanged => "is_loading_changed",
            EventFlag::PlaybackStateChanged => "playback_state_changed",
            EventFlag::PlayWhenReadyChanged => "play_when_ready_changed",
            EventFlag::PlaybackSuppressionReasonChanged => "playback_suppression_reason_changed",
            EventFlag::IsPlayingChanged => "is_playing_changed",
            EventFlag::RepeatModeChanged => "repeat_mode_changed",
            EventFlag::ShuffleModeEnabledChanged => "shuffle_mode_enabled_changed",
            EventFlag::PlayerError => "player_error",
            EventFlag::PositionDiscontinuity => "position_discontinuity",
            EventFlag::PlaybackParametersChanged => "playback_parameters_changed",
            EventFlag::AvailableCommandsChanged => "available_commands_changed",
            EventFlag::MediaMetadataChanged => "media_metadata_changed",
            EventFlag::PlaylistMetadataChanged => "playlist_metadata_changed",
            EventFlag::SeekBackIncrementChanged => "seek_back_increment_changed",
            EventFlag::SeekForwardIncrementChanged => "seek_forward_increment_changed",
            EventFlag::MaxSeekToPreviousPositionChanged => {
                "max_seek_to_previous_position_changed"
            }
            EventFlag::TrackSelectionParametersChanged => "track_selection_parameters_changed",
            EventFlag::AudioAttributesChanged => "audio_attributes_changed",
            EventFlag::AudioSessionId => "audio_session_id",
            EventFlag::VolumeChanged => "volume_changed",
            EventFlag::SkipSilenceEnabledChanged => "skip_silence_enabled_changed",
            EventFlag::SurfaceSizeChanged => "surface_size_changed",
            EventFlag::VideoSizeChanged => "video_size_changed",
            EventFlag::RenderedFirstFrame => "rendered_first_frame",
            EventFlag::Cues => "cues",
            EventFlag::Metadata => "metadata",
            EventFlag::DeviceInfoChanged => "device_info_changed",
            EventFlag::DeviceVolumeChanged => "device_volume_changed",
            EventFlag::LoadStarted => "load_started",
            EventFlag::LoadCompleted => "load_completed",
            EventFlag::LoadCanceled => "load_canceled",
            EventFlag::LoadError => "load_error",
            EventFlag::DownstreamFormatChanged => "downstream_format_changed",
            EventFlag::UpstreamDiscarded => "upstream_discarded",
            EventFlag::BandwidthEstimate => "bandwidth_estimate",
            EventFlag::AudioEnabled => "audio_enabled",
            EventFlag::AudioDecoderInitialized => "audio_decoder_initialized",
            EventFlag::AudioInputFormatChanged => "audio_input_format_changed",
            EventFlag::AudioPositionAdvancing => "audio_position_advancing",
            EventFlag::AudioUnderrun => "audio_underrun",
            EventFlag::AudioDecoderReleased => "audio_decoder_released",
            EventFlag::AudioDisabled => "audio_disabled",
            EventFlag::AudioSinkError => "audio_sink_error",
            EventFlag::VideoEnabled => "video_enabled",
            EventFlag::VideoDecoderInitialized => "video_decoder_initialized",
            EventFlag::VideoInputFormatChanged => "video_input_format_changed",
            EventFlag::DroppedVideoFrames => "dropped_video_frames",
            EventFlag::VideoDecoderReleased => "video_decoder_released",
            EventFlag::VideoDisabled => "video_disabled",
            EventFlag::VideoFrameProcessingOffset => "video_frame_processing_offset",
            EventFlag::DrmSessionAcquired => "drm_session_acquired",
            EventFlag::DrmKeysLoaded => "drm_keys_loaded",
            EventFlag::DrmSessionManagerError => "drm_session_manager_error",
            EventFlag::DrmKeysRestored => "drm_keys_restored",
            EventFlag::DrmKeysRemoved => "drm_keys_removed",
            EventFlag::DrmSessionReleased => "drm_session_released",
            EventFlag::PlayerReleased => "player_released",
            EventFlag::AudioCodecError => "audio_codec_error",
            EventFlag::VideoCodecError => "video_codec_error",
        }
    }
}

impl fmt::Display for EventFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ========================================
// Aggregate Batch
// ========================================

/// Flags that fired together, with the most recent event time of each
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Events {
    flags: BTreeSet<EventFlag>,
    event_times: HashMap<EventFlag, EventTime>,
}

impl Events {
    /// Build a batch for `flags`, keeping only the event times of those flags
    pub fn new(flags: BTreeSet<EventFlag>, event_times: &HashMap<EventFlag, EventTime>) -> Self {
        let event_times = flags
            .iter()
            .filter_map(|flag| event_times.get(flag).map(|time| (*flag, time.clone())))
            .collect();
        Self { flags, event_times }
    }

    pub fn contains(&self, flag: EventFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn contains_any(&self, flags: &[EventFlag]) -> bool {
        flags.iter().any(|flag| self.contains(*flag))
    }

    /// Most recent event time recorded for `flag`
    pub fn event_time(&self, flag: EventFlag) -> Option<&EventTime> {
        self.event_times.get(&flag)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Flags in ascending code order
    pub fn iter(&self) -> impl Iterator<Item = EventFlag> + '_ {
        self.flags.iter().copied()
    }
}
