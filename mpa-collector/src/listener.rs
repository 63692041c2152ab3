//! Analytics listener interface
//!
//! Every method has an empty default body, so listeners implement only what they care
//! about. Each per-event method receives the resolved [`EventTime`] followed by the
//! payload of the raw callback. [`AnalyticsListener::on_events`] is called once per
//! externally visible batch with the flags the listener received in that batch.
//!
//! Methods marked deprecated are the older callback shapes. They are delivered in the
//! same job as their replacement when `legacy_callbacks` is enabled.

use mpa_common::events::payloads::{
    DecoderCounters, DecoderReuseEvaluation, DiscontinuityReason, DrmSessionState,
    ErrorPayload, Format, LoadEventInfo, MediaItemTransitionReason, MediaLoadData,
    OpaquePayload, PlayWhenReadyChangeReason, PlaybackError, PlaybackParameters,
    PlaybackState, PlaybackSuppressionReason, PositionInfo, RepeatMode, TimelineChangeReason,
    VideoSize,
};
use mpa_common::{EventTime, Events, Player};

/// Observer of analytics events
#[allow(unused_variables)]
pub trait AnalyticsListener: Send + Sync {
    // ========================================
    // Player state
    // ========================================

    fn on_playback_state_changed(&self, event_time: &EventTime, state: PlaybackState) {}

    fn on_play_when_ready_changed(
        &self,
        event_time: &EventTime,
        play_when_ready: bool,
        reason: PlayWhenReadyChangeReason,
    ) {
    }

    fn on_playback_suppression_reason_changed(
        &self,
        event_time: &EventTime,
        reason: PlaybackSuppressionReason,
    ) {
    }

    fn on_is_playing_changed(&self, event_time: &EventTime, is_playing: bool) {}

    fn on_timeline_changed(&self, event_time: &EventTime, reason: TimelineChangeReason) {}

    /// `media_item` is `None` when the playlist became empty
    fn on_media_item_transition(
        &self,
        event_time: &EventTime,
        media_item: Option<&OpaquePayload>,
        reason: MediaItemTransitionReason,
    ) {
    }

    fn on_position_discontinuity(
        &self,
        event_time: &EventTime,
        old_position: &PositionInfo,
        new_position: &PositionInfo,
        reason: DiscontinuityReason,
    ) {
    }

    #[deprecated(note = "use on_position_discontinuity with position details")]
    fn on_position_discontinuity_legacy(&self, event_time: &EventTime, reason: DiscontinuityReason) {
    }

    /// Seek requested; reported once per seek, outside any aggregate
    fn on_seek_started(&self, event_time: &EventTime) {}

    fn on_playback_parameters_changed(
        &self,
        event_time: &EventTime,
        parameters: &PlaybackParameters,
    ) {
    }

    fn on_seek_back_increment_changed(&self, event_time: &EventTime, increment_ms: u64) {}

    fn on_seek_forward_increment_changed(&self, event_time: &EventTime, increment_ms: u64) {}

    fn on_max_seek_to_previous_position_changed(&self, event_time: &EventTime, position_ms: u64) {}

    fn on_repeat_mode_changed(&self, event_time: &EventTime, mode: RepeatMode) {}

    fn on_shuffle_mode_changed(&self, event_time: &EventTime, enabled: bool) {}

    fn on_is_loading_changed(&self, event_time: &EventTime, is_loading: bool) {}

    #[deprecated(note = "use on_is_loading_changed")]
    fn on_loading_changed_legacy(&self, event_time: &EventTime, is_loading: bool) {}

    fn on_available_commands_changed(&self, event_time: &EventTime, commands: &OpaquePayload) {}

    fn on_player_error(&self, event_time: &EventTime, error: &PlaybackError) {}

    /// `error` is `None` once the error has been cleared
    fn on_player_error_changed(&self, event_time: &EventTime, error: Option<&PlaybackError>) {}

    #[deprecated(note = "use on_playback_state_changed and on_play_when_ready_changed")]
    fn on_player_state_changed_legacy(
        &self,
        event_time: &EventTime,
        play_when_ready: bool,
        state: PlaybackState,
    ) {
    }

    fn on_tracks_changed(&self, event_time: &EventTime, tracks: &OpaquePayload) {}

    fn on_track_selection_parameters_changed(
        &self,
        event_time: &EventTime,
        parameters: &OpaquePayload,
    ) {
    }

    fn on_media_metadata_changed(&self, event_time: &EventTime, metadata: &OpaquePayload) {}

    fn on_playlist_metadata_changed(&self, event_time: &EventTime, metadata: &OpaquePayload) {}

    fn on_metadata(&self, event_time: &EventTime, metadata: &OpaquePayload) {}

    fn on_cues(&self, event_time: &EventTime, cues: &OpaquePayload) {}

    fn on_device_info_changed(&self, event_time: &EventTime, device_info: &OpaquePayload) {}

    fn on_device_volume_changed(&self, event_time: &EventTime, volume: i32, muted: bool) {}

    // ========================================
    // Audio
    // ========================================

    fn on_audio_enabled(&self, event_time: &EventTime, counters: &DecoderCounters) {}

    fn on_audio_decoder_initialized(
        &self,
        event_time: &EventTime,
        decoder_name: &str,
        initialized_timestamp_ms: u64,
        initialization_duration_ms: u64,
    ) {
    }

    #[deprecated(note = "use on_audio_decoder_initialized with the initialization timestamp")]
    fn on_audio_decoder_initialized_legacy(
        &self,
        event_time: &EventTime,
        decoder_name: &str,
        initialization_duration_ms: u64,
    ) {
    }

    /// `evaluation` is `None` when no decoder was in use for the previous format
    fn on_audio_input_format_changed(
        &self,
        event_time: &EventTime,
        format: &Format,
        evaluation: Option<&DecoderReuseEvaluation>,
    ) {
    }

    #[deprecated(note = "use on_audio_input_format_changed with the reuse evaluation")]
    fn on_audio_input_format_changed_legacy(&self, event_time: &EventTime, format: &Format) {}

    fn on_audio_position_advancing(&self, event_time: &EventTime, playout_start_system_time_ms: u64) {}

    fn on_audio_underrun(
        &self,
        event_time: &EventTime,
        buffer_size: u64,
        buffer_size_ms: u64,
        elapsed_since_last_feed_ms: u64,
    ) {
    }

    fn on_audio_decoder_released(&self, event_time: &EventTime, decoder_name: &str) {}

    fn on_audio_disabled(&self, event_time: &EventTime, counters: &DecoderCounters) {}

    fn on_audio_sink_error(&self, event_time: &EventTime, error: &ErrorPayload) {}

    fn on_audio_codec_error(&self, event_time: &EventTime, error: &ErrorPayload) {}

    fn on_audio_attributes_changed(&self, event_time: &EventTime, attributes: &OpaquePayload) {}

    fn on_audio_session_id_changed(&self, event_time: &EventTime, audio_session_id: i32) {}

    fn on_skip_silence_enabled_changed(&self, event_time: &EventTime, enabled: bool) {}

    fn on_volume_changed(&self, event_time: &EventTime, volume: f32) {}

    // ========================================
    // Video
    // ========================================

    fn on_video_enabled(&self, event_time: &EventTime, counters: &DecoderCounters) {}

    fn on_video_decoder_initialized(
        &self,
        event_time: &EventTime,
        decoder_name: &str,
        initialized_timestamp_ms: u64,
        initialization_duration_ms: u64,
    ) {
    }

    #[deprecated(note = "use on_video_decoder_initialized with the initialization timestamp")]
    fn on_video_decoder_initialized_legacy(
        &self,
        event_time: &EventTime,
        decoder_name: &str,
        initialization_duration_ms: u64,
    ) {
    }

    fn on_video_input_format_changed(
        &self,
        event_time: &EventTime,
        format: &Format,
        evaluation: Option<&DecoderReuseEvaluation>,
    ) {
    }

    #[deprecated(note = "use on_video_input_format_changed with the reuse evaluation")]
    fn on_video_input_format_changed_legacy(&self, event_time: &EventTime, format: &Format) {}

    fn on_dropped_video_frames(&self, event_time: &EventTime, dropped_frames: u32, elapsed_ms: u64) {}

    fn on_video_decoder_released(&self, event_time: &EventTime, decoder_name: &str) {}

    fn on_video_disabled(&self, event_time: &EventTime, counters: &DecoderCounters) {}

    fn on_video_frame_processing_offset(
        &self,
        event_time: &EventTime,
        total_processing_offset_us: i64,
        frame_count: u32,
    ) {
    }

    fn on_video_codec_error(&self, event_time: &EventTime, error: &ErrorPayload) {}

    fn on_rendered_first_frame(
        &self,
        event_time: &EventTime,
        output: &OpaquePayload,
        render_time_ms: u64,
    ) {
    }

    fn on_surface_size_changed(&self, event_time: &EventTime, width: u32, height: u32) {}

    fn on_video_size_changed(&self, event_time: &EventTime, size: &VideoSize) {}

    #[deprecated(note = "use on_video_size_changed")]
    fn on_video_size_changed_legacy(
        &self,
        event_time: &EventTime,
        width: u32,
        height: u32,
        unapplied_rotation_degrees: u32,
        pixel_width_height_ratio: f32,
    ) {
    }

    // ========================================
    // Media source and bandwidth
    // ========================================

    fn on_load_started(&self, event_time: &EventTime, info: &LoadEventInfo, data: &MediaLoadData) {}

    fn on_load_completed(&self, event_time: &EventTime, info: &LoadEventInfo, data: &MediaLoadData) {}

    fn on_load_canceled(&self, event_time: &EventTime, info: &LoadEventInfo, data: &MediaLoadData) {}

    fn on_load_error(
        &self,
        event_time: &EventTime,
        info: &LoadEventInfo,
        data: &MediaLoadData,
        error: &ErrorPayload,
        was_canceled: bool,
    ) {
    }

    fn on_upstream_discarded(&self, event_time: &EventTime, data: &MediaLoadData) {}

    fn on_downstream_format_changed(&self, event_time: &EventTime, data: &MediaLoadData) {}

    fn on_bandwidth_estimate(
        &self,
        event_time: &EventTime,
        total_load_time_ms: u64,
        total_bytes_loaded: u64,
        bitrate_estimate: u64,
    ) {
    }

    // ========================================
    // DRM
    // ========================================

    fn on_drm_session_acquired(&self, event_time: &EventTime, state: DrmSessionState) {}

    #[deprecated(note = "use on_drm_session_acquired with the session state")]
    fn on_drm_session_acquired_legacy(&self, event_time: &EventTime) {}

    fn on_drm_keys_loaded(&self, event_time: &EventTime) {}

    fn on_drm_session_manager_error(&self, event_time: &EventTime, error: &ErrorPayload) {}

    fn on_drm_keys_restored(&self, event_time: &EventTime) {}

    fn on_drm_keys_removed(&self, event_time: &EventTime) {}

    fn on_drm_session_released(&self, event_time: &EventTime) {}

    // ========================================
    // Lifecycle
    // ========================================

    /// Last per-event callback before the listener set is released
    fn on_player_released(&self, event_time: &EventTime) {}

    /// Flags this listener received since the previous batch, with their event times
    fn on_events(&self, player: &dyn Player, events: &Events) {}
}
