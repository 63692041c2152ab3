//! Player state callbacks
//!
//! Resolved with the "current" strategy, except errors that name their failing period.

use super::AnalyticsCollector;
use mpa_common::events::payloads::{
    DiscontinuityReason, MediaItemTransitionReason, OpaquePayload, PlayWhenReadyChangeReason,
    PlaybackError, PlaybackParameters, PlaybackState, PlaybackSuppressionReason, PositionInfo,
    RepeatMode, TimelineChangeReason,
};
use mpa_common::{EventFlag, Result};

impl AnalyticsCollector {
    /// Announce a seek before the player reports its discontinuity
    ///
    /// Reported once per seek: further calls are ignored until a seek discontinuity.
    pub fn notify_seek_started(&mut self) -> Result<()> {
        if self.is_seeking {
            return Ok(());
        }
        let event_time = self.current_event_time()?;
        self.is_seeking = true;
        self.send(None, event_time, |listener, et| listener.on_seek_started(et))
    }

    /// The tracker is updated before the event time is resolved
    pub fn on_timeline_changed(&mut self, reason: TimelineChangeReason) -> Result<()> {
        self.listeners.verify_thread()?;
        let player = self.bound_player()?;
        self.tracker.on_timeline_changed(player.as_ref());
        let event_time = self.current_event_time()?;
        self.send_verified(Some(EventFlag::TimelineChanged), event_time, move |listener, et| {
            listener.on_timeline_changed(et, reason)
        })
    }

    pub fn on_media_item_transition(
        &mut self,
        media_item: Option<OpaquePayload>,
        reason: MediaItemTransitionReason,
    ) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::MediaItemTransition), event_time, move |listener, et| {
            listener.on_media_item_transition(et, media_item.as_ref(), reason)
        })
    }

    pub fn on_tracks_changed(&mut self, tracks: OpaquePayload) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::TracksChanged), event_time, move |listener, et| {
            listener.on_tracks_changed(et, &tracks)
        })
    }

    #[allow(deprecated)]
    pub fn on_is_loading_changed(&mut self, is_loading: bool) -> Result<()> {
        let event_time = self.current_event_time()?;
        let legacy = self.config.legacy_callbacks;
        self.send(Some(EventFlag::IsLoadingChanged), event_time, move |listener, et| {
            if legacy {
                listener.on_loading_changed_legacy(et, is_loading);
            }
            listener.on_is_loading_changed(et, is_loading);
        })
    }

    pub fn on_available_commands_changed(&mut self, commands: OpaquePayload) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::AvailableCommandsChanged), event_time, move |listener, et| {
            listener.on_available_commands_changed(et, &commands)
        })
    }

    /// Older combined state callback; never part of an aggregate batch
    ///
    /// Dropped when legacy callbacks are disabled.
    #[allow(deprecated)]
    pub fn on_player_state_changed(
        &mut self,
        play_when_ready: bool,
        state: PlaybackState,
    ) -> Result<()> {
        if !self.config.legacy_callbacks {
            return Ok(());
        }
        let event_time = self.current_event_time()?;
        self.send(None, event_time, move |listener, et| {
            listener.on_player_state_changed_legacy(et, play_when_ready, state)
        })
    }

    pub fn on_playback_state_changed(&mut self, state: PlaybackState) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::PlaybackStateChanged), event_time, move |listener, et| {
            listener.on_playback_state_changed(et, state)
        })
    }

    pub fn on_play_when_ready_changed(
        &mut self,
        play_when_ready: bool,
        reason: PlayWhenReadyChangeReason,
    ) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::PlayWhenReadyChanged), event_time, move |listener, et| {
            listener.on_play_when_ready_changed(et, play_when_ready, reason)
        })
    }

    pub fn on_playback_suppression_reason_changed(
        &mut self,
        reason: PlaybackSuppressionReason,
    ) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(
            Some(EventFlag::PlaybackSuppressionReasonChanged),
            event_time,
            move |listener, et| listener.on_playback_suppression_reason_changed(et, reason),
        )
    }

    pub fn on_is_playing_changed(&mut self, is_playing: bool) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::IsPlayingChanged), event_time, move |listener, et| {
            listener.on_is_playing_changed(et, is_playing)
        })
    }

    pub fn on_repeat_mode_changed(&mut self, mode: RepeatMode) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::RepeatModeChanged), event_time, move |listener, et| {
            listener.on_repeat_mode_changed(et, mode)
        })
    }

    pub fn on_shuffle_mode_enabled_changed(&mut self, enabled: bool) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::ShuffleModeEnabledChanged), event_time, move |listener, et| {
            listener.on_shuffle_mode_changed(et, enabled)
        })
    }

    pub fn on_player_error(&mut self, error: PlaybackError) -> Result<()> {
        let event_time = self.error_event_time(error.media_period_id.as_ref())?;
        self.send(Some(EventFlag::PlayerError), event_time, move |listener, et| {
            listener.on_player_error(et, &error)
        })
    }

    pub fn on_player_error_changed(&mut self, error: Option<PlaybackError>) -> Result<()> {
        let failing_period = error.as_ref().and_then(|e| e.media_period_id);
        let event_time = self.error_event_time(failing_period.as_ref())?;
        self.send(Some(EventFlag::PlayerError), event_time, move |listener, et| {
            listener.on_player_error_changed(et, error.as_ref())
        })
    }

    /// A seek discontinuity ends the current seek. The tracker re-matches the player
    /// position before the event time is resolved.
    #[allow(deprecated)]
    pub fn on_position_discontinuity(
        &mut self,
        old_position: PositionInfo,
        new_position: PositionInfo,
        reason: DiscontinuityReason,
    ) -> Result<()> {
        self.listeners.verify_thread()?;
        let player = self.bound_player()?;
        if reason == DiscontinuityReason::Seek {
            self.is_seeking = false;
        }
        self.tracker.on_position_discontinuity(player.as_ref());
        let event_time = self.current_event_time()?;
        let legacy = self.config.legacy_callbacks;
        self.send_verified(Some(EventFlag::PositionDiscontinuity), event_time, move |listener, et| {
            if legacy {
                listener.on_position_discontinuity_legacy(et, reason);
            }
            listener.on_position_discontinuity(et, &old_position, &new_position, reason);
        })
    }

    pub fn on_playback_parameters_changed(&mut self, parameters: PlaybackParameters) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::PlaybackParametersChanged), event_time, move |listener, et| {
            listener.on_playback_parameters_changed(et, &parameters)
        })
    }

    pub fn on_seek_back_increment_changed(&mut self, increment_ms: u64) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::SeekBackIncrementChanged), event_time, move |listener, et| {
            listener.on_seek_back_increment_changed(et, increment_ms)
        })
    }

    pub fn on_seek_forward_increment_changed(&mut self, increment_ms: u64) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::SeekForwardIncrementChanged), event_time, move |listener, et| {
            listener.on_seek_forward_increment_changed(et, increment_ms)
        })
    }

    pub fn on_max_seek_to_previous_position_changed(&mut self, position_ms: u64) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(
            Some(EventFlag::MaxSeekToPreviousPositionChanged),
            event_time,
            move |listener, et| listener.on_max_seek_to_previous_position_changed(et, position_ms),
        )
    }

    pub fn on_media_metadata_changed(&mut self, metadata: OpaquePayload) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::MediaMetadataChanged), event_time, move |listener, et| {
            listener.on_media_metadata_changed(et, &metadata)
        })
    }

    pub fn on_playlist_metadata_changed(&mut self, metadata: OpaquePayload) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::PlaylistMetadataChanged), event_time, move |listener, et| {
            listener.on_playlist_metadata_changed(et, &metadata)
        })
    }

    pub fn on_metadata(&mut self, metadata: OpaquePayload) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::Metadata), event_time, move |listener, et| {
            listener.on_metadata(et, &metadata)
        })
    }

    pub fn on_cues(&mut self, cues: OpaquePayload) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::Cues), event_time, move |listener, et| {
            listener.on_cues(et, &cues)
        })
    }

    pub fn on_track_selection_parameters_changed(&mut self, parameters: OpaquePayload) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(
            Some(EventFlag::TrackSelectionParametersChanged),
            event_time,
            move |listener, et| listener.on_track_selection_parameters_changed(et, &parameters),
        )
    }

    pub fn on_device_info_changed(&mut self, device_info: OpaquePayload) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::DeviceInfoChanged), event_time, move |listener, et| {
            listener.on_device_info_changed(et, &device_info)
        })
    }

    pub fn on_device_volume_changed(&mut self, volume: i32, muted: bool) -> Result<()> {
        let event_time = self.current_event_time()?;
        self.send(Some(EventFlag::DeviceVolumeChanged), event_time, move |listener, et| {
            listener.on_device_volume_changed(et, volume, muted)
        })
    }
}
