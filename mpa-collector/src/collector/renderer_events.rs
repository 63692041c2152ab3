//! Audio and video renderer callbacks
//!
//! Setup and output events concern the period renderers are reading. Teardown and
//! frame statistics concern the period being played out.

use super::AnalyticsCollector;
use mpa_common::events::payloads::{
    DecoderCounters, DecoderReuseEvaluation, ErrorPayload, Format, OpaquePayload, VideoSize,
};
use mpa_common::{EventFlag, Result};

impl AnalyticsCollector {
    // ========================================
    // Audio
    // ========================================

    pub fn on_audio_enabled(&mut self, counters: DecoderCounters) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::AudioEnabled), event_time, move |listener, et| {
            listener.on_audio_enabled(et, &counters)
        })
    }

    #[allow(deprecated)]
    pub fn on_audio_decoder_initialized(
        &mut self,
        decoder_name: String,
        initialized_timestamp_ms: u64,
        initialization_duration_ms: u64,
    ) -> Result<()> {
        let event_time = self.reading_event_time()?;
        let legacy = self.config.legacy_callbacks;
        self.send(Some(EventFlag::AudioDecoderInitialized), event_time, move |listener, et| {
            listener.on_audio_decoder_initialized(
                et,
                &decoder_name,
                initialized_timestamp_ms,
                initialization_duration_ms,
            );
            if legacy {
                listener.on_audio_decoder_initialized_legacy(
                    et,
                    &decoder_name,
                    initialization_duration_ms,
                );
            }
        })
    }

    #[allow(deprecated)]
    pub fn on_audio_input_format_changed(
        &mut self,
        format: Format,
        evaluation: Option<DecoderReuseEvaluation>,
    ) -> Result<()> {
        let event_time = self.reading_event_time()?;
        let legacy = self.config.legacy_callbacks;
        self.send(Some(EventFlag::AudioInputFormatChanged), event_time, move |listener, et| {
            if legacy {
                listener.on_audio_input_format_changed_legacy(et, &format);
            }
            listener.on_audio_input_format_changed(et, &format, evaluation.as_ref());
        })
    }

    pub fn on_audio_position_advancing(&mut self, playout_start_system_time_ms: u64) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::AudioPositionAdvancing), event_time, move |listener, et| {
            listener.on_audio_position_advancing(et, playout_start_system_time_ms)
        })
    }

    pub fn on_audio_underrun(
        &mut self,
        buffer_size: u64,
        buffer_size_ms: u64,
        elapsed_since_last_feed_ms: u64,
    ) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::AudioUnderrun), event_time, move |listener, et| {
            listener.on_audio_underrun(et, buffer_size, buffer_size_ms, elapsed_since_last_feed_ms)
        })
    }

    pub fn on_audio_decoder_released(&mut self, decoder_name: String) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::AudioDecoderReleased), event_time, move |listener, et| {
            listener.on_audio_decoder_released(et, &decoder_name)
        })
    }

    pub fn on_audio_disabled(&mut self, counters: DecoderCounters) -> Result<()> {
        let event_time = self.playing_event_time()?;
        self.send(Some(EventFlag::AudioDisabled), event_time, move |listener, et| {
            listener.on_audio_disabled(et, &counters)
        })
    }

    pub fn on_audio_sink_error(&mut self, error: ErrorPayload) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::AudioSinkError), event_time, move |listener, et| {
            listener.on_audio_sink_error(et, &error)
        })
    }

    pub fn on_audio_codec_error(&mut self, error: ErrorPayload) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::AudioCodecError), event_time, move |listener, et| {
            listener.on_audio_codec_error(et, &error)
        })
    }

    pub fn on_audio_attributes_changed(&mut self, attributes: OpaquePayload) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::AudioAttributesChanged), event_time, move |listener, et| {
            listener.on_audio_attributes_changed(et, &attributes)
        })
    }

    pub fn on_audio_session_id_changed(&mut self, audio_session_id: i32) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::AudioSessionId), event_time, move |listener, et| {
            listener.on_audio_session_id_changed(et, audio_session_id)
        })
    }

    pub fn on_skip_silence_enabled_changed(&mut self, enabled: bool) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::SkipSilenceEnabledChanged), event_time, move |listener, et| {
            listener.on_skip_silence_enabled_changed(et, enabled)
        })
    }

    pub fn on_volume_changed(&mut self, volume: f32) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::VolumeChanged), event_time, move |listener, et| {
            listener.on_volume_changed(et, volume)
        })
    }

    // ========================================
    // Video
    // ========================================

    pub fn on_video_enabled(&mut self, counters: DecoderCounters) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::VideoEnabled), event_time, move |listener, et| {
            listener.on_video_enabled(et, &counters)
        })
    }

    #[allow(deprecated)]
    pub fn on_video_decoder_initialized(
        &mut self,
        decoder_name: String,
        initialized_timestamp_ms: u64,
        initialization_duration_ms: u64,
    ) -> Result<()> {
        let event_time = self.reading_event_time()?;
        let legacy = self.config.legacy_callbacks;
        self.send(Some(EventFlag::VideoDecoderInitialized), event_time, move |listener, et| {
            listener.on_video_decoder_initialized(
                et,
                &decoder_name,
                initialized_timestamp_ms,
                initialization_duration_ms,
            );
            if legacy {
                listener.on_video_decoder_initialized_legacy(
                    et,
                    &decoder_name,
                    initialization_duration_ms,
                );
            }
        })
    }

    #[allow(deprecated)]
    pub fn on_video_input_format_changed(
        &mut self,
        format: Format,
        evaluation: Option<DecoderReuseEvaluation>,
    ) -> Result<()> {
        let event_time = self.reading_event_time()?;
        let legacy = self.config.legacy_callbacks;
        self.send(Some(EventFlag::VideoInputFormatChanged), event_time, move |listener, et| {
            if legacy {
                listener.on_video_input_format_changed_legacy(et, &format);
            }
            listener.on_video_input_format_changed(et, &format, evaluation.as_ref());
        })
    }

    pub fn on_dropped_video_frames(&mut self, dropped_frames: u32, elapsed_ms: u64) -> Result<()> {
        let event_time = self.playing_event_time()?;
        self.send(Some(EventFlag::DroppedVideoFrames), event_time, move |listener, et| {
            listener.on_dropped_video_frames(et, dropped_frames, elapsed_ms)
        })
    }

    pub fn on_video_decoder_released(&mut self, decoder_name: String) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::VideoDecoderReleased), event_time, move |listener, et| {
            listener.on_video_decoder_released(et, &decoder_name)
        })
    }

    pub fn on_video_disabled(&mut self, counters: DecoderCounters) -> Result<()> {
        let event_time = self.playing_event_time()?;
        self.send(Some(EventFlag::VideoDisabled), event_time, move |listener, et| {
            listener.on_video_disabled(et, &counters)
        })
    }

    pub fn on_video_frame_processing_offset(
        &mut self,
        total_processing_offset_us: i64,
        frame_count: u32,
    ) -> Result<()> {
        let event_time = self.playing_event_time()?;
        self.send(Some(EventFlag::VideoFrameProcessingOffset), event_time, move |listener, et| {
            listener.on_video_frame_processing_offset(et, total_processing_offset_us, frame_count)
        })
    }

    pub fn on_video_codec_error(&mut self, error: ErrorPayload) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::VideoCodecError), event_time, move |listener, et| {
            listener.on_video_codec_error(et, &error)
        })
    }

    pub fn on_rendered_first_frame(&mut self, output: OpaquePayload, render_time_ms: u64) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::RenderedFirstFrame), event_time, move |listener, et| {
            listener.on_rendered_first_frame(et, &output, render_time_ms)
        })
    }

    pub fn on_surface_size_changed(&mut self, width: u32, height: u32) -> Result<()> {
        let event_time = self.reading_event_time()?;
        self.send(Some(EventFlag::SurfaceSizeChanged), event_time, move |listener, et| {
            listener.on_surface_size_changed(et, width, height)
        })
    }

    #[allow(deprecated)]
    pub fn on_video_size_changed(&mut self, size: VideoSize) -> Result<()> {
        let event_time = self.reading_event_time()?;
        let legacy = self.config.legacy_callbacks;
        self.send(Some(EventFlag::VideoSizeChanged), event_time, move |listener, et| {
            listener.on_video_size_changed(et, &size);
            if legacy {
                listener.on_video_size_changed_legacy(
                    et,
                    size.width,
                    size.height,
                    size.unapplied_rotation_degrees,
                    size.pixel_width_height_ratio,
                );
            }
        })
    }
}
