//! Media source, bandwidth and DRM callbacks
//!
//! Sources and DRM sessions name the window and media period they work for, so these
//! events resolve against that pair rather than the tracker's pointers.

use super::AnalyticsCollector;
use mpa_common::events::payloads::{DrmSessionState, ErrorPayload, LoadEventInfo, MediaLoadData};
use mpa_common::{EventFlag, MediaPeriodId, Result};

impl AnalyticsCollector {
    // ========================================
    // Media source
    // ========================================

    pub fn on_load_started(
        &mut self,
        window_index: usize,
        media_period_id: Option<MediaPeriodId>,
        info: LoadEventInfo,
        data: MediaLoadData,
    ) -> Result<()> {
        let event_time = self.media_period_event_time(window_index, media_period_id.as_ref())?;
        self.send(Some(EventFlag::LoadStarted), event_time, move |listener, et| {
            listener.on_load_started(et, &info, &data)
        })
    }

    pub fn on_load_completed(
        &mut self,
        window_index: usize,
        media_period_id: Option<MediaPeriodId>,
        info: LoadEventInfo,
        data: MediaLoadData,
    ) -> Result<()> {
        let event_time = self.media_period_event_time(window_index, media_period_id.as_ref())?;
        self.send(Some(EventFlag::LoadCompleted), event_time, move |listener, et| {
            listener.on_load_completed(et, &info, &data)
        })
    }

    pub fn on_load_canceled(
        &mut self,
        window_index: usize,
        media_period_id: Option<MediaPeriodId>,
        info: LoadEventInfo,
        data: MediaLoadData,
    ) -> Result<()> {
        let event_time = self.media_period_event_time(window_index, media_period_id.as_ref())?;
        self.send(Some(EventFlag::LoadCanceled), event_time, move |listener, et| {
            listener.on_load_canceled(et, &info, &data)
        })
    }

    pub fn on_load_error(
        &mut self,
        window_index: usize,
        media_period_id: Option<MediaPeriodId>,
        info: LoadEventInfo,
        data: MediaLoadData,
        error: ErrorPayload,
        was_canceled: bool,
    ) -> Result<()> {
        let event_time = self.media_period_event_time(window_index, media_period_id.as_ref())?;
        self.send(Some(EventFlag::LoadError), event_time, move |listener, et| {
            listener.on_load_error(et, &info, &data, &error, was_canceled)
        })
    }

    pub fn on_upstream_discarded(
        &mut self,
        window_index: usize,
        media_period_id: Option<MediaPeriodId>,
        data: MediaLoadData,
    ) -> Result<()> {
        let event_time = self.media_period_event_time(window_index, media_period_id.as_ref())?;
        self.send(Some(EventFlag::UpstreamDiscarded), event_time, move |listener, et| {
            listener.on_upstream_discarded(et, &data)
        })
    }

    pub fn on_downstream_format_changed(
        &mut self,
        window_index: usize,
        media_period_id: Option<MediaPeriodId>,
        data: MediaLoadData,
    ) -> Result<()> {
        let event_time = self.media_period_event_time(window_index, media_period_id.as_ref())?;
        self.send(Some(EventFlag::DownstreamFormatChanged), event_time, move |listener, et| {
            listener.on_downstream_format_changed(et, &data)
        })
    }

    /// Bandwidth samples concern whatever is being loaded
    pub fn on_bandwidth_sample(
        &mut self,
        total_load_time_ms: u64,
        total_bytes_loaded: u64,
        bitrate_estimate: u64,
    ) -> Result<()> {
        let event_time = self.loading_event_time()?;
        self.send(Some(EventFlag::BandwidthEstimate), event_time, move |listener, et| {
            listener.on_bandwidth_estimate(et, total_load_time_ms, total_bytes_loaded, bitrate_estimate)
        })
    }

    // ========================================
    // DRM
    // ========================================

    #[allow(deprecated)]
    pub fn on_drm_session_acquired(
        &mut self,
        window_index: usize,
        media_period_id: Option<MediaPeriodId>,
        state: DrmSessionState,
    ) -> Result<()> {
        let event_time = self.media_period_event_time(window_index, media_period_id.as_ref())?;
        let legacy = self.config.legacy_callbacks;
        self.send(Some(EventFlag::DrmSessionAcquired), event_time, move |listener, et| {
            if legacy {
                listener.on_drm_session_acquired_legacy(et);
            }
            listener.on_drm_session_acquired(et, state);
        })
    }

    pub fn on_drm_keys_loaded(
        &mut self,
        window_index: usize,
        media_period_id: Option<MediaPeriodId>,
    ) -> Result<()> {
        let event_time = self.media_period_event_time(window_index, media_period_id.as_ref())?;
        self.send(Some(EventFlag::DrmKeysLoaded), event_time, |listener, et| {
            listener.on_drm_keys_loaded(et)
        })
    }

    pub fn on_drm_session_manager_error(
        &mut self,
        window_index: usize,
        media_period_id: Option<MediaPeriodId>,
        error: ErrorPayload,
    ) -> Result<()> {
        let event_time = self.media_period_event_time(window_index, media_period_id.as_ref())?;
        self.send(Some(EventFlag::DrmSessionManagerError), event_time, move |listener, et| {
            listener.on_drm_session_manager_error(et, &error)
        })
    }

    pub fn on_drm_keys_restored(
        &mut self,
        window_index: usize,
        media_period_id: Option<MediaPeriodId>,
    ) -> Result<()> {
        let event_time = self.media_period_event_time(window_index, media_period_id.as_ref())?;
        self.send(Some(EventFlag::DrmKeysRestored), event_time, |listener, et| {
            listener.on_drm_keys_restored(et)
        })
    }

    pub fn on_drm_keys_removed(
        &mut self,
        window_index: usize,
        media_period_id: Option<MediaPeriodId>,
    ) -> Result<()> {
        let event_time = self.media_period_event_time(window_index, media_period_id.as_ref())?;
        self.send(Some(EventFlag::DrmKeysRemoved), event_time, |listener, et| {
            listener.on_drm_keys_removed(et)
        })
    }

    pub fn on_drm_session_released(
        &mut self,
        window_index: usize,
        media_period_id: Option<MediaPeriodId>,
    ) -> Result<()> {
        let event_time = self.media_period_event_time(window_index, media_period_id.as_ref())?;
        self.send(Some(EventFlag::DrmSessionReleased), event_time, |listener, et| {
            listener.on_drm_session_released(et)
        })
    }
}
