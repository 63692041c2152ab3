//! Scripted session replay
//!
//! Drives an [`AnalyticsCollector`] from a [`Script`]: player state is simulated with a
//! [`SharedPlayerState`], every step feeds one raw callback (or a state change) into the
//! collector, and the aggregate batch is flushed after each step.

mod json_listener;
mod script;

pub use json_listener::JsonLinesListener;
pub use script::{AdGroupScript, AdScript, PeriodRef, PeriodScript, Script, Step, TimelineScript, WindowScript};

use crate::collector::AnalyticsCollector;
use crate::dispatch::ExecutionContext;
use mpa_common::config::CollectorConfig;
use mpa_common::events::payloads::{
    DataType, LoadEventInfo, MediaLoadData, PlaybackError, PositionInfo, TrackType,
};
use mpa_common::{
    AdGroup, AdSlot, Clock, MediaPeriodId, PeriodSpec, PeriodUid, PlayerState, SharedPlayerState,
    Timeline,
};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Replay failures
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Script parse error: {0}")]
    Script(#[from] toml::de::Error),

    #[error("Script I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown timeline '{0}'")]
    UnknownTimeline(String),

    #[error("Period '{0}' is not declared by any timeline")]
    UnknownPeriod(String),

    #[error("Invalid timeline '{name}': {source}")]
    InvalidTimeline {
        name: String,
        #[source]
        source: mpa_common::Error,
    },

    #[error("Step {step}: {message}")]
    InvalidStep { step: usize, message: String },

    #[error("Collector error: {0}")]
    Collector(#[from] mpa_common::Error),
}

/// Outcome of a replayed session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps: usize,
    pub listener_failures: u64,
    pub released: bool,
}

/// Period label registry; a label maps to one period uid for the whole session
///
/// Labels are declared by timelines. Steps may only refer to declared labels.
#[derive(Debug, Default)]
struct PeriodLabels {
    uids: HashMap<String, PeriodUid>,
}

impl PeriodLabels {
    fn declare(&mut self, label: &str) -> PeriodUid {
        *self
            .uids
            .entry(label.to_string())
            .or_insert_with(PeriodUid::random)
    }

    fn lookup(&self, label: &str) -> Result<PeriodUid, ReplayError> {
        self.uids
            .get(label)
            .copied()
            .ok_or_else(|| ReplayError::UnknownPeriod(label.to_string()))
    }

    fn by_uid(&self) -> HashMap<PeriodUid, String> {
        self.uids
            .iter()
            .map(|(label, uid)| (*uid, label.clone()))
            .collect()
    }
}

/// One scripted session in progress
pub struct ReplaySession {
    collector: AnalyticsCollector,
    player: SharedPlayerState,
    timelines: HashMap<String, Timeline>,
    labels: PeriodLabels,
    released: bool,
}

impl ReplaySession {
    /// Build timelines, bind a simulated player and register a JSON Lines listener
    /// writing to `out`
    pub fn new<W>(
        script: &Script,
        config: CollectorConfig,
        clock: Arc<dyn Clock>,
        out: W,
    ) -> Result<Self, ReplayError>
    where
        W: Write + Send + 'static,
    {
        let mut labels = PeriodLabels::default();
        let mut timelines = HashMap::new();
        for timeline in &script.timelines {
            timelines.insert(timeline.name.clone(), build_timeline(timeline, &mut labels)?);
        }

        let context = ExecutionContext::spawn(config.context_name.clone())?;
        let mut collector = AnalyticsCollector::with_context(clock, config, context.clone());
        let player = SharedPlayerState::default();
        collector.set_player(Arc::new(player.clone()), context)?;
        collector.add_listener(Arc::new(JsonLinesListener::new(out, labels.by_uid())))?;

        Ok(Self {
            collector,
            player,
            timelines,
            labels,
            released: false,
        })
    }

    pub fn collector(&self) -> &AnalyticsCollector {
        &self.collector
    }

    /// Apply every step, then wait for all deliveries to finish
    pub async fn run(mut self, steps: &[Step]) -> Result<ReplaySummary, ReplayError> {
        for (index, step) in steps.iter().enumerate() {
            self.apply(index, step)?;
            self.collector.flush_events()?;
        }
        self.collector.context().idle().await;

        let summary = ReplaySummary {
            steps: steps.len(),
            listener_failures: self.collector.listener_failures(),
            released: self.released,
        };
        info!(steps = summary.steps, released = summary.released, "Replay finished");
        Ok(summary)
    }

    fn apply(&mut self, index: usize, step: &Step) -> Result<(), ReplayError> {
        debug!(step = index, ?step, "Applying replay step");
        match step {
            Step::Player {
                timeline,
                period_index,
                media_item_index,
                position_ms,
                content_position_ms,
                ad,
                buffered_ms,
            } => {
                let timeline = match timeline {
                    Some(name) => self
                        .timelines
                        .get(name)
                        .cloned()
                        .ok_or_else(|| ReplayError::UnknownTimeline(name.clone()))?,
                    None => Timeline::empty(),
                };
                self.player.set(PlayerState {
                    timeline,
                    period_index: *period_index,
                    media_item_index: *media_item_index,
                    position_ms: *position_ms,
                    content_position_ms: content_position_ms.unwrap_or(*position_ms),
                    ad: ad.map(|ad| AdSlot::new(ad.group, ad.index)),
                    total_buffered_duration_ms: *buffered_ms,
                });
            }
            Step::QueueUpdated { queue, reading } => {
                let queue = queue
                    .iter()
                    .map(|period| self.media_period_id(period))
                    .collect::<Result<Vec<_>, _>>()?;
                let reading_period = match reading {
                    Some(position) => Some(*queue.get(*position).ok_or_else(|| {
                        ReplayError::InvalidStep {
                            step: index,
                            message: format!(
                                "reading index {} outside queue of {}",
                                position,
                                queue.len()
                            ),
                        }
                    })?),
                    None => None,
                };
                self.collector
                    .update_media_period_queue_info(queue, reading_period)?;
            }
            Step::TimelineChanged { reason } => self.collector.on_timeline_changed(*reason)?,
            Step::PositionDiscontinuity { reason, from_ms } => {
                let old_position = PositionInfo {
                    position_ms: *from_ms,
                    content_position_ms: *from_ms,
                    ..self.position_info()
                };
                let new_position = self.position_info();
                self.collector
                    .on_position_discontinuity(old_position, new_position, *reason)?;
            }
            Step::SeekStarted => self.collector.notify_seek_started()?,
            Step::PlaybackStateChanged { state } => {
                self.collector.on_playback_state_changed(*state)?
            }
            Step::IsPlayingChanged { is_playing } => {
                self.collector.on_is_playing_changed(*is_playing)?
            }
            Step::LoadStarted {
                window_index,
                period,
                uri,
            } => {
                let id = period
                    .as_ref()
                    .map(|period| self.media_period_id(period))
                    .transpose()?;
                let info = load_info(index, uri, 0, 0);
                self.collector
                    .on_load_started(*window_index, id, info, media_load_data())?;
            }
            Step::LoadCompleted {
                window_index,
                period,
                uri,
                bytes_loaded,
                load_duration_ms,
            } => {
                let id = period
                    .as_ref()
                    .map(|period| self.media_period_id(period))
                    .transpose()?;
                let info = load_info(index, uri, *bytes_loaded, *load_duration_ms);
                self.collector
                    .on_load_completed(*window_index, id, info, media_load_data())?;
            }
            Step::DroppedFrames { count, elapsed_ms } => {
                self.collector.on_dropped_video_frames(*count, *elapsed_ms)?
            }
            Step::PlayerError {
                code,
                message,
                period,
            } => {
                let mut error = PlaybackError::new(*code, message.clone());
                if let Some(period) = period {
                    error = error.with_media_period_id(self.media_period_id(period)?);
                }
                self.collector.on_player_error(error)?;
            }
            Step::Release => {
                self.collector.release()?;
                self.released = true;
            }
        }
        Ok(())
    }

    fn media_period_id(&self, period: &PeriodRef) -> Result<MediaPeriodId, ReplayError> {
        let uid = self.labels.lookup(&period.period)?;
        Ok(match period.ad {
            Some(ad) => MediaPeriodId::ad(uid, ad.group, ad.index, period.window_sequence),
            None => MediaPeriodId::content(uid, period.window_sequence, period.next_ad_group),
        })
    }

    fn position_info(&self) -> PositionInfo {
        let state = self.player.snapshot();
        PositionInfo {
            media_item_index: state.media_item_index,
            period_index: state.period_index,
            position_ms: state.position_ms,
            content_position_ms: state.content_position_ms,
            ad_group_index: state.ad.map(|ad| ad.group_index),
            ad_index_in_ad_group: state.ad.map(|ad| ad.index_in_group),
        }
    }
}

fn build_timeline(script: &TimelineScript, labels: &mut PeriodLabels) -> Result<Timeline, ReplayError> {
    let mut builder = Timeline::builder();
    for window in &script.windows {
        let periods: Vec<PeriodSpec> = window
            .periods
            .iter()
            .map(|period| {
                let mut spec = PeriodSpec::new(labels.declare(&period.id)).ad_groups(
                    period
                        .ad_groups
                        .iter()
                        .map(|group| {
                            AdGroup {
                                time_us: group.time_ms.map(|ms| ms.saturating_mul(1000)),
                                count: group.count,
                                played: group.played,
                            }
                        })
                        .collect(),
                );
                if let Some(duration_ms) = period.duration_ms {
                    spec = spec.duration_ms(duration_ms);
                }
                spec
            })
            .collect();
        builder = builder.window(window.default_position_ms, periods);
    }
    builder.build().map_err(|source| ReplayError::InvalidTimeline {
        name: script.name.clone(),
        source,
    })
}

fn load_info(task_id: usize, uri: &str, bytes_loaded: u64, load_duration_ms: u64) -> LoadEventInfo {
    LoadEventInfo {
        load_task_id: task_id as u64,
        uri: uri.to_string(),
        elapsed_realtime_ms: 0,
        load_duration_ms,
        bytes_loaded,
    }
}

fn media_load_data() -> MediaLoadData {
    MediaLoadData {
        data_type: DataType::Media,
        track_type: TrackType::Unknown,
        track_format: None,
        media_start_time_ms: None,
        media_end_time_ms: None,
    }
}
