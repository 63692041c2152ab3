//! Analytics collector facade
//!
//! Receives raw callbacks from the playback engine, renderers, media sources and DRM,
//! resolves an [`EventTime`] for each with the strategy that fits the callback, and
//! hands the delivery to the [`ListenerSet`].
//!
//! Resolution strategies:
//! - **current**: the period the player is positioned in (player state events)
//! - **playing**: front of the queue (renderer teardown, dropped frames)
//! - **reading**: period renderers are consuming (renderer setup and output events)
//! - **loading**: back of the queue (bandwidth samples)
//! - **explicit**: window index and period supplied by the source (load and DRM events)
//!
//! Callbacks are grouped by producer in the submodules. Every callback requires a bound
//! player (see [`AnalyticsCollector::set_player`]).

mod player_events;
mod renderer_events;
mod source_events;

use crate::dispatch::{AggregateFn, ExecutionContext, ListenerSet};
use crate::listener::AnalyticsListener;
use crate::resolver::EventTimeResolver;
use crate::tracker::MediaPeriodQueueTracker;
use mpa_common::config::CollectorConfig;
use mpa_common::{Clock, Error, EventFlag, EventTime, Events, MediaPeriodId, Player, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Listener object type held by the collector's listener set
type DynListener = dyn AnalyticsListener;

/// Entry point of the analytics core
pub struct AnalyticsCollector {
    clock: Arc<dyn Clock>,
    config: CollectorConfig,
    tracker: MediaPeriodQueueTracker,
    listeners: ListenerSet<DynListener>,
    player: Option<Arc<dyn Player>>,

    /// Set by `notify_seek_started`, cleared by a seek discontinuity
    is_seeking: bool,
}

impl AnalyticsCollector {
    /// Create a collector with its own execution context
    ///
    /// Must be called inside a tokio runtime. The collector is bound to the calling
    /// thread until [`AnalyticsCollector::set_player`] rebinds it.
    pub fn new(clock: Arc<dyn Clock>, config: CollectorConfig) -> Result<Self> {
        let context = ExecutionContext::spawn(config.context_name.clone())?;
        Ok(Self::with_context(clock, config, context))
    }

    pub fn with_context(
        clock: Arc<dyn Clock>,
        config: CollectorConfig,
        context: ExecutionContext,
    ) -> Self {
        let listeners = ListenerSet::new(context, config.thread_check, None);
        Self {
            clock,
            config,
            tracker: MediaPeriodQueueTracker::new(),
            listeners,
            player: None,
            is_seeking: false,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn tracker(&self) -> &MediaPeriodQueueTracker {
        &self.tracker
    }

    pub fn context(&self) -> &ExecutionContext {
        self.listeners.context()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of listener deliveries that panicked on the current context
    pub fn listener_failures(&self) -> u64 {
        self.listeners.failure_count()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn AnalyticsListener>) -> Result<()> {
        self.listeners.add(listener)
    }

    /// Returns `false` if `listener` was not registered
    pub fn remove_listener(&mut self, listener: &Arc<dyn AnalyticsListener>) -> Result<bool> {
        self.listeners.remove(listener)
    }

    /// Bind the player and move delivery to `context`
    ///
    /// Rebinding is allowed only while no media periods are queued. Listeners start
    /// receiving [`AnalyticsListener::on_events`] batches from this point.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if a player is bound and its queue is not empty.
    pub fn set_player(&mut self, player: Arc<dyn Player>, context: ExecutionContext) -> Result<()> {
        if self.player.is_some() && !self.tracker.queue().is_empty() {
            return Err(Error::InvalidState(
                "player can only be replaced while the media period queue is empty".to_string(),
            ));
        }

        let aggregate_player = Arc::clone(&player);
        let aggregate: AggregateFn<DynListener> =
            Arc::new(move |listener: &DynListener, events: &Events| {
                listener.on_events(&*aggregate_player, events)
            });
        self.listeners = self.listeners.migrate(context, Some(aggregate))?;
        self.player = Some(player);

        info!(context = %self.listeners.context().name(), "Analytics collector bound to player");
        Ok(())
    }

    /// Report the player's media period queue and the period renderers are reading
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] without a bound player, or for a non-empty queue without a
    /// reading period.
    pub fn update_media_period_queue_info(
        &mut self,
        queue: Vec<MediaPeriodId>,
        reading_period: Option<MediaPeriodId>,
    ) -> Result<()> {
        self.listeners.verify_thread()?;
        let player = self.bound_player()?;
        self.tracker
            .on_queue_updated(queue, reading_period, player.as_ref())
    }

    /// Deliver the aggregate batch for everything sent since the last flush
    pub fn flush_events(&mut self) -> Result<()> {
        self.listeners.flush_aggregate()
    }

    /// Report the player release and shut delivery down
    ///
    /// `on_player_released` is the last per-event callback listeners receive. Deliveries
    /// queued before this call complete first. The listener set is released even when
    /// the release event cannot be sent; the first error is returned.
    pub fn release(&mut self) -> Result<()> {
        self.listeners.verify_thread()?;
        let sent = match self.current_event_time() {
            Ok(event_time) => self.send_verified(
                Some(EventFlag::PlayerReleased),
                event_time,
                |listener, et| listener.on_player_released(et),
            ),
            Err(e) => Err(e),
        };
        let released = self.listeners.release_verified();
        debug!("Analytics collector released");
        sent.and(released)
    }

    // ========================================
    // Event time resolution
    // ========================================

    fn bound_player(&self) -> Result<Arc<dyn Player>> {
        self.player
            .clone()
            .ok_or_else(|| Error::InvalidState("no player bound to the analytics collector".to_string()))
    }

    fn resolver(&self) -> Result<EventTimeResolver<'_>> {
        let player = self
            .player
            .as_deref()
            .ok_or_else(|| Error::InvalidState("no player bound to the analytics collector".to_string()))?;
        Ok(EventTimeResolver::new(self.clock.as_ref(), &self.tracker, player))
    }

    fn current_event_time(&self) -> Result<EventTime> {
        Ok(self.resolver()?.current())
    }

    fn playing_event_time(&self) -> Result<EventTime> {
        Ok(self.resolver()?.playing())
    }

    fn reading_event_time(&self) -> Result<EventTime> {
        Ok(self.resolver()?.reading())
    }

    fn loading_event_time(&self) -> Result<EventTime> {
        Ok(self.resolver()?.loading())
    }

    fn media_period_event_time(
        &self,
        window_index: usize,
        media_period_id: Option<&MediaPeriodId>,
    ) -> Result<EventTime> {
        Ok(self.resolver()?.resolve_in(window_index, media_period_id))
    }

    fn error_event_time(&self, media_period_id: Option<&MediaPeriodId>) -> Result<EventTime> {
        Ok(self.resolver()?.for_error(media_period_id))
    }

    fn send<F>(&mut self, flag: Option<EventFlag>, event_time: EventTime, deliver: F) -> Result<()>
    where
        F: Fn(&DynListener, &EventTime) + Send + 'static,
    {
        self.listeners.send(flag, event_time, deliver)
    }

    /// Send for callbacks that checked the thread themselves before touching the tracker
    fn send_verified<F>(&mut self, flag: Option<EventFlag>, event_time: EventTime, deliver: F) -> Result<()>
    where
        F: Fn(&DynListener, &EventTime) + Send + 'static,
    {
        self.listeners.send_verified(flag, event_time, deliver)
    }
}
