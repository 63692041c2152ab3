//! Listener set with ordered, snapshot-per-send delivery
//!
//! The producer side (`add`, `remove`, `send`, `flush_aggregate`, `migrate`, `release`)
//! is confined to the thread that created the set. Deliveries run on the set's
//! [`ExecutionContext`]. Every `send` captures the membership at the time of the call,
//! so later membership changes never reorder or duplicate work already queued.

use super::ExecutionContext;
use mpa_common::config::ThreadCheck;
use mpa_common::{Error, EventFlag, EventTime, Events, Result};
use std::collections::{BTreeSet, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, Thread, ThreadId};
use tracing::{error, trace, warn};

/// Aggregate callback invoked once per listener per flush with the flags it received
pub type AggregateFn<L> = Arc<dyn Fn(&L, &Events) + Send + Sync>;

struct ListenerHolder<L: ?Sized> {
    listener: Arc<L>,
    /// Flags delivered to this listener since its last aggregate, shared with the
    /// holder it was migrated from
    pending: Arc<Mutex<BTreeSet<EventFlag>>>,
}

impl<L: ?Sized> ListenerHolder<L> {
    fn new(listener: Arc<L>) -> Self {
        Self {
            listener,
            pending: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    fn migrated(&self) -> Self {
        Self {
            listener: Arc::clone(&self.listener),
            pending: Arc::clone(&self.pending),
        }
    }

    fn record(&self, flag: EventFlag) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(flag);
    }

    fn take_pending(&self) -> BTreeSet<EventFlag> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Delivers one listener's pending aggregate, isolating a panicking listener
fn flush_holder<L: ?Sized>(
    holder: &ListenerHolder<L>,
    aggregate: Option<&AggregateFn<L>>,
    event_times: &HashMap<EventFlag, EventTime>,
    failures: &AtomicU64,
) {
    // Without an aggregate callback the flags stay pending for a migrated set.
    let Some(aggregate) = aggregate else {
        return;
    };
    let flags = holder.take_pending();
    if flags.is_empty() {
        return;
    }
    let events = Events::new(flags, event_times);
    if catch_unwind(AssertUnwindSafe(|| aggregate(&*holder.listener, &events))).is_err() {
        failures.fetch_add(1, Ordering::Relaxed);
        error!(flags = events.len(), "Listener panicked in aggregate delivery");
    }
}

fn describe(thread: &Thread) -> String {
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}

/// Ordered fan-out of events to a dynamic set of listeners
pub struct ListenerSet<L: ?Sized> {
    context: ExecutionContext,
    holders: Arc<[Arc<ListenerHolder<L>>]>,
    aggregate: Option<AggregateFn<L>>,

    /// Last event time recorded per flag, reported with aggregates
    event_times: HashMap<EventFlag, EventTime>,

    owner: ThreadId,
    owner_name: String,
    thread_check: ThreadCheck,

    /// Panicked deliveries, counted on the execution context
    failures: Arc<AtomicU64>,
    /// Failures already surfaced to the producer in strict mode
    reported_failures: u64,

    released: bool,
}

impl<L: ?Sized + Send + Sync + 'static> ListenerSet<L> {
    /// Create an empty set bound to the calling thread
    pub fn new(
        context: ExecutionContext,
        thread_check: ThreadCheck,
        aggregate: Option<AggregateFn<L>>,
    ) -> Self {
        let owner = thread::current();
        Self {
            context,
            holders: Arc::from(Vec::new()),
            aggregate,
            event_times: HashMap::new(),
            owner: owner.id(),
            owner_name: describe(&owner),
            thread_check,
            failures: Arc::new(AtomicU64::new(0)),
            reported_failures: 0,
            released: false,
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Number of listener deliveries that panicked so far
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Last event time recorded for `flag`
    pub fn event_time(&self, flag: EventFlag) -> Option<&EventTime> {
        self.event_times.get(&flag)
    }

    /// Check that the caller runs on the thread this set is bound to
    ///
    /// Lenient sets only log a warning.
    ///
    /// # Errors
    ///
    /// [`Error::WrongThread`] in strict mode.
    pub fn verify_thread(&self) -> Result<()> {
        let current = thread::current();
        if current.id() == self.owner {
            return Ok(());
        }
        let actual = describe(&current);
        match self.thread_check {
            ThreadCheck::Strict => Err(Error::WrongThread {
                expected: self.owner_name.clone(),
                actual,
            }),
            ThreadCheck::Lenient => {
                warn!(
                    expected = %self.owner_name,
                    actual = %actual,
                    "Listener set used from the wrong thread"
                );
                Ok(())
            }
        }
    }

    /// In strict mode, report listener failures that happened since the previous report
    ///
    /// Called after the producer operation has done its work, so a failure never drops
    /// the event that surfaced it.
    fn surface_failures(&mut self) -> Result<()> {
        if self.thread_check == ThreadCheck::Strict {
            let failures = self.failures.load(Ordering::Relaxed);
            if failures > self.reported_failures {
                self.reported_failures = failures;
                return Err(Error::ListenerFailure { failures });
            }
        }
        Ok(())
    }

    /// Register a listener; it receives every event sent after this call
    pub fn add(&mut self, listener: Arc<L>) -> Result<()> {
        self.verify_thread()?;
        if self.released {
            warn!("Listener added after release; it will not receive events");
        }
        let mut holders: Vec<_> = self.holders.iter().cloned().collect();
        holders.push(Arc::new(ListenerHolder::new(listener)));
        self.holders = Arc::from(holders);
        self.surface_failures()
    }

    /// Unregister a listener by handle identity
    ///
    /// Deliveries already queued still reach it. Its pending aggregate is delivered after
    /// them. Returns `false` if the listener was not registered.
    pub fn remove(&mut self, listener: &Arc<L>) -> Result<bool> {
        self.verify_thread()?;
        let position = self
            .holders
            .iter()
            .position(|holder| std::ptr::addr_eq(Arc::as_ptr(&holder.listener), Arc::as_ptr(listener)));
        let Some(position) = position else {
            self.surface_failures()?;
            return Ok(false);
        };

        let mut holders: Vec<_> = self.holders.iter().cloned().collect();
        let removed = holders.remove(position);
        self.holders = Arc::from(holders);

        let aggregate = self.aggregate.clone();
        let event_times = self.event_times.clone();
        let failures = Arc::clone(&self.failures);
        self.context.post(move || {
            flush_holder(&removed, aggregate.as_ref(), &event_times, &failures);
        });
        self.surface_failures()?;
        Ok(true)
    }

    /// Queue `deliver` for every current listener, in registration order
    ///
    /// With a flag, `event_time` becomes the flag's last recorded time and the flag is
    /// added to each listener's pending aggregate once delivered.
    pub fn send<F>(&mut self, flag: Option<EventFlag>, event_time: EventTime, deliver: F) -> Result<()>
    where
        F: Fn(&L, &EventTime) + Send + 'static,
    {
        self.verify_thread()?;
        self.send_verified(flag, event_time, deliver)
    }

    /// [`ListenerSet::send`] for callers that already ran [`ListenerSet::verify_thread`]
    /// for this operation
    pub(crate) fn send_verified<F>(
        &mut self,
        flag: Option<EventFlag>,
        event_time: EventTime,
        deliver: F,
    ) -> Result<()>
    where
        F: Fn(&L, &EventTime) + Send + 'static,
    {
        if self.released {
            warn!(flag = ?flag, "Event sent after release was dropped");
            return self.surface_failures();
        }
        if let Some(flag) = flag {
            self.event_times.insert(flag, event_time.clone());
        }
        trace!(flag = ?flag, listeners = self.holders.len(), "Queueing delivery");

        let holders = Arc::clone(&self.holders);
        let failures = Arc::clone(&self.failures);
        self.context.post(move || {
            for holder in holders.iter() {
                if let Some(flag) = flag {
                    holder.record(flag);
                }
                let delivered =
                    catch_unwind(AssertUnwindSafe(|| deliver(&*holder.listener, &event_time)));
                if delivered.is_err() {
                    failures.fetch_add(1, Ordering::Relaxed);
                    error!(flag = ?flag, "Listener panicked during delivery; continuing with remaining listeners");
                }
            }
        });
        self.surface_failures()
    }

    /// Deliver one aggregate per listener covering the flags it received since the last
    /// flush
    pub fn flush_aggregate(&mut self) -> Result<()> {
        self.verify_thread()?;
        if !self.released && self.aggregate.is_some() {
            self.post_flush();
        }
        self.surface_failures()
    }

    fn post_flush(&self) {
        let holders = Arc::clone(&self.holders);
        let aggregate = self.aggregate.clone();
        let event_times = self.event_times.clone();
        let failures = Arc::clone(&self.failures);
        self.context.post(move || {
            for holder in holders.iter() {
                flush_holder(holder, aggregate.as_ref(), &event_times, &failures);
            }
        });
    }

    /// Equivalent set bound to `context` and the calling thread
    ///
    /// Membership, recorded event times and unflushed flags carry over. Work already
    /// queued on the old context keeps draining there, and `context` holds its own jobs
    /// back until that drain is done, so the first flush on `context` reports every flag
    /// delivered before the handoff.
    pub fn migrate(&self, context: ExecutionContext, aggregate: Option<AggregateFn<L>>) -> Result<Self> {
        if self.released {
            return Err(Error::InvalidState(
                "cannot migrate a released listener set".to_string(),
            ));
        }
        let owner = thread::current();
        let holders: Vec<_> = self
            .holders
            .iter()
            .map(|holder| Arc::new(holder.migrated()))
            .collect();
        context.wait_for(&self.context);
        Ok(Self {
            context,
            holders: Arc::from(holders),
            aggregate,
            event_times: self.event_times.clone(),
            owner: owner.id(),
            owner_name: describe(&owner),
            thread_check: self.thread_check,
            failures: Arc::new(AtomicU64::new(0)),
            reported_failures: 0,
            released: false,
        })
    }

    /// Schedule the final aggregate flush behind every queued delivery
    ///
    /// Later sends are dropped.
    pub fn release(&mut self) -> Result<()> {
        self.verify_thread()?;
        self.release_verified()
    }

    /// [`ListenerSet::release`] for callers that already ran
    /// [`ListenerSet::verify_thread`] for this operation
    pub(crate) fn release_verified(&mut self) -> Result<()> {
        if !self.released {
            self.post_flush();
            self.released = true;
        }
        self.surface_failures()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mpa_common::{PlayerSnapshot, Timeline};

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                log: Arc::clone(log),
            })
        }

        fn push(&self, entry: &str) {
            self.log.lock().unwrap().push(format!("{}:{}", self.name, entry));
        }
    }

    fn event_time(position_ms: u64) -> EventTime {
        let current = PlayerSnapshot {
            timeline: Timeline::empty(),
            window_index: 0,
            media_period_id: None,
            position_ms,
            total_buffered_duration_ms: 0,
        };
        EventTime::new(Utc::now(), Timeline::empty(), 0, None, position_ms, current)
    }

    fn aggregate() -> AggregateFn<Recorder> {
        Arc::new(|recorder: &Recorder, events: &Events| {
            let names: Vec<_> = events.iter().map(|flag| flag.name()).collect();
            recorder.push(&format!("events[{}]", names.join(",")));
        })
    }

    fn set(log: &Arc<Mutex<Vec<String>>>, thread_check: ThreadCheck) -> (ListenerSet<Recorder>, Arc<Recorder>, Arc<Recorder>) {
        let context = ExecutionContext::spawn("test").unwrap();
        let mut listeners = ListenerSet::new(context, thread_check, Some(aggregate()));
        let a = Recorder::new("a", log);
        let b = Recorder::new("b", log);
        listeners.add(Arc::clone(&a)).unwrap();
        listeners.add(Arc::clone(&b)).unwrap();
        (listeners, a, b)
    }

    fn entries(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_every_listener_sees_sends_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut listeners, _, _) = set(&log, ThreadCheck::Strict);

        listeners
            .send(Some(EventFlag::PlaybackStateChanged), event_time(1), |l, _| l.push("state"))
            .unwrap();
        listeners
            .send(Some(EventFlag::IsPlayingChanged), event_time(2), |l, _| l.push("playing"))
            .unwrap();
        listeners.context().idle().await;

        assert_eq!(entries(&log), vec!["a:state", "b:state", "a:playing", "b:playing"]);
    }

    #[tokio::test]
    async fn test_membership_changes_apply_to_next_send() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut listeners, a, _) = set(&log, ThreadCheck::Strict);

        listeners.send(None, event_time(0), |l, _| l.push("one")).unwrap();
        assert!(listeners.remove(&a).unwrap());
        let c = Recorder::new("c", &log);
        listeners.add(c).unwrap();
        listeners.send(None, event_time(0), |l, _| l.push("two")).unwrap();
        listeners.context().idle().await;

        assert_eq!(entries(&log), vec!["a:one", "b:one", "b:two", "c:two"]);
        assert_eq!(listeners.len(), 2);
    }

    #[tokio::test]
    async fn test_removing_unknown_listener_is_a_no_op() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut listeners, _, _) = set(&log, ThreadCheck::Strict);

        let stranger = Recorder::new("x", &log);
        assert!(!listeners.remove(&stranger).unwrap());
        assert_eq!(listeners.len(), 2);
    }

    #[tokio::test]
    async fn test_aggregate_carries_flags_received_since_last_flush() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut listeners, _, _) = set(&log, ThreadCheck::Strict);

        listeners
            .send(Some(EventFlag::TimelineChanged), event_time(0), |_, _| {})
            .unwrap();
        listeners
            .send(Some(EventFlag::PositionDiscontinuity), event_time(0), |_, _| {})
            .unwrap();
        listeners.send(None, event_time(0), |_, _| {}).unwrap();
        listeners.flush_aggregate().unwrap();
        listeners.flush_aggregate().unwrap();
        listeners.context().idle().await;

        assert_eq!(
            entries(&log),
            vec![
                "a:events[timeline_changed,position_discontinuity]",
                "b:events[timeline_changed,position_discontinuity]",
            ]
        );
    }

    #[tokio::test]
    async fn test_same_flag_keeps_latest_event_time() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut listeners, _, _) = set(&log, ThreadCheck::Strict);

        listeners
            .send(Some(EventFlag::IsLoadingChanged), event_time(10), |_, _| {})
            .unwrap();
        listeners
            .send(Some(EventFlag::IsLoadingChanged), event_time(20), |_, _| {})
            .unwrap();

        let recorded = listeners.event_time(EventFlag::IsLoadingChanged).unwrap();
        assert_eq!(recorded.event_playback_position_ms(), 20);
    }

    #[tokio::test]
    async fn test_removed_listener_gets_pending_aggregate() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut listeners, a, _) = set(&log, ThreadCheck::Strict);

        listeners
            .send(Some(EventFlag::VolumeChanged), event_time(0), |l, _| l.push("volume"))
            .unwrap();
        listeners.remove(&a).unwrap();
        listeners.context().idle().await;

        assert_eq!(
            entries(&log),
            vec!["a:volume", "b:volume", "a:events[volume_changed]"]
        );
    }

    #[tokio::test]
    async fn test_release_runs_after_queued_work_and_drops_later_sends() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut listeners, _, _) = set(&log, ThreadCheck::Strict);

        listeners
            .send(Some(EventFlag::PlayerReleased), event_time(0), |l, _| l.push("released"))
            .unwrap();
        listeners.release().unwrap();
        listeners.send(None, event_time(0), |l, _| l.push("late")).unwrap();
        listeners.context().idle().await;

        assert!(listeners.is_released());
        assert_eq!(
            entries(&log),
            vec![
                "a:released",
                "b:released",
                "a:events[player_released]",
                "b:events[player_released]",
            ]
        );
    }

    #[tokio::test]
    async fn test_panicking_listener_is_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut listeners, _, _) = set(&log, ThreadCheck::Lenient);

        listeners
            .send(None, event_time(0), |l, _| {
                if l.name == "a" {
                    panic!("listener failure");
                }
                l.push("ok");
            })
            .unwrap();
        listeners.send(None, event_time(0), |l, _| l.push("next")).unwrap();
        listeners.context().idle().await;

        assert_eq!(entries(&log), vec!["b:ok", "a:next", "b:next"]);
        assert_eq!(listeners.failure_count(), 1);
        assert!(listeners.send(None, event_time(0), |_, _| {}).is_ok());
    }

    #[tokio::test]
    async fn test_strict_mode_surfaces_listener_failure_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut listeners, _, _) = set(&log, ThreadCheck::Strict);

        listeners.send(None, event_time(0), |_, _| panic!("boom")).unwrap();
        listeners.context().idle().await;

        let result = listeners.send(None, event_time(0), |_, _| {});
        assert!(matches!(result, Err(Error::ListenerFailure { failures: 2 })));
        assert!(listeners.send(None, event_time(0), |_, _| {}).is_ok());
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_wrong_thread() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (listeners, _, _) = set(&log, ThreadCheck::Strict);
        let listeners = Arc::new(Mutex::new(listeners));

        let shared = Arc::clone(&listeners);
        let result = std::thread::Builder::new()
            .name("intruder".to_string())
            .spawn(move || shared.lock().unwrap().send(None, event_time(0), |_, _| {}))
            .unwrap()
            .join()
            .unwrap();

        match result {
            Err(Error::WrongThread { actual, .. }) => assert_eq!(actual, "intruder"),
            other => panic!("expected wrong-thread error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lenient_mode_allows_wrong_thread() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (listeners, _, _) = set(&log, ThreadCheck::Lenient);
        let listeners = Arc::new(Mutex::new(listeners));

        let shared = Arc::clone(&listeners);
        let result = std::thread::spawn(move || shared.lock().unwrap().verify_thread())
            .join()
            .unwrap();

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_migrate_keeps_members_and_moves_new_sends() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut listeners, _, _) = set(&log, ThreadCheck::Strict);

        listeners
            .send(Some(EventFlag::TimelineChanged), event_time(5), |l, _| l.push("old"))
            .unwrap();
        let new_context = ExecutionContext::spawn("migrated").unwrap();
        let mut migrated = listeners.migrate(new_context, Some(aggregate())).unwrap();
        migrated
            .send(Some(EventFlag::RepeatModeChanged), event_time(0), |l, _| l.push("new"))
            .unwrap();
        migrated.flush_aggregate().unwrap();

        listeners.context().idle().await;
        migrated.context().idle().await;

        assert_eq!(migrated.len(), 2);
        assert_eq!(migrated.context().name(), "migrated");
        assert_eq!(
            migrated
                .event_time(EventFlag::TimelineChanged)
                .map(|t| t.event_playback_position_ms()),
            Some(5)
        );
        assert_eq!(
            entries(&log),
            vec![
                "a:old",
                "b:old",
                "a:new",
                "b:new",
                "a:events[timeline_changed,repeat_mode_changed]",
                "b:events[timeline_changed,repeat_mode_changed]",
            ]
        );
    }

    #[tokio::test]
    async fn test_migrate_reports_flags_left_unflushed_on_old_context() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let context = ExecutionContext::spawn("unbound").unwrap();
        let mut listeners = ListenerSet::new(context, ThreadCheck::Strict, None);
        listeners.add(Recorder::new("a", &log)).unwrap();

        listeners
            .send(Some(EventFlag::IsPlayingChanged), event_time(0), |l, _| l.push("playing"))
            .unwrap();
        listeners.flush_aggregate().unwrap();

        let mut migrated = listeners
            .migrate(ExecutionContext::spawn("bound").unwrap(), Some(aggregate()))
            .unwrap();
        migrated.flush_aggregate().unwrap();
        migrated.context().idle().await;

        assert_eq!(entries(&log), vec!["a:playing", "a:events[is_playing_changed]"]);
    }

    #[tokio::test]
    async fn test_strict_failure_report_keeps_the_event() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut listeners, _, _) = set(&log, ThreadCheck::Strict);

        listeners.send(None, event_time(0), |_, _| panic!("boom")).unwrap();
        listeners.context().idle().await;

        let result = listeners.send(Some(EventFlag::TimelineChanged), event_time(7), |l, _| {
            l.push("timeline")
        });
        assert!(matches!(result, Err(Error::ListenerFailure { .. })));
        listeners.context().idle().await;

        assert_eq!(entries(&log), vec!["a:timeline", "b:timeline"]);
        assert_eq!(
            listeners
                .event_time(EventFlag::TimelineChanged)
                .map(|t| t.event_playback_position_ms()),
            Some(7)
        );
    }

    #[tokio::test]
    async fn test_strict_failure_report_still_releases() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut listeners, _, _) = set(&log, ThreadCheck::Strict);

        listeners
            .send(Some(EventFlag::VolumeChanged), event_time(0), |l, _| {
                if l.name == "a" {
                    panic!("boom");
                }
                l.push("volume");
            })
            .unwrap();
        listeners.context().idle().await;

        let result = listeners.release();
        assert!(matches!(result, Err(Error::ListenerFailure { failures: 1 })));
        assert!(listeners.is_released());
        listeners.context().idle().await;

        assert_eq!(
            entries(&log),
            vec!["b:volume", "a:events[volume_changed]", "b:events[volume_changed]"]
        );
    }
}
