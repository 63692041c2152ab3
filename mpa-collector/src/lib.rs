//! # MPA Collector
//!
//! Event-time resolution and listener dispatch core of the playback analytics pipeline.
//!
//! Raw playback callbacks enter through [`AnalyticsCollector`], which:
//! 1. keeps the [`MediaPeriodQueueTracker`] in sync with the player's queue,
//! 2. resolves an [`EventTime`](mpa_common::EventTime) for the callback with an
//!    [`EventTimeResolver`] strategy (current, playing, reading, loading or explicit),
//! 3. hands the delivery to a [`ListenerSet`], which runs it for every registered
//!    [`AnalyticsListener`] on a single [`ExecutionContext`], in send order.

pub mod collector;
pub mod dispatch;
pub mod listener;
pub mod replay;
pub mod resolver;
pub mod tracker;

pub use collector::AnalyticsCollector;
pub use dispatch::{ExecutionContext, ListenerSet};
pub use listener::AnalyticsListener;
pub use mpa_common::{Error, Result};
pub use resolver::EventTimeResolver;
pub use tracker::MediaPeriodQueueTracker;
