//! # MPA Common Library
//!
//! Shared model for the media playback analytics core:
//! - Media period identity (`MediaPeriodId`) and timelines
//! - Resolved event times (`EventTime`) and event flags
//! - Payload types forwarded to analytics listeners
//! - The `Player` collaborator interface
//! - Clock abstraction, configuration loading and error types

pub mod config;
pub mod error;
pub mod event_time;
pub mod events;
pub mod media_period;
pub mod player;
pub mod time;
pub mod timeline;

pub use error::{Error, Result};
pub use event_time::{EventTime, PlayerSnapshot};
pub use events::{EventFlag, Events};
pub use media_period::{AdSlot, MediaPeriodId, PeriodUid};
pub use player::{Player, PlayerState, SharedPlayerState};
pub use time::{Clock, ManualClock, SystemClock};
pub use timeline::{AdGroup, Period, PeriodSpec, Timeline, TimelineBuilder, Window};
