//! Timeline model
//!
//! A timeline is an ordered, immutable description of seekable structure: windows
//! (logical content items) made of periods (content or ad segments). A later timeline
//! is a different value; nothing is mutated in place, so a `Timeline` is a cheap,
//! shareable snapshot.

use crate::media_period::PeriodUid;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One ad break inside a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdGroup {
    /// Start of the ad group relative to the period, `None` for a post-roll
    pub time_us: Option<u64>,
    /// Number of ads, `None` while unknown
    pub count: Option<usize>,
    /// Number of ads already played
    #[serde(default)]
    pub played: usize,
}

impl AdGroup {
    /// Ad group starting at `time_us` into the period
    pub fn at(time_us: u64, count: usize) -> Self {
        Self {
            time_us: Some(time_us),
            count: Some(count),
            played: 0,
        }
    }

    /// Ad group played once the period has ended
    pub fn post_roll(count: usize) -> Self {
        Self {
            time_us: None,
            count: Some(count),
            played: 0,
        }
    }

    pub fn with_played(mut self, played: usize) -> Self {
        self.played = played;
        self
    }

    /// Whether the group still has ads to play (unknown counts are assumed playable)
    pub fn should_play(&self) -> bool {
        self.count.map_or(true, |count| self.played < count)
    }
}

/// Period inside a timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub uid: PeriodUid,
    /// Index of the window containing this period
    pub window_index: usize,
    /// Duration, `None` while unknown
    pub duration_us: Option<u64>,
    /// Offset of the period start from the window start
    pub position_in_window_us: i64,
    pub ad_groups: Vec<AdGroup>,
}

impl Period {
    /// Index of the next ad group to play after `position_us` (period-relative)
    ///
    /// Returns `None` when the position is at or past the end of the period, or when no
    /// later ad group still has ads to play.
    pub fn ad_group_index_after_position_us(&self, position_us: i64) -> Option<usize> {
        if let Some(duration_us) = self.duration_us {
            if position_us >= i64::try_from(duration_us).unwrap_or(i64::MAX) {
                return None;
            }
        }
        self.ad_groups.iter().position(|group| {
            let after_position = match group.time_us {
                Some(time_us) => i64::try_from(time_us).unwrap_or(i64::MAX) > position_us,
                None => true,
            };
            after_position && group.should_play()
        })
    }
}

/// Window (logical content item) inside a timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Position playback starts from when the window is entered without a seek
    pub default_position_ms: u64,
    /// Sum of the period durations, `None` if any is unknown
    pub duration_ms: Option<u64>,
    pub first_period_index: usize,
    pub last_period_index: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct TimelineData {
    windows: Vec<Window>,
    periods: Vec<Period>,
}

/// Immutable snapshot of the playable structure
///
/// Cloning shares the underlying data. Equality compares content, so two separately
/// built but identical timelines are equal.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    data: Arc<TimelineData>,
}

impl PartialEq for Timeline {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data) || self.data == other.data
    }
}

impl Eq for Timeline {}

impl Timeline {
    /// The empty timeline (no windows, no periods)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> TimelineBuilder {
        TimelineBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.windows.is_empty()
    }

    pub fn window_count(&self) -> usize {
        self.data.windows.len()
    }

    pub fn period_count(&self) -> usize {
        self.data.periods.len()
    }

    pub fn window(&self, index: usize) -> Option<&Window> {
        self.data.windows.get(index)
    }

    pub fn period(&self, index: usize) -> Option<&Period> {
        self.data.periods.get(index)
    }

    pub fn uid_of_period(&self, index: usize) -> Option<PeriodUid> {
        self.period(index).map(|period| period.uid)
    }

    /// Index of the period with the given key, if this timeline contains it
    pub fn index_of_period(&self, uid: &PeriodUid) -> Option<usize> {
        self.data.periods.iter().position(|period| &period.uid == uid)
    }

    pub fn period_by_uid(&self, uid: &PeriodUid) -> Option<&Period> {
        self.data.periods.iter().find(|period| &period.uid == uid)
    }

    pub fn contains_period(&self, uid: &PeriodUid) -> bool {
        self.index_of_period(uid).is_some()
    }
}

/// Description of a period handed to [`TimelineBuilder::window`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSpec {
    pub uid: PeriodUid,
    pub duration_us: Option<u64>,
    pub ad_groups: Vec<AdGroup>,
}

impl PeriodSpec {
    pub fn new(uid: PeriodUid) -> Self {
        Self {
            uid,
            duration_us: None,
            ad_groups: Vec::new(),
        }
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_us = Some(duration_ms.saturating_mul(1000));
        self
    }

    pub fn ad_groups(mut self, ad_groups: Vec<AdGroup>) -> Self {
        self.ad_groups = ad_groups;
        self
    }
}

/// Incremental builder for [`Timeline`]
///
/// Periods are laid out back to back inside their window: each period starts where the
/// previous one (with known duration) ended.
#[derive(Debug, Default)]
pub struct TimelineBuilder {
    windows: Vec<Window>,
    periods: Vec<Period>,
    empty_window: Option<usize>,
}

impl TimelineBuilder {
    /// Append a window made of `periods`
    pub fn window(
        mut self,
        default_position_ms: u64,
        periods: impl IntoIterator<Item = PeriodSpec>,
    ) -> Self {
        let window_index = self.windows.len();
        let first_period_index = self.periods.len();
        let mut position_in_window_us: i64 = 0;
        let mut duration_us: Option<u64> = Some(0);

        for spec in periods {
            self.periods.push(Period {
                uid: spec.uid,
                window_index,
                duration_us: spec.duration_us,
                position_in_window_us,
                ad_groups: spec.ad_groups,
            });
            match spec.duration_us {
                Some(period_us) => {
                    position_in_window_us = position_in_window_us
                        .saturating_add(i64::try_from(period_us).unwrap_or(i64::MAX));
                    duration_us = duration_us.map(|total| total.saturating_add(period_us));
                }
                None => duration_us = None,
            }
        }

        if self.periods.len() == first_period_index {
            self.empty_window.get_or_insert(window_index);
        }

        self.windows.push(Window {
            default_position_ms,
            duration_ms: duration_us.map(|us| us / 1000),
            first_period_index,
            last_period_index: self.periods.len().saturating_sub(1),
        });
        self
    }

    /// Finish the timeline
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a window has no periods or a period key is
    /// used twice.
    pub fn build(self) -> Result<Timeline> {
        if let Some(index) = self.empty_window {
            return Err(Error::InvalidInput(format!("window {index} has no periods")));
        }
        for (index, period) in self.periods.iter().enumerate() {
            if self.periods[..index].iter().any(|other| other.uid == period.uid) {
                return Err(Error::InvalidInput(format!(
                    "duplicate period uid {}",
                    period.uid
                )));
            }
        }
        Ok(Timeline {
            data: Arc::new(TimelineData {
                windows: self.windows,
                periods: self.periods,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_window_timeline(a: PeriodUid, b: PeriodUid, c: PeriodUid) -> Timeline {
        Timeline::builder()
            .window(
                0,
                [
                    PeriodSpec::new(a).duration_ms(10_000),
                    PeriodSpec::new(b).duration_ms(5_000),
                ],
            )
            .window(2_000, [PeriodSpec::new(c)])
            .build()
            .unwrap()
    }

    #[test]
    fn test_empty_timeline() {
        let timeline = Timeline::empty();
        assert!(timeline.is_empty());
        assert_eq!(timeline.window_count(), 0);
        assert_eq!(timeline.period_count(), 0);
        assert!(timeline.window(0).is_none());
        assert_eq!(timeline, Timeline::empty());
    }

    #[test]
    fn test_builder_lays_out_windows_and_periods() {
        let (a, b, c) = (PeriodUid::random(), PeriodUid::random(), PeriodUid::random());
        let timeline = two_window_timeline(a, b, c);

        assert_eq!(timeline.window_count(), 2);
        assert_eq!(timeline.period_count(), 3);

        let first = timeline.window(0).unwrap();
        assert_eq!(first.first_period_index, 0);
        assert_eq!(first.last_period_index, 1);
        assert_eq!(first.duration_ms, Some(15_000));

        let second = timeline.window(1).unwrap();
        assert_eq!(second.default_position_ms, 2_000);
        assert_eq!(second.duration_ms, None);

        assert_eq!(timeline.period(1).unwrap().position_in_window_us, 10_000_000);
        assert_eq!(timeline.period_by_uid(&c).unwrap().window_index, 1);
    }

    #[test]
    fn test_index_of_period() {
        let (a, b, c) = (PeriodUid::random(), PeriodUid::random(), PeriodUid::random());
        let timeline = two_window_timeline(a, b, c);
        assert_eq!(timeline.index_of_period(&b), Some(1));
        assert_eq!(timeline.uid_of_period(2), Some(c));
        assert!(!timeline.contains_period(&PeriodUid::random()));
    }

    #[test]
    fn test_equality_is_by_content() {
        let (a, b, c) = (PeriodUid::random(), PeriodUid::random(), PeriodUid::random());
        let first = two_window_timeline(a, b, c);
        let second = two_window_timeline(a, b, c);
        let different = two_window_timeline(a, c, b);
        assert_eq!(first, second);
        assert_ne!(first, different);
    }

    #[test]
    fn test_window_without_periods_is_rejected() {
        let result = Timeline::builder()
            .window(0, [PeriodSpec::new(PeriodUid::random())])
            .window(0, Vec::<PeriodSpec>::new())
            .build();
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_duplicate_period_uid_is_rejected() {
        let uid = PeriodUid::random();
        let result = Timeline::builder()
            .window(0, [PeriodSpec::new(uid), PeriodSpec::new(uid)])
            .build();
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_ad_group_after_position() {
        let period = Period {
            uid: PeriodUid::random(),
            window_index: 0,
            duration_us: Some(60_000_000),
            position_in_window_us: 0,
            ad_groups: vec![
                AdGroup::at(0, 1),
                AdGroup::at(30_000_000, 2),
                AdGroup::post_roll(1),
            ],
        };

        // Pre-roll is at position 0, so "after" 0 is the mid-roll.
        assert_eq!(period.ad_group_index_after_position_us(0), Some(1));
        assert_eq!(period.ad_group_index_after_position_us(-1), Some(0));
        assert_eq!(period.ad_group_index_after_position_us(29_999_999), Some(1));
        assert_eq!(period.ad_group_index_after_position_us(30_000_000), Some(2));
        assert_eq!(period.ad_group_index_after_position_us(60_000_000), None);
    }

    #[test]
    fn test_ad_group_after_position_skips_played_groups() {
        let period = Period {
            uid: PeriodUid::random(),
            window_index: 0,
            duration_us: None,
            position_in_window_us: 0,
            ad_groups: vec![AdGroup::at(10_000_000, 1).with_played(1), AdGroup::post_roll(1)],
        };
        assert_eq!(period.ad_group_index_after_position_us(0), Some(1));
    }

    #[test]
    fn test_unknown_ad_count_should_play() {
        let group = AdGroup {
            time_us: Some(0),
            count: None,
            played: 3,
        };
        assert!(group.should_play());
        assert!(!AdGroup::at(0, 2).with_played(2).should_play());
    }
}
