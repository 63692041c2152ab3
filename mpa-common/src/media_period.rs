//! Media period identity
//!
//! A media period is a contiguous, independently loadable unit of a timeline: either a
//! main content segment or an inserted ad. The same underlying content period can be
//! queued several times, interleaved with different ad breaks, so identity also carries
//! the ad placement and the next upcoming ad break.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque, stable key of a period inside a timeline's period list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodUid(Uuid);

impl PeriodUid {
    /// Generate a fresh random period key
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PeriodUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an ad inside the ad groups of its period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdSlot {
    /// Index of the ad group (ad break) within the period
    pub group_index: usize,
    /// Index of the ad within its ad group
    pub index_in_group: usize,
}

impl AdSlot {
    pub fn new(group_index: usize, index_in_group: usize) -> Self {
        Self {
            group_index,
            index_in_group,
        }
    }
}

/// Identity of a playable unit in the playback queue
///
/// Equality covers every field. Values are immutable once constructed; use the
/// `with_*` helpers to derive a modified copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaPeriodId {
    /// Key of the period in the timeline that describes it
    pub period_uid: PeriodUid,

    /// Ad placement, or `None` for content
    pub ad: Option<AdSlot>,

    /// Next ad group after this unit, or `None` if no ad break follows
    ///
    /// Only meaningful for content: it tells "content before ad break N" apart from
    /// "content after ad break N" for otherwise identical content periods.
    pub next_ad_group_index: Option<usize>,

    /// Sequence number of the window instance this period belongs to
    pub window_sequence_number: Option<u64>,
}

impl MediaPeriodId {
    /// Content period id
    pub fn content(
        period_uid: PeriodUid,
        window_sequence_number: u64,
        next_ad_group_index: Option<usize>,
    ) -> Self {
        Self {
            period_uid,
            ad: None,
            next_ad_group_index,
            window_sequence_number: Some(window_sequence_number),
        }
    }

    /// Ad period id
    pub fn ad(
        period_uid: PeriodUid,
        ad_group_index: usize,
        ad_index_in_ad_group: usize,
        window_sequence_number: u64,
    ) -> Self {
        Self {
            period_uid,
            ad: Some(AdSlot::new(ad_group_index, ad_index_in_ad_group)),
            next_ad_group_index: None,
            window_sequence_number: Some(window_sequence_number),
        }
    }

    /// Id that only names a period, with no window instance or ad information
    pub fn for_period(period_uid: PeriodUid) -> Self {
        Self {
            period_uid,
            ad: None,
            next_ad_group_index: None,
            window_sequence_number: None,
        }
    }

    pub fn is_ad(&self) -> bool {
        self.ad.is_some()
    }

    pub fn ad_group_index(&self) -> Option<usize> {
        self.ad.map(|slot| slot.group_index)
    }

    pub fn ad_index_in_ad_group(&self) -> Option<usize> {
        self.ad.map(|slot| slot.index_in_group)
    }

    /// Copy of this id pointing at a different period key
    pub fn with_period_uid(self, period_uid: PeriodUid) -> Self {
        Self { period_uid, ..self }
    }
}

impl fmt::Display for MediaPeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ad {
            Some(slot) => write!(
                f,
                "{}[ad {}/{}]",
                self.period_uid, slot.group_index, slot.index_in_group
            ),
            None => match self.next_ad_group_index {
                Some(next) => write!(f, "{}[content, next ad {}]", self.period_uid, next),
                None => write!(f, "{}[content]", self.period_uid),
            },
        }
    }
}
