//! Key range translation

use std::ops::Bound;

use crate::backend::SortKeyCondition;

use super::options::IteratorOptions;

/// The sort-key interval a scan covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub low: Bound<String>,
    pub high: Bound<String>,
}

impl KeyRange {
    pub fn unbounded() -> Self {
        Self {
            low: Bound::Unbounded,
            high: Bound::Unbounded,
        }
    }

    /// Resolve LevelDB options into an interval.
    ///
    /// Low bound: `gt`, then `gte`, then the legacy bound. High bound: `lt`,
    /// then `lte`, then the legacy bound. Legacy bounds are inclusive and
    /// swap roles in reverse mode.
    pub fn from_options(options: &IteratorOptions) -> Self {
        let (legacy_low, legacy_high) = if options.reverse {
            (&options.end, &options.start)
        } else {
            (&options.start, &options.end)
        };

        let low = match (&options.gt, &options.gte, legacy_low) {
            (Some(gt), _, _) => Bound::Excluded(gt.clone()),
            (None, Some(gte), _) => Bound::Included(gte.clone()),
            (None, None, Some(legacy)) => Bound::Included(legacy.clone()),
            (None, None, None) => Bound::Unbounded,
        };
        let high = match (&options.lt, &options.lte, legacy_high) {
            (Some(lt), _, _) => Bound::Excluded(lt.clone()),
            (None, Some(lte), _) => Bound::Included(lte.clone()),
            (None, None, Some(legacy)) => Bound::Included(legacy.clone()),
            (None, None, None) => Bound::Unbounded,
        };

        Self { low, high }
    }

    pub fn contains(&self, key: &str) -> bool {
        let above_low = match &self.low {
            Bound::Included(low) => key >= low.as_str(),
            Bound::Excluded(low) => key > low.as_str(),
            Bound::Unbounded => true,
        };
        let below_high = match &self.high {
            Bound::Included(high) => key <= high.as_str(),
            Bound::Excluded(high) => key < high.as_str(),
            Bound::Unbounded => true,
        };
        above_low && below_high
    }

    /// True when no key can fall inside the range
    pub fn is_empty(&self) -> bool {
        match (&self.low, &self.high) {
            (Bound::Included(low), Bound::Included(high)) => low > high,
            (Bound::Included(low), Bound::Excluded(high))
            | (Bound::Excluded(low), Bound::Included(high))
            | (Bound::Excluded(low), Bound::Excluded(high)) => low >= high,
            _ => false,
        }
    }

    /// Backend condition covering the range.
    ///
    /// A range bounded on both sides becomes an inclusive `Between`; callers
    /// re-apply `contains` to drop the excluded endpoints.
    pub fn condition(&self) -> Option<SortKeyCondition> {
        match (&self.low, &self.high) {
            (Bound::Unbounded, Bound::Unbounded) => None,
            (Bound::Included(low), Bound::Unbounded) => Some(SortKeyCondition::Ge(low.clone())),
            (Bound::Excluded(low), Bound::Unbounded) => Some(SortKeyCondition::Gt(low.clone())),
            (Bound::Unbounded, Bound::Included(high)) => Some(SortKeyCondition::Le(high.clone())),
            (Bound::Unbounded, Bound::Excluded(high)) => Some(SortKeyCondition::Lt(high.clone())),
            (Bound::Included(low) | Bound::Excluded(low), Bound::Included(high) | Bound::Excluded(high)) => {
                Some(SortKeyCondition::Between(low.clone(), high.clone()))
            }
        }
    }
}
