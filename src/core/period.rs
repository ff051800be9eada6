//! Base/comparison year selection and month windows

use std::collections::BTreeSet;

/// Inclusive month window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MonthRange {
    pub(crate) start: u32,
    pub(crate) end: u32,
}

impl MonthRange {
    pub(crate) const ALL: MonthRange = MonthRange { start: 1, end: 12 };

    /// Bounds are order-insensitive
    pub(crate) fn new(a: u32, b: u32) -> Self {
        MonthRange {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub(crate) fn contains(self, month: u32) -> bool {
        (self.start..=self.end).contains(&month)
    }
}

impl Default for MonthRange {
    fn default() -> Self {
        MonthRange::ALL
    }
}

/// Pair of years compared by every comparative report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Period {
    pub(crate) base_year: i32,
    pub(crate) comparison_year: i32,
    pub(crate) months: MonthRange,
}

impl Period {
    /// Derive the period from the years present; `None` when there are none
    pub(crate) fn from_years(years: &BTreeSet<i32>, months: MonthRange) -> Option<Self> {
        let (base_year, comparison_year) = select_period(years)?;
        Some(Period {
            base_year,
            comparison_year,
            months,
        })
    }

    /// Requested year columns, deduplicated, oldest first
    pub(crate) fn years(&self) -> Vec<i32> {
        if self.base_year == self.comparison_year {
            vec![self.base_year]
        } else {
            vec![self.base_year, self.comparison_year]
        }
    }

    pub(crate) fn is_single_year(&self) -> bool {
        self.base_year == self.comparison_year
    }
}

/// Second-most-recent and most-recent year, or the only year twice
pub(crate) fn select_period(years: &BTreeSet<i32>) -> Option<(i32, i32)> {
    let mut recent = years.iter().rev();
    let comparison = *recent.next()?;
    let base = recent.next().copied().unwrap_or(comparison);
    Some((base, comparison))
}
