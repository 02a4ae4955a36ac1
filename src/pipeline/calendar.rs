//! Calendar arithmetic for cutoff dates and closed-month windows
//!
//! All behavioral features are computed over windows of whole calendar
//! months ending at a cutoff date. The cutoff is either the reference date
//! itself (M policy) or the last day of the month before it (M-1 policy,
//! the default, which keeps the observation month out of the features).

use chrono::{Datelike, NaiveDate};

/// The fixed family of aggregation windows, shortest to longest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    M1,
    M3,
    M6,
    M9,
    M12,
    M24,
    Ever,
}

impl Window {
    /// Every window, shortest first. Feature columns are emitted in this order.
    pub const ALL: [Window; 7] = [
        Window::M1,
        Window::M3,
        Window::M6,
        Window::M9,
        Window::M12,
        Window::M24,
        Window::Ever,
    ];

    /// Window length in months; `None` means unbounded history ("ever").
    pub fn months(self) -> Option<u32> {
        match self {
            Window::M1 => Some(1),
            Window::M3 => Some(3),
            Window::M6 => Some(6),
            Window::M9 => Some(9),
            Window::M12 => Some(12),
            Window::M24 => Some(24),
            Window::Ever => None,
        }
    }

    /// Index of this window within [`Window::ALL`].
    pub fn position(self) -> usize {
        match self {
            Window::M1 => 0,
            Window::M3 => 1,
            Window::M6 => 2,
            Window::M9 => 3,
            Window::M12 => 4,
            Window::M24 => 5,
            Window::Ever => 6,
        }
    }

    /// Column-name suffix ("1m", "3m", ..., "ever").
    pub fn label(self) -> &'static str {
        match self {
            Window::M1 => "1m",
            Window::M3 => "3m",
            Window::M6 => "6m",
            Window::M9 => "9m",
            Window::M12 => "12m",
            Window::M24 => "24m",
            Window::Ever => "ever",
        }
    }
}

/// Adjacent window pairs compared by the ratio/delta features, in the
/// fixed (shorter, longer) order.
pub const ADJACENT_PAIRS: [(Window, Window); 6] = [
    (Window::M1, Window::M3),
    (Window::M3, Window::M6),
    (Window::M6, Window::M9),
    (Window::M9, Window::M12),
    (Window::M12, Window::M24),
    (Window::M24, Window::Ever),
];

/// First day of `date`'s month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap()
}

/// Last day of the given month (handles leap Februaries).
pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.unwrap().pred_opt().unwrap()
}

/// "YYYY-MM" label for `date`'s month.
pub fn month_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Resolve the cutoff for a reference date.
///
/// With `use_prior_month` the cutoff is the last day of the month before
/// the reference date's month, even across year boundaries:
/// 2024-01-15 -> 2023-12-31, 2024-03-31 -> 2024-02-29.
pub fn cutoff_date(reference: NaiveDate, use_prior_month: bool) -> NaiveDate {
    if use_prior_month {
        month_start(reference).pred_opt().unwrap()
    } else {
        reference
    }
}

/// Start of an N-month window ending at `cutoff`: the first day of the
/// month (N-1) months before the cutoff's month, so the window covers N
/// closed calendar months ending in the cutoff's month.
pub fn window_start(cutoff: NaiveDate, months: u32) -> NaiveDate {
    let total = cutoff.year() * 12 + cutoff.month0() as i32 - (months as i32 - 1);
    let year = total.div_euclid(12);
    let month0 = total.rem_euclid(12) as u32;
    NaiveDate::from_ymd_opt(year, month0 + 1, 1).unwrap()
}

/// Inclusive bounds of a window: `(start, end)` with `start = None` for
/// the unbounded "ever" window. `end` is always the cutoff.
pub fn window_bounds(cutoff: NaiveDate, months: Option<u32>) -> (Option<NaiveDate>, NaiveDate) {
    (months.map(|m| window_start(cutoff, m)), cutoff)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_cutoff_without_prior_month_is_identity() {
        assert_eq!(cutoff_date(d(2024, 4, 30), false), d(2024, 4, 30));
        assert_eq!(cutoff_date(d(2024, 4, 12), false), d(2024, 4, 12));
    }

    #[test]
    fn test_cutoff_prior_month() {
        // Mid-month and month-end references both land on the previous month-end
        assert_eq!(cutoff_date(d(2024, 4, 30), true), d(2024, 3, 31));
        assert_eq!(cutoff_date(d(2024, 4, 1), true), d(2024, 3, 31));
    }

    #[test]
    fn test_cutoff_prior_month_across_year_boundary() {
        assert_eq!(cutoff_date(d(2024, 1, 31), true), d(2023, 12, 31));
        assert_eq!(cutoff_date(d(2023, 12, 31), true), d(2023, 11, 30));
    }

    #[test]
    fn test_cutoff_prior_month_leap_february() {
        assert_eq!(cutoff_date(d(2024, 3, 31), true), d(2024, 2, 29));
        assert_eq!(cutoff_date(d(2023, 3, 31), true), d(2023, 2, 28));
    }

    #[test]
    fn test_window_start_single_month() {
        // 1m window ending 2024-03-31 covers exactly March 2024
        assert_eq!(window_start(d(2024, 3, 31), 1), d(2024, 3, 1));
    }

    #[test]
    fn test_window_start_spans_year_boundary() {
        // 3m ending 2024-01-31 = Nov/23, Dec/23, Jan/24
        assert_eq!(window_start(d(2024, 1, 31), 3), d(2023, 11, 1));
        // 24m ending 2024-03-31 starts April 2022
        assert_eq!(window_start(d(2024, 3, 31), 24), d(2022, 4, 1));
    }

    #[test]
    fn test_window_bounds_ever_has_no_start() {
        let (start, end) = window_bounds(d(2024, 3, 31), None);
        assert!(start.is_none());
        assert_eq!(end, d(2024, 3, 31));
    }

    #[test]
    fn test_windows_are_nested() {
        let cutoff = d(2024, 6, 30);
        let mut prev = cutoff;
        for window in Window::ALL {
            if let Some(months) = window.months() {
                let start = window_start(cutoff, months);
                assert!(start <= prev, "{} start should not move later", window.label());
                prev = start;
            }
        }
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(2024, 2), d(2024, 2, 29));
        assert_eq!(last_day_of_month(2023, 2), d(2023, 2, 28));
        assert_eq!(last_day_of_month(2024, 12), d(2024, 12, 31));
        assert_eq!(last_day_of_month(2024, 4), d(2024, 4, 30));
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label(d(2024, 4, 30)), "2024-04");
        assert_eq!(month_label(d(2023, 12, 1)), "2023-12");
    }
}
