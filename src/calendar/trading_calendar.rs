//! Trading session calendar.
//!
//! Deterministic, pure logic. No IO, no wall-clock reads: callers pass `now`
//! explicitly so date adjustment stays testable.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::America::New_York;
use std::collections::HashSet;

use crate::constants::MARKET_CLOSE_BUFFER_MINUTES;

/// US market holidays, observed dates, 2023-2026. Extend as needed.
const US_MARKET_HOLIDAYS: &[(i32, u32, u32)] = &[
    (2023, 1, 2),
    (2023, 1, 16),
    (2023, 2, 20),
    (2023, 4, 7),
    (2023, 5, 29),
    (2023, 6, 19),
    (2023, 7, 4),
    (2023, 9, 4),
    (2023, 11, 23),
    (2023, 12, 25),
    (2024, 1, 1),
    (2024, 1, 15),
    (2024, 2, 19),
    (2024, 3, 29),
    (2024, 5, 27),
    (2024, 6, 19),
    (2024, 7, 4),
    (2024, 9, 2),
    (2024, 11, 28),
    (2024, 12, 25),
    (2025, 1, 1),
    (2025, 1, 20),
    (2025, 2, 17),
    (2025, 4, 18),
    (2025, 5, 26),
    (2025, 6, 19),
    (2025, 7, 4),
    (2025, 9, 1),
    (2025, 11, 27),
    (2025, 12, 25),
    (2026, 1, 1),
    (2026, 1, 19),
    (2026, 2, 16),
    (2026, 4, 3),
    (2026, 5, 25),
    (2026, 6, 19),
    (2026, 7, 3),
    (2026, 9, 7),
    (2026, 11, 26),
    (2026, 12, 25),
];

/// Answers "is this a trading day" and adjusts requested calculation dates to
/// the most recent session with reliable closing data.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    holidays: HashSet<NaiveDate>,
    close_buffer: Duration,
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl TradingCalendar {
    pub fn new() -> Self {
        let holidays = US_MARKET_HOLIDAYS
            .iter()
            .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
            .collect();
        Self {
            holidays,
            close_buffer: Duration::minutes(MARKET_CLOSE_BUFFER_MINUTES),
        }
    }

    /// Calendar with extra market holidays on top of the built-in table.
    pub fn with_additional_holidays(extra: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut calendar = Self::new();
        calendar.holidays.extend(extra);
        calendar
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    /// Most recent trading day strictly before `date`.
    pub fn previous_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut current = date;
        while let Some(prev) = current.pred_opt() {
            current = prev;
            if self.is_trading_day(current) {
                return current;
            }
        }
        date
    }

    /// First trading day strictly after `date`.
    pub fn next_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut current = date;
        while let Some(next) = current.succ_opt() {
            current = next;
            if self.is_trading_day(current) {
                return current;
            }
        }
        date
    }

    /// Adjusts a requested calculation date to one with reliable closing data.
    ///
    /// Non-trading days roll back to the most recent session. A request for
    /// today's session before the close-plus-buffer cutoff (16:00 ET + buffer)
    /// also rolls back one day, since the session is still in progress and its
    /// closing prices are not trustworthy yet.
    pub fn adjust_to_valid_date(&self, date: NaiveDate, now: DateTime<Utc>) -> NaiveDate {
        let mut adjusted = if self.is_trading_day(date) {
            date
        } else {
            self.previous_trading_day(date)
        };

        let now_eastern = now.with_timezone(&New_York);
        if adjusted == now_eastern.date_naive() {
            let close = NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN);
            let cutoff = close + self.close_buffer;
            if now_eastern.time() < cutoff {
                adjusted = self.previous_trading_day(adjusted);
            }
        }

        adjusted
    }

    /// Trading days in `(after, until]`, oldest first. The backfill worklist.
    pub fn trading_days_between(&self, after: NaiveDate, until: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = after;
        while let Some(next) = current.succ_opt() {
            if next > until {
                break;
            }
            current = next;
            if self.is_trading_day(current) {
                days.push(current);
            }
        }
        days
    }
}
