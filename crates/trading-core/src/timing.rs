//! Trading session windows and the square-off deadline.
//!
//! [`TimingPolicy`] is a pure function of the supplied time: the same code
//! answers for the wall clock in live mode and for the replay cursor in a
//! backtest.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TradingError;
use crate::traits::Validate;

/// Minimum time that must remain before square-off for a new entry.
pub const ENTRY_BUFFER_MINUTES: i64 = 30;

/// Session windows in exchange-local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    #[serde(with = "hhmm")]
    pub market_open: NaiveTime,
    #[serde(with = "hhmm")]
    pub market_close: NaiveTime,
    /// No new signals at or after this time
    #[serde(with = "hhmm")]
    pub signal_cutoff: NaiveTime,
    /// All positions must be flat at or after this time
    #[serde(with = "hhmm")]
    pub square_off: NaiveTime,
    /// Exchange offset from UTC used by the wall clock
    pub utc_offset_minutes: i32,
    /// Full-day exchange holidays
    pub holidays: Vec<NaiveDate>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            market_open: hm(9, 15),
            market_close: hm(15, 30),
            signal_cutoff: hm(14, 0),
            square_off: hm(15, 20),
            utc_offset_minutes: 330,
            holidays: Vec::new(),
        }
    }
}

impl Validate for SessionConfig {
    fn validate(&self) -> Result<(), TradingError> {
        if self.market_open >= self.market_close {
            return Err(TradingError::Config(format!(
                "market_open {} must be before market_close {}",
                self.market_open, self.market_close
            )));
        }
        if self.square_off < self.signal_cutoff {
            return Err(TradingError::Config(format!(
                "square_off {} must not be before signal_cutoff {}",
                self.square_off, self.signal_cutoff
            )));
        }
        if self.square_off > self.market_close {
            return Err(TradingError::Config(format!(
                "square_off {} is after market_close {}",
                self.square_off, self.market_close
            )));
        }
        Ok(())
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Why an entry is not allowed at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRejection {
    Weekend,
    Holiday,
    MarketClosed,
    PastCutoff,
    TooCloseToSquareOff,
}

impl fmt::Display for EntryRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            EntryRejection::Weekend => "weekend, market closed",
            EntryRejection::Holiday => "exchange holiday",
            EntryRejection::MarketClosed => "market is closed",
            EntryRejection::PastCutoff => "past signal cutoff time",
            EntryRejection::TooCloseToSquareOff => "less than 30 minutes to square-off",
        };
        f.write_str(reason)
    }
}

/// Snapshot of the session state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketStatus {
    pub time: NaiveDateTime,
    pub is_market_open: bool,
    pub is_weekend: bool,
    pub is_holiday: bool,
    pub should_square_off: bool,
    pub can_generate_signals: bool,
    pub time_until_square_off: Option<String>,
}

/// Stateless evaluator of the session windows.
#[derive(Debug, Clone)]
pub struct TimingPolicy {
    config: SessionConfig,
}

impl TimingPolicy {
    /// Create a policy from validated session windows.
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_weekend(&self, date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.config.holidays.contains(&date)
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !self.is_weekend(date) && !self.is_holiday(date)
    }

    /// Trading day and `market_open <= t <= market_close`.
    pub fn is_market_open(&self, t: NaiveDateTime) -> bool {
        let time = t.time();
        self.is_trading_day(t.date())
            && time >= self.config.market_open
            && time <= self.config.market_close
    }

    /// The mandatory square-off deadline has been reached.
    pub fn should_square_off(&self, t: NaiveDateTime) -> bool {
        t.time() >= self.config.square_off
    }

    /// New signals may be generated: market open and before the cutoff.
    pub fn can_generate_signals(&self, t: NaiveDateTime) -> bool {
        let time = t.time();
        self.is_market_open(t) && time >= self.config.market_open && time < self.config.signal_cutoff
    }

    /// Square-off instant on the day of `t`.
    pub fn square_off_at(&self, t: NaiveDateTime) -> NaiveDateTime {
        t.date().and_time(self.config.square_off)
    }

    /// Time left until square-off, `None` once it has passed.
    pub fn time_until_square_off(&self, t: NaiveDateTime) -> Option<Duration> {
        let deadline = self.square_off_at(t);
        (t < deadline).then(|| deadline - t)
    }

    /// Check whether a new position may be entered at `t`.
    pub fn validate_entry_time(&self, t: NaiveDateTime) -> Result<(), EntryRejection> {
        if self.is_weekend(t.date()) {
            return Err(EntryRejection::Weekend);
        }
        if self.is_holiday(t.date()) {
            return Err(EntryRejection::Holiday);
        }
        if !self.is_market_open(t) {
            return Err(EntryRejection::MarketClosed);
        }
        if !self.can_generate_signals(t) {
            return Err(EntryRejection::PastCutoff);
        }
        match self.time_until_square_off(t) {
            Some(remaining) if remaining >= Duration::minutes(ENTRY_BUFFER_MINUTES) => Ok(()),
            _ => Err(EntryRejection::TooCloseToSquareOff),
        }
    }

    /// First trading day strictly after `date`.
    pub fn next_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut next = date + Duration::days(1);
        while !self.is_trading_day(next) {
            next += Duration::days(1);
        }
        next
    }

    pub fn market_status(&self, t: NaiveDateTime) -> MarketStatus {
        MarketStatus {
            time: t,
            is_market_open: self.is_market_open(t),
            is_weekend: self.is_weekend(t.date()),
            is_holiday: self.is_holiday(t.date()),
            should_square_off: self.should_square_off(t),
            can_generate_signals: self.can_generate_signals(t),
            time_until_square_off: self.time_until_square_off(t).map(format_time_remaining),
        }
    }
}

/// Minutes between two instants.
pub fn holding_minutes(entry: NaiveDateTime, exit: NaiveDateTime) -> f64 {
    (exit - entry).num_seconds() as f64 / 60.0
}

/// Human-readable remaining time: "2h 15m", "5m 3s", "7s" or "Expired".
pub fn format_time_remaining(remaining: Duration) -> String {
    let total = remaining.num_seconds();
    if total < 0 {
        return "Expired".to_string();
    }

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Serde adapter for "HH:MM" times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}
