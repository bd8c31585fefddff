//! Cycle engine
//!
//! Pure functions that turn raw time input into a cycle anchor and derive
//! the live phase of a cycle from its anchor and "now". Nothing here holds
//! state; callers sample "now" once and pass the same value everywhere.
//!
//! A cycle lasts 80 minutes: 40 quiet minutes (pending) followed by a
//! 40-minute price-reset window (active).

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ResetError;

/// Minutes from anchor until the reset window opens.
pub const QUIET_MINUTES: i64 = 40;

/// Total cycle length in minutes.
pub const CYCLE_MINUTES: i64 = 80;

/// Raw time input as accepted from a front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeInput {
    /// Minute of the current or previous clock hour.
    MinuteOfHour {
        /// Minute within the hour, `0..=59`
        minutes: i64,
        /// `true` for the current hour, `false` for the previous one
        current_hour: bool,
    },
    /// Time of day as `HH:MM`, today or (if that is still ahead) yesterday.
    TimeOfDay(String),
}

/// Where a live cycle currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Quiet period; the window opens at `safe_end`
    Pending,
    /// Window open; it closes at `window_end`
    Active,
}

/// Live phase information for one anchor at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleInfo {
    /// Current phase
    pub phase: Phase,
    /// Cycle start
    pub anchor: NaiveDateTime,
    /// Anchor + 40 minutes, when the window opens
    pub safe_end: NaiveDateTime,
    /// Anchor + 80 minutes, when the window closes
    pub window_end: NaiveDateTime,
    #[serde(skip)]
    elapsed: Duration,
}

impl CycleInfo {
    /// Elapsed time since the anchor, in fractional minutes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed.num_milliseconds() as f64 / 60_000.0
    }

    /// Elapsed whole minutes since the anchor (floored).
    #[must_use]
    pub fn elapsed_whole_minutes(&self) -> i64 {
        self.elapsed.num_minutes()
    }

    /// The next boundary the cycle will cross.
    #[must_use]
    pub const fn next_boundary(&self) -> NaiveDateTime {
        match self.phase {
            Phase::Pending => self.safe_end,
            Phase::Active => self.window_end,
        }
    }
}

/// Turn raw time input into a minute-resolution anchor no later than `now`.
///
/// Anchors that land after `now` (for example a current-hour minute that has
/// not happened yet) are rejected with [`ResetError::StaleOrFutureAnchor`].
pub fn normalize(input: &TimeInput, now: NaiveDateTime) -> Result<NaiveDateTime, ResetError> {
    match input {
        TimeInput::MinuteOfHour {
            minutes,
            current_hour,
        } => {
            let minute = u32::try_from(*minutes)
                .ok()
                .filter(|m| *m <= 59)
                .ok_or(ResetError::InvalidMinutes(*minutes))?;

            // Stepping back a whole hour keeps the date correct across midnight.
            let base = if *current_hour {
                now
            } else {
                now - Duration::hours(1)
            };
            let anchor = base
                .date()
                .and_hms_opt(base.hour(), minute, 0)
                .ok_or(ResetError::InvalidMinutes(*minutes))?;

            if anchor > now {
                return Err(ResetError::StaleOrFutureAnchor);
            }
            Ok(anchor)
        }
        TimeInput::TimeOfDay(raw) => {
            let time = parse_time_of_day(raw)?;
            let today = now.date().and_time(time);
            if today > now {
                Ok(today - Duration::days(1))
            } else {
                Ok(today)
            }
        }
    }
}

/// Parse a strict `HH:MM` string.
fn parse_time_of_day(raw: &str) -> Result<NaiveTime, ResetError> {
    let trimmed = raw.trim();
    let invalid = || ResetError::InvalidTimeFormat(trimmed.to_string());

    let (hours, minutes) = trimmed.split_once(':').ok_or_else(invalid)?;
    if hours.is_empty()
        || hours.len() > 2
        || minutes.len() != 2
        || !hours.chars().all(|c| c.is_ascii_digit())
        || !minutes.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(invalid)
}

/// Derive the live phase of the cycle started at `anchor`.
///
/// Returns `None` when the cycle is expired: `now` is before the anchor or
/// 80 or more minutes after it.
#[must_use]
pub fn phase(anchor: NaiveDateTime, now: NaiveDateTime) -> Option<CycleInfo> {
    let elapsed = now - anchor;
    if elapsed < Duration::zero() || elapsed >= Duration::minutes(CYCLE_MINUTES) {
        return None;
    }

    let phase = if elapsed < Duration::minutes(QUIET_MINUTES) {
        Phase::Pending
    } else {
        Phase::Active
    };

    Some(CycleInfo {
        phase,
        anchor,
        safe_end: anchor + Duration::minutes(QUIET_MINUTES),
        window_end: anchor + Duration::minutes(CYCLE_MINUTES),
        elapsed,
    })
}

/// Check that an anchor sits inside the live 80-minute window.
pub fn validate_anchor(anchor: NaiveDateTime, now: NaiveDateTime) -> Result<CycleInfo, ResetError> {
    phase(anchor, now).ok_or(ResetError::StaleOrFutureAnchor)
}

/// Normalize raw input and validate the resulting anchor in one step.
pub fn resolve(input: &TimeInput, now: NaiveDateTime) -> Result<CycleInfo, ResetError> {
    let anchor = normalize(input, now)?;
    validate_anchor(anchor, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::at;

    fn minute_of_hour(minutes: i64, current_hour: bool) -> TimeInput {
        TimeInput::MinuteOfHour {
            minutes,
            current_hour,
        }
    }

    #[test]
    fn test_normalize_current_hour() {
        let now = at("2024-05-10 14:37:42");
        let anchor = normalize(&minute_of_hour(5, true), now).unwrap();
        assert_eq!(anchor, at("2024-05-10 14:05:00"));
    }

    #[test]
    fn test_normalize_previous_hour() {
        let now = at("2024-05-10 14:37:42");
        let anchor = normalize(&minute_of_hour(50, false), now).unwrap();
        assert_eq!(anchor, at("2024-05-10 13:50:00"));
    }

    #[test]
    fn test_normalize_previous_hour_rolls_back_across_midnight() {
        let now = at("2024-01-02 00:10:00");
        let anchor = normalize(&minute_of_hour(45, false), now).unwrap();
        assert_eq!(anchor, at("2024-01-01 23:45:00"));
    }

    #[test]
    fn test_normalize_previous_hour_rolls_back_across_year() {
        let now = at("2024-01-01 00:05:00");
        let anchor = normalize(&minute_of_hour(30, false), now).unwrap();
        assert_eq!(anchor, at("2023-12-31 23:30:00"));
    }

    #[test]
    fn test_normalize_output_is_truncated_and_not_after_now() {
        let now = at("2024-05-10 14:37:42");
        for minutes in 0..=59 {
            for current_hour in [true, false] {
                if let Ok(anchor) = normalize(&minute_of_hour(minutes, current_hour), now) {
                    assert_eq!(anchor.second(), 0);
                    assert_eq!(anchor.nanosecond(), 0);
                    assert!(anchor <= now);
                }
            }
        }
    }

    #[test]
    fn test_normalize_previous_hour_always_succeeds() {
        let now = at("2024-05-10 14:37:42");
        for minutes in 0..=59 {
            assert!(normalize(&minute_of_hour(minutes, false), now).is_ok());
        }
    }

    #[test]
    fn test_normalize_current_hour_future_minute_is_rejected() {
        let now = at("2024-05-10 14:37:42");
        assert_eq!(
            normalize(&minute_of_hour(38, true), now),
            Err(ResetError::StaleOrFutureAnchor)
        );
        // The current minute itself is fine
        assert!(normalize(&minute_of_hour(37, true), now).is_ok());
    }

    #[test]
    fn test_normalize_rejects_out_of_range_minutes() {
        let now = at("2024-05-10 14:37:42");
        assert_eq!(
            normalize(&minute_of_hour(60, true), now),
            Err(ResetError::InvalidMinutes(60))
        );
        assert_eq!(
            normalize(&minute_of_hour(-1, false), now),
            Err(ResetError::InvalidMinutes(-1))
        );
    }

    #[test]
    fn test_normalize_time_of_day_today() {
        let now = at("2024-05-10 14:37:42");
        let anchor = normalize(&TimeInput::TimeOfDay("13:20".to_string()), now).unwrap();
        assert_eq!(anchor, at("2024-05-10 13:20:00"));
    }

    #[test]
    fn test_normalize_time_of_day_later_today_means_yesterday() {
        let now = at("2024-05-10 00:20:00");
        let anchor = normalize(&TimeInput::TimeOfDay("23:50".to_string()), now).unwrap();
        assert_eq!(anchor, at("2024-05-09 23:50:00"));
    }

    #[test]
    fn test_normalize_time_of_day_rejects_malformed() {
        let now = at("2024-05-10 14:37:42");
        for raw in ["", "1420", "14:2", "24:00", "12:60", "ab:cd", "-1:30", "14:20:00"] {
            assert_eq!(
                normalize(&TimeInput::TimeOfDay(raw.to_string()), now),
                Err(ResetError::InvalidTimeFormat(raw.to_string())),
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn test_phase_boundaries() {
        let anchor = at("2024-05-10 12:00:00");

        let start = phase(anchor, anchor).unwrap();
        assert_eq!(start.phase, Phase::Pending);

        let just_before = phase(anchor, anchor + Duration::milliseconds(39 * 60_000 + 59_940));
        assert_eq!(just_before.unwrap().phase, Phase::Pending);

        let opened = phase(anchor, anchor + Duration::minutes(40)).unwrap();
        assert_eq!(opened.phase, Phase::Active);

        let last = phase(anchor, anchor + Duration::minutes(80) - Duration::milliseconds(1));
        assert_eq!(last.unwrap().phase, Phase::Active);

        assert!(phase(anchor, anchor + Duration::minutes(80)).is_none());
        assert!(phase(anchor, anchor - Duration::seconds(1)).is_none());
    }

    #[test]
    fn test_phase_window_ends() {
        let anchor = at("2024-05-10 23:30:00");
        let info = phase(anchor, at("2024-05-11 00:15:30")).unwrap();

        assert_eq!(info.safe_end, at("2024-05-11 00:10:00"));
        assert_eq!(info.window_end, at("2024-05-11 00:50:00"));
        assert_eq!(info.phase, Phase::Active);
        assert_eq!(info.elapsed_whole_minutes(), 45);
        assert!((info.elapsed_minutes() - 45.5).abs() < f64::EPSILON);
        assert_eq!(info.next_boundary(), info.window_end);
    }

    #[test]
    fn test_resolve_rejects_stale_previous_hour() {
        let now = at("2024-05-10 14:50:00");
        // 13:05 is 105 minutes ago
        assert_eq!(
            resolve(&minute_of_hour(5, false), now),
            Err(ResetError::StaleOrFutureAnchor)
        );
    }

    #[test]
    fn test_resolve_rejects_stale_time_of_day() {
        let now = at("2024-05-10 14:50:00");
        assert_eq!(
            resolve(&TimeInput::TimeOfDay("09:00".to_string()), now),
            Err(ResetError::StaleOrFutureAnchor)
        );
    }
}
