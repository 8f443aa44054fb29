//! Schedule window entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use reportal_core::{AppError, AppResult};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// One business-hour window on a single day of the week.
///
/// Times are local-naive. A window that would cross midnight is stored as
/// two rows, one per day. `end` is exclusive; `24:00` means "until midnight".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ScheduleWindow {
    /// Day of week, `0 = Sunday` through `6 = Saturday`.
    pub day_of_week: i16,
    /// Start hour (0-23).
    pub start_hour: i16,
    /// Start minute (0-59).
    pub start_minute: i16,
    /// End hour (0-24).
    pub end_hour: i16,
    /// End minute (0-59; must be 0 when `end_hour` is 24).
    pub end_minute: i16,
}

impl ScheduleWindow {
    /// Create a window on `day_of_week` from `start` to `end` (hour, minute).
    pub fn new(day_of_week: i16, start: (i16, i16), end: (i16, i16)) -> Self {
        Self {
            day_of_week,
            start_hour: start.0,
            start_minute: start.1,
            end_hour: end.0,
            end_minute: end.1,
        }
    }

    /// Start as minute-of-day.
    pub fn start_minute_of_day(&self) -> i32 {
        i32::from(self.start_hour) * 60 + i32::from(self.start_minute)
    }

    /// End (exclusive) as minute-of-day.
    pub fn end_minute_of_day(&self) -> i32 {
        i32::from(self.end_hour) * 60 + i32::from(self.end_minute)
    }

    /// Check field ranges and ordering.
    pub fn validate(&self) -> AppResult<()> {
        if !(0..=6).contains(&self.day_of_week) {
            return Err(AppError::validation(format!(
                "day_of_week must be 0-6, got {}",
                self.day_of_week
            )));
        }
        if !(0..=23).contains(&self.start_hour) || !(0..=59).contains(&self.start_minute) {
            return Err(AppError::validation(format!(
                "invalid start time {:02}:{:02}",
                self.start_hour, self.start_minute
            )));
        }
        let end_ok = ((0..=23).contains(&self.end_hour) && (0..=59).contains(&self.end_minute))
            || (self.end_hour == 24 && self.end_minute == 0);
        if !end_ok {
            return Err(AppError::validation(format!(
                "invalid end time {:02}:{:02}",
                self.end_hour, self.end_minute
            )));
        }
        if self.end_minute_of_day() <= self.start_minute_of_day() {
            return Err(AppError::validation(
                "window end must be after start; split cross-midnight windows into two rows",
            ));
        }
        Ok(())
    }

    /// Whether `minute_of_day` on `day_of_week` falls inside this window.
    ///
    /// Invalid windows never match.
    pub fn contains(&self, day_of_week: u32, minute_of_day: u32) -> bool {
        if self.validate().is_err() || minute_of_day >= MINUTES_PER_DAY {
            return false;
        }
        i64::from(self.day_of_week) == i64::from(day_of_week)
            && (self.start_minute_of_day()..self.end_minute_of_day())
                .contains(&(minute_of_day as i32))
    }
}
