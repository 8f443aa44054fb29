//! Business-hour gating.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};

use reportal_core::config::CapacityConfig;
use reportal_core::{AppError, AppResult};
use reportal_entity::schedule::ScheduleWindow;

/// Evaluates schedule rows in the deployment's fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleEvaluator {
    offset: FixedOffset,
}

impl ScheduleEvaluator {
    /// Creates an evaluator for `utc_offset_minutes` east of UTC.
    pub fn new(utc_offset_minutes: i32) -> AppResult<Self> {
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                AppError::configuration(format!(
                    "invalid schedule UTC offset: {utc_offset_minutes} minutes"
                ))
            })?;
        Ok(Self { offset })
    }

    /// Creates an evaluator from the capacity configuration section.
    pub fn from_config(config: &CapacityConfig) -> AppResult<Self> {
        Self::new(config.utc_offset_minutes)
    }

    /// The offset in use.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Day of week (`0 = Sunday`) and minute of day for `now` in local time.
    pub fn local_position(&self, now: DateTime<Utc>) -> (u32, u32) {
        let local = now.with_timezone(&self.offset);
        (
            local.weekday().num_days_from_sunday(),
            local.hour() * 60 + local.minute(),
        )
    }

    /// Whether `now` falls inside any window.
    ///
    /// An empty schedule places no restriction.
    pub fn is_within_schedule(&self, windows: &[ScheduleWindow], now: DateTime<Utc>) -> bool {
        if windows.is_empty() {
            return true;
        }
        let (day, minute) = self.local_position(now);
        windows.iter().any(|w| w.contains(day, minute))
    }
}

impl Default for ScheduleEvaluator {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2025-03-03 is a Monday.
    fn monday_utc(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_empty_schedule_is_always_within() {
        let evaluator = ScheduleEvaluator::default();
        assert!(evaluator.is_within_schedule(&[], monday_utc(3, 0)));
    }

    #[test]
    fn test_split_business_hours() {
        let evaluator = ScheduleEvaluator::default();
        let windows = [
            ScheduleWindow::new(1, (8, 0), (12, 0)),
            ScheduleWindow::new(1, (13, 0), (17, 0)),
        ];
        assert!(evaluator.is_within_schedule(&windows, monday_utc(8, 0)));
        assert!(!evaluator.is_within_schedule(&windows, monday_utc(12, 30)));
        assert!(evaluator.is_within_schedule(&windows, monday_utc(16, 59)));
        assert!(!evaluator.is_within_schedule(&windows, monday_utc(17, 0)));
    }

    #[test]
    fn test_cross_midnight_as_two_rows() {
        let evaluator = ScheduleEvaluator::default();
        let windows = [
            ScheduleWindow::new(1, (22, 0), (24, 0)),
            ScheduleWindow::new(2, (0, 0), (2, 0)),
        ];
        assert!(evaluator.is_within_schedule(&windows, monday_utc(23, 30)));
        let tuesday_1am = Utc.with_ymd_and_hms(2025, 3, 4, 1, 0, 0).unwrap();
        assert!(evaluator.is_within_schedule(&windows, tuesday_1am));
        assert!(!evaluator.is_within_schedule(&windows, monday_utc(21, 59)));
    }

    #[test]
    fn test_offset_shifts_day_and_minute() {
        // 23:30 UTC Monday is 01:30 Tuesday at UTC+2.
        let evaluator = ScheduleEvaluator::new(120).unwrap();
        assert_eq!(evaluator.local_position(monday_utc(23, 30)), (2, 90));

        let windows = [ScheduleWindow::new(2, (1, 0), (2, 0))];
        assert!(evaluator.is_within_schedule(&windows, monday_utc(23, 30)));
        assert!(!ScheduleEvaluator::default().is_within_schedule(&windows, monday_utc(23, 30)));
    }

    #[test]
    fn test_invalid_rows_never_match() {
        let evaluator = ScheduleEvaluator::default();
        let windows = [ScheduleWindow::new(1, (17, 0), (8, 0))];
        assert!(!evaluator.is_within_schedule(&windows, monday_utc(20, 0)));
    }

    #[test]
    fn test_offset_out_of_range_rejected() {
        assert!(ScheduleEvaluator::new(24 * 60).is_err());
        assert!(ScheduleEvaluator::new(-330).is_ok());
    }
}
