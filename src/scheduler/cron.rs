// mongobackup/src/scheduler/cron.rs
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Expected 5 cron fields (minute hour day-of-month month day-of-week), got {0}")]
    FieldCount(usize),

    #[error("Invalid {field} field: '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("Only weekly schedules are supported; {field} must be '*', got '{value}'")]
    NotWeekly { field: &'static str, value: String },
}

/// A fixed weekday and wall-clock time, evaluated in UTC.
///
/// Parsed from a five-field cron expression of the form `M H * * DOW`, where
/// `DOW` is `0`-`7` (both `0` and `7` are Sunday) or an English day name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    weekday: Weekday,
    time: NaiveTime,
}

impl WeeklySchedule {
    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> DateTime<Utc> {
        let date = after.date_naive();
        let days_ahead = (7 + self.weekday.num_days_from_monday()
            - date.weekday().num_days_from_monday())
            % 7;
        let candidate = (date + Duration::days(i64::from(days_ahead)))
            .and_time(self.time)
            .and_utc();

        if candidate <= after {
            candidate + Duration::weeks(1)
        } else {
            candidate
        }
    }
}

impl FromStr for WeeklySchedule {
    type Err = ScheduleError;

    fn from_str(expr: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        let [minute, hour, day_of_month, month, day_of_week] = fields[..] else {
            return Err(ScheduleError::FieldCount(fields.len()));
        };

        let minute = parse_number(minute, "minute", 59)?;
        let hour = parse_number(hour, "hour", 23)?;
        for (field, value) in [("day-of-month", day_of_month), ("month", month)] {
            if value != "*" {
                return Err(ScheduleError::NotWeekly {
                    field,
                    value: value.to_string(),
                });
            }
        }
        let weekday = parse_weekday(day_of_week)?;

        let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or(ScheduleError::InvalidField {
            field: "hour",
            value: hour.to_string(),
        })?;
        Ok(WeeklySchedule { weekday, time })
    }
}

impl fmt::Display for WeeklySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "every {} at {} UTC", self.weekday, self.time.format("%H:%M"))
    }
}

fn parse_number(value: &str, field: &'static str, max: u32) -> Result<u32, ScheduleError> {
    value
        .parse::<u32>()
        .ok()
        .filter(|n| *n <= max)
        .ok_or_else(|| ScheduleError::InvalidField {
            field,
            value: value.to_string(),
        })
}

const WEEKDAYS_FROM_MONDAY: [Weekday; 6] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

fn parse_weekday(value: &str) -> Result<Weekday, ScheduleError> {
    let invalid = || ScheduleError::InvalidField {
        field: "day-of-week",
        value: value.to_string(),
    };

    if let Ok(n) = value.parse::<u32>() {
        return match n {
            0 | 7 => Ok(Weekday::Sun),
            1..=6 => Ok(WEEKDAYS_FROM_MONDAY[(n - 1) as usize]),
            _ => Err(invalid()),
        };
    }
    // chrono accepts both "Sun" and "Sunday", any case
    value.parse::<Weekday>().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_parses_default_expression() -> anyhow::Result<()> {
        let schedule: WeeklySchedule = "0 3 * * Sunday".parse()?;
        assert_eq!(schedule.to_string(), "every Sun at 03:00 UTC");
        Ok(())
    }

    #[test]
    fn test_numeric_and_abbreviated_weekdays() -> anyhow::Result<()> {
        let sunday: WeeklySchedule = "30 4 * * 0".parse()?;
        assert_eq!(sunday, "30 4 * * 7".parse::<WeeklySchedule>()?);
        assert_eq!(sunday, "30 4 * * sun".parse::<WeeklySchedule>()?);

        let wednesday: WeeklySchedule = "30 4 * * 3".parse()?;
        assert_eq!(wednesday, "30 4 * * Wed".parse::<WeeklySchedule>()?);
        assert_eq!(wednesday.next_after(at(2024, 3, 10, 0, 0, 0)), at(2024, 3, 13, 4, 30, 0));
        Ok(())
    }

    #[test]
    fn test_rejects_malformed_expressions() {
        assert_eq!(
            "0 3 * *".parse::<WeeklySchedule>(),
            Err(ScheduleError::FieldCount(4))
        );
        assert!(matches!(
            "60 3 * * 0".parse::<WeeklySchedule>(),
            Err(ScheduleError::InvalidField { field: "minute", .. })
        ));
        assert!(matches!(
            "0 24 * * 0".parse::<WeeklySchedule>(),
            Err(ScheduleError::InvalidField { field: "hour", .. })
        ));
        assert!(matches!(
            "0 3 * * 8".parse::<WeeklySchedule>(),
            Err(ScheduleError::InvalidField { field: "day-of-week", .. })
        ));
        assert!(matches!(
            "0 3 1 * 0".parse::<WeeklySchedule>(),
            Err(ScheduleError::NotWeekly { field: "day-of-month", .. })
        ));
        assert!(matches!(
            "*/5 3 * * 0".parse::<WeeklySchedule>(),
            Err(ScheduleError::InvalidField { field: "minute", .. })
        ));
    }

    #[test]
    fn test_next_after_same_week() -> anyhow::Result<()> {
        let schedule: WeeklySchedule = "0 3 * * Sunday".parse()?;
        // 2024-03-06 is a Wednesday
        assert_eq!(schedule.next_after(at(2024, 3, 6, 12, 0, 0)), at(2024, 3, 10, 3, 0, 0));
        Ok(())
    }

    #[test]
    fn test_next_after_same_day_before_and_after_fire_time() -> anyhow::Result<()> {
        let schedule: WeeklySchedule = "0 3 * * Sunday".parse()?;
        assert_eq!(schedule.next_after(at(2024, 3, 10, 2, 59, 59)), at(2024, 3, 10, 3, 0, 0));
        // exactly at the fire time moves to next week
        assert_eq!(schedule.next_after(at(2024, 3, 10, 3, 0, 0)), at(2024, 3, 17, 3, 0, 0));
        assert_eq!(schedule.next_after(at(2024, 3, 10, 18, 0, 0)), at(2024, 3, 17, 3, 0, 0));
        Ok(())
    }

    #[test]
    fn test_next_after_crosses_month_and_year() -> anyhow::Result<()> {
        let schedule: WeeklySchedule = "15 23 * * Mon".parse()?;
        // 2024-12-31 is a Tuesday
        assert_eq!(schedule.next_after(at(2024, 12, 31, 0, 0, 0)), at(2025, 1, 6, 23, 15, 0));
        Ok(())
    }
}
