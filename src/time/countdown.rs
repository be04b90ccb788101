use chrono::TimeDelta;

use super::DateKey;

/// Human readable remaining time, e.g. `2 jam 5 menit` or `45 detik`.
pub fn format_countdown(remaining: TimeDelta) -> String {
    let total = remaining.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours} jam {minutes} menit")
    } else if minutes > 0 {
        format!("{minutes} menit {seconds} detik")
    } else {
        format!("{seconds} detik")
    }
}

/// 1-based day of Ramadan for `current`, or `None` outside the month.
pub fn ramadan_day(current: DateKey, start: DateKey, total_days: u32) -> Option<u32> {
    let day = start.days_until(current) + 1;
    (1..=i64::from(total_days))
        .contains(&day)
        .then_some(day as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_picks_largest_units() {
        assert_eq!(format_countdown(TimeDelta::seconds(2 * 3600 + 5 * 60 + 9)), "2 jam 5 menit");
        assert_eq!(format_countdown(TimeDelta::seconds(5 * 60 + 9)), "5 menit 9 detik");
        assert_eq!(format_countdown(TimeDelta::milliseconds(45_900)), "45 detik");
    }

    #[test]
    fn countdown_clamps_past_times_to_zero() {
        assert_eq!(format_countdown(TimeDelta::seconds(-30)), "0 detik");
    }

    #[test]
    fn ramadan_day_is_one_based_and_bounded() {
        let start = DateKey::parse("2026-02-18").unwrap();
        let day = |s: &str| ramadan_day(DateKey::parse(s).unwrap(), start, 30);

        assert_eq!(day("2026-02-17"), None);
        assert_eq!(day("2026-02-18"), Some(1));
        assert_eq!(day("2026-03-10"), Some(21));
        assert_eq!(day("2026-03-19"), Some(30));
        assert_eq!(day("2026-03-20"), None);
    }
}
