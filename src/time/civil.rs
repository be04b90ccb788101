use chrono::{DateTime, LocalResult, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use super::DateKey;

/// Longest stretch of skipped local time we search across. Zones have skipped
/// a whole calendar day before (Pacific/Apia, 2011).
const MAX_GAP_MINUTES: i64 = 48 * 60;

/// Strict `HH:MM` 24-hour parse with minute precision.
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let bytes = s.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }

    let digit = |i: usize| bytes[i].is_ascii_digit().then(|| u32::from(bytes[i] - b'0'));
    let hour = digit(0)? * 10 + digit(1)?;
    let minute = digit(3)? * 10 + digit(4)?;

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Converts a wall-clock `HH:MM` on `date_key` in `tz` into an absolute
/// instant. `None` when either string is malformed.
pub fn civil_to_instant(date_key: &str, time_of_day: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let date = DateKey::parse(date_key)?;
    let time = parse_time_of_day(time_of_day)?;

    local_to_instant(date, time, tz)
}

/// Resolves a local date and time in `tz`.
///
/// Ambiguous local times (clocks falling back) resolve to the earliest
/// instant. Skipped local times (clocks springing forward) use the offset in
/// effect before the transition, so 02:30 inside a 02:00-03:00 gap lands on
/// 03:30 local.
pub fn local_to_instant(date: DateKey, time: NaiveTime, tz: Tz) -> Option<DateTime<Utc>> {
    let naive = date.date().and_time(time);

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) => Some(local.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            let offset = offset_before_gap(naive, tz)?;
            Some((naive - offset).and_utc())
        }
    }
}

fn offset_before_gap(naive: NaiveDateTime, tz: Tz) -> Option<TimeDelta> {
    (1..=MAX_GAP_MINUTES)
        .find_map(|minutes| {
            tz.from_local_datetime(&(naive - TimeDelta::minutes(minutes)))
                .latest()
        })
        .map(|before| TimeDelta::seconds(i64::from(before.offset().fix().local_minus_utc())))
}

/// The civil date of `instant` as observed in `tz`.
pub fn instant_to_date_key(instant: DateTime<Utc>, tz: Tz) -> DateKey {
    DateKey::from_date(instant.with_timezone(&tz).date_naive())
}
