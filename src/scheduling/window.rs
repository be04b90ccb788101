use chrono::{DateTime, TimeDelta, Utc};

/// How long a window stays open after its target, to absorb poll jitter.
const GRACE_SECONDS: i64 = 59;

pub fn grace_period() -> TimeDelta {
    TimeDelta::seconds(GRACE_SECONDS)
}

/// True while `now` is at most `window` before `target` and at most the grace
/// period after it. Both bounds are inclusive.
pub fn is_in_window(now: DateTime<Utc>, target: DateTime<Utc>, window: TimeDelta) -> bool {
    let until = target - now;
    until <= window && until >= -grace_period()
}

/// Pre-event reminder window: opens `lead` before `target` and stays open for
/// one `poll` period, so exactly one tick of a regular poll lands inside.
pub fn is_in_lead_window(
    now: DateTime<Utc>,
    target: DateTime<Utc>,
    lead: TimeDelta,
    poll: TimeDelta,
) -> bool {
    let until = target - now;
    until <= lead && until > lead - poll
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::utc;
    use proptest::prelude::*;

    fn target() -> DateTime<Utc> {
        utc("2026-03-10T11:05:00Z")
    }

    #[test]
    fn window_start_is_inclusive() {
        let window = TimeDelta::seconds(30);
        assert!(is_in_window(target() - window, target(), window));
        assert!(!is_in_window(
            target() - window - TimeDelta::milliseconds(1),
            target(),
            window
        ));
    }

    #[test]
    fn window_stays_open_for_grace_period() {
        let window = TimeDelta::seconds(30);
        assert!(is_in_window(target(), target(), window));
        assert!(is_in_window(target() + TimeDelta::seconds(59), target(), window));
        assert!(!is_in_window(
            target() + TimeDelta::seconds(59) + TimeDelta::milliseconds(1),
            target(),
            window
        ));
    }

    #[test]
    fn lead_window_is_one_poll_wide() {
        let lead = TimeDelta::minutes(20);
        let poll = TimeDelta::seconds(30);
        let opens = target() - lead;

        assert!(is_in_lead_window(opens, target(), lead, poll));
        assert!(is_in_lead_window(opens + TimeDelta::seconds(29), target(), lead, poll));
        assert!(!is_in_lead_window(opens + poll, target(), lead, poll));
        assert!(!is_in_lead_window(opens - TimeDelta::milliseconds(1), target(), lead, poll));
    }

    proptest! {
        #[test]
        fn regular_polling_hits_lead_window_once(offset_ms in 0i64..30_000) {
            let lead = TimeDelta::minutes(20);
            let poll = TimeDelta::seconds(30);
            let start = target() - TimeDelta::hours(1) + TimeDelta::milliseconds(offset_ms);

            let hits = (0..240)
                .map(|tick| start + poll * tick)
                .filter(|now| is_in_lead_window(*now, target(), lead, poll))
                .count();

            prop_assert_eq!(hits, 1);
        }

        #[test]
        fn regular_polling_always_lands_in_event_window(offset_ms in 0i64..30_000) {
            let poll = TimeDelta::seconds(30);
            let start = target() - TimeDelta::hours(1) + TimeDelta::milliseconds(offset_ms);

            let hits = (0..240)
                .map(|tick| start + poll * tick)
                .filter(|now| is_in_window(*now, target(), poll))
                .count();

            prop_assert!(hits >= 1);
        }
    }
}
