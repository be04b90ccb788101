use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::{
    schedule::{PrayerEvent, Schedule, ScheduleError, ScheduleService},
    time::{DateKey, instant_to_date_key},
};

/// The next occurrence of a daily event.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEvent {
    pub event: PrayerEvent,
    pub date_key: DateKey,
    pub schedule: Schedule,
    /// `None` when the provider time for that day is malformed; such an
    /// occurrence is unknown and must not be notified.
    pub instant: Option<DateTime<Utc>>,
}

impl ResolvedEvent {
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.instant.map(|instant| instant - now)
    }
}

#[derive(Clone)]
pub struct EventResolver {
    schedules: Arc<ScheduleService>,
    timezone: Tz,
}

impl EventResolver {
    pub fn new(schedules: Arc<ScheduleService>, timezone: Tz) -> Self {
        Self { schedules, timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn today(&self, now: DateTime<Utc>) -> DateKey {
        instant_to_date_key(now, self.timezone)
    }

    pub async fn schedule_for(&self, date_key: DateKey) -> Result<Schedule, ScheduleError> {
        self.schedules.daily(date_key).await
    }

    /// Today's occurrence of `event` when it is still ahead of `now`,
    /// otherwise tomorrow's. Schedule errors are returned as is.
    pub async fn next_occurrence(
        &self,
        event: PrayerEvent,
        now: DateTime<Utc>,
    ) -> Result<ResolvedEvent, ScheduleError> {
        let today = self.today(now);
        let schedule = self.schedule_for(today).await?;

        if let Some(instant) = schedule
            .instant_of(event, self.timezone)
            .filter(|instant| *instant > now)
        {
            return Ok(ResolvedEvent {
                event,
                date_key: today,
                schedule,
                instant: Some(instant),
            });
        }

        let tomorrow = today
            .add_days(1)
            .ok_or(ScheduleError::DateOutOfRange(today))?;
        let schedule = self.schedule_for(tomorrow).await?;
        let instant = schedule.instant_of(event, self.timezone);

        Ok(ResolvedEvent {
            event,
            date_key: tomorrow,
            schedule,
            instant,
        })
    }
}
