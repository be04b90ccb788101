use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::time::{DateKey, local_to_instant, parse_time_of_day};

/// Named daily events published by the schedule provider, in the order they
/// occur during the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrayerEvent {
    Imsak,
    Subuh,
    Terbit,
    Dhuha,
    Dzuhur,
    Ashar,
    Maghrib,
    Isya,
}

impl PrayerEvent {
    pub const ALL: [PrayerEvent; 8] = [
        PrayerEvent::Imsak,
        PrayerEvent::Subuh,
        PrayerEvent::Terbit,
        PrayerEvent::Dhuha,
        PrayerEvent::Dzuhur,
        PrayerEvent::Ashar,
        PrayerEvent::Maghrib,
        PrayerEvent::Isya,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            PrayerEvent::Imsak => "imsak",
            PrayerEvent::Subuh => "subuh",
            PrayerEvent::Terbit => "terbit",
            PrayerEvent::Dhuha => "dhuha",
            PrayerEvent::Dzuhur => "dzuhur",
            PrayerEvent::Ashar => "ashar",
            PrayerEvent::Maghrib => "maghrib",
            PrayerEvent::Isya => "isya",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrayerEvent::Imsak => "Imsak",
            PrayerEvent::Subuh => "Subuh",
            PrayerEvent::Terbit => "Terbit",
            PrayerEvent::Dhuha => "Dhuha",
            PrayerEvent::Dzuhur => "Dzuhur",
            PrayerEvent::Ashar => "Ashar",
            PrayerEvent::Maghrib => "Maghrib",
            PrayerEvent::Isya => "Isya",
        }
    }
}

impl fmt::Display for PrayerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PrayerEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrayerEvent::ALL
            .into_iter()
            .find(|event| event.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("Unknown prayer event {s:?}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Location {
    pub provinsi: String,
    pub kabkota: String,
}

/// Raw `HH:MM` times for one day, exactly as supplied by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrayerTimes {
    pub imsak: String,
    pub subuh: String,
    pub terbit: String,
    pub dhuha: String,
    pub dzuhur: String,
    pub ashar: String,
    pub maghrib: String,
    pub isya: String,
}

impl PrayerTimes {
    pub fn get(&self, event: PrayerEvent) -> &str {
        match event {
            PrayerEvent::Imsak => &self.imsak,
            PrayerEvent::Subuh => &self.subuh,
            PrayerEvent::Terbit => &self.terbit,
            PrayerEvent::Dhuha => &self.dhuha,
            PrayerEvent::Dzuhur => &self.dzuhur,
            PrayerEvent::Ashar => &self.ashar,
            PrayerEvent::Maghrib => &self.maghrib,
            PrayerEvent::Isya => &self.isya,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub date_key: DateKey,
    pub provinsi: String,
    pub kabkota: String,
    pub day_name: Option<String>,
    pub times: PrayerTimes,
}

impl Schedule {
    pub fn time_of(&self, event: PrayerEvent) -> &str {
        self.times.get(event)
    }

    /// The absolute instant of `event` on this schedule's day, or `None`
    /// when the provider supplied a malformed time.
    pub fn instant_of(&self, event: PrayerEvent, tz: Tz) -> Option<DateTime<Utc>> {
        parse_time_of_day(self.time_of(event))
            .and_then(|time| local_to_instant(self.date_key, time, tz))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyEntry {
    pub day: Option<u32>,
    pub date: Option<DateKey>,
    pub day_name: Option<String>,
    pub times: PrayerTimes,
}

/// One month of schedules for one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlySchedule {
    pub provinsi: String,
    pub kabkota: String,
    pub days: Vec<DailyEntry>,
}

impl MonthlySchedule {
    /// The schedule for `date_key`, matched on the full date first and on the
    /// day of month otherwise.
    pub fn day(&self, date_key: DateKey) -> Option<Schedule> {
        let entry = self
            .days
            .iter()
            .find(|entry| entry.date == Some(date_key))
            .or_else(|| {
                self.days
                    .iter()
                    .find(|entry| entry.day == Some(date_key.day()))
            })?;

        Some(Schedule {
            date_key,
            provinsi: self.provinsi.clone(),
            kabkota: self.kabkota.clone(),
            day_name: entry.day_name.clone(),
            times: entry.times.clone(),
        })
    }
}
