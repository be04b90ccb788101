//! Fixtures and in-memory collaborators shared by unit tests.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    delivery::{Notification, NotificationSink, Presence, PresenceSink},
    provider::{Assistant, ContentProvider, ProviderError, ScheduleProvider, TafsirSnippet},
    schedule::{DailyEntry, Location, MonthlySchedule, PrayerTimes, Schedule},
    time::DateKey,
};

pub fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn jakarta_location() -> Location {
    Location {
        provinsi: "DKI Jakarta".to_owned(),
        kabkota: "Kota Jakarta".to_owned(),
    }
}

/// A March 2026 entry with the given imsak and maghrib times.
pub fn daily_entry(day: u32, imsak: &str, maghrib: &str) -> DailyEntry {
    DailyEntry {
        day: Some(day),
        date: DateKey::parse(&format!("2026-03-{day:02}")),
        day_name: Some("Selasa".to_owned()),
        times: PrayerTimes {
            imsak: imsak.to_owned(),
            subuh: "04:38".to_owned(),
            terbit: "05:52".to_owned(),
            dhuha: "06:20".to_owned(),
            dzuhur: "12:03".to_owned(),
            ashar: "15:12".to_owned(),
            maghrib: maghrib.to_owned(),
            isya: "19:18".to_owned(),
        },
    }
}

pub fn monthly_schedule(days: Vec<DailyEntry>) -> MonthlySchedule {
    let location = jakarta_location();
    MonthlySchedule {
        provinsi: location.provinsi,
        kabkota: location.kabkota,
        days,
    }
}

pub fn schedule_on(date: &str, imsak: &str, maghrib: &str) -> Schedule {
    let date_key = DateKey::parse(date).unwrap();
    let entry = daily_entry(date_key.day(), imsak, maghrib);
    let location = jakarta_location();

    Schedule {
        date_key,
        provinsi: location.provinsi,
        kabkota: location.kabkota,
        day_name: entry.day_name,
        times: entry.times,
    }
}

/// Serves inserted months; any other month answers 404.
pub struct StaticScheduleProvider {
    months: Mutex<HashMap<(i32, u32), MonthlySchedule>>,
    fetches: AtomicUsize,
}

impl StaticScheduleProvider {
    pub fn new() -> Self {
        Self {
            months: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn insert(&self, year: i32, month: u32, schedule: MonthlySchedule) {
        self.months.lock().unwrap().insert((year, month), schedule);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduleProvider for StaticScheduleProvider {
    async fn fetch_monthly_schedule(
        &self,
        _location: &Location,
        year: i32,
        month: u32,
    ) -> Result<MonthlySchedule, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.months
            .lock()
            .unwrap()
            .get(&(year, month))
            .cloned()
            .ok_or_else(|| ProviderError::Status {
                status: 404,
                body: format!("no schedule for {year}-{month:02}"),
            })
    }
}

pub struct FixedContentProvider {
    calls: AtomicUsize,
    last_max_chars: Mutex<Option<usize>>,
}

impl FixedContentProvider {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_max_chars: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_max_chars(&self) -> Option<usize> {
        *self.last_max_chars.lock().unwrap()
    }
}

#[async_trait]
impl ContentProvider for FixedContentProvider {
    async fn random_tafsir(&self, max_chars: usize) -> Result<TafsirSnippet, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_max_chars.lock().unwrap() = Some(max_chars);

        Ok(TafsirSnippet {
            surah_number: 2,
            surah_name: "Al-Baqarah".to_owned(),
            ayah: 183,
            text: "Puasa diwajibkan agar kamu bertakwa.".to_owned(),
        })
    }
}

pub struct FixedAssistant {
    answer: String,
    last_call: Mutex<Option<(String, Option<String>)>>,
}

impl FixedAssistant {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_owned(),
            last_call: Mutex::new(None),
        }
    }

    pub fn last_call(&self) -> Option<(String, Option<String>)> {
        self.last_call.lock().unwrap().clone()
    }
}

#[async_trait]
impl Assistant for FixedAssistant {
    async fn ask(&self, prompt: &str, context: Option<&str>) -> Result<String, ProviderError> {
        *self.last_call.lock().unwrap() = Some((prompt.to_owned(), context.map(str::to_owned)));
        Ok(self.answer.clone())
    }
}

/// Records delivered notifications; the first `failures` sends fail.
pub struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
    failures: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::failing(0)
    }

    pub fn failing(failures: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures: AtomicUsize::new(failures),
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        anyhow::ensure!(!failing, "channel unavailable");

        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub struct RecordingPresenceSink {
    presences: Mutex<Vec<Presence>>,
}

impl RecordingPresenceSink {
    pub fn new() -> Self {
        Self {
            presences: Mutex::new(Vec::new()),
        }
    }

    pub fn presences(&self) -> Vec<Presence> {
        self.presences.lock().unwrap().clone()
    }
}

#[async_trait]
impl PresenceSink for RecordingPresenceSink {
    async fn set_presence(&self, presence: &Presence) -> anyhow::Result<()> {
        self.presences.lock().unwrap().push(presence.clone());
        Ok(())
    }
}
