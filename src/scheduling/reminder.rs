use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    appsettings::AppSettings,
    delivery::{
        Notification, NotificationSink,
        message::{event_reached_text, kultum_embed, kultum_intro_text},
    },
    provider::ContentProvider,
    schedule::{PrayerEvent, Schedule},
    time::DateKey,
};

use super::{
    EventResolver, MarkerSet, NotificationMarker, PeriodicJob,
    window::{is_in_lead_window, is_in_window},
};

const ANNOUNCED_EVENTS: [PrayerEvent; 2] = [PrayerEvent::Imsak, PrayerEvent::Maghrib];

#[derive(Debug, Clone)]
pub struct ReminderSettings {
    /// Poll period; also the width of every notification window.
    pub check_interval: TimeDelta,
    pub kultum_lead: TimeDelta,
    pub kultum_max_chars: usize,
    pub role_id: Option<String>,
}

impl ReminderSettings {
    pub fn from_app_settings(settings: &AppSettings) -> Self {
        Self {
            check_interval: TimeDelta::milliseconds(settings.scheduling.check_interval_ms as i64),
            kultum_lead: TimeDelta::minutes(settings.scheduling.kultum_before_maghrib_minutes as i64),
            kultum_max_chars: settings.scheduling.kultum_max_chars,
            role_id: settings.discord.role_id.clone(),
        }
    }
}

/// Announces imsak and maghrib once per day and posts a kultum shortly
/// before maghrib.
pub struct ReminderDispatcher {
    resolver: EventResolver,
    content: Arc<dyn ContentProvider>,
    sink: Arc<dyn NotificationSink>,
    settings: ReminderSettings,
    sent: MarkerSet,
}

impl ReminderDispatcher {
    pub fn new(
        resolver: EventResolver,
        content: Arc<dyn ContentProvider>,
        sink: Arc<dyn NotificationSink>,
        settings: ReminderSettings,
    ) -> Self {
        Self {
            resolver,
            content,
            sink,
            settings,
            sent: MarkerSet::default(),
        }
    }

    pub async fn check(&mut self, now: DateTime<Utc>) -> anyhow::Result<()> {
        let today = self.resolver.today(now);
        let schedule = self.resolver.schedule_for(today).await?;

        for event in ANNOUNCED_EVENTS {
            if let Err(error) = self.announce_event(event, today, &schedule, now).await {
                log::error!("[REMINDER] Failed to announce {event} for {today}: {error:#}");
            }
        }

        self.post_kultum(today, &schedule, now).await
    }

    async fn announce_event(
        &mut self,
        event: PrayerEvent,
        today: DateKey,
        schedule: &Schedule,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let Some(target) = schedule.instant_of(event, self.resolver.timezone()) else {
            log::debug!("[REMINDER] No usable {event} time for {today}: {:?}", schedule.time_of(event));
            return Ok(());
        };

        let marker = NotificationMarker::event(today, event);
        if !is_in_window(now, target, self.settings.check_interval) || self.sent.contains(&marker) {
            return Ok(());
        }

        let role_id = self.settings.role_id.as_deref();
        let notification = Notification {
            content: event_reached_text(role_id, event, schedule),
            embeds: Vec::new(),
            mention_role: self.settings.role_id.clone(),
        };

        self.sink.send(&notification).await?;
        self.sent.insert(marker);
        log::info!("[REMINDER] Sent {marker}");
        Ok(())
    }

    async fn post_kultum(
        &mut self,
        today: DateKey,
        schedule: &Schedule,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let Some(maghrib) = schedule.instant_of(PrayerEvent::Maghrib, self.resolver.timezone()) else {
            return Ok(());
        };

        let marker = NotificationMarker::kultum(today);
        let in_lead = is_in_lead_window(
            now,
            maghrib,
            self.settings.kultum_lead,
            self.settings.check_interval,
        );
        if !in_lead || self.sent.contains(&marker) {
            return Ok(());
        }

        let snippet = self.content.random_tafsir(self.settings.kultum_max_chars).await?;
        let minutes_left = minutes_left(maghrib - now);

        let notification = Notification {
            content: kultum_intro_text(self.settings.role_id.as_deref()),
            embeds: vec![kultum_embed(&snippet, schedule, minutes_left, now)],
            mention_role: self.settings.role_id.clone(),
        };

        self.sink.send(&notification).await?;
        self.sent.insert(marker);
        log::info!(
            "[REMINDER] Sent {marker} ({} {}:{})",
            snippet.surah_name,
            snippet.surah_number,
            snippet.ayah
        );
        Ok(())
    }
}

/// Whole minutes left, rounded up and never below one.
fn minutes_left(remaining: TimeDelta) -> i64 {
    let millis = remaining.num_milliseconds();
    (millis + 59_999).div_euclid(60_000).max(1)
}

#[async_trait]
impl PeriodicJob for ReminderDispatcher {
    fn name(&self) -> &'static str {
        "reminder"
    }

    async fn run(&mut self, now: DateTime<Utc>) -> anyhow::Result<()> {
        self.check(now).await
    }
}
