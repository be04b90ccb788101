use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Timelike, Utc};

use crate::{
    delivery::{ActivityKind, Presence, PresenceSink},
    schedule::PrayerEvent,
};

use super::{EventResolver, PeriodicJob, ResolvedEvent};

pub const WARM_LINES: [&str; 6] = [
    "Niat baik, puasa berkah",
    "Jaga lisan, jaga hati",
    "Cukup minum setelah buka",
    "Semoga puasamu lancar",
    "Tetap tenang, tetap ibadah",
    "Jangan lupa doa terbaik",
];

/// Identical presences are not re-sent more often than this.
const MIN_UPDATE_SECONDS: i64 = 120;

/// Picks the bot status for `now`, `remaining` before the next `event`.
///
/// The countdown is shown more often the closer the event is, and only on
/// round minute values; the rest of the time a warm line rotates.
pub fn select_presence(now: DateTime<Utc>, event: PrayerEvent, remaining: TimeDelta) -> Presence {
    let remaining = remaining.num_minutes().max(0);
    let gate = now.minute() % 4;

    let priority = if remaining <= 90 {
        gate != 3
    } else if remaining <= 240 {
        gate % 2 == 0
    } else {
        gate == 0
    };

    let step = if remaining <= 30 { 2 } else { 5 };
    let on_boundary = remaining <= 2 || remaining % step == 0;

    if priority && on_boundary {
        let text = if remaining >= 60 {
            format!("Menuju {} {}j {:02}m", event.label(), remaining / 60, remaining % 60)
        } else {
            format!("{} {}m lagi", event.label(), remaining)
        };

        return Presence {
            text,
            kind: ActivityKind::Watching,
        };
    }

    let unix_minutes = now.timestamp().div_euclid(60);
    let offset = i64::from(event == PrayerEvent::Imsak);
    let index = (unix_minutes + offset).rem_euclid(WARM_LINES.len() as i64) as usize;

    Presence {
        text: WARM_LINES[index].to_owned(),
        kind: ActivityKind::Listening,
    }
}

/// The earlier of two occurrences with a known instant. Imsak wins ties.
fn nearest(imsak: ResolvedEvent, maghrib: ResolvedEvent) -> Option<ResolvedEvent> {
    match (imsak.instant, maghrib.instant) {
        (Some(a), Some(b)) if a <= b => Some(imsak),
        (Some(_), Some(_)) => Some(maghrib),
        (Some(_), None) => Some(imsak),
        (None, Some(_)) => Some(maghrib),
        (None, None) => None,
    }
}

/// Keeps the bot status pointed at the next imsak or maghrib.
pub struct PresenceUpdater {
    resolver: EventResolver,
    sink: Arc<dyn PresenceSink>,
    min_update_interval: TimeDelta,
    last: Option<(Presence, DateTime<Utc>)>,
}

impl PresenceUpdater {
    pub fn new(resolver: EventResolver, sink: Arc<dyn PresenceSink>, refresh_interval: TimeDelta) -> Self {
        Self {
            resolver,
            sink,
            min_update_interval: refresh_interval.max(TimeDelta::seconds(MIN_UPDATE_SECONDS)),
            last: None,
        }
    }

    pub async fn refresh(&mut self, now: DateTime<Utc>) -> anyhow::Result<()> {
        let imsak = self.resolver.next_occurrence(PrayerEvent::Imsak, now).await?;
        let maghrib = self.resolver.next_occurrence(PrayerEvent::Maghrib, now).await?;

        let Some(next) = nearest(imsak, maghrib) else {
            log::warn!("[PRESENCE] Neither imsak nor maghrib has a usable time");
            return Ok(());
        };
        let Some(remaining) = next.remaining(now) else {
            return Ok(());
        };

        let presence = select_presence(now, next.event, remaining);
        if let Some((last, updated_at)) = &self.last {
            if *last == presence && now - *updated_at < self.min_update_interval {
                return Ok(());
            }
        }

        self.sink.set_presence(&presence).await?;
        self.last = Some((presence, now));
        Ok(())
    }
}

#[async_trait]
impl PeriodicJob for PresenceUpdater {
    fn name(&self) -> &'static str {
        "presence"
    }

    async fn run(&mut self, now: DateTime<Utc>) -> anyhow::Result<()> {
        self.refresh(now).await
    }
}
