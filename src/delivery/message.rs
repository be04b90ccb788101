use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::{
    provider::TafsirSnippet,
    schedule::{PrayerEvent, Schedule},
    time::{DateKey, format_countdown},
};

const DAILY_COLOR: u32 = 0x2d8f58;
const MAGHRIB_COLOR: u32 = 0xf59e0b;
const IMSAK_COLOR: u32 = 0x38bdf8;
const KULTUM_COLOR: u32 = 0x7c3aed;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

pub fn role_mention(role_id: Option<&str>) -> String {
    role_id.map(|id| format!("<@&{id}>")).unwrap_or_default()
}

fn location_line(schedule: &Schedule) -> String {
    format!("{}, {}", schedule.kabkota, schedule.provinsi)
}

/// Announcement that `event` has started.
pub fn event_reached_text(role_id: Option<&str>, event: PrayerEvent, schedule: &Schedule) -> String {
    format!(
        "{} {} untuk {} sudah masuk ({}).",
        role_mention(role_id),
        event.label(),
        schedule.kabkota,
        schedule.time_of(event)
    )
}

pub fn kultum_intro_text(role_id: Option<&str>) -> String {
    format!("{} Kultum singkat sebelum berbuka.", role_mention(role_id))
}

pub fn daily_embed(schedule: &Schedule, title: &str, ramadan_day: Option<u32>, now: DateTime<Utc>) -> Embed {
    let mut description = format!("{}\nTanggal: {}", location_line(schedule), schedule.date_key);
    if let Some(day_name) = &schedule.day_name {
        description.push_str(&format!(" ({day_name})"));
    }
    if let Some(day) = ramadan_day {
        description.push_str(&format!("\nRamadan hari ke-{day}"));
    }

    Embed {
        title: title.to_owned(),
        description,
        color: DAILY_COLOR,
        fields: PrayerEvent::ALL
            .into_iter()
            .map(|event| EmbedField::new(event.label(), schedule.time_of(event), true))
            .collect(),
        footer: None,
        timestamp: now.to_rfc3339(),
    }
}

/// Countdown towards `event` on `date_key`. `remaining` is `None` when the
/// provider time could not be converted.
pub fn countdown_embed(
    event: PrayerEvent,
    schedule: &Schedule,
    date_key: DateKey,
    remaining: Option<TimeDelta>,
    now: DateTime<Utc>,
) -> Embed {
    let (title, color) = match event {
        PrayerEvent::Maghrib => ("Countdown Buka", MAGHRIB_COLOR),
        _ => ("Countdown Imsak", IMSAK_COLOR),
    };

    let status = match remaining {
        Some(remaining) if remaining > TimeDelta::zero() => {
            format!("Sisa waktu: **{}**", format_countdown(remaining))
        }
        Some(_) => "Waktu sudah lewat.".to_owned(),
        None => "Waktu belum tersedia.".to_owned(),
    };

    Embed {
        title: title.to_owned(),
        description: format!(
            "{}\n{}: {} ({date_key})\n{status}",
            location_line(schedule),
            event.label(),
            schedule.time_of(event)
        ),
        color,
        fields: Vec::new(),
        footer: None,
        timestamp: now.to_rfc3339(),
    }
}

/// Tafsir snippet shown before iftar. `minutes_left` of zero means the
/// snippet was requested on demand.
pub fn kultum_embed(
    snippet: &TafsirSnippet,
    schedule: &Schedule,
    minutes_left: i64,
    now: DateTime<Utc>,
) -> Embed {
    let remaining = if minutes_left > 0 {
        format!("{minutes_left} menit lagi")
    } else {
        "Siap dibaca kapan saja".to_owned()
    };

    Embed {
        title: "Kultum Menjelang Berbuka".to_owned(),
        description: snippet.text.clone(),
        color: KULTUM_COLOR,
        fields: vec![
            EmbedField::new(
                "Tafsir",
                format!("{} ({}:{})", snippet.surah_name, snippet.surah_number, snippet.ayah),
                false,
            ),
            EmbedField::new(
                "Maghrib",
                format!("{} ({})", schedule.times.maghrib, schedule.date_key),
                true,
            ),
            EmbedField::new("Sisa Waktu", remaining, true),
        ],
        footer: Some(EmbedFooter {
            text: location_line(schedule),
        }),
        timestamp: now.to_rfc3339(),
    }
}
