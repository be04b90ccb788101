use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
    appsettings::{AppSettings, RamadanSettings},
    delivery::message::{Embed, countdown_embed, daily_embed, kultum_embed},
    provider::{Assistant, ContentProvider, ai::AiAssistant},
    schedule::{PrayerEvent, Schedule},
    scheduling::EventResolver,
    time::{DateKey, ramadan_day},
};

const SCHEDULE_ERROR: &str = "Terjadi error saat mengambil jadwal. Coba lagi sebentar.";
const INVALID_DATE: &str = "Format tanggal tidak valid. Gunakan YYYY-MM-DD.";
const ASSISTANT_DISABLED: &str = "Fitur tanya AI belum dikonfigurasi.";
const ASSISTANT_ERROR: &str = "Asisten AI sedang tidak bisa menjawab. Coba lagi sebentar.";
const EMPTY_QUESTION: &str = "Pertanyaan tidak boleh kosong.";

/// Discord rejects message content above this many characters.
const MAX_REPLY_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    JadwalSholat { tanggal: Option<String> },
    Buka,
    Imsak,
    Kultum,
    Tanya { pertanyaan: String },
}

impl Command {
    /// Builds a command from a slash-command name and its string options.
    pub fn parse(name: &str, options: &HashMap<String, String>) -> Option<Self> {
        let command = match name {
            "jadwal-sholat" => Command::JadwalSholat {
                tanggal: options
                    .get("tanggal")
                    .map(|value| value.trim().to_owned())
                    .filter(|value| !value.is_empty()),
            },
            "buka" => Command::Buka,
            "imsak" => Command::Imsak,
            "kultum" => Command::Kultum,
            "tanya" => Command::Tanya {
                pertanyaan: options.get("pertanyaan").cloned().unwrap_or_default(),
            },
            _ => return None,
        };

        Some(command)
    }

    /// Parses a typed line such as `/jadwal-sholat 2026-03-10` or
    /// `tanya kapan niat puasa?`. Everything after the name fills the
    /// command's single option.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        let line = line.strip_prefix('/').unwrap_or(line);
        let (name, argument) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));

        let mut options = HashMap::new();
        let option = match name {
            "jadwal-sholat" => Some("tanggal"),
            "tanya" => Some("pertanyaan"),
            _ => None,
        };
        if let Some(option) = option {
            options.insert(option.to_owned(), argument.trim().to_owned());
        }

        Self::parse(name, &options)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::JadwalSholat { .. } => "jadwal-sholat",
            Command::Buka => "buka",
            Command::Imsak => "imsak",
            Command::Kultum => "kultum",
            Command::Tanya { .. } => "tanya",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reply {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    /// Only visible to the user who ran the command.
    pub ephemeral: bool,
}

impl Reply {
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Default::default()
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn private(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ephemeral: true,
            ..Default::default()
        }
    }
}

pub struct CommandHandler {
    resolver: EventResolver,
    content: Arc<dyn ContentProvider>,
    assistant: Option<Arc<dyn Assistant>>,
    kultum_max_chars: usize,
    ramadan: RamadanSettings,
}

impl CommandHandler {
    pub fn new(
        resolver: EventResolver,
        content: Arc<dyn ContentProvider>,
        assistant: Option<Arc<dyn Assistant>>,
        kultum_max_chars: usize,
        ramadan: RamadanSettings,
    ) -> Self {
        Self {
            resolver,
            content,
            assistant,
            kultum_max_chars,
            ramadan,
        }
    }

    /// Builds the handler from settings. `/tanya` is answered by an
    /// [`AiAssistant`] only when the `ai` section is present.
    pub fn from_settings(
        settings: &AppSettings,
        resolver: EventResolver,
        content: Arc<dyn ContentProvider>,
    ) -> anyhow::Result<Self> {
        let assistant: Option<Arc<dyn Assistant>> = match settings.ai.clone() {
            Some(ai) => {
                log::info!("[COMMAND] /tanya answers with model {}", ai.model);
                Some(Arc::new(AiAssistant::new(ai)?))
            }
            None => {
                log::info!("[COMMAND] /tanya is disabled, no ai section configured");
                None
            }
        };

        Ok(Self::new(
            resolver,
            content,
            assistant,
            settings.scheduling.kultum_max_chars,
            settings.ramadan.clone(),
        ))
    }

    /// Never fails; errors are logged and answered with a short private
    /// message.
    pub async fn handle(&self, command: &Command, now: DateTime<Utc>) -> Reply {
        let result = match command {
            Command::JadwalSholat { tanggal } => self.daily(tanggal.as_deref(), now).await,
            Command::Buka => self.countdown(PrayerEvent::Maghrib, now).await,
            Command::Imsak => self.countdown(PrayerEvent::Imsak, now).await,
            Command::Kultum => self.kultum(now).await,
            Command::Tanya { pertanyaan } => return self.ask(pertanyaan, now).await,
        };

        result.unwrap_or_else(|error| {
            log::error!("[COMMAND] /{} failed: {error:#}", command.name());
            Reply::private(SCHEDULE_ERROR)
        })
    }

    async fn daily(&self, tanggal: Option<&str>, now: DateTime<Utc>) -> anyhow::Result<Reply> {
        let date_key = match tanggal {
            Some(value) => match DateKey::parse(value) {
                Some(date_key) => date_key,
                None => return Ok(Reply::private(INVALID_DATE)),
            },
            None => self.resolver.today(now),
        };

        let schedule = self.resolver.schedule_for(date_key).await?;
        let day = self
            .ramadan
            .start_date
            .and_then(|start| ramadan_day(date_key, start, self.ramadan.total_days));

        Ok(Reply::embed(daily_embed(&schedule, "Jadwal Sholat", day, now)))
    }

    async fn countdown(&self, event: PrayerEvent, now: DateTime<Utc>) -> anyhow::Result<Reply> {
        let next = self.resolver.next_occurrence(event, now).await?;
        Ok(Reply::embed(countdown_embed(
            event,
            &next.schedule,
            next.date_key,
            next.remaining(now),
            now,
        )))
    }

    async fn kultum(&self, now: DateTime<Utc>) -> anyhow::Result<Reply> {
        let schedule = self.resolver.schedule_for(self.resolver.today(now)).await?;
        let snippet = self.content.random_tafsir(self.kultum_max_chars).await?;
        Ok(Reply::embed(kultum_embed(&snippet, &schedule, 0, now)))
    }

    async fn ask(&self, question: &str, now: DateTime<Utc>) -> Reply {
        let Some(assistant) = &self.assistant else {
            return Reply::private(ASSISTANT_DISABLED);
        };
        if question.trim().is_empty() {
            return Reply::private(EMPTY_QUESTION);
        }

        // the answer is still useful without schedule context
        let context = match self.resolver.schedule_for(self.resolver.today(now)).await {
            Ok(schedule) => Some(schedule_context(&schedule)),
            Err(error) => {
                log::warn!("[COMMAND] /tanya without schedule context: {error}");
                None
            }
        };

        match assistant.ask(question, context.as_deref()).await {
            Ok(answer) => Reply::text(limit_chars(&answer, MAX_REPLY_CHARS)),
            Err(error) => {
                log::error!("[COMMAND] /tanya failed: {error}");
                Reply::private(ASSISTANT_ERROR)
            }
        }
    }
}

/// One-line summary of a day's schedule used to ground assistant answers.
pub fn schedule_context(schedule: &Schedule) -> String {
    let times = PrayerEvent::ALL
        .into_iter()
        .map(|event| format!("{} {}", event.label(), schedule.time_of(event)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Lokasi: {}, {}. Tanggal: {}. Jadwal: {times}.",
        schedule.kabkota, schedule.provinsi, schedule.date_key
    )
}

fn limit_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_owned(),
        None => text.to_owned(),
    }
}
