use std::{sync::LazyLock, time::Duration};

use async_trait::async_trait;
use rand::{Rng, seq::SliceRandom};
use regex::Regex;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;

use crate::{
    appsettings::EQuranSettings,
    schedule::{DailyEntry, Location, MonthlySchedule, PrayerTimes},
    time::DateKey,
};

use super::{ContentProvider, ProviderError, RetryPolicy, ScheduleProvider, TafsirSnippet};

pub const DEFAULT_BASE_URL: &str = "https://equran.id/api/v2";

const SURAH_COUNT: u32 = 114;
const TAFSIR_ATTEMPTS: u32 = 7;

/// Client for the EQuran v2 API: monthly prayer schedules and tafsir.
pub struct EQuranClient {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl EQuranClient {
    pub fn new(settings: &EQuranSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
            client,
            retry: RetryPolicy::default(),
        })
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let (client, url) = (&self.client, &url);

        self.retry
            .run(path, || async move {
                let response = client.post(url).json(body).send().await?;
                read_envelope(response).await
            })
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let (client, url) = (&self.client, &url);

        self.retry
            .run(path, || async move {
                let response = client.get(url).send().await?;
                read_envelope(response).await
            })
            .await
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: Option<u16>,
    message: Option<String>,
    data: Option<T>,
}

async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let envelope: Envelope<T> = response.json().await?;
    unwrap_envelope(envelope)
}

fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T, ProviderError> {
    match envelope.code {
        Some(code) if code != 200 => Err(ProviderError::Api(
            envelope.message.unwrap_or_else(|| "unknown".to_owned()),
        )),
        _ => envelope
            .data
            .ok_or_else(|| ProviderError::InvalidPayload("Response has no data".to_owned())),
    }
}

#[derive(Debug, Deserialize)]
struct MonthlyPayload {
    provinsi: String,
    kabkota: String,
    jadwal: Vec<DailyPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DayNumber {
    Number(u32),
    Text(String),
}

impl DayNumber {
    fn value(&self) -> Option<u32> {
        match self {
            DayNumber::Number(n) => Some(*n),
            DayNumber::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DailyPayload {
    #[serde(default)]
    tanggal: Option<DayNumber>,
    #[serde(default)]
    tanggal_lengkap: Option<String>,
    #[serde(default)]
    hari: Option<String>,
    #[serde(default)]
    imsak: Option<String>,
    #[serde(default)]
    subuh: Option<String>,
    #[serde(default)]
    terbit: Option<String>,
    #[serde(default)]
    dhuha: Option<String>,
    #[serde(default)]
    dzuhur: Option<String>,
    #[serde(default)]
    ashar: Option<String>,
    #[serde(default)]
    maghrib: Option<String>,
    #[serde(default)]
    isya: Option<String>,
}

impl From<MonthlyPayload> for MonthlySchedule {
    fn from(payload: MonthlyPayload) -> Self {
        let days = payload
            .jadwal
            .into_iter()
            .map(|day| DailyEntry {
                day: day.tanggal.as_ref().and_then(DayNumber::value),
                date: day.tanggal_lengkap.as_deref().and_then(DateKey::parse),
                day_name: day.hari,
                // A missing time stays empty and resolves to no instant.
                times: PrayerTimes {
                    imsak: day.imsak.unwrap_or_default(),
                    subuh: day.subuh.unwrap_or_default(),
                    terbit: day.terbit.unwrap_or_default(),
                    dhuha: day.dhuha.unwrap_or_default(),
                    dzuhur: day.dzuhur.unwrap_or_default(),
                    ashar: day.ashar.unwrap_or_default(),
                    maghrib: day.maghrib.unwrap_or_default(),
                    isya: day.isya.unwrap_or_default(),
                },
            })
            .collect();

        MonthlySchedule {
            provinsi: payload.provinsi,
            kabkota: payload.kabkota,
            days,
        }
    }
}

#[async_trait]
impl ScheduleProvider for EQuranClient {
    async fn fetch_monthly_schedule(
        &self,
        location: &Location,
        year: i32,
        month: u32,
    ) -> Result<MonthlySchedule, ProviderError> {
        let body = json!({
            "provinsi": location.provinsi,
            "kabkota": location.kabkota,
            "bulan": month,
            "tahun": year,
        });

        let payload: MonthlyPayload = self.post_json("/shalat", &body).await?;
        log::info!(
            "Fetched {} schedule days for {}, {} ({year}-{month:02})",
            payload.jadwal.len(),
            location.kabkota,
            location.provinsi
        );

        Ok(payload.into())
    }
}

#[derive(Debug, Deserialize)]
struct TafsirPayload {
    nomor: u32,
    #[serde(default)]
    nama: Option<String>,
    #[serde(default, rename = "namaLatin")]
    nama_latin: Option<String>,
    #[serde(default)]
    tafsir: Vec<TafsirEntry>,
}

#[derive(Debug, Deserialize)]
struct TafsirEntry {
    ayat: u32,
    #[serde(default)]
    teks: Option<String>,
}

#[async_trait]
impl ContentProvider for EQuranClient {
    async fn random_tafsir(&self, max_chars: usize) -> Result<TafsirSnippet, ProviderError> {
        for attempt in 1..=TAFSIR_ATTEMPTS {
            let surah = rand::thread_rng().gen_range(1..=SURAH_COUNT);
            let payload: TafsirPayload = self.get_json(&format!("/tafsir/{surah}")).await?;

            if let Some(snippet) = pick_snippet(payload, max_chars) {
                return Ok(snippet);
            }
            log::debug!("Surah {surah} had no usable tafsir (attempt {attempt}/{TAFSIR_ATTEMPTS})");
        }

        Err(ProviderError::NoContent(
            "Could not pick a random tafsir".to_owned(),
        ))
    }
}

fn pick_snippet(payload: TafsirPayload, max_chars: usize) -> Option<TafsirSnippet> {
    let picked = payload.tafsir.choose(&mut rand::thread_rng())?;
    let text = to_plain_text(picked.teks.as_deref().unwrap_or_default());
    if text.is_empty() {
        return None;
    }

    let surah_name = payload
        .nama_latin
        .or(payload.nama)
        .unwrap_or_else(|| format!("Surah {}", payload.nomor));

    Some(TafsirSnippet {
        surah_number: payload.nomor,
        surah_name,
        ayah: picked.ayat,
        text: truncate(&text, max_chars),
    })
}

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Drops complete markup tags and collapses whitespace. A lone `<` is kept
/// as text.
pub(crate) fn to_plain_text(html: &str) -> String {
    let text = MARKUP_TAG.replace_all(html, " ");
    WHITESPACE.replace_all(&text, " ").trim().to_owned()
}

/// Cuts `text` to at most `max_chars` characters, ending with an ellipsis
/// when shortened.
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }

    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
