use std::time::Duration;

use chrono_tz::{Asia, Tz};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::{provider::equran::DEFAULT_BASE_URL, schedule::Location, time::DateKey};

#[derive(Deserialize, Debug, Clone)]
pub struct DiscordSettings {
    pub token: String,
    pub channel_id: String,
    #[serde(default)]
    pub role_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SchedulingSettings {
    #[serde(default = "default_status_refresh_ms")]
    pub status_refresh_ms: u64,
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    #[serde(default = "default_kultum_before_maghrib_minutes")]
    pub kultum_before_maghrib_minutes: u32,
    #[serde(default = "default_kultum_max_chars")]
    pub kultum_max_chars: usize,
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            status_refresh_ms: default_status_refresh_ms(),
            check_interval_ms: default_check_interval_ms(),
            kultum_before_maghrib_minutes: default_kultum_before_maghrib_minutes(),
            kultum_max_chars: default_kultum_max_chars(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct EQuranSettings {
    #[serde(default = "default_equran_base_url")]
    pub base_url: String,
    #[serde(default = "default_equran_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for EQuranSettings {
    fn default() -> Self {
        Self {
            base_url: default_equran_base_url(),
            timeout_ms: default_equran_timeout_ms(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RamadanSettings {
    /// First day of Ramadan in the configured zone; day numbering is off
    /// when unset.
    #[serde(default)]
    pub start_date: Option<DateKey>,
    #[serde(default = "default_ramadan_total_days")]
    pub total_days: u32,
}

impl Default for RamadanSettings {
    fn default() -> Self {
        Self {
            start_date: None,
            total_days: default_ramadan_total_days(),
        }
    }
}

/// OpenAI compatible chat endpoint behind `/tanya`.
#[derive(Deserialize, Debug, Clone)]
pub struct AiSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_ai_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_ai_temperature")]
    pub temperature: f32,
    #[serde(default = "default_ai_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    pub discord: DiscordSettings,
    pub location: Location,
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    #[serde(default)]
    pub scheduling: SchedulingSettings,
    #[serde(default)]
    pub equran: EQuranSettings,
    #[serde(default)]
    pub ramadan: RamadanSettings,
    #[serde(default)]
    pub ai: Option<AiSettings>,
}

impl AppSettings {
    /// Reads `appsettings.*`, then `appsettings.local.*`, then `APP_*`
    /// environment variables (`APP_DISCORD__TOKEN`). Later sources win.
    pub fn load() -> anyhow::Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let mut settings: AppSettings = config.try_deserialize().map_err(describe)?;
        settings.normalize();
        settings.validate()?;
        Ok(settings)
    }

    fn normalize(&mut self) {
        self.discord.role_id = self
            .discord
            .role_id
            .take()
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty());
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.discord.token.trim().is_empty(), "discord.token is empty");
        anyhow::ensure!(!self.discord.channel_id.trim().is_empty(), "discord.channel_id is empty");
        anyhow::ensure!(!self.location.provinsi.trim().is_empty(), "location.provinsi is empty");
        anyhow::ensure!(!self.location.kabkota.trim().is_empty(), "location.kabkota is empty");
        anyhow::ensure!(self.scheduling.status_refresh_ms > 0, "scheduling.status_refresh_ms must be positive");
        anyhow::ensure!(self.scheduling.check_interval_ms > 0, "scheduling.check_interval_ms must be positive");
        anyhow::ensure!(self.scheduling.kultum_max_chars > 0, "scheduling.kultum_max_chars must be positive");
        anyhow::ensure!(self.ramadan.total_days > 0, "ramadan.total_days must be positive");
        Ok(())
    }

    pub fn status_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.scheduling.status_refresh_ms)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.scheduling.check_interval_ms)
    }
}

fn describe(error: ConfigError) -> anyhow::Error {
    anyhow::anyhow!("Invalid configuration: {error}")
}

fn default_status_refresh_ms() -> u64 {
    60_000
}

fn default_check_interval_ms() -> u64 {
    30_000
}

fn default_kultum_before_maghrib_minutes() -> u32 {
    20
}

fn default_kultum_max_chars() -> usize {
    500
}

fn default_equran_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_equran_timeout_ms() -> u64 {
    10_000
}

fn default_ramadan_total_days() -> u32 {
    30
}

fn default_ai_max_tokens() -> u32 {
    600
}

fn default_ai_temperature() -> f32 {
    0.4
}

fn default_ai_timeout_ms() -> u64 {
    20_000
}

fn default_timezone() -> Tz {
    Asia::Jakarta
}
