//! Outbound collaborators: the prayer schedule and Quran content provider
//! (EQuran) and the optional AI assistant.

pub mod ai;
pub mod equran;
mod error;
mod retry;

use async_trait::async_trait;

use crate::schedule::{Location, MonthlySchedule};

pub use error::ProviderError;
pub use retry::RetryPolicy;

#[async_trait]
pub trait ScheduleProvider: Send + Sync + 'static {
    async fn fetch_monthly_schedule(
        &self,
        location: &Location,
        year: i32,
        month: u32,
    ) -> Result<MonthlySchedule, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TafsirSnippet {
    pub surah_number: u32,
    pub surah_name: String,
    pub ayah: u32,
    pub text: String,
}

#[async_trait]
pub trait ContentProvider: Send + Sync + 'static {
    /// A random tafsir passage, plain text, at most `max_chars` characters.
    async fn random_tafsir(&self, max_chars: usize) -> Result<TafsirSnippet, ProviderError>;
}

#[async_trait]
pub trait Assistant: Send + Sync + 'static {
    /// Answers `prompt`, optionally grounded on `context` (today's schedule).
    async fn ask(&self, prompt: &str, context: Option<&str>) -> Result<String, ProviderError>;
}
