use std::{collections::HashMap, sync::Arc};

use thiserror::Error;
use tokio::sync::RwLock;

use crate::{
    provider::{ProviderError, ScheduleProvider},
    time::DateKey,
};

use super::{Location, MonthlySchedule, Schedule};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Schedule for {0} not found")]
    MissingDay(DateKey),

    #[error("Date after {0} is out of range")]
    DateOutOfRange(DateKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    location: Location,
    year: i32,
    month: u32,
}

type MonthlyCache = RwLock<HashMap<CacheKey, Arc<MonthlySchedule>>>;

/// Daily schedule lookups for one location, backed by a month cache.
///
/// Cached months never expire: a published month does not change while the
/// process runs. Concurrent misses for the same month may both hit the
/// provider; the first stored result wins.
pub struct ScheduleService {
    provider: Arc<dyn ScheduleProvider>,
    location: Location,
    cache: MonthlyCache,
}

impl ScheduleService {
    pub fn new(provider: Arc<dyn ScheduleProvider>, location: Location) -> Self {
        Self {
            provider,
            location,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub async fn monthly(&self, year: i32, month: u32) -> Result<Arc<MonthlySchedule>, ProviderError> {
        let key = CacheKey {
            location: self.location.clone(),
            year,
            month,
        };

        if let Some(cached) = self.cache.read().await.get(&key) {
            return Ok(Arc::clone(cached));
        }

        log::info!("Schedule cache miss for {year}-{month:02}, fetching");
        let fetched = self
            .provider
            .fetch_monthly_schedule(&self.location, year, month)
            .await?;

        let mut cache = self.cache.write().await;
        let entry = cache.entry(key).or_insert_with(|| Arc::new(fetched));
        Ok(Arc::clone(entry))
    }

    pub async fn daily(&self, date_key: DateKey) -> Result<Schedule, ScheduleError> {
        let month = self.monthly(date_key.year(), date_key.month()).await?;
        month
            .day(date_key)
            .ok_or(ScheduleError::MissingDay(date_key))
    }
}
