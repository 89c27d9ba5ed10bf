//! Weather provider decorator backed by the persistent cache

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::WeatherProvider;
use crate::Result;
use crate::cache::{PersistentCache, jittered};
use crate::models::{Location, WeatherObservation};

/// Serves repeated lookups for the same place from the cache.
/// Cache failures are logged and the inner provider is asked instead.
pub struct CachedWeatherProvider {
    inner: Arc<dyn WeatherProvider>,
    cache: PersistentCache,
    ttl: Duration,
}

impl CachedWeatherProvider {
    #[must_use]
    pub fn new(inner: Arc<dyn WeatherProvider>, cache: PersistentCache, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    async fn lookup<T>(&self, key: &str) -> Option<T>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        match self.cache.get::<T>(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key, error = %e, "Weather cache read failed");
                None
            }
        }
    }

    async fn store<T>(&self, key: &str, value: T)
    where
        T: serde::Serialize + Send + std::fmt::Debug + 'static,
    {
        if let Err(e) = self.cache.put(key, value, jittered(self.ttl)).await {
            tracing::warn!(key, error = %e, "Weather cache write failed");
        }
    }
}

#[async_trait]
impl WeatherProvider for CachedWeatherProvider {
    async fn current_weather(&self, location: &Location) -> Result<WeatherObservation> {
        let key = location.cache_key("now");
        if let Some(hit) = self.lookup::<WeatherObservation>(&key).await {
            tracing::debug!(key, "Weather cache hit");
            return Ok(hit);
        }

        let observation = self.inner.current_weather(location).await?;
        self.store(&key, observation.clone()).await;
        Ok(observation)
    }

    async fn forecast(&self, location: &Location, days: u8) -> Result<Vec<WeatherObservation>> {
        let key = location.cache_key(&format!("{days}d"));
        if let Some(hit) = self.lookup::<Vec<WeatherObservation>>(&key).await {
            tracing::debug!(key, "Forecast cache hit");
            return Ok(hit);
        }

        let forecast = self.inner.forecast(location, days).await?;
        self.store(&key, forecast.clone()).await;
        Ok(forecast)
    }
}
