//! Shared HTTP plumbing for the provider clients

use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::{Result, TripcastError};

const USER_AGENT: &str = concat!("Tripcast/", env!("CARGO_PKG_VERSION"));

/// Build a client that retries transient failures with exponential backoff
pub fn build_client(
    provider: &'static str,
    timeout: Duration,
    max_retries: u32,
) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| TripcastError::from_transport(provider, &e))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// GET `url` with `params` and decode the JSON body
pub async fn get_json<T: DeserializeOwned>(
    client: &ClientWithMiddleware,
    provider: &'static str,
    url: &str,
    params: &[(&str, String)],
) -> Result<T> {
    let url = reqwest::Url::parse_with_params(url, params)
        .map_err(|e| TripcastError::config(format!("invalid {provider} URL '{url}': {e}")))?;

    let response = client.get(url).send().await.map_err(|e| match e {
        reqwest_middleware::Error::Reqwest(err) => TripcastError::from_transport(provider, &err),
        other => TripcastError::provider(provider, other.to_string()),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(TripcastError::provider(provider, format!("HTTP {status}")));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| TripcastError::from_transport(provider, &e))
}

/// Providers send numbers as strings, as numbers, or as `[]` when empty
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Lenient {
    fn number(self) -> Option<f64> {
        match self {
            Lenient::Number(n) => Some(n),
            Lenient::Text(s) => s.trim().parse().ok(),
            Lenient::Other(_) => None,
        }
    }

    fn text(self) -> Option<String> {
        match self {
            Lenient::Number(n) => Some(n.to_string()),
            Lenient::Text(s) if !s.trim().is_empty() => Some(s),
            Lenient::Text(_) | Lenient::Other(_) => None,
        }
    }
}

/// Deserialize an optional number from a string, number or empty value
pub fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<f64>, D::Error> {
    Ok(Option::<Lenient>::deserialize(deserializer)?.and_then(Lenient::number))
}

/// Deserialize an optional string, treating `[]` and blanks as absent
pub fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<Lenient>::deserialize(deserializer)?.and_then(Lenient::text))
}

/// Convert a lenient number to whole units, dropping negatives
#[must_use]
pub fn whole(value: Option<f64>) -> u64 {
    // provider distances and durations comfortably fit in u64
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let units = value.unwrap_or(0.0).max(0.0).round() as u64;
    units
}
