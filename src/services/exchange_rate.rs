use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::RateSettings;
use crate::error::{AppError, AppResult};
use crate::utils::money::round_rate;

/// A cached rate is trusted for this long.
pub const CACHE_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateOrigin {
    Primary,
    Backup,
    Cache,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateQuote {
    pub rate: f64,
    pub origin: RateOrigin,
    pub fetched_at: DateTime<Utc>,
    /// Set when neither HTTP source answered.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachedRate {
    pub rate: f64,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRate {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.fetched_at) < Duration::hours(CACHE_TTL_HOURS)
    }
}

#[derive(Debug, Error)]
pub enum RateError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Parse(String),
    #[error("unusable rate {0}")]
    Invalid(f64),
}

/// `{"rates": {"VES": 36.5, ...}}`
#[derive(Debug, Deserialize)]
struct KeyedRates {
    rates: HashMap<String, f64>,
}

/// `{"promedio": 36.5, ...}`
#[derive(Debug, Deserialize)]
struct AveragedRate {
    promedio: f64,
}

pub fn parse_keyed(body: &str, currency: &str) -> Result<f64, RateError> {
    let parsed: KeyedRates =
        serde_json::from_str(body).map_err(|e| RateError::Parse(e.to_string()))?;
    let rate = parsed
        .rates
        .get(currency)
        .copied()
        .ok_or_else(|| RateError::Parse(format!("missing currency {}", currency)))?;
    usable(rate)
}

pub fn parse_averaged(body: &str) -> Result<f64, RateError> {
    let parsed: AveragedRate =
        serde_json::from_str(body).map_err(|e| RateError::Parse(e.to_string()))?;
    usable(parsed.promedio)
}

fn usable(rate: f64) -> Result<f64, RateError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(round_rate(rate))
    } else {
        Err(RateError::Invalid(rate))
    }
}

pub async fn read_cache(path: &Path) -> Option<CachedRate> {
    let raw = tokio::fs::read_to_string(path).await.ok()?;
    match serde_json::from_str(&raw) {
        Ok(cached) => Some(cached),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable rate cache: {e}");
            None
        }
    }
}

pub async fn write_cache(path: &Path, cached: &CachedRate) -> std::io::Result<()> {
    let raw = serde_json::to_string(cached)?;
    tokio::fs::write(path, raw).await
}

/// USD to local-currency rate with a primary source, a backup source, a file
/// cache and a configured default, tried in that order.
pub struct ExchangeRateProvider {
    client: reqwest::Client,
    settings: RateSettings,
    latest: RwLock<Option<RateQuote>>,
}

impl ExchangeRateProvider {
    pub fn new(settings: RateSettings) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            settings,
            latest: RwLock::new(None),
        })
    }

    /// Last resolved quote, resolving one first if none is loaded yet.
    pub async fn current(&self) -> RateQuote {
        if let Some(quote) = self.latest.read().await.clone() {
            return quote;
        }
        self.refresh().await
    }

    /// Walk the source chain again. Never fails; the worst case is the default.
    pub async fn refresh(&self) -> RateQuote {
        let quote = self.resolve(Utc::now()).await;
        *self.latest.write().await = Some(quote.clone());
        quote
    }

    async fn resolve(&self, now: DateTime<Utc>) -> RateQuote {
        let fetched = match self.fetch_primary().await {
            Ok(rate) => Some((rate, RateOrigin::Primary)),
            Err(e) => {
                tracing::warn!(url = %self.settings.primary_url, "primary rate source failed: {e}");
                match self.fetch_backup().await {
                    Ok(rate) => Some((rate, RateOrigin::Backup)),
                    Err(e) => {
                        tracing::warn!(url = %self.settings.backup_url, "backup rate source failed: {e}");
                        None
                    }
                }
            }
        };

        if let Some((rate, origin)) = fetched {
            let cached = CachedRate {
                rate,
                fetched_at: now,
            };
            if let Err(e) = write_cache(&self.settings.cache_path, &cached).await {
                tracing::warn!(path = %self.settings.cache_path.display(), "failed to write rate cache: {e}");
            }
            tracing::info!(rate, ?origin, "exchange rate updated");
            return RateQuote {
                rate,
                origin,
                fetched_at: now,
                error: None,
            };
        }

        if let Some(cached) = read_cache(&self.settings.cache_path).await {
            if cached.is_fresh(now) {
                return RateQuote {
                    rate: cached.rate,
                    origin: RateOrigin::Cache,
                    fetched_at: cached.fetched_at,
                    error: Some("Could not refresh the exchange rate; using the last saved value".to_string()),
                };
            }
        }

        tracing::error!(rate = self.settings.fallback_rate, "no exchange rate available, using default");
        RateQuote {
            rate: self.settings.fallback_rate,
            origin: RateOrigin::Fallback,
            fetched_at: now,
            error: Some("Could not obtain the exchange rate; using the default value".to_string()),
        }
    }

    async fn fetch_primary(&self) -> Result<f64, RateError> {
        let body = self.get(&self.settings.primary_url).await?;
        parse_keyed(&body, &self.settings.currency)
    }

    async fn fetch_backup(&self) -> Result<f64, RateError> {
        let body = self.get(&self.settings.backup_url).await?;
        parse_averaged(&body)
    }

    async fn get(&self, url: &str) -> Result<String, RateError> {
        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_response_reads_configured_currency() {
        let body = r#"{"result":"success","rates":{"USD":1,"VES":36.5012}}"#;
        assert_eq!(parse_keyed(body, "VES").unwrap(), 36.5012);
        assert!(matches!(parse_keyed(body, "COP"), Err(RateError::Parse(_))));
    }

    #[test]
    fn averaged_response_reads_promedio() {
        let body = r#"{"fuente":"oficial","promedio":36.42,"fechaActualizacion":"2024-05-10"}"#;
        assert_eq!(parse_averaged(body).unwrap(), 36.42);
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(matches!(parse_averaged(r#"{"promedio":0}"#), Err(RateError::Invalid(_))));
        assert!(matches!(parse_averaged("not json"), Err(RateError::Parse(_))));
    }

    #[test]
    fn cache_expires_after_a_day() {
        let now = Utc::now();
        let fresh = CachedRate {
            rate: 36.0,
            fetched_at: now - Duration::hours(23),
        };
        let stale = CachedRate {
            rate: 36.0,
            fetched_at: now - Duration::hours(25),
        };
        assert!(fresh.is_fresh(now));
        assert!(!stale.is_fresh(now));
    }
}
