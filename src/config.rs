use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};

use crate::error::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub admin_username: String,
    pub admin_password: String,
    pub rates: RateSettings,
    pub business: BusinessHours,
    /// Wall-clock UTC time at which every session is closed.
    pub session_purge_at: NaiveTime,
    pub plate_lookup_debounce: Duration,
}

/// Where the exchange rate comes from and what to fall back to.
#[derive(Clone, Debug)]
pub struct RateSettings {
    pub primary_url: String,
    pub backup_url: String,
    /// Currency code read from the primary source's `rates` map.
    pub currency: String,
    pub fallback_rate: f64,
    pub cache_path: PathBuf,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
}

/// Local opening hours, expressed as a fixed UTC offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusinessHours {
    pub utc_offset_hours: i32,
    pub open_hour: u32,
    pub close_hour: u32,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let purge = env::var("SESSION_PURGE_UTC").unwrap_or_else(|_| "04:00".to_string());
        let session_purge_at = NaiveTime::parse_from_str(&purge, "%H:%M").map_err(|e| {
            AppError::Internal(format!("SESSION_PURGE_UTC must be HH:MM: {}", e))
        })?;

        let business = BusinessHours {
            utc_offset_hours: parsed("BUSINESS_UTC_OFFSET_HOURS", -4)?,
            open_hour: parsed("BUSINESS_OPEN_HOUR", 7)?,
            close_hour: parsed("BUSINESS_CLOSE_HOUR", 19)?,
        };
        business.offset()?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_hours: parsed("JWT_EXPIRATION_HOURS", 24)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: parsed("SERVER_PORT", 3000)?,
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
            rates: RateSettings {
                primary_url: env::var("RATE_PRIMARY_URL")
                    .unwrap_or_else(|_| "https://open.er-api.com/v6/latest/USD".to_string()),
                backup_url: env::var("RATE_BACKUP_URL")
                    .unwrap_or_else(|_| "https://ve.dolarapi.com/v1/dolares/oficial".to_string()),
                currency: env::var("RATE_CURRENCY").unwrap_or_else(|_| "VES".to_string()),
                fallback_rate: parsed("RATE_FALLBACK", 36.5)?,
                cache_path: env::var("RATE_CACHE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("exchange_rate_cache.json")),
                refresh_interval: Duration::from_secs(60 * parsed("RATE_REFRESH_MINUTES", 30u64)?),
                request_timeout: Duration::from_secs(parsed("RATE_TIMEOUT_SECS", 10u64)?),
            },
            business,
            session_purge_at,
            plate_lookup_debounce: Duration::from_millis(parsed("PLATE_LOOKUP_DEBOUNCE_MS", 800u64)?),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn required(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Internal(format!("{} must be set", name)))
}

fn parsed<T: FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Internal(format!("{} must be a valid number", name))),
        Err(_) => Ok(default),
    }
}

impl BusinessHours {
    pub fn offset(&self) -> AppResult<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            AppError::Internal(format!("invalid UTC offset: {}", self.utc_offset_hours))
        })
    }

    /// Whether `now` falls inside `[open_hour, close_hour)` local time.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let Ok(offset) = self.offset() else {
            return false;
        };
        let hour = now.with_timezone(&offset).hour();
        hour >= self.open_hour && hour < self.close_hour
    }

    /// The local calendar day `now` belongs to.
    pub fn local_date(&self, now: DateTime<Utc>) -> AppResult<NaiveDate> {
        Ok(now.with_timezone(&self.offset()?).date_naive())
    }

    /// UTC bounds `[start, end)` covering the local days `from..=to`.
    pub fn day_range(&self, from: NaiveDate, to: NaiveDate) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
        let offset = self.offset()?;
        let start = offset
            .from_local_datetime(&from.and_time(NaiveTime::MIN))
            .single()
            .ok_or_else(|| AppError::BadRequest(format!("Invalid date: {}", from)))?;
        let end_day = to
            .succ_opt()
            .ok_or_else(|| AppError::BadRequest(format!("Invalid date: {}", to)))?;
        let end = offset
            .from_local_datetime(&end_day.and_time(NaiveTime::MIN))
            .single()
            .ok_or_else(|| AppError::BadRequest(format!("Invalid date: {}", to)))?;
        Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)))
    }
}
