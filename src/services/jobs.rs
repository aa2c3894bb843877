use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::BusinessHours;
use crate::entities::session;
use crate::error::AppResult;
use crate::services::exchange_rate::ExchangeRateProvider;

/// First instant strictly after `now` whose UTC wall clock reads `at`.
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub closed: u64,
    pub deleted: u64,
}

/// Deactivate every open session and drop the ones that already expired.
pub async fn close_all_sessions(db: &DatabaseConnection) -> AppResult<PurgeReport> {
    let closed = session::Entity::update_many()
        .col_expr(session::Column::Active, Expr::value(false))
        .filter(session::Column::Active.eq(true))
        .exec(db)
        .await?
        .rows_affected;

    let now: DateTime<chrono::FixedOffset> = Utc::now().into();
    let deleted = session::Entity::delete_many()
        .filter(session::Column::ExpiresAt.lt(now))
        .exec(db)
        .await?
        .rows_affected;

    Ok(PurgeReport { closed, deleted })
}

pub fn spawn_session_purge(db: DatabaseConnection, at: NaiveTime) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let wait = (next_run_after(now, at) - now)
                .to_std()
                .unwrap_or(Duration::from_secs(60));
            tokio::time::sleep(wait).await;

            match close_all_sessions(&db).await {
                Ok(report) => tracing::info!(
                    closed = report.closed,
                    deleted = report.deleted,
                    "daily session purge"
                ),
                Err(e) => tracing::error!("session purge failed: {}", e),
            }
        }
    })
}

/// Refresh the rate every `every`, but only during business hours.
pub fn spawn_rate_refresh(
    rates: Arc<ExchangeRateProvider>,
    hours: BusinessHours,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if !hours.contains(Utc::now()) {
                tracing::debug!("outside business hours, skipping rate refresh");
                continue;
            }
            let quote = rates.refresh().await;
            tracing::debug!(rate = quote.rate, origin = ?quote.origin, "scheduled rate refresh");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn four_am() -> NaiveTime {
        NaiveTime::from_hms_opt(4, 0, 0).unwrap()
    }

    #[test]
    fn runs_later_today_when_time_not_reached() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 1, 30, 0).unwrap();
        assert_eq!(
            next_run_after(now, four_am()),
            Utc.with_ymd_and_hms(2024, 5, 10, 4, 0, 0).unwrap()
        );
    }

    #[test]
    fn runs_tomorrow_once_time_passed() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 4, 0, 0).unwrap();
        assert_eq!(
            next_run_after(now, four_am()),
            Utc.with_ymd_and_hms(2024, 5, 11, 4, 0, 0).unwrap()
        );
        let evening = Utc.with_ymd_and_hms(2024, 5, 31, 22, 0, 0).unwrap();
        assert_eq!(
            next_run_after(evening, four_am()),
            Utc.with_ymd_and_hms(2024, 6, 1, 4, 0, 0).unwrap()
        );
    }
}
