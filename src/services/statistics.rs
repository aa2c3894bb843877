use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;

use crate::entities::vehicle_record::{CarStatus, PaymentStatus};
use crate::entities::{
    category, expense, service, vehicle_record, vehicle_record_extra, vehicle_type,
};
use crate::error::AppResult;
use crate::utils::money::round_cents;

/// What statistics need to know about one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFacts {
    pub category: String,
    pub service: String,
    pub car_status: CarStatus,
    pub payment_status: PaymentStatus,
    pub total_usd: f64,
    pub total_local: Option<f64>,
    pub extras_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub name: String,
    pub count: u64,
    pub total_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: i64,
    pub vehicle_count: u64,
    pub total_usd: f64,
    pub total_local: f64,
    pub extras_usd: f64,
    pub by_car_status: BTreeMap<String, u64>,
    pub by_payment_status: BTreeMap<String, u64>,
    pub by_category: Vec<Breakdown>,
    pub by_service: Vec<Breakdown>,
    pub expenses_usd: f64,
    pub expenses_local: f64,
    pub vehicles_per_day: f64,
    pub revenue_usd_per_day: f64,
    pub average_ticket_usd: f64,
}

fn status_key<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn breakdown<'a>(rows: impl Iterator<Item = (&'a str, f64)>) -> Vec<Breakdown> {
    let mut grouped: BTreeMap<&str, (u64, f64)> = BTreeMap::new();
    for (name, usd) in rows {
        let entry = grouped.entry(name).or_default();
        entry.0 += 1;
        entry.1 += usd;
    }
    let mut out: Vec<Breakdown> = grouped
        .into_iter()
        .map(|(name, (count, total))| Breakdown {
            name: name.to_string(),
            count,
            total_usd: round_cents(total),
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    out
}

/// Fold records and `(usd, local)` expense pairs for the inclusive day range.
pub fn aggregate(
    from: NaiveDate,
    to: NaiveDate,
    records: &[RecordFacts],
    expenses: &[(f64, f64)],
) -> Statistics {
    let days = (to - from).num_days() + 1;
    let vehicle_count = records.len() as u64;
    let total_usd = round_cents(records.iter().map(|r| r.total_usd).sum());
    let total_local = round_cents(records.iter().filter_map(|r| r.total_local).sum());
    let extras_usd = round_cents(records.iter().map(|r| r.extras_usd).sum());

    let mut by_car_status = BTreeMap::new();
    let mut by_payment_status = BTreeMap::new();
    for r in records {
        *by_car_status.entry(status_key(&r.car_status)).or_insert(0) += 1;
        *by_payment_status.entry(status_key(&r.payment_status)).or_insert(0) += 1;
    }

    let per_day = |value: f64| {
        if days > 0 {
            round_cents(value / days as f64)
        } else {
            0.0
        }
    };

    Statistics {
        from,
        to,
        days,
        vehicle_count,
        total_usd,
        total_local,
        extras_usd,
        by_car_status,
        by_payment_status,
        by_category: breakdown(records.iter().map(|r| (r.category.as_str(), r.total_usd))),
        by_service: breakdown(records.iter().map(|r| (r.service.as_str(), r.total_usd))),
        expenses_usd: round_cents(expenses.iter().map(|e| e.0).sum()),
        expenses_local: round_cents(expenses.iter().map(|e| e.1).sum()),
        vehicles_per_day: per_day(vehicle_count as f64),
        revenue_usd_per_day: per_day(total_usd),
        average_ticket_usd: if vehicle_count > 0 {
            round_cents(total_usd / vehicle_count as f64)
        } else {
            0.0
        },
    }
}

/// Load records and expenses created in `[start, end)` and aggregate them.
pub async fn collect(
    db: &DatabaseConnection,
    from: NaiveDate,
    to: NaiveDate,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<Statistics> {
    let records = vehicle_record::Entity::find()
        .filter(vehicle_record::Column::CreatedAt.gte(start))
        .filter(vehicle_record::Column::CreatedAt.lt(end))
        .all(db)
        .await?;

    let record_ids: Vec<_> = records.iter().map(|r| r.id).collect();
    let mut extras_by_record: HashMap<uuid::Uuid, f64> = HashMap::new();
    if !record_ids.is_empty() {
        for row in vehicle_record_extra::Entity::find()
            .filter(vehicle_record_extra::Column::RecordId.is_in(record_ids))
            .all(db)
            .await?
        {
            *extras_by_record.entry(row.record_id).or_default() += row.price;
        }
    }

    let categories: HashMap<i32, String> = category::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let vehicle_types: HashMap<i32, i32> = vehicle_type::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|v| (v.id, v.category_id))
        .collect();
    let services: HashMap<i32, String> = service::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    let facts: Vec<RecordFacts> = records
        .into_iter()
        .map(|r| RecordFacts {
            category: vehicle_types
                .get(&r.vehicle_type_id)
                .and_then(|c| categories.get(c))
                .cloned()
                .unwrap_or_default(),
            service: services.get(&r.service_id).cloned().unwrap_or_default(),
            car_status: r.car_status,
            payment_status: r.payment_status,
            total_usd: r.total_usd,
            total_local: r.total_local,
            extras_usd: extras_by_record.get(&r.id).copied().unwrap_or(0.0),
        })
        .collect();

    let expenses: Vec<(f64, f64)> = expense::Entity::find()
        .filter(expense::Column::CreatedAt.gte(start))
        .filter(expense::Column::CreatedAt.lt(end))
        .all(db)
        .await?
        .into_iter()
        .map(|e| (e.amount_usd, e.amount_local))
        .collect();

    Ok(aggregate(from, to, &facts, &expenses))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(category: &str, service: &str, usd: f64, local: Option<f64>, paid: bool) -> RecordFacts {
        RecordFacts {
            category: category.to_string(),
            service: service.to_string(),
            car_status: CarStatus::Completed,
            payment_status: if paid {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Pending
            },
            total_usd: usd,
            total_local: local,
            extras_usd: usd - 6.0,
        }
    }

    #[test]
    fn aggregates_totals_and_rates() {
        let from = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let records = vec![
            fact("Sedan", "Sencillo Sedan", 6.0, Some(219.0), true),
            fact("Sedan", "Sencillo Sedan", 21.0, Some(766.5), true),
            fact("Camioneta", "Sencillo Camioneta", 8.0, None, false),
        ];

        let stats = aggregate(from, to, &records, &[(10.0, 365.0)]);

        assert_eq!(stats.days, 2);
        assert_eq!(stats.vehicle_count, 3);
        assert_eq!(stats.total_usd, 35.0);
        assert_eq!(stats.total_local, 985.5);
        assert_eq!(stats.vehicles_per_day, 1.5);
        assert_eq!(stats.revenue_usd_per_day, 17.5);
        assert_eq!(stats.average_ticket_usd, 11.67);
        assert_eq!(stats.expenses_local, 365.0);
        assert_eq!(stats.by_payment_status.get("paid"), Some(&2));
        assert_eq!(stats.by_payment_status.get("pending"), Some(&1));
        assert_eq!(stats.by_category[0].name, "Sedan");
        assert_eq!(stats.by_category[0].count, 2);
        assert_eq!(stats.by_category[0].total_usd, 27.0);
    }

    #[test]
    fn empty_range_has_zero_rates() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let stats = aggregate(day, day, &[], &[]);
        assert_eq!(stats.days, 1);
        assert_eq!(stats.vehicle_count, 0);
        assert_eq!(stats.average_ticket_usd, 0.0);
        assert!(stats.by_category.is_empty());
    }
}
