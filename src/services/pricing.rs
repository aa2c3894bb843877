use serde::Serialize;

use crate::utils::money::round_cents;

/// Dual-currency price of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub base_usd: f64,
    pub extras_usd: f64,
    pub total_usd: f64,
    pub total_local: Option<f64>,
    pub exchange_rate: Option<f64>,
}

/// Service price plus every selected extra. Without a service there is nothing
/// to charge, so extras alone add up to zero.
pub fn total_usd(service_price: Option<f64>, extras: &[f64]) -> f64 {
    match service_price {
        Some(base) => round_cents(base + extras.iter().sum::<f64>()),
        None => 0.0,
    }
}

pub fn total_local(total_usd: f64, rate: Option<f64>) -> Option<f64> {
    rate.map(|r| round_cents(total_usd * r))
}

pub fn quote(service_price: Option<f64>, extras: &[f64], rate: Option<f64>) -> PriceBreakdown {
    let total = total_usd(service_price, extras);
    let extras_usd = if service_price.is_some() {
        round_cents(extras.iter().sum())
    } else {
        0.0
    };

    PriceBreakdown {
        base_usd: service_price.unwrap_or(0.0),
        extras_usd,
        total_usd: total,
        total_local: total_local(total, rate),
        exchange_rate: rate,
    }
}
