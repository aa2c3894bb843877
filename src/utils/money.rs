/// Round an amount to cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Exchange rates keep four decimals.
pub fn round_rate(rate: f64) -> f64 {
    (rate * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_cents(219.004), 219.0);
        assert_eq!(round_cents(10.125), 10.13);
        assert_eq!(round_rate(36.123456), 36.1235);
    }
}
