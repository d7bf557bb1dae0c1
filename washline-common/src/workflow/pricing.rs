//! Service pricing
//!
//! Prices are integer cents. A service costs its weight times the hotel rate;
//! delivery sub-services carry the parent price prorated by bags.

use crate::{Error, Result};

pub fn calculate_price(weight_kg: f64, price_per_kg_cents: i64) -> Result<i64> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "Weight must be a positive number of kilograms, got {}",
            weight_kg
        )));
    }
    if price_per_kg_cents < 0 {
        return Err(Error::InvalidInput(format!(
            "Price per kg cannot be negative, got {}",
            price_per_kg_cents
        )));
    }
    Ok((weight_kg * price_per_kg_cents as f64).round() as i64)
}

/// Share of `total_cents` attributable to `bags` out of `bag_count`
pub fn prorate(total_cents: i64, bags: u32, bag_count: u32) -> i64 {
    if bag_count == 0 {
        return 0;
    }
    (total_cents as f64 * bags as f64 / bag_count as f64).round() as i64
}

/// Price of a delivery batch of `batch` bags following `delivered_before` earlier ones
///
/// Rounds the running total rather than each batch, so batch prices are
/// never negative and all batches of a service sum to `total_cents`.
pub fn prorate_batch(total_cents: i64, delivered_before: u32, batch: u32, bag_count: u32) -> i64 {
    prorate(total_cents, delivered_before + batch, bag_count)
        - prorate(total_cents, delivered_before, bag_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_is_weight_times_rate() {
        assert_eq!(calculate_price(4.0, 350).unwrap(), 1400);
        assert_eq!(calculate_price(1.5, 333).unwrap(), 500); // 499.5 rounds half away from zero
        assert_eq!(calculate_price(1.0, 0).unwrap(), 0);
    }

    #[test]
    fn test_price_rejects_bad_weight() {
        assert!(calculate_price(0.0, 350).is_err());
        assert!(calculate_price(-1.0, 350).is_err());
        assert!(calculate_price(f64::NAN, 350).is_err());
        assert!(calculate_price(f64::INFINITY, 350).is_err());
    }

    #[test]
    fn test_price_rejects_negative_rate() {
        assert!(calculate_price(1.0, -5).is_err());
    }

    #[test]
    fn test_prorate() {
        assert_eq!(prorate(1000, 1, 4), 250);
        assert_eq!(prorate(1000, 1, 3), 333);
        assert_eq!(prorate(1000, 2, 3), 667);
        assert_eq!(prorate(1000, 3, 3), 1000);
        assert_eq!(prorate(1000, 1, 0), 0);
    }

    #[test]
    fn test_prorate_batch_sums_to_total() {
        // 7 cents over 10 bags delivered one at a time
        let prices: Vec<i64> = (0..10).map(|before| prorate_batch(7, before, 1, 10)).collect();
        assert!(prices.iter().all(|&p| p >= 0), "negative batch price in {:?}", prices);
        assert_eq!(prices.iter().sum::<i64>(), 7);

        assert_eq!(prorate_batch(1000, 0, 1, 3), 333);
        assert_eq!(prorate_batch(1000, 1, 1, 3), 334);
        assert_eq!(prorate_batch(1000, 2, 1, 3), 333);
        assert_eq!(prorate_batch(700, 1, 3, 4), 525);
    }
}
