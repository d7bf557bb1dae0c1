//! Bag-level delivery accounting
//!
//! Bags are numbered `1..=bag_count`. A service's delivered set is the union
//! of the bags carried by each of its delivery sub-services.

use crate::{Error, Result};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagLedger {
    bag_count: u32,
    delivered: BTreeSet<u32>,
}

impl BagLedger {
    pub fn new(bag_count: u32) -> Self {
        Self {
            bag_count,
            delivered: BTreeSet::new(),
        }
    }

    /// Rebuild a ledger from bags already delivered
    ///
    /// Fails if any stored bag number is out of range.
    pub fn with_delivered<I>(bag_count: u32, delivered: I) -> Result<Self>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut ledger = Self::new(bag_count);
        for bag in delivered {
            ledger.check_range(bag)?;
            ledger.delivered.insert(bag);
        }
        Ok(ledger)
    }

    /// Mark `bags` as delivered
    ///
    /// Returns the newly delivered bags in ascending order. The ledger is left
    /// untouched when any bag is rejected.
    pub fn record_delivery(&mut self, bags: &[u32]) -> Result<Vec<u32>> {
        if bags.is_empty() {
            return Err(Error::InvalidInput(
                "At least one bag must be selected for delivery".to_string(),
            ));
        }

        let mut batch = BTreeSet::new();
        for &bag in bags {
            self.check_range(bag)?;
            if !batch.insert(bag) {
                return Err(Error::InvalidInput(format!(
                    "Bag {} selected more than once",
                    bag
                )));
            }
            if self.delivered.contains(&bag) {
                return Err(Error::InvalidInput(format!(
                    "Bag {} was already delivered",
                    bag
                )));
            }
        }

        self.delivered.extend(batch.iter().copied());
        Ok(batch.into_iter().collect())
    }

    /// Deliver every bag still outstanding, returning them
    pub fn deliver_remaining(&mut self) -> Vec<u32> {
        let remaining = self.remaining_bags();
        self.delivered.extend(remaining.iter().copied());
        remaining
    }

    fn check_range(&self, bag: u32) -> Result<()> {
        if bag == 0 || bag > self.bag_count {
            return Err(Error::InvalidInput(format!(
                "Bag {} is out of range (service has {} bags)",
                bag, self.bag_count
            )));
        }
        Ok(())
    }

    pub fn bag_count(&self) -> u32 {
        self.bag_count
    }

    pub fn delivered_bags(&self) -> Vec<u32> {
        self.delivered.iter().copied().collect()
    }

    pub fn remaining_bags(&self) -> Vec<u32> {
        (1..=self.bag_count)
            .filter(|bag| !self.delivered.contains(bag))
            .collect()
    }

    pub fn delivered_count(&self) -> u32 {
        self.delivered.len() as u32
    }

    pub fn remaining_count(&self) -> u32 {
        self.bag_count - self.delivered_count()
    }

    pub fn is_complete(&self) -> bool {
        self.bag_count > 0 && self.remaining_count() == 0
    }

    /// Delivered share rounded to a whole percent
    pub fn percentage(&self) -> u8 {
        if self.bag_count == 0 {
            return 0;
        }
        let pct = (self.delivered_count() as f64 / self.bag_count as f64) * 100.0;
        pct.round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ledger_has_everything_remaining() {
        let ledger = BagLedger::new(4);
        assert_eq!(ledger.remaining_bags(), vec![1, 2, 3, 4]);
        assert_eq!(ledger.delivered_count(), 0);
        assert_eq!(ledger.percentage(), 0);
        assert!(!ledger.is_complete());
    }

    #[test]
    fn test_partial_then_final_delivery() {
        let mut ledger = BagLedger::new(5);

        let first = ledger.record_delivery(&[3, 1]).unwrap();
        assert_eq!(first, vec![1, 3]);
        assert_eq!(ledger.remaining_bags(), vec![2, 4, 5]);
        assert_eq!(ledger.percentage(), 40);

        let second = ledger.record_delivery(&[5, 2, 4]).unwrap();
        assert_eq!(second, vec![2, 4, 5]);
        assert!(ledger.is_complete());
        assert_eq!(ledger.percentage(), 100);
        assert_eq!(ledger.remaining_count(), 0);
    }

    #[test]
    fn test_percentage_rounds() {
        let mut ledger = BagLedger::new(3);
        ledger.record_delivery(&[1]).unwrap();
        assert_eq!(ledger.percentage(), 33);
        ledger.record_delivery(&[2]).unwrap();
        assert_eq!(ledger.percentage(), 67);
    }

    #[test]
    fn test_rejects_already_delivered_bag_without_side_effects() {
        let mut ledger = BagLedger::new(4);
        ledger.record_delivery(&[2]).unwrap();

        let err = ledger.record_delivery(&[3, 2]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("already delivered")));
        // Bag 3 must not have been recorded by the failed call
        assert_eq!(ledger.delivered_bags(), vec![2]);
    }

    #[test]
    fn test_rejects_out_of_range_and_duplicates() {
        let mut ledger = BagLedger::new(2);
        assert!(ledger.record_delivery(&[0]).is_err());
        assert!(ledger.record_delivery(&[3]).is_err());
        assert!(ledger.record_delivery(&[1, 1]).is_err());
        assert!(ledger.record_delivery(&[]).is_err());
        assert_eq!(ledger.delivered_count(), 0);
    }

    #[test]
    fn test_deliver_remaining() {
        let mut ledger = BagLedger::with_delivered(4, [1, 4]).unwrap();
        assert_eq!(ledger.deliver_remaining(), vec![2, 3]);
        assert!(ledger.is_complete());
        assert!(ledger.deliver_remaining().is_empty());
    }

    #[test]
    fn test_with_delivered_is_a_union() {
        // Two sub-services reporting overlapping bags collapse into one set
        let ledger = BagLedger::with_delivered(6, [1, 2, 2, 5]).unwrap();
        assert_eq!(ledger.delivered_bags(), vec![1, 2, 5]);
        assert!(BagLedger::with_delivered(2, [7]).is_err());
    }

    #[test]
    fn test_empty_service_is_never_complete() {
        let ledger = BagLedger::new(0);
        assert!(!ledger.is_complete());
        assert_eq!(ledger.percentage(), 0);
    }
}
