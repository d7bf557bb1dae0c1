//! Enumerated model fields and their storage names

use serde::{Deserialize, Serialize};
use std::fmt;

/// Laundry service lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    /// Created, waiting for the collector to pick the bags up
    PendingPickup,
    /// Bags collected and weighed
    PickedUp,
    /// Every bag carries a label
    Labeled,
    /// Washing in progress
    InProcess,
    /// Some bags delivered, others still pending
    PartialDelivery,
    /// All bags processed and waiting to go out
    ReadyForDelivery,
    /// All bags delivered
    Completed,
    /// Cancelled before processing started
    Cancelled,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 8] = [
        ServiceStatus::PendingPickup,
        ServiceStatus::PickedUp,
        ServiceStatus::Labeled,
        ServiceStatus::InProcess,
        ServiceStatus::PartialDelivery,
        ServiceStatus::ReadyForDelivery,
        ServiceStatus::Completed,
        ServiceStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingPickup => "PENDING_PICKUP",
            Self::PickedUp => "PICKED_UP",
            Self::Labeled => "LABELED",
            Self::InProcess => "IN_PROCESS",
            Self::PartialDelivery => "PARTIAL_DELIVERY",
            Self::ReadyForDelivery => "READY_FOR_DELIVERY",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// No outgoing transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServicePriority {
    #[default]
    Normal,
    High,
    Urgent,
}

impl ServicePriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NORMAL" => Some(Self::Normal),
            "HIGH" => Some(Self::High),
            "URGENT" => Some(Self::Urgent),
            _ => None,
        }
    }
}

/// Physical state of a single labelled bag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LabelStatus {
    Labeled,
    Processing,
    Delivered,
}

impl LabelStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Labeled => "LABELED",
            Self::Processing => "PROCESSING",
            Self::Delivered => "DELIVERED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LABELED" => Some(Self::Labeled),
            "PROCESSING" => Some(Self::Processing),
            "DELIVERED" => Some(Self::Delivered),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "INCOME" => Some(Self::Income),
            "EXPENSE" => Some(Self::Expense),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    /// Charged to the hotel account
    Credit,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Card => "CARD",
            Self::Transfer => "TRANSFER",
            Self::Credit => "CREDIT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CASH" => Some(Self::Cash),
            "CARD" => Some(Self::Card),
            "TRANSFER" => Some(Self::Transfer),
            "CREDIT" => Some(Self::Credit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_storage_names_parse_back() {
        for status in ServiceStatus::ALL {
            assert_eq!(ServiceStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ServiceStatus::parse("pending_pickup"), None);
    }

    #[test]
    fn test_status_serde_matches_storage_name() {
        let json = serde_json::to_string(&ServiceStatus::ReadyForDelivery).unwrap();
        assert_eq!(json, "\"READY_FOR_DELIVERY\"");
        let parsed: ServiceStatus = serde_json::from_str("\"PARTIAL_DELIVERY\"").unwrap();
        assert_eq!(parsed, ServiceStatus::PartialDelivery);
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = ServiceStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![ServiceStatus::Completed, ServiceStatus::Cancelled]);
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!(PaymentMethod::parse("CREDIT"), Some(PaymentMethod::Credit));
        assert_eq!(PaymentMethod::parse("BITCOIN"), None);
    }
}
