//! Status transition table

use crate::models::ServiceStatus;
use crate::{Error, Result};

use ServiceStatus::*;

/// Allowed next statuses for `from`
///
/// PARTIAL_DELIVERY may follow itself: each further batch of bags is another
/// partial delivery until the last bag goes out.
pub fn valid_transitions(from: ServiceStatus) -> &'static [ServiceStatus] {
    match from {
        PendingPickup => &[PickedUp, Cancelled],
        PickedUp => &[Labeled, Cancelled],
        Labeled => &[InProcess, Cancelled],
        InProcess => &[PartialDelivery, ReadyForDelivery, Completed],
        PartialDelivery => &[PartialDelivery, ReadyForDelivery, Completed],
        ReadyForDelivery => &[Completed],
        Completed | Cancelled => &[],
    }
}

pub fn can_transition(from: ServiceStatus, to: ServiceStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Reject a status change that is not in the transition table
pub fn validate_transition(from: ServiceStatus, to: ServiceStatus) -> Result<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(Error::InvalidTransition { from, to })
    }
}
