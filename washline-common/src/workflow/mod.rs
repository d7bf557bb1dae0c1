//! Service status workflow
//!
//! Pure rules behind the laundry lifecycle: which status changes are legal,
//! how delivered bags are accounted for across partial deliveries, how a
//! service is priced and how bag labels are coded. Persistence lives in the
//! server crate; nothing here touches the database.

mod bags;
mod labels;
mod pricing;
mod transitions;

pub use bags::BagLedger;
pub use labels::label_code;
pub use pricing::{calculate_price, prorate, prorate_batch};
pub use transitions::{can_transition, valid_transitions, validate_transition};
