//! The flat check view exposed to reconciliation consumers.

use crate::file::Detail;
use crate::money::Amount;
use chrono::NaiveDate;
use serde::Serialize;

/// One paper check, projected read-only out of a validated detail record
/// and its overflow records. Field names follow what the consumer cares
/// about rather than the wire format's vocabulary.
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    /// Name of the check's sender (the remitter)
    pub sender: String,

    /// Name of the check's recipient (the payee)
    pub recipient: String,

    /// Date written on the check
    pub date: NaiveDate,

    /// Check number
    pub number: u64,

    /// Face amount of the check
    pub amount: Amount,

    /// Memo text, concatenated from the overflow records; empty if none
    pub memo: String,

    /// Routing number of the bank the check originated from
    pub sender_routing_number: String,

    /// Account number the check originated from
    pub sender_account_number: String,
}

impl From<&Detail> for Check {
    fn from(detail: &Detail) -> Self {
        Check {
            sender: detail.record.remitter_name.clone(),
            recipient: detail.record.payee_name.clone(),
            date: detail.record.check_date,
            number: detail.record.check_number,
            amount: detail.record.check_amount,
            memo: detail.memo(),
            sender_routing_number: detail.record.transit_routing_number.clone(),
            sender_account_number: detail.record.dd_account_number.clone(),
        }
    }
}
