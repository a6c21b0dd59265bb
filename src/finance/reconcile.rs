//! Balance Reconciliation
//! Mission: amount_paid and payment_status always match the payment history
//!
//! The paid total is recomputed from scratch — summed over the pilgrim's
//! verified payment records — never accumulated incrementally. The verified
//! filter is applied uniformly to every ingestion path.

use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{payment_status_for, PaymentStatus};
use crate::store::{payments, pilgrims};

use super::FinanceEngine;

/// Recompute and persist one pilgrim's balance. Runs inside the caller's
/// transaction so it reads the full committed payment set and writes the
/// pilgrim row without interleaving with another mutation.
///
/// A refunded pilgrim keeps `PaymentStatus::Refund` — terminal state — but
/// the stored `amount_paid` still tracks the verified sum.
pub fn recompute_in_tx(
    conn: &Connection,
    pilgrim_id: Uuid,
) -> Result<(Decimal, PaymentStatus), ServiceError> {
    let pilgrim = pilgrims::get(conn, pilgrim_id)?;
    let total = payments::verified_total(conn, pilgrim_id)?;

    let status = if pilgrim.payment_status == PaymentStatus::Refund {
        PaymentStatus::Refund
    } else {
        payment_status_for(total, pilgrim.final_price)
    };

    pilgrims::update_balance(conn, pilgrim_id, total, status)?;
    debug!(
        pilgrim = %pilgrim_id,
        amount_paid = %total,
        status = status.as_str(),
        "Balance reconciled"
    );

    Ok((total, status))
}

impl FinanceEngine {
    /// Standalone recompute, e.g. after a corrected price. Idempotent.
    pub fn recompute(&self, pilgrim_id: Uuid) -> Result<(Decimal, PaymentStatus), ServiceError> {
        self.db.with_tx(|tx| recompute_in_tx(tx, pilgrim_id))
    }
}
