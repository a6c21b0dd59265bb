//! Payment Ingestion
//! Mission: Validate, persist, reconcile, post income — atomically
//!
//! Income is posted to the ledger at the moment a payment becomes verified
//! (on creation for already-verified records, or on the pending→verified
//! flip during an update). Ledger income therefore tracks verified inflow;
//! deletes do not write reversal rows, the ledger stays append-only.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::auth::{authorize, ActorContext, STAFF_TIER};
use crate::error::ServiceError;
use crate::models::{LedgerType, PaymentRecord, PaymentState, PaymentStatus, Pilgrim};
use crate::store::{ledger, payments, pilgrims};

use super::reconcile::recompute_in_tx;
use super::FinanceEngine;

/// Input for recording one installment payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub pilgrim_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: Option<String>,
    /// Defaults to verified; staff may record an unconfirmed transfer as
    /// pending and flip it later.
    pub state: Option<PaymentState>,
    pub proof_url: Option<String>,
    pub notes: Option<String>,
}

/// Partial correction of an existing payment record.
#[derive(Debug, Clone, Default)]
pub struct PaymentPatch {
    pub amount: Option<Decimal>,
    pub payment_date: Option<NaiveDate>,
    pub method: Option<String>,
    pub state: Option<PaymentState>,
    pub proof_url: Option<String>,
    pub notes: Option<String>,
}

fn require_positive(amount: Decimal) -> Result<(), ServiceError> {
    if amount <= Decimal::ZERO {
        return Err(ServiceError::invalid("Payment amount must be positive"));
    }
    Ok(())
}

fn require_not_refunded(pilgrim: &Pilgrim) -> Result<(), ServiceError> {
    if pilgrim.payment_status == PaymentStatus::Refund {
        return Err(ServiceError::invalid(format!(
            "Pilgrim {} is refunded; payment records are frozen",
            pilgrim.id
        )));
    }
    Ok(())
}

fn post_income(
    conn: &rusqlite::Connection,
    pilgrim: &Pilgrim,
    record: &PaymentRecord,
) -> Result<(), ServiceError> {
    ledger::append(
        conn,
        LedgerType::Income,
        record.amount,
        &format!("Pembayaran jamaah {}", pilgrim.name),
        Some(pilgrim.id),
        None,
        record.payment_date,
    )?;
    Ok(())
}

impl FinanceEngine {
    /// Record a payment, reconcile the pilgrim and post the income row in
    /// one transaction. Returns the record and the post-reconciliation
    /// payment status.
    pub fn add_payment(
        &self,
        actor: &ActorContext,
        new: NewPayment,
    ) -> Result<(PaymentRecord, PaymentStatus), ServiceError> {
        authorize(actor, STAFF_TIER)?;
        require_positive(new.amount)?;

        let record = PaymentRecord {
            id: Uuid::new_v4(),
            pilgrim_id: new.pilgrim_id,
            amount: new.amount,
            payment_date: new.payment_date,
            method: new.method,
            state: new.state.unwrap_or(PaymentState::Verified),
            proof_url: new.proof_url,
            notes: new.notes,
            recorded_by: actor.id.clone(),
            created_at: Utc::now(),
        };

        let (record, status) = self.db.with_tx(|tx| {
            let pilgrim = pilgrims::get(tx, record.pilgrim_id)?;
            require_not_refunded(&pilgrim)?;

            payments::insert(tx, &record)?;
            let (_, status) = recompute_in_tx(tx, record.pilgrim_id)?;

            if record.state == PaymentState::Verified {
                post_income(tx, &pilgrim, &record)?;
            }

            Ok((record, status))
        })?;

        info!(
            payment = %record.id,
            pilgrim = %record.pilgrim_id,
            amount = %record.amount,
            status = status.as_str(),
            "💰 Payment recorded"
        );
        self.audit.emit(
            actor,
            "payment.create",
            Some(record.id.to_string()),
            format!("pilgrim {} amount {}", record.pilgrim_id, record.amount),
        );

        Ok((record, status))
    }

    /// Correct an existing payment record. The owning pilgrim is always
    /// reconciled afterwards; a pending record flipped to verified posts
    /// its income row at that moment.
    pub fn update_payment(
        &self,
        actor: &ActorContext,
        id: Uuid,
        patch: PaymentPatch,
    ) -> Result<(PaymentRecord, PaymentStatus), ServiceError> {
        authorize(actor, STAFF_TIER)?;
        if let Some(amount) = patch.amount {
            require_positive(amount)?;
        }

        let (record, status) = self.db.with_tx(|tx| {
            let existing = payments::get(tx, id)?;
            let pilgrim = pilgrims::get(tx, existing.pilgrim_id)?;
            require_not_refunded(&pilgrim)?;

            let was_verified = existing.state == PaymentState::Verified;
            let updated = PaymentRecord {
                amount: patch.amount.unwrap_or(existing.amount),
                payment_date: patch.payment_date.unwrap_or(existing.payment_date),
                method: patch.method.or(existing.method),
                state: patch.state.unwrap_or(existing.state),
                proof_url: patch.proof_url.or(existing.proof_url),
                notes: patch.notes.or(existing.notes),
                ..existing
            };

            payments::update(tx, &updated)?;
            let (_, status) = recompute_in_tx(tx, updated.pilgrim_id)?;

            if !was_verified && updated.state == PaymentState::Verified {
                post_income(tx, &pilgrim, &updated)?;
            }

            Ok((updated, status))
        })?;

        info!(payment = %id, status = status.as_str(), "✏️ Payment updated");
        self.audit.emit(
            actor,
            "payment.update",
            Some(id.to_string()),
            format!("pilgrim {} amount {}", record.pilgrim_id, record.amount),
        );

        Ok((record, status))
    }

    /// Remove a payment record and reconcile the owner. The ledger keeps
    /// any income row the payment produced.
    pub fn delete_payment(
        &self,
        actor: &ActorContext,
        id: Uuid,
    ) -> Result<(PaymentRecord, PaymentStatus), ServiceError> {
        authorize(actor, STAFF_TIER)?;

        let (record, status) = self.db.with_tx(|tx| {
            let existing = payments::get(tx, id)?;
            let pilgrim = pilgrims::get(tx, existing.pilgrim_id)?;
            require_not_refunded(&pilgrim)?;

            let record = payments::delete(tx, id)?;
            let (_, status) = recompute_in_tx(tx, record.pilgrim_id)?;
            Ok((record, status))
        })?;

        info!(payment = %id, pilgrim = %record.pilgrim_id, "🗑️ Payment deleted");
        self.audit.emit(
            actor,
            "payment.delete",
            Some(id.to_string()),
            format!("pilgrim {} amount {}", record.pilgrim_id, record.amount),
        );

        Ok((record, status))
    }
}
