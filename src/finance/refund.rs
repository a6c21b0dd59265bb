//! Refund / Cancellation Workflow
//! Mission: Terminal state flip plus the mirrored ledger expense
//!
//! The refund amount is supplied by the administrator — it is independent
//! of the sum of prior payments, which stay untouched as history.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::auth::{authorize, ActorContext, ADMIN_TIER};
use crate::error::ServiceError;
use crate::models::{LedgerEntry, LedgerType, PaymentStatus};
use crate::store::{ledger, pilgrims};

use super::FinanceEngine;

impl FinanceEngine {
    /// Cancel a pilgrim's booking: status and payment_status become Refund
    /// (terminal) and the outflow lands in the ledger, atomically.
    pub fn process_refund(
        &self,
        actor: &ActorContext,
        pilgrim_id: Uuid,
        amount: Decimal,
        notes: Option<String>,
    ) -> Result<LedgerEntry, ServiceError> {
        authorize(actor, ADMIN_TIER)?;
        if amount <= Decimal::ZERO {
            return Err(ServiceError::invalid("Refund amount must be positive"));
        }

        let entry = self.db.with_tx(|tx| {
            let pilgrim = pilgrims::get(tx, pilgrim_id)?;
            if pilgrim.payment_status == PaymentStatus::Refund {
                return Err(ServiceError::invalid(format!(
                    "Pilgrim {} is already refunded",
                    pilgrim_id
                )));
            }

            pilgrims::mark_refunded(tx, pilgrim_id)?;

            let description = match &notes {
                Some(notes) => format!("Refund jamaah {} — {}", pilgrim.name, notes),
                None => format!("Refund jamaah {}", pilgrim.name),
            };
            ledger::append(
                tx,
                LedgerType::Refund,
                amount,
                &description,
                Some(pilgrim_id),
                None,
                Utc::now().date_naive(),
            )
        })?;

        info!(pilgrim = %pilgrim_id, amount = %amount, "↩️ Refund processed");
        self.audit.emit(
            actor,
            "pilgrim.refund",
            Some(pilgrim_id.to_string()),
            format!("amount {}", amount),
        );

        Ok(entry)
    }
}
