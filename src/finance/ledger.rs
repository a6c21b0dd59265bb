//! Ledger Posting
//! Mission: Append-only money movement, manual entry limited to its lane
//!
//! Income and Refund rows are reachable only through payment ingestion and
//! the refund workflow. The manual entry point enforces the type
//! restriction before any role consideration — even an owner cannot hand-
//! write an Income row.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::auth::{authorize, ActorContext, FINANCE_TIER};
use crate::error::ServiceError;
use crate::models::{LedgerEntry, LedgerType};
use crate::store::ledger;

use super::FinanceEngine;

/// Input for a staff-recorded ledger entry.
#[derive(Debug, Clone)]
pub struct ManualEntry {
    pub entry_type: LedgerType,
    pub amount: Decimal,
    pub description: String,
    /// Staff member a salary/advance entry is tied to.
    pub user_id: Option<String>,
    pub entry_date: Option<NaiveDate>,
}

impl FinanceEngine {
    /// Staff-facing "record entry". Business rule before role check:
    /// only Salary, Advance and Operational are allowed here.
    pub fn post_manual_entry(
        &self,
        actor: &ActorContext,
        entry: ManualEntry,
    ) -> Result<LedgerEntry, ServiceError> {
        if !entry.entry_type.is_manual() {
            return Err(ServiceError::invalid(format!(
                "Ledger type '{}' cannot be recorded manually",
                entry.entry_type.as_str()
            )));
        }
        authorize(actor, FINANCE_TIER)?;
        if entry.amount <= Decimal::ZERO {
            return Err(ServiceError::invalid("Ledger amount must be positive"));
        }

        let row = self.db.with_tx(|tx| {
            ledger::append(
                tx,
                entry.entry_type,
                entry.amount,
                &entry.description,
                None,
                entry.user_id.as_deref(),
                entry.entry_date.unwrap_or_else(|| Utc::now().date_naive()),
            )
        })?;

        info!(
            entry = row.id,
            entry_type = row.entry_type.as_str(),
            amount = %row.amount,
            "🧾 Ledger entry recorded"
        );
        self.audit.emit(
            actor,
            "ledger.create",
            Some(row.id.to_string()),
            format!("{} {}", row.entry_type.as_str(), row.amount),
        );

        Ok(row)
    }

    /// Full ledger listing, newest first.
    pub fn list_ledger(&self, actor: &ActorContext) -> Result<Vec<LedgerEntry>, ServiceError> {
        authorize(actor, FINANCE_TIER)?;
        self.db.with_conn(ledger::list)
    }

    /// Derived net cash position: income minus every outflow type.
    pub fn net_position(&self, actor: &ActorContext) -> Result<Decimal, ServiceError> {
        authorize(actor, FINANCE_TIER)?;
        self.db.with_conn(ledger::net_position)
    }
}
