//! Finance & Payment Reconciliation Engine
//! Mission: Money must reconcile — derived balances, append-only ledger,
//! permission-gated mutations
//!
//! Every payment mutation runs inside one database transaction that covers
//! the record write, the balance recompute, and any ledger posting, so the
//! three can never drift apart.

pub mod ingest;
pub mod ledger;
pub mod reconcile;
pub mod refund;

pub use ingest::{NewPayment, PaymentPatch};
pub use ledger::ManualEntry;

use crate::audit::AuditLogger;
use crate::store::Database;

/// The one entry point for every finance mutation. Handlers hold a clone
/// and pass the request actor explicitly into each call.
#[derive(Clone)]
pub struct FinanceEngine {
    pub(crate) db: Database,
    pub(crate) audit: AuditLogger,
}

impl FinanceEngine {
    pub fn new(db: Database, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}
