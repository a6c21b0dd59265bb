//! Alhijrah Backend Library
//!
//! Business-management backend for a pilgrimage travel agency. The core is
//! the finance-and-payment reconciliation subsystem: payment records drive
//! a derived per-pilgrim balance, confirmed money mirrors into the
//! append-only office ledger, and every mutation is permission-gated and
//! audit-logged.

pub mod api;
pub mod audit;
pub mod auth;
pub mod error;
pub mod finance;
pub mod models;
pub mod store;
