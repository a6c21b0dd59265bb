//! Domain Records
//! Mission: Typed rows for the agency database — no duck-typed maps anywhere

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Manifest entry: a pilgrim booked on a travel package.
///
/// `amount_paid` and `payment_status` are derived columns — the
/// reconciliation engine recomputes them from the payment history on every
/// payment mutation. Client input never writes them directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pilgrim {
    pub id: Uuid,
    pub name: String,
    pub passport_no: Option<String>,
    pub package_id: Option<String>,
    pub final_price: Decimal,
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
    pub status: PilgrimStatus,
    pub visa_status: Option<String>,
    pub equipment_status: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Derived payment state of a pilgrim, the three-band rule plus the
/// terminal refund state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    /// No verified payment yet ("Belum Lunas").
    #[serde(rename = "belum_lunas")]
    BelumLunas,
    /// Partial payment received ("DP/Cicil").
    #[serde(rename = "dp")]
    Dp,
    /// Fully paid ("Lunas").
    #[serde(rename = "lunas")]
    Lunas,
    /// Booking refunded; terminal.
    #[serde(rename = "refund")]
    Refund,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::BelumLunas => "belum_lunas",
            PaymentStatus::Dp => "dp",
            PaymentStatus::Lunas => "lunas",
            PaymentStatus::Refund => "refund",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "belum_lunas" => Some(PaymentStatus::BelumLunas),
            "dp" => Some(PaymentStatus::Dp),
            "lunas" => Some(PaymentStatus::Lunas),
            "refund" => Some(PaymentStatus::Refund),
            _ => None,
        }
    }
}

/// Booking state of a pilgrim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PilgrimStatus {
    #[serde(rename = "active")]
    Active,
    /// Cancelled without refund.
    #[serde(rename = "batal")]
    Batal,
    #[serde(rename = "refund")]
    Refund,
}

impl PilgrimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PilgrimStatus::Active => "active",
            PilgrimStatus::Batal => "batal",
            PilgrimStatus::Refund => "refund",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(PilgrimStatus::Active),
            "batal" => Some(PilgrimStatus::Batal),
            "refund" => Some(PilgrimStatus::Refund),
            _ => None,
        }
    }
}

/// The three-band rule: payment status as a pure function of the verified
/// total against the agreed price. Refund is never produced here — it is a
/// terminal state set only by the refund workflow.
pub fn payment_status_for(amount_paid: Decimal, final_price: Decimal) -> PaymentStatus {
    if amount_paid <= Decimal::ZERO {
        PaymentStatus::BelumLunas
    } else if amount_paid < final_price {
        PaymentStatus::Dp
    } else {
        PaymentStatus::Lunas
    }
}

/// One installment payment by a pilgrim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub pilgrim_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: Option<String>,
    pub state: PaymentState,
    /// Opaque reference produced by the external media store.
    pub proof_url: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
}

/// Verification state of a single payment record. Only verified payments
/// count toward a pilgrim's balance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentState {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "verified")]
    Verified,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Verified => "verified",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(PaymentState::Pending),
            "verified" => Some(PaymentState::Verified),
            _ => None,
        }
    }
}

/// Office ledger ("buku besar") entry. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub entry_type: LedgerType,
    pub amount: Decimal,
    pub description: String,
    /// Non-owning back-reference for traceability, not ownership.
    pub pilgrim_id: Option<Uuid>,
    pub user_id: Option<String>,
    pub entry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Closed set of ledger entry kinds. Income and Refund rows are written
/// only by internal triggers (payment ingestion, refund workflow); staff
/// data entry is limited to [`LedgerType::MANUAL`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LedgerType {
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "salary")]
    Salary,
    #[serde(rename = "advance")]
    Advance,
    #[serde(rename = "operational")]
    Operational,
    #[serde(rename = "refund")]
    Refund,
}

impl LedgerType {
    /// Types staff may record by hand.
    pub const MANUAL: &'static [LedgerType] =
        &[LedgerType::Salary, LedgerType::Advance, LedgerType::Operational];

    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerType::Income => "income",
            LedgerType::Salary => "salary",
            LedgerType::Advance => "advance",
            LedgerType::Operational => "operational",
            LedgerType::Refund => "refund",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(LedgerType::Income),
            "salary" => Some(LedgerType::Salary),
            "advance" => Some(LedgerType::Advance),
            "operational" => Some(LedgerType::Operational),
            "refund" => Some(LedgerType::Refund),
            _ => None,
        }
    }

    pub fn is_manual(&self) -> bool {
        Self::MANUAL.contains(self)
    }

    /// Income is the only inflow; everything else counts against cash.
    pub fn is_inflow(&self) -> bool {
        matches!(self, LedgerType::Income)
    }
}

/// Append-only audit trail row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub actor_id: String,
    pub action: String,
    pub object_id: Option<String>,
    pub detail: String,
    pub ip: Option<String>,
    pub created_at: DateTime<Utc>,
}
