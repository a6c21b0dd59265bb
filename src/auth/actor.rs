//! Actor Roles & Permission Gate
//! Mission: Role-set membership checks in front of every mutation

use crate::error::ServiceError;
use serde::{Deserialize, Serialize};

/// Staff roles for RBAC. An actor usually holds exactly one, but the gate
/// works on role sets so a multi-role identity model upstream keeps working.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "owner")]
    Owner, // Full access including audit log
    #[serde(rename = "admin")]
    Admin, // Refunds, manifest deletion, all finance
    #[serde(rename = "finance")]
    Finance, // Ledger view + manual entries
    #[serde(rename = "staff")]
    Staff, // Ordinary payment data entry
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Finance => "finance",
            Role::Staff => "staff",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Some(Role::Owner),
            "admin" | "administrator" => Some(Role::Admin),
            "finance" => Some(Role::Finance),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }
}

/// Audit-log access.
pub const OWNER_TIER: &[Role] = &[Role::Owner];
/// Refunds and other sensitive operations.
pub const ADMIN_TIER: &[Role] = &[Role::Owner, Role::Admin];
/// Ledger view and manual ledger entries.
pub const FINANCE_TIER: &[Role] = &[Role::Owner, Role::Admin, Role::Finance];
/// Any authenticated employee.
pub const STAFF_TIER: &[Role] = &[Role::Owner, Role::Admin, Role::Finance, Role::Staff];

/// Resolved request actor, threaded explicitly through every engine call.
/// Never read from ambient global state.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub id: String,
    pub roles: Vec<Role>,
    /// Client IP as reported by the gateway, for the audit trail.
    pub ip: Option<String>,
}

impl ActorContext {
    pub fn new(id: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            id: id.into(),
            roles,
            ip: None,
        }
    }
}

/// Non-empty intersection between the actor's roles and `allowed` authorizes;
/// anything else is Forbidden with no side effects.
pub fn authorize(actor: &ActorContext, allowed: &[Role]) -> Result<(), ServiceError> {
    if actor.roles.iter().any(|r| allowed.contains(r)) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}
