//! Audit Trail Emitter
//! Mission: Best-effort traceability that never blocks a mutation
//!
//! Mutations emit onto a bounded channel; a background drain task appends
//! rows to the audit table. A full channel drops the entry with a warning
//! rather than failing or slowing the primary operation.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::auth::ActorContext;
use crate::store::audit::NewAuditEntry;
use crate::store::Database;

const CHANNEL_CAPACITY: usize = 1024;

/// Handle for emitting audit entries. Cheap to clone.
#[derive(Clone)]
pub struct AuditLogger {
    tx: Option<mpsc::Sender<NewAuditEntry>>,
}

impl AuditLogger {
    /// Start the drain task and return the emitter handle.
    pub fn spawn(db: Database) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<NewAuditEntry>(CHANNEL_CAPACITY);

        let handle = tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                let result = db.with_conn(|conn| crate::store::audit::append(conn, &entry));
                if let Err(e) = result {
                    warn!("Audit append failed ({} {}): {}", entry.actor_id, entry.action, e);
                }
            }
            debug!("Audit drain task stopped");
        });

        (Self { tx: Some(tx) }, handle)
    }

    /// Emitter that discards everything. For unit tests of the engine.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Record a mutation. Best effort: a full queue drops the entry.
    pub fn emit(
        &self,
        actor: &ActorContext,
        action: &str,
        object_id: Option<String>,
        detail: impl Into<String>,
    ) {
        let Some(tx) = &self.tx else {
            return;
        };

        let entry = NewAuditEntry {
            actor_id: actor.id.clone(),
            action: action.to_string(),
            object_id,
            detail: detail.into(),
            ip: actor.ip.clone(),
        };

        if let Err(e) = tx.try_send(entry) {
            warn!("Audit entry dropped (queue full or closed): {}", e);
        }
    }
}
