//! Audit trail rows. Append-only; read path is the owner-only log listing.

use chrono::Utc;
use rusqlite::{params, Connection, Row};

use crate::error::ServiceError;
use crate::models::AuditEntry;
use crate::store::parse_col;

fn map_row(row: &Row<'_>) -> rusqlite::Result<AuditEntry> {
    Ok(AuditEntry {
        id: row.get(0)?,
        actor_id: row.get(1)?,
        action: row.get(2)?,
        object_id: row.get(3)?,
        detail: row.get(4)?,
        ip: row.get(5)?,
        created_at: parse_col(row, 6)?,
    })
}

/// Fields of an audit entry before it has a row id or timestamp.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_id: String,
    pub action: String,
    pub object_id: Option<String>,
    pub detail: String,
    pub ip: Option<String>,
}

pub fn append(conn: &Connection, entry: &NewAuditEntry) -> Result<(), ServiceError> {
    conn.execute(
        "INSERT INTO audit_log (actor_id, action, object_id, detail, ip, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.actor_id,
            entry.action,
            entry.object_id,
            entry.detail,
            entry.ip,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// One page of audit entries, newest first, plus the total row count for
/// the pagination headers.
pub fn list_page(
    conn: &Connection,
    page: u32,
    per_page: u32,
) -> Result<(Vec<AuditEntry>, u64), ServiceError> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;

    let offset = (page.saturating_sub(1) as i64) * per_page as i64;
    let mut stmt = conn.prepare(
        "SELECT id, actor_id, action, object_id, detail, ip, created_at
         FROM audit_log ORDER BY id DESC LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt
        .query_map(params![per_page as i64, offset], map_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((rows, total as u64))
}
