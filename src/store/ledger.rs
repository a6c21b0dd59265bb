//! Office ledger ("buku besar") rows. Append-only by construction: this
//! module exposes no update or delete, and the current balance is always a
//! derived aggregate, never a stored column.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{LedgerEntry, LedgerType};
use crate::store::{bad_enum_col, parse_col, parse_col_opt};

const COLUMNS: &str =
    "id, entry_type, amount, description, pilgrim_id, user_id, entry_date, created_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let type_raw: String = row.get(1)?;
    Ok(LedgerEntry {
        id: row.get(0)?,
        entry_type: LedgerType::from_str(&type_raw).ok_or_else(|| bad_enum_col(1, &type_raw))?,
        amount: parse_col(row, 2)?,
        description: row.get(3)?,
        pilgrim_id: parse_col_opt(row, 4)?,
        user_id: row.get(5)?,
        entry_date: parse_col(row, 6)?,
        created_at: parse_col(row, 7)?,
    })
}

/// Append one entry and return it with its assigned row id.
pub fn append(
    conn: &Connection,
    entry_type: LedgerType,
    amount: Decimal,
    description: &str,
    pilgrim_id: Option<Uuid>,
    user_id: Option<&str>,
    entry_date: NaiveDate,
) -> Result<LedgerEntry, ServiceError> {
    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO ledger (entry_type, amount, description, pilgrim_id, user_id,
                             entry_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry_type.as_str(),
            amount.to_string(),
            description,
            pilgrim_id.map(|id| id.to_string()),
            user_id,
            entry_date.to_string(),
            created_at.to_rfc3339(),
        ],
    )?;
    let id = conn.last_insert_rowid();

    Ok(LedgerEntry {
        id,
        entry_type,
        amount,
        description: description.to_string(),
        pilgrim_id,
        user_id: user_id.map(str::to_string),
        entry_date,
        created_at,
    })
}

pub fn list(conn: &Connection) -> Result<Vec<LedgerEntry>, ServiceError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM ledger ORDER BY id DESC",
        COLUMNS
    ))?;
    let rows = stmt
        .query_map([], map_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Net cash position: sum of Income minus sum of everything else.
pub fn net_position(conn: &Connection) -> Result<Decimal, ServiceError> {
    let mut stmt = conn.prepare("SELECT entry_type, amount FROM ledger")?;
    let rows = stmt
        .query_map([], |row| {
            let type_raw: String = row.get(0)?;
            let entry_type =
                LedgerType::from_str(&type_raw).ok_or_else(|| bad_enum_col(0, &type_raw))?;
            let amount: Decimal = parse_col(row, 1)?;
            Ok((entry_type, amount))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut net = Decimal::ZERO;
    for (entry_type, amount) in rows {
        if entry_type.is_inflow() {
            net += amount;
        } else {
            net -= amount;
        }
    }
    Ok(net)
}
