//! Pilgrim manifest rows.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{payment_status_for, PaymentStatus, Pilgrim, PilgrimStatus};
use crate::store::{bad_enum_col, parse_col};

const COLUMNS: &str = "id, name, passport_no, package_id, final_price, amount_paid, \
                       payment_status, status, visa_status, equipment_status, created_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<Pilgrim> {
    let payment_status_raw: String = row.get(6)?;
    let status_raw: String = row.get(7)?;
    Ok(Pilgrim {
        id: parse_col(row, 0)?,
        name: row.get(1)?,
        passport_no: row.get(2)?,
        package_id: row.get(3)?,
        final_price: parse_col(row, 4)?,
        amount_paid: parse_col(row, 5)?,
        payment_status: PaymentStatus::from_str(&payment_status_raw)
            .ok_or_else(|| bad_enum_col(6, &payment_status_raw))?,
        status: PilgrimStatus::from_str(&status_raw).ok_or_else(|| bad_enum_col(7, &status_raw))?,
        visa_status: row.get(8)?,
        equipment_status: row.get(9)?,
        created_at: parse_col(row, 10)?,
    })
}

/// Fields accepted when registering a pilgrim. Balance columns are not
/// here on purpose — they are derived.
#[derive(Debug, Clone)]
pub struct NewPilgrim {
    pub name: String,
    pub passport_no: Option<String>,
    pub package_id: Option<String>,
    pub final_price: Decimal,
    pub visa_status: Option<String>,
    pub equipment_status: Option<String>,
}

pub fn insert(conn: &Connection, new: &NewPilgrim) -> Result<Pilgrim, ServiceError> {
    let pilgrim = Pilgrim {
        id: Uuid::new_v4(),
        name: new.name.clone(),
        passport_no: new.passport_no.clone(),
        package_id: new.package_id.clone(),
        final_price: new.final_price,
        amount_paid: Decimal::ZERO,
        payment_status: payment_status_for(Decimal::ZERO, new.final_price),
        status: PilgrimStatus::Active,
        visa_status: new.visa_status.clone(),
        equipment_status: new.equipment_status.clone(),
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO pilgrims (id, name, passport_no, package_id, final_price, amount_paid,
                               payment_status, status, visa_status, equipment_status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            pilgrim.id.to_string(),
            pilgrim.name,
            pilgrim.passport_no,
            pilgrim.package_id,
            pilgrim.final_price.to_string(),
            pilgrim.amount_paid.to_string(),
            pilgrim.payment_status.as_str(),
            pilgrim.status.as_str(),
            pilgrim.visa_status,
            pilgrim.equipment_status,
            pilgrim.created_at.to_rfc3339(),
        ],
    )?;

    Ok(pilgrim)
}

pub fn get(conn: &Connection, id: Uuid) -> Result<Pilgrim, ServiceError> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM pilgrims WHERE id = ?1", COLUMNS))?;
    match stmt.query_row(params![id.to_string()], map_row) {
        Ok(pilgrim) => Ok(pilgrim),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            Err(ServiceError::not_found(format!("Pilgrim {} not found", id)))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn list(conn: &Connection) -> Result<Vec<Pilgrim>, ServiceError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM pilgrims ORDER BY created_at DESC",
        COLUMNS
    ))?;
    let rows = stmt
        .query_map([], map_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Persist a freshly reconciled balance. Only the reconciliation engine
/// calls this.
pub fn update_balance(
    conn: &Connection,
    id: Uuid,
    amount_paid: Decimal,
    payment_status: PaymentStatus,
) -> Result<(), ServiceError> {
    let changed = conn.execute(
        "UPDATE pilgrims SET amount_paid = ?2, payment_status = ?3 WHERE id = ?1",
        params![
            id.to_string(),
            amount_paid.to_string(),
            payment_status.as_str()
        ],
    )?;
    if changed == 0 {
        return Err(ServiceError::not_found(format!("Pilgrim {} not found", id)));
    }
    Ok(())
}

/// Flip a pilgrim into the terminal refund state.
pub fn mark_refunded(conn: &Connection, id: Uuid) -> Result<(), ServiceError> {
    let changed = conn.execute(
        "UPDATE pilgrims SET status = ?2, payment_status = ?3 WHERE id = ?1",
        params![
            id.to_string(),
            PilgrimStatus::Refund.as_str(),
            PaymentStatus::Refund.as_str()
        ],
    )?;
    if changed == 0 {
        return Err(ServiceError::not_found(format!("Pilgrim {} not found", id)));
    }
    Ok(())
}

/// Delete a pilgrim. Forbidden while payment records reference it — the
/// payment history is the audit trail of money received.
pub fn delete(conn: &Connection, id: Uuid) -> Result<(), ServiceError> {
    let payment_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM payments WHERE pilgrim_id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    if payment_count > 0 {
        return Err(ServiceError::invalid(format!(
            "Pilgrim {} has {} payment record(s); delete is forbidden",
            id, payment_count
        )));
    }

    let changed = conn.execute("DELETE FROM pilgrims WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(ServiceError::not_found(format!("Pilgrim {} not found", id)));
    }
    Ok(())
}
