//! Payment record rows.

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{PaymentRecord, PaymentState};
use crate::store::{bad_enum_col, parse_col};

const COLUMNS: &str = "id, pilgrim_id, amount, payment_date, method, state, proof_url, \
                       notes, recorded_by, created_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<PaymentRecord> {
    let state_raw: String = row.get(5)?;
    Ok(PaymentRecord {
        id: parse_col(row, 0)?,
        pilgrim_id: parse_col(row, 1)?,
        amount: parse_col(row, 2)?,
        payment_date: parse_col(row, 3)?,
        method: row.get(4)?,
        state: PaymentState::from_str(&state_raw).ok_or_else(|| bad_enum_col(5, &state_raw))?,
        proof_url: row.get(6)?,
        notes: row.get(7)?,
        recorded_by: row.get(8)?,
        created_at: parse_col(row, 9)?,
    })
}

pub fn insert(conn: &Connection, record: &PaymentRecord) -> Result<(), ServiceError> {
    conn.execute(
        "INSERT INTO payments (id, pilgrim_id, amount, payment_date, method, state,
                               proof_url, notes, recorded_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            record.id.to_string(),
            record.pilgrim_id.to_string(),
            record.amount.to_string(),
            record.payment_date.to_string(),
            record.method,
            record.state.as_str(),
            record.proof_url,
            record.notes,
            record.recorded_by,
            record.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: Uuid) -> Result<PaymentRecord, ServiceError> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM payments WHERE id = ?1", COLUMNS))?;
    match stmt.query_row(params![id.to_string()], map_row) {
        Ok(record) => Ok(record),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            Err(ServiceError::not_found(format!("Payment {} not found", id)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Persist a corrected record (same id). Owning pilgrim never changes.
pub fn update(conn: &Connection, record: &PaymentRecord) -> Result<(), ServiceError> {
    let changed = conn.execute(
        "UPDATE payments SET amount = ?2, payment_date = ?3, method = ?4, state = ?5,
                             proof_url = ?6, notes = ?7
         WHERE id = ?1",
        params![
            record.id.to_string(),
            record.amount.to_string(),
            record.payment_date.to_string(),
            record.method,
            record.state.as_str(),
            record.proof_url,
            record.notes,
        ],
    )?;
    if changed == 0 {
        return Err(ServiceError::not_found(format!(
            "Payment {} not found",
            record.id
        )));
    }
    Ok(())
}

/// Delete a record, returning it so the caller can reconcile the owning
/// pilgrim.
pub fn delete(conn: &Connection, id: Uuid) -> Result<PaymentRecord, ServiceError> {
    let record = get(conn, id)?;
    conn.execute("DELETE FROM payments WHERE id = ?1", params![id.to_string()])?;
    Ok(record)
}

pub fn list_for_pilgrim(
    conn: &Connection,
    pilgrim_id: Uuid,
) -> Result<Vec<PaymentRecord>, ServiceError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM payments WHERE pilgrim_id = ?1 ORDER BY created_at",
        COLUMNS
    ))?;
    let rows = stmt
        .query_map(params![pilgrim_id.to_string()], map_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Sum of verified payment amounts for one pilgrim. Amounts are decimal
/// text, so the sum happens here rather than in SQL.
pub fn verified_total(conn: &Connection, pilgrim_id: Uuid) -> Result<Decimal, ServiceError> {
    let mut stmt = conn.prepare(
        "SELECT amount FROM payments WHERE pilgrim_id = ?1 AND state = 'verified'",
    )?;
    let amounts = stmt
        .query_map(params![pilgrim_id.to_string()], |row| {
            parse_col::<Decimal>(row, 0)
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(amounts.into_iter().sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::pilgrims::{self, NewPilgrim};
    use crate::store::test_support::open_test_db;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn seed_pilgrim(db: &crate::store::Database) -> Uuid {
        db.with_conn(|conn| {
            pilgrims::insert(
                conn,
                &NewPilgrim {
                    name: "Ahmad Fauzi".to_string(),
                    passport_no: None,
                    package_id: None,
                    final_price: dec!(25_000_000),
                    visa_status: None,
                    equipment_status: None,
                },
            )
        })
        .unwrap()
        .id
    }

    fn record(pilgrim_id: Uuid, amount: Decimal, state: PaymentState) -> PaymentRecord {
        PaymentRecord {
            id: Uuid::new_v4(),
            pilgrim_id,
            amount,
            payment_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            method: Some("transfer".to_string()),
            state,
            proof_url: None,
            notes: None,
            recorded_by: "staff-1".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_get_delete() {
        let (db, _temp) = open_test_db();
        let pilgrim_id = seed_pilgrim(&db);
        let rec = record(pilgrim_id, dec!(5_000_000), PaymentState::Verified);

        db.with_conn(|conn| insert(conn, &rec)).unwrap();
        let fetched = db.with_conn(|conn| get(conn, rec.id)).unwrap();
        assert_eq!(fetched.amount, dec!(5_000_000));
        assert_eq!(fetched.state, PaymentState::Verified);

        let deleted = db.with_conn(|conn| delete(conn, rec.id)).unwrap();
        assert_eq!(deleted.pilgrim_id, pilgrim_id);
        let err = db.with_conn(|conn| get(conn, rec.id)).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn test_verified_total_ignores_pending() {
        let (db, _temp) = open_test_db();
        let pilgrim_id = seed_pilgrim(&db);

        db.with_conn(|conn| {
            insert(conn, &record(pilgrim_id, dec!(4_000_000), PaymentState::Verified))?;
            insert(conn, &record(pilgrim_id, dec!(6_000_000), PaymentState::Verified))?;
            insert(conn, &record(pilgrim_id, dec!(9_999_999), PaymentState::Pending))
        })
        .unwrap();

        let total = db
            .with_conn(|conn| verified_total(conn, pilgrim_id))
            .unwrap();
        assert_eq!(total, dec!(10_000_000));
    }

    #[test]
    fn test_verified_total_empty_is_zero() {
        let (db, _temp) = open_test_db();
        let pilgrim_id = seed_pilgrim(&db);
        let total = db
            .with_conn(|conn| verified_total(conn, pilgrim_id))
            .unwrap();
        assert_eq!(total, Decimal::ZERO);
    }
}
