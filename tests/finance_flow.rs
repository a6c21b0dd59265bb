//! End-to-end tests for the finance core: payment ingestion, balance
//! reconciliation, refunds, ledger posting and the audit trail, exercised
//! against a throwaway SQLite file exactly as the handlers drive them.

use alhijrah_backend::audit::AuditLogger;
use alhijrah_backend::auth::{ActorContext, Role};
use alhijrah_backend::error::ServiceError;
use alhijrah_backend::finance::{FinanceEngine, ManualEntry, NewPayment, PaymentPatch};
use alhijrah_backend::models::{LedgerType, PaymentState, PaymentStatus, PilgrimStatus};
use alhijrah_backend::store::pilgrims::{self, NewPilgrim};
use alhijrah_backend::store::{audit, ledger, Database};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::NamedTempFile;
use uuid::Uuid;

fn setup() -> (FinanceEngine, NamedTempFile) {
    let temp = NamedTempFile::new().unwrap();
    let db = Database::open(temp.path().to_str().unwrap()).unwrap();
    (FinanceEngine::new(db, AuditLogger::disabled()), temp)
}

fn staff() -> ActorContext {
    ActorContext::new("staff-1", vec![Role::Staff])
}

fn admin() -> ActorContext {
    ActorContext::new("admin-1", vec![Role::Admin])
}

fn register(engine: &FinanceEngine, name: &str, final_price: Decimal) -> Uuid {
    engine
        .db()
        .with_tx(|tx| {
            pilgrims::insert(
                tx,
                &NewPilgrim {
                    name: name.to_string(),
                    passport_no: None,
                    package_id: Some("umrah-ramadhan".to_string()),
                    final_price,
                    visa_status: None,
                    equipment_status: None,
                },
            )
        })
        .unwrap()
        .id
}

fn pay(pilgrim_id: Uuid, amount: Decimal) -> NewPayment {
    NewPayment {
        pilgrim_id,
        amount,
        payment_date: NaiveDate::from_ymd_opt(2026, 5, 20).unwrap(),
        method: Some("transfer".to_string()),
        state: None,
        proof_url: None,
        notes: None,
    }
}

#[test]
fn installments_move_through_dp_to_lunas() {
    let (engine, _temp) = setup();
    let id = register(&engine, "Siti Rahma", dec!(10_000_000));

    let (_, status) = engine.add_payment(&staff(), pay(id, dec!(4_000_000))).unwrap();
    assert_eq!(status, PaymentStatus::Dp);
    let p = engine.db().with_conn(|c| pilgrims::get(c, id)).unwrap();
    assert_eq!(p.amount_paid, dec!(4_000_000));

    let (_, status) = engine.add_payment(&staff(), pay(id, dec!(6_000_000))).unwrap();
    assert_eq!(status, PaymentStatus::Lunas);
    let p = engine.db().with_conn(|c| pilgrims::get(c, id)).unwrap();
    assert_eq!(p.amount_paid, dec!(10_000_000));
}

#[test]
fn deleting_an_installment_recomputes_back_to_dp() {
    let (engine, _temp) = setup();
    let id = register(&engine, "Siti Rahma", dec!(10_000_000));

    engine.add_payment(&staff(), pay(id, dec!(4_000_000))).unwrap();
    let (second, _) = engine.add_payment(&staff(), pay(id, dec!(6_000_000))).unwrap();

    let (_, status) = engine.delete_payment(&staff(), second.id).unwrap();
    assert_eq!(status, PaymentStatus::Dp);
    let p = engine.db().with_conn(|c| pilgrims::get(c, id)).unwrap();
    assert_eq!(p.amount_paid, dec!(4_000_000));
}

#[test]
fn negative_amount_leaves_no_trace() {
    let (engine, _temp) = setup();
    let id = register(&engine, "Siti Rahma", dec!(10_000_000));

    let err = engine.add_payment(&staff(), pay(id, dec!(-500))).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));

    let p = engine.db().with_conn(|c| pilgrims::get(c, id)).unwrap();
    assert_eq!(p.amount_paid, Decimal::ZERO);
    assert_eq!(p.payment_status, PaymentStatus::BelumLunas);
    assert!(engine.db().with_conn(ledger::list).unwrap().is_empty());
}

#[test]
fn refund_requires_admin_and_fails_cleanly() {
    let (engine, _temp) = setup();
    let id = register(&engine, "Siti Rahma", dec!(10_000_000));
    engine.add_payment(&staff(), pay(id, dec!(4_000_000))).unwrap();

    let err = engine
        .process_refund(&staff(), id, dec!(4_000_000), None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden));

    // Pilgrim and ledger unchanged (one income row from the payment).
    let p = engine.db().with_conn(|c| pilgrims::get(c, id)).unwrap();
    assert_eq!(p.status, PilgrimStatus::Active);
    let entries = engine.db().with_conn(ledger::list).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].entry_type, LedgerType::Income);
}

#[test]
fn manual_income_entry_rejected_even_for_admin() {
    let (engine, _temp) = setup();

    let err = engine
        .post_manual_entry(
            &admin(),
            ManualEntry {
                entry_type: LedgerType::Income,
                amount: dec!(100),
                description: "direct income".to_string(),
                user_id: None,
                entry_date: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
}

#[test]
fn amount_paid_always_equals_verified_sum() {
    let (engine, _temp) = setup();
    let id = register(&engine, "Ahmad", dec!(30_000_000));

    let (a, _) = engine.add_payment(&staff(), pay(id, dec!(5_000_000))).unwrap();
    engine.add_payment(&staff(), pay(id, dec!(7_000_000))).unwrap();
    let mut pending = pay(id, dec!(9_000_000));
    pending.state = Some(PaymentState::Pending);
    let (p3, _) = engine.add_payment(&staff(), pending).unwrap();

    // verified: 5M + 7M
    let p = engine.db().with_conn(|c| pilgrims::get(c, id)).unwrap();
    assert_eq!(p.amount_paid, dec!(12_000_000));

    // correct the first, verify the third, drop the second's sibling later
    engine
        .update_payment(&staff(), a.id, PaymentPatch { amount: Some(dec!(6_000_000)), ..Default::default() })
        .unwrap();
    engine
        .update_payment(&staff(), p3.id, PaymentPatch { state: Some(PaymentState::Verified), ..Default::default() })
        .unwrap();

    let p = engine.db().with_conn(|c| pilgrims::get(c, id)).unwrap();
    assert_eq!(p.amount_paid, dec!(22_000_000));
    assert_eq!(p.payment_status, PaymentStatus::Dp);

    engine.delete_payment(&staff(), a.id).unwrap();
    let p = engine.db().with_conn(|c| pilgrims::get(c, id)).unwrap();
    assert_eq!(p.amount_paid, dec!(16_000_000));
}

#[test]
fn stale_status_after_price_change_until_next_mutation() {
    let (engine, _temp) = setup();
    let id = register(&engine, "Ahmad", dec!(10_000_000));
    engine.add_payment(&staff(), pay(id, dec!(10_000_000))).unwrap();

    // Price raised directly in the store: status stays Lunas until the
    // next recompute trigger. Expected behavior, not a bug.
    engine
        .db()
        .with_tx(|tx| {
            tx.execute(
                "UPDATE pilgrims SET final_price = '15000000' WHERE id = ?1",
                [id.to_string()],
            )
            .map_err(ServiceError::from)
        })
        .unwrap();

    let p = engine.db().with_conn(|c| pilgrims::get(c, id)).unwrap();
    assert_eq!(p.payment_status, PaymentStatus::Lunas);

    let (_, status) = engine.recompute(id).unwrap();
    assert_eq!(status, PaymentStatus::Dp);
}

#[test]
fn ledger_net_position_identity() {
    let (engine, _temp) = setup();
    let id = register(&engine, "Ahmad", dec!(20_000_000));
    let finance_actor = ActorContext::new("fin-1", vec![Role::Finance]);

    engine.add_payment(&staff(), pay(id, dec!(20_000_000))).unwrap();
    engine
        .post_manual_entry(
            &finance_actor,
            ManualEntry {
                entry_type: LedgerType::Salary,
                amount: dec!(4_000_000),
                description: "Gaji".to_string(),
                user_id: Some("staff-1".to_string()),
                entry_date: None,
            },
        )
        .unwrap();
    engine.process_refund(&admin(), id, dec!(2_000_000), None).unwrap();

    let entries = engine.db().with_conn(ledger::list).unwrap();
    let mut income = Decimal::ZERO;
    let mut outflow = Decimal::ZERO;
    for e in &entries {
        if e.entry_type == LedgerType::Income {
            income += e.amount;
        } else {
            outflow += e.amount;
        }
    }

    let net = engine.net_position(&finance_actor).unwrap();
    assert_eq!(net, income - outflow);
    assert_eq!(net, dec!(14_000_000));
}

#[test]
fn refund_is_terminal() {
    let (engine, _temp) = setup();
    let id = register(&engine, "Ahmad", dec!(10_000_000));
    engine.add_payment(&staff(), pay(id, dec!(10_000_000))).unwrap();

    engine.process_refund(&admin(), id, dec!(8_000_000), None).unwrap();

    let p = engine.db().with_conn(|c| pilgrims::get(c, id)).unwrap();
    assert_eq!(p.status, PilgrimStatus::Refund);
    assert_eq!(p.payment_status, PaymentStatus::Refund);

    // Recompute keeps the terminal status.
    let (_, status) = engine.recompute(id).unwrap();
    assert_eq!(status, PaymentStatus::Refund);
}

#[test]
fn pilgrim_delete_forbidden_while_payments_exist() {
    let (engine, _temp) = setup();
    let id = register(&engine, "Ahmad", dec!(10_000_000));
    let (payment, _) = engine.add_payment(&staff(), pay(id, dec!(1_000_000))).unwrap();

    let err = engine
        .db()
        .with_tx(|tx| pilgrims::delete(tx, id))
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));

    engine.delete_payment(&staff(), payment.id).unwrap();
    engine.db().with_tx(|tx| pilgrims::delete(tx, id)).unwrap();
}

#[test]
fn concurrent_payments_serialize_on_reconciliation() {
    let (engine, _temp) = setup();
    let id = register(&engine, "Ahmad", dec!(100_000_000));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(std::thread::spawn(move || {
            let actor = staff();
            for _ in 0..5 {
                engine
                    .add_payment(
                        &actor,
                        NewPayment {
                            pilgrim_id: id,
                            amount: dec!(1_000_000),
                            payment_date: NaiveDate::from_ymd_opt(2026, 5, 20).unwrap(),
                            method: None,
                            state: None,
                            proof_url: None,
                            notes: None,
                        },
                    )
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // 40 verified payments of 1M each: no lost update allowed.
    let p = engine.db().with_conn(|c| pilgrims::get(c, id)).unwrap();
    assert_eq!(p.amount_paid, dec!(40_000_000));
    assert_eq!(p.payment_status, PaymentStatus::Dp);
}

#[tokio::test]
async fn mutations_reach_the_audit_trail() {
    let temp = NamedTempFile::new().unwrap();
    let db = Database::open(temp.path().to_str().unwrap()).unwrap();
    let (logger, _drain) = AuditLogger::spawn(db.clone());
    let engine = FinanceEngine::new(db.clone(), logger);

    let id = register(&engine, "Siti", dec!(10_000_000));
    engine
        .add_payment(&staff(), pay(id, dec!(4_000_000)))
        .unwrap();

    let mut total = 0;
    for _ in 0..100 {
        let (_, count) = db.with_conn(|c| audit::list_page(c, 1, 10)).unwrap();
        if count >= 1 {
            total = count;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(total >= 1, "payment.create never reached the audit log");

    let (rows, _) = db.with_conn(|c| audit::list_page(c, 1, 10)).unwrap();
    assert!(rows.iter().any(|r| r.action == "payment.create"));
}
