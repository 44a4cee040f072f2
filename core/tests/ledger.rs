//! Wallet ledger tests.
//!
//! Verifies that:
//!   - balance == initial balance + credits - debits after any sequence
//!   - rejected input writes nothing and leaves the balance alone
//!   - a customer holds at most one wallet
//!   - the transaction list reconstructs the balance, newest first

use chrono::{Duration, TimeZone, Utc};
use loyalty_core::{
    clock::FixedClock,
    customer::NewCustomer,
    error::LoyaltyError,
    ledger::{LedgerService, MAX_DESCRIPTION_LEN},
    store::LoyaltyStore,
    types::{RecordId, MAX_POINTS, MIN_POINTS},
    wallet::{TransactionType, WalletStatus},
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::sync::Arc;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn build_ledger() -> (LedgerService<Arc<LoyaltyStore>>, Arc<FixedClock>) {
    let store = Arc::new(LoyaltyStore::open_migrated(":memory:").expect("in-memory store"));
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    ));
    (LedgerService::new(store, clock.clone()), clock)
}

fn add_customer(ledger: &LedgerService<Arc<LoyaltyStore>>, name: &str) -> RecordId {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    ledger
        .store()
        .insert_customer(&NewCustomer {
            name: name.to_string(),
            email,
            phone: None,
            tier: None,
            segment: None,
            visits: None,
            spend: None,
        })
        .expect("insert customer")
        .id
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Seeded 100, credit 50 "bonus", debit 30 "redeemed" -> 120.
#[test]
fn credit_then_debit_scenario() {
    let (ledger, clock) = build_ledger();
    let customer = add_customer(&ledger, "Sofia Rodriguez");
    let wallet = ledger
        .create_wallet(customer, 100, WalletStatus::Active)
        .unwrap();

    clock.advance(Duration::minutes(1));
    ledger
        .record(wallet.id, "credit", 50, Some("bonus"))
        .unwrap();
    clock.advance(Duration::minutes(1));
    ledger
        .record(wallet.id, "debit", 30, Some("redeemed"))
        .unwrap();

    assert_eq!(ledger.wallet(wallet.id).unwrap().balance, 120);

    let txns = ledger.transactions(wallet.id).unwrap();
    let summary: Vec<_> = txns
        .iter()
        .map(|t| (t.kind, t.amount, t.description.as_deref()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (TransactionType::Debit, 30, Some("redeemed")),
            (TransactionType::Credit, 50, Some("bonus")),
        ]
    );
}

/// Any random sequence of credits and debits lands on the arithmetic sum.
#[test]
fn balance_equals_initial_plus_signed_sum() {
    let mut rng = Pcg64Mcg::seed_from_u64(0x10_7A17);
    for round in 0..5 {
        let (ledger, _clock) = build_ledger();
        let customer = add_customer(&ledger, &format!("Guest {round}"));
        let initial = rng.gen_range(0..500);
        let wallet = ledger
            .create_wallet(customer, initial, WalletStatus::Active)
            .unwrap();

        let mut expected = initial;
        for _ in 0..rng.gen_range(10..60) {
            let amount = rng.gen_range(1..200);
            let kind = if rng.gen_bool(0.6) {
                TransactionType::Credit
            } else {
                TransactionType::Debit
            };
            ledger
                .record_transaction(wallet.id, kind, amount, None)
                .unwrap();
            expected += kind.signed(amount);
        }

        let balance = ledger.wallet(wallet.id).unwrap().balance;
        assert_eq!(balance, expected, "round {round}: balance drifted");
        assert_eq!(
            ledger.store().wallet_ledger_sum(wallet.id).unwrap() + initial,
            balance,
            "round {round}: ledger does not reconstruct the balance"
        );
    }
}

/// The listing holds every row, newest first, and reconstructs the balance.
#[test]
fn listing_reconstructs_balance_newest_first() {
    let (ledger, clock) = build_ledger();
    let customer = add_customer(&ledger, "James Chen");
    let wallet = ledger
        .create_wallet(customer, 40, WalletStatus::Active)
        .unwrap();

    for i in 1..=8 {
        clock.advance(Duration::seconds(30));
        let kind = if i % 3 == 0 { "debit" } else { "credit" };
        ledger.record(wallet.id, kind, i * 5, None).unwrap();
    }

    let txns = ledger.transactions(wallet.id).unwrap();
    assert_eq!(txns.len(), 8);
    assert!(
        txns.windows(2).all(|w| w[0].created_at >= w[1].created_at),
        "transactions must be newest first"
    );
    let signed: i64 = txns.iter().map(|t| t.signed_amount()).sum();
    assert_eq!(40 + signed, ledger.wallet(wallet.id).unwrap().balance);
}

/// Zero and negative amounts are rejected before anything is written.
#[test]
fn non_positive_amount_writes_nothing() {
    let (ledger, _clock) = build_ledger();
    let customer = add_customer(&ledger, "Emily Watson");
    let wallet = ledger
        .create_wallet(customer, 75, WalletStatus::Active)
        .unwrap();

    for amount in [0, -1, -250] {
        let err = ledger
            .record_transaction(wallet.id, TransactionType::Credit, amount, None)
            .unwrap_err();
        assert!(
            matches!(err, LoyaltyError::Validation(_)),
            "amount {amount} should be a validation error, got {err:?}"
        );
    }

    assert_eq!(ledger.store().wallet_transaction_count(wallet.id).unwrap(), 0);
    assert_eq!(ledger.wallet(wallet.id).unwrap().balance, 75);
}

/// Amounts past the 32-bit ceiling never reach the ledger, and a credit that
/// would push a near-full wallet over it rolls back whole.
#[test]
fn overflowing_amounts_write_nothing() {
    let (ledger, _clock) = build_ledger();
    let customer = add_customer(&ledger, "Marcus Chen");
    let wallet = ledger
        .create_wallet(customer, 1, WalletStatus::Active)
        .unwrap();

    for amount in [i64::MAX, MAX_POINTS + 1] {
        let err = ledger
            .record_transaction(wallet.id, TransactionType::Credit, amount, None)
            .unwrap_err();
        assert!(
            matches!(err, LoyaltyError::Validation(_)),
            "amount {amount} should be a validation error, got {err:?}"
        );
    }

    // Within the per-entry bound, but the sum leaves the column range.
    let err = ledger
        .record_transaction(wallet.id, TransactionType::Credit, MAX_POINTS, None)
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::Validation(_)), "got {err:?}");

    assert_eq!(ledger.store().wallet_transaction_count(wallet.id).unwrap(), 0);
    assert_eq!(ledger.wallet(wallet.id).unwrap().balance, 1);
    assert_eq!(ledger.wallets().unwrap().len(), 1);
}

#[test]
fn initial_balance_outside_32_bits_is_rejected() {
    let (ledger, _clock) = build_ledger();
    let customer = add_customer(&ledger, "Aisha Bello");

    for balance in [MAX_POINTS + 1, MIN_POINTS - 1, i64::MIN] {
        let err = ledger
            .create_wallet(customer, balance, WalletStatus::Active)
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::Validation(_)), "got {err:?}");
    }
    assert_eq!(ledger.store().wallet_count().unwrap(), 0);

    let wallet = ledger
        .create_wallet(customer, MIN_POINTS, WalletStatus::Active)
        .unwrap();
    assert_eq!(wallet.balance, MIN_POINTS);
}

#[test]
fn unknown_type_is_a_validation_error() {
    let (ledger, _clock) = build_ledger();
    let customer = add_customer(&ledger, "David Kim");
    let wallet = ledger
        .create_wallet(customer, 0, WalletStatus::Active)
        .unwrap();

    let err = ledger.record(wallet.id, "refund", 10, None).unwrap_err();
    assert!(matches!(err, LoyaltyError::Validation(_)));
    assert_eq!(ledger.store().wallet_transaction_count(wallet.id).unwrap(), 0);
}

#[test]
fn overlong_description_is_rejected() {
    let (ledger, _clock) = build_ledger();
    let customer = add_customer(&ledger, "Sarah Miller");
    let wallet = ledger
        .create_wallet(customer, 0, WalletStatus::Active)
        .unwrap();

    let long = "x".repeat(MAX_DESCRIPTION_LEN + 1);
    let err = ledger
        .record_transaction(wallet.id, TransactionType::Credit, 5, Some(&long))
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::Validation(_)));

    // Blank descriptions are stored as absent.
    let txn = ledger
        .record_transaction(wallet.id, TransactionType::Credit, 5, Some("   "))
        .unwrap();
    assert_eq!(txn.description, None);
}

/// A second wallet for the same customer is a conflict and leaves one row.
#[test]
fn duplicate_wallet_is_a_conflict() {
    let (ledger, _clock) = build_ledger();
    let customer = add_customer(&ledger, "Michael Johnson");
    let first = ledger
        .create_wallet(customer, 10, WalletStatus::Active)
        .unwrap();

    let err = ledger
        .create_wallet(customer, 999, WalletStatus::Inactive)
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::Conflict(_)), "got {err:?}");

    assert_eq!(ledger.store().wallet_count().unwrap(), 1);
    let kept = ledger.wallet_for_customer(customer).unwrap().unwrap();
    assert_eq!(kept, first);
}

#[test]
fn wallet_for_missing_customer_is_not_found() {
    let (ledger, _clock) = build_ledger();
    let err = ledger
        .create_wallet(4242, 0, WalletStatus::Active)
        .unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
    assert_eq!(ledger.store().wallet_count().unwrap(), 0);
}

/// The initial balance is set directly; no ledger row backs it.
#[test]
fn initial_balance_has_no_ledger_row() {
    let (ledger, _clock) = build_ledger();
    let customer = add_customer(&ledger, "Jessica Taylor");
    let wallet = ledger
        .create_wallet(customer, 300, WalletStatus::Active)
        .unwrap();
    assert_eq!(wallet.balance, 300);
    assert!(ledger.transactions(wallet.id).unwrap().is_empty());
}

#[test]
fn lookups_that_find_nothing() {
    let (ledger, _clock) = build_ledger();
    assert!(ledger.wallet(77).unwrap_err().is_not_found());
    assert_eq!(ledger.wallet_for_customer(999).unwrap(), None);
    assert!(ledger.transactions(77).unwrap().is_empty());

    let err = ledger
        .record_transaction(77, TransactionType::Credit, 10, None)
        .unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

/// Inactive wallets and negative balances are accepted as-is.
#[test]
fn inactive_wallet_still_accepts_debits_below_zero() {
    let (ledger, clock) = build_ledger();
    let customer = add_customer(&ledger, "Robert Anderson");
    let wallet = ledger
        .create_wallet(customer, 20, WalletStatus::Active)
        .unwrap();

    let later = clock.advance(Duration::hours(2));
    let updated = ledger.set_status(wallet.id, WalletStatus::Inactive).unwrap();
    assert_eq!(updated.status, WalletStatus::Inactive);
    assert_eq!(updated.updated_at, later);
    assert_eq!(updated.created_at, wallet.created_at);

    ledger
        .record_transaction(wallet.id, TransactionType::Debit, 50, Some("comp"))
        .unwrap();
    assert_eq!(ledger.wallet(wallet.id).unwrap().balance, -30);
}

#[test]
fn updated_at_follows_the_latest_transaction() {
    let (ledger, clock) = build_ledger();
    let customer = add_customer(&ledger, "Ana Lopez");
    let wallet = ledger
        .create_wallet(customer, 0, WalletStatus::Active)
        .unwrap();

    let stamp = clock.advance(Duration::days(3));
    let txn = ledger
        .record_transaction(wallet.id, TransactionType::Credit, 15, None)
        .unwrap();
    assert_eq!(txn.created_at, stamp);
    assert_eq!(ledger.wallet(wallet.id).unwrap().updated_at, stamp);
}
