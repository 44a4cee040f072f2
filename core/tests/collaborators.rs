//! Back-office records around the ledger: customers, activity, seating,
//! feedback, the reports, and demo seeding.

use chrono::{Duration, TimeZone, Utc};
use loyalty_core::{
    clock::{Clock, FixedClock},
    customer::{ActivityKind, Customer, CustomerUpdate, NewCustomer, NewTier, TierUpdate},
    error::{LoyaltyError, LoyaltyResult},
    feedback::NewFeedback,
    ledger::LedgerService,
    reporting::{wallet_overview, CustomerDirectory},
    seating::{NewSession, NewTable, SessionStatus, SessionUpdate, TableStatus},
    seed::seed_demo_data,
    store::LoyaltyStore,
    types::RecordId,
    wallet::WalletStatus,
};
use std::{collections::HashMap, sync::Arc};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn build_store() -> (Arc<LoyaltyStore>, Arc<FixedClock>) {
    let store = Arc::new(LoyaltyStore::open_migrated(":memory:").expect("in-memory store"));
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 2, 14, 19, 0, 0).unwrap(),
    ));
    (store, clock)
}

fn new_customer(name: &str, email: &str) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        tier: None,
        segment: None,
        visits: None,
        spend: None,
    }
}

fn new_table(name: &str) -> NewTable {
    NewTable {
        name: name.to_string(),
        capacity: 4,
        location: None,
        status: None,
        notes: None,
    }
}

// ── Customers & activity ─────────────────────────────────────────────────────

#[test]
fn new_customer_gets_defaults_and_initials() {
    let (store, _clock) = build_store();
    let c = store
        .insert_customer(&new_customer("  Sofia Rodriguez ", "sofia.r@example.com"))
        .unwrap();
    assert_eq!(c.name, "Sofia Rodriguez");
    assert_eq!(c.tier, "Silver");
    assert_eq!(c.segment, "Occasional");
    assert_eq!(c.visits, 0);
    assert_eq!(c.avatar.as_deref(), Some("SR"));
    assert_eq!(c.last_visit, None);
}

#[test]
fn duplicate_email_is_a_conflict() {
    let (store, _clock) = build_store();
    store
        .insert_customer(&new_customer("A", "same@example.com"))
        .unwrap();
    let err = store
        .insert_customer(&new_customer("B", "same@example.com"))
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::Conflict(_)), "got {err:?}");
    assert_eq!(store.customer_count().unwrap(), 1);
}

#[test]
fn partial_update_keeps_untouched_columns() {
    let (store, _clock) = build_store();
    let c = store
        .insert_customer(&new_customer("James Chen", "james.c@example.com"))
        .unwrap();
    let updated = store
        .update_customer(
            c.id,
            &CustomerUpdate {
                segment: Some("Regular".into()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.segment, "Regular");
    assert_eq!(updated.email, c.email);
    assert_eq!(store.update_customer(999, &CustomerUpdate::default()).unwrap(), None);
}

#[test]
fn visit_bumps_counters_and_reward_does_not() {
    let (store, clock) = build_store();
    let c = store
        .insert_customer(&new_customer("Emily Watson", "emily.w@example.com"))
        .unwrap();

    let first = clock.advance(Duration::hours(1));
    store
        .insert_activity(c.id, ActivityKind::Visit, 80.0, None, first)
        .unwrap();
    let second = clock.advance(Duration::days(2));
    store
        .insert_activity(c.id, ActivityKind::Visit, 20.5, None, second)
        .unwrap();
    store
        .insert_activity(c.id, ActivityKind::Reward, 0.0, Some("Free Dessert"), second)
        .unwrap();

    let c = store.customer(c.id).unwrap().unwrap();
    assert_eq!(c.visits, 2);
    assert!((c.spend - 100.5).abs() < 1e-9);
    assert_eq!(c.last_visit, Some(second));

    let history = store.customer_activities(c.id).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].kind, ActivityKind::Reward);
    assert_eq!(history[0].reward_used.as_deref(), Some("Free Dessert"));
    assert_eq!(store.activities(2).unwrap().len(), 2);
}

#[test]
fn activity_for_missing_customer_writes_nothing() {
    let (store, clock) = build_store();
    let err = store
        .insert_activity(12, ActivityKind::Visit, 10.0, None, clock.now())
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(store.activities(10).unwrap().is_empty());
}

#[test]
fn customer_with_wallet_cannot_be_deleted() {
    let (store, clock) = build_store();
    let ledger = LedgerService::new(store.clone(), clock.clone());
    let keep = store
        .insert_customer(&new_customer("Michael Johnson", "michael.j@example.com"))
        .unwrap();
    let leaving = store
        .insert_customer(&new_customer("Robert Anderson", "robert.a@example.com"))
        .unwrap();
    ledger
        .create_wallet(keep.id, 10, WalletStatus::Active)
        .unwrap();

    let err = store.delete_customer(keep.id).unwrap_err();
    assert!(matches!(err, LoyaltyError::Conflict(_)));
    assert!(store.customer(keep.id).unwrap().is_some());

    assert!(store.delete_customer(leaving.id).unwrap());
    assert!(!store.delete_customer(leaving.id).unwrap());
}

#[test]
fn tiers_sort_by_threshold_and_keep_benefits() {
    let (store, _clock) = build_store();
    let gold = store
        .insert_tier(&NewTier {
            name: "Gold".into(),
            requirement: "Spend $500+".into(),
            threshold: 500.0,
            benefits: vec!["Priority Seating".into()],
        })
        .unwrap();
    store
        .insert_tier(&NewTier {
            name: "Silver".into(),
            requirement: "Join".into(),
            threshold: 0.0,
            benefits: vec![],
        })
        .unwrap();

    let names: Vec<_> = store.tiers().unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(names, ["Silver", "Gold"]);

    let updated = store
        .update_tier(
            gold.id,
            &TierUpdate {
                benefits: Some(vec!["Priority Seating".into(), "Skip the Line".into()]),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.benefits.len(), 2);
    assert_eq!(updated.threshold, 500.0);
}

// ── Seating ──────────────────────────────────────────────────────────────────

#[test]
fn seating_occupies_and_clearing_frees_the_table() {
    let (store, clock) = build_store();
    let guest = store
        .insert_customer(&new_customer("Sarah Miller", "sarah.m@example.com"))
        .unwrap();
    let table = store.insert_table(&new_table("Patio 2")).unwrap();
    assert_eq!(table.status, TableStatus::Available);
    assert_eq!(table.location, "Main");

    let session = store
        .insert_session(
            &NewSession {
                table_id: table.id,
                customer_id: Some(guest.id),
                party_size: 2,
            },
            clock.now(),
        )
        .unwrap();
    let seated = store.table(table.id).unwrap().unwrap();
    assert_eq!(seated.status, TableStatus::Occupied);
    assert_eq!(seated.current_customer_id, Some(guest.id));

    let err = store
        .insert_session(
            &NewSession {
                table_id: table.id,
                customer_id: None,
                party_size: 4,
            },
            clock.now(),
        )
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::Conflict(_)));

    let ended = clock.advance(Duration::minutes(75));
    let cleared = store
        .update_session(
            session.id,
            &SessionUpdate {
                status: Some(SessionStatus::Cleared),
                ..Default::default()
            },
            ended,
        )
        .unwrap()
        .unwrap();
    assert_eq!(cleared.status, SessionStatus::Cleared);
    assert_eq!(cleared.ended_at, Some(ended));

    let freed = store.table(table.id).unwrap().unwrap();
    assert_eq!(freed.status, TableStatus::Available);
    assert_eq!(freed.current_customer_id, None);
    assert!(store.sessions(true).unwrap().is_empty());
    assert_eq!(store.sessions(false).unwrap().len(), 1);
}

#[test]
fn session_on_missing_table_is_not_found() {
    let (store, clock) = build_store();
    let err = store
        .insert_session(
            &NewSession {
                table_id: 404,
                customer_id: None,
                party_size: 2,
            },
            clock.now(),
        )
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.update_session(404, &SessionUpdate::default(), clock.now()).unwrap(), None);
}

// ── Feedback ─────────────────────────────────────────────────────────────────

#[test]
fn feedback_stats_group_by_channel_and_rating() {
    let (store, clock) = build_store();
    for (rating, channel) in [(5, "Google"), (4, "Google"), (3, "Yelp"), (1, "In-store")] {
        store
            .insert_feedback(
                &NewFeedback {
                    customer_id: None,
                    rating,
                    channel: channel.to_string(),
                    comment: None,
                },
                clock.now(),
            )
            .unwrap();
    }

    let stats = store.feedback_stats().unwrap();
    assert_eq!(stats.total_reviews, 4);
    assert!((stats.avg_rating - 3.25).abs() < 1e-9);
    assert_eq!(stats.positive_percent, 50);

    let by_channel: HashMap<_, _> = stats
        .by_channel
        .iter()
        .map(|c| (c.channel.as_str(), c.count))
        .collect();
    assert_eq!(by_channel["Google"], 2);
    assert_eq!(by_channel["Yelp"], 1);
    assert_eq!(stats.by_rating.iter().map(|r| r.count).sum::<i64>(), 4);
}

#[test]
fn empty_feedback_stats_are_zero() {
    let (store, _clock) = build_store();
    let stats = store.feedback_stats().unwrap();
    assert_eq!(stats.total_reviews, 0);
    assert_eq!(stats.avg_rating, 0.0);
    assert_eq!(stats.positive_percent, 0);
    assert!(stats.by_channel.is_empty());
}

// ── Reports ──────────────────────────────────────────────────────────────────

/// Resolves only the ids it was given; counts lookups.
struct SparseDirectory {
    names: HashMap<RecordId, String>,
    lookups: std::cell::Cell<usize>,
}

impl CustomerDirectory for SparseDirectory {
    fn customer(&self, id: RecordId) -> LoyaltyResult<Option<Customer>> {
        self.lookups.set(self.lookups.get() + 1);
        Ok(self.names.get(&id).map(|name| Customer {
            id,
            name: name.clone(),
            email: format!("{id}@example.com"),
            phone: None,
            tier: "Silver".into(),
            segment: "Occasional".into(),
            visits: 0,
            spend: 0.0,
            last_visit: None,
            avatar: None,
        }))
    }
}

#[test]
fn wallet_overview_totals_and_names() {
    let (store, clock) = build_store();
    let ledger = LedgerService::new(store.clone(), clock.clone());
    let a = store
        .insert_customer(&new_customer("Jessica Taylor", "jessica.t@example.com"))
        .unwrap();
    let b = store
        .insert_customer(&new_customer("David Kim", "david.k@example.com"))
        .unwrap();
    ledger.create_wallet(a.id, 250, WalletStatus::Active).unwrap();
    let wb = ledger.create_wallet(b.id, 50, WalletStatus::Active).unwrap();
    ledger.set_status(wb.id, WalletStatus::Inactive).unwrap();

    let report = wallet_overview(store.as_ref(), store.as_ref()).unwrap();
    assert_eq!(report.total_points, 300);
    assert_eq!(report.active_wallets, 1);
    assert_eq!(report.wallets.len(), 2);
    assert_eq!(report.wallets[0].customer_name.as_deref(), Some("David Kim"));

    let directory = SparseDirectory {
        names: HashMap::from([(a.id, "J. Taylor".to_string())]),
        lookups: std::cell::Cell::new(0),
    };
    let report = wallet_overview(store.as_ref(), &directory).unwrap();
    assert_eq!(report.wallets[0].customer_name, None);
    assert_eq!(report.wallets[1].customer_name.as_deref(), Some("J. Taylor"));
    assert_eq!(directory.lookups.get(), 2);
}

#[test]
fn dashboard_stats_sum_customers_and_rewards() {
    let (store, clock) = build_store();
    let c = store
        .insert_customer(&NewCustomer {
            visits: Some(4),
            spend: Some(120.0),
            ..new_customer("Ana Lopez", "ana.l@example.com")
        })
        .unwrap();
    store
        .insert_activity(c.id, ActivityKind::Reward, 0.0, Some("Free Drink"), clock.now())
        .unwrap();
    store
        .insert_activity(c.id, ActivityKind::Visit, 30.0, None, clock.now())
        .unwrap();

    let stats = store.dashboard_stats().unwrap();
    assert_eq!(stats.active_members, 1);
    assert_eq!(stats.loyalty_visits, 5);
    assert!((stats.total_revenue - 150.0).abs() < 1e-9);
    assert_eq!(stats.rewards_redeemed, 1);
}

// ── Seed ─────────────────────────────────────────────────────────────────────

#[test]
fn demo_seed_runs_once() {
    let (store, clock) = build_store();
    let report = seed_demo_data(&store, clock.as_ref()).unwrap();
    assert_eq!(report.tiers, 3);
    assert_eq!(report.customers, 8);
    assert_eq!(report.activities, 3);
    assert_eq!(store.customer_count().unwrap(), 8);

    let visits_before = store.dashboard_stats().unwrap().loyalty_visits;
    let again = seed_demo_data(&store, clock.as_ref()).unwrap();
    assert!(again.is_empty());
    assert_eq!(store.customer_count().unwrap(), 8);
    assert_eq!(store.tiers().unwrap().len(), 3);
    assert_eq!(store.dashboard_stats().unwrap().loyalty_visits, visits_before);
}
