//! Demo data for a fresh database: three tiers, eight customers and a
//! handful of activities.

use crate::{
    clock::Clock,
    customer::{ActivityKind, NewCustomer, NewTier},
    error::LoyaltyResult,
    store::LoyaltyStore,
};

struct SeedCustomer {
    name: &'static str,
    email: &'static str,
    tier: &'static str,
    segment: &'static str,
    visits: i64,
    spend: f64,
}

const SEED_CUSTOMERS: &[SeedCustomer] = &[
    SeedCustomer { name: "Sofia Rodriguez", email: "sofia.r@example.com",   tier: "Platinum", segment: "High Spender", visits: 42, spend: 3240.0 },
    SeedCustomer { name: "James Chen",      email: "james.c@example.com",   tier: "Gold",     segment: "Regular",      visits: 18, spend: 1150.0 },
    SeedCustomer { name: "Emily Watson",    email: "emily.w@example.com",   tier: "Silver",   segment: "Occasional",   visits: 5,  spend: 240.0 },
    SeedCustomer { name: "Michael Johnson", email: "michael.j@example.com", tier: "Platinum", segment: "VIP",          visits: 56, spend: 4800.0 },
    SeedCustomer { name: "Sarah Miller",    email: "sarah.m@example.com",   tier: "Gold",     segment: "Regular",      visits: 22, spend: 1350.0 },
    SeedCustomer { name: "David Kim",       email: "david.k@example.com",   tier: "Silver",   segment: "Growing",      visits: 8,  spend: 450.0 },
    SeedCustomer { name: "Jessica Taylor",  email: "jessica.t@example.com", tier: "Platinum", segment: "High Spender", visits: 38, spend: 2900.0 },
    SeedCustomer { name: "Robert Anderson", email: "robert.a@example.com",  tier: "Silver",   segment: "At Risk",      visits: 3,  spend: 150.0 },
];

fn seed_tiers() -> Vec<NewTier> {
    fn tier(name: &str, requirement: &str, threshold: f64, benefits: &[&str]) -> NewTier {
        NewTier {
            name: name.to_string(),
            requirement: requirement.to_string(),
            threshold,
            benefits: benefits.iter().map(|b| b.to_string()).collect(),
        }
    }
    vec![
        tier("Silver", "Join the program", 0.0, &["5% Cashback", "Birthday Dessert", "Exclusive Newsletter"]),
        tier("Gold", "Spend $500+", 500.0, &["10% Cashback", "Priority Seating", "Free Drink every visit", "Skip the Line"]),
        tier("Platinum", "Spend $2,500+", 2500.0, &["15% Cashback", "Chef's Table Access", "Personal Concierge", "Private Event Invite", "Zero Service Fees"]),
    ]
}

/// What a seeding pass wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub tiers: usize,
    pub customers: usize,
    pub activities: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        self.tiers == 0 && self.customers == 0 && self.activities == 0
    }
}

/// Seed demo data unless customers already exist. Running twice is a no-op.
///
/// Customer counters are seeded directly, so the sample activities are
/// written as rewards and a single signup rather than visits; a visit
/// would bump the counters a second time.
pub fn seed_demo_data(store: &LoyaltyStore, clock: &dyn Clock) -> LoyaltyResult<SeedReport> {
    if store.customer_count()? > 0 {
        log::info!("demo seed skipped: customers already present");
        return Ok(SeedReport::default());
    }

    let mut report = SeedReport::default();
    for tier in seed_tiers() {
        store.insert_tier(&tier)?;
        report.tiers += 1;
    }

    let mut ids = Vec::with_capacity(SEED_CUSTOMERS.len());
    for c in SEED_CUSTOMERS {
        let customer = store.insert_customer(&NewCustomer {
            name: c.name.to_string(),
            email: c.email.to_string(),
            phone: None,
            tier: Some(c.tier.to_string()),
            segment: Some(c.segment.to_string()),
            visits: Some(c.visits),
            spend: Some(c.spend),
        })?;
        ids.push(customer.id);
        report.customers += 1;
    }

    let now = clock.now();
    let activities = [
        (ids[0], ActivityKind::Reward, Some("Free Dessert")),
        (ids[1], ActivityKind::Reward, Some("Birthday Discount (20%)")),
        (ids[7], ActivityKind::Signup, None),
    ];
    for (customer_id, kind, reward) in activities {
        store.insert_activity(customer_id, kind, 0.0, reward, now)?;
        report.activities += 1;
    }

    log::info!(
        "demo seed: {} tiers, {} customers, {} activities",
        report.tiers,
        report.customers,
        report.activities
    );
    Ok(report)
}
