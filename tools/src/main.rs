//! loyalty-server: HTTP back-office for the restaurant loyalty program.
//!
//! Usage:
//!   loyalty-server --db loyalty.db --bind 0.0.0.0:5000
//!   loyalty-server --config server.json --seed-demo
//!   loyalty-server --db :memory: --seed-demo

use anyhow::{Context, Result};
use loyalty_core::{
    api::{self, AppContext},
    clock::{Clock, SystemClock},
    config::ServerConfig,
    seed::seed_demo_data,
    store::LoyaltyStore,
};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = resolve_config(&args)?;

    println!("Loyalty back-office server");
    println!("  bind:      {}", config.bind_addr);
    println!("  db:        {}", config.database);
    println!("  seed demo: {}", config.seed_demo_data);
    println!();

    let store = Arc::new(
        LoyaltyStore::open_migrated(&config.database)
            .with_context(|| format!("opening database {}", config.database))?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    if config.seed_demo_data {
        let report = seed_demo_data(&store, clock.as_ref())?;
        if report.is_empty() {
            println!("Demo data already present, nothing seeded.");
        } else {
            println!(
                "Seeded {} tiers, {} customers, {} activities.",
                report.tiers, report.customers, report.activities
            );
        }
    }

    let ctx = Arc::new(AppContext::new(store, clock));
    api::serve(ctx, &config).await
}

/// Config file first (if given), then command-line overrides.
fn resolve_config(args: &[String]) -> Result<ServerConfig> {
    let mut config = match str_arg(args, "--config") {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(db) = str_arg(args, "--db") {
        config.database = db.to_string();
    }
    if let Some(bind) = str_arg(args, "--bind") {
        config.bind_addr = bind.to_string();
    }
    if args.iter().any(|a| a == "--seed-demo") {
        config.seed_demo_data = true;
    }
    config.body_limit_bytes = parse_arg(args, "--body-limit", config.body_limit_bytes);
    Ok(config)
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
