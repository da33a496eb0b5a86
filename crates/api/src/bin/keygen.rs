//! Provision an API key and store its hash.
//!
//! Usage: `hark-keygen <name> [rate_limit] [period_secs]`
//!
//! Prints the plaintext key exactly once; only the SHA-256 hash and a short
//! display prefix are persisted.

use hark_core::api_keys::{
    generate_api_key, DEFAULT_RATE_LIMIT, DEFAULT_RATE_LIMIT_PERIOD_SECS,
};
use hark_db::models::api_key::NewApiKey;
use hark_db::repositories::ApiKeyRepo;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| {
        eprintln!("Usage: hark-keygen <name> [rate_limit] [period_secs]");
        std::process::exit(2);
    });
    let rate_limit: i32 = args
        .next()
        .map(|v| v.parse().expect("rate_limit must be an integer"))
        .unwrap_or(DEFAULT_RATE_LIMIT);
    let rate_limit_period_secs: i32 = args
        .next()
        .map(|v| v.parse().expect("period_secs must be an integer"))
        .unwrap_or(DEFAULT_RATE_LIMIT_PERIOD_SECS);

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = hark_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    hark_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let generated = generate_api_key();
    let key = ApiKeyRepo::create(
        &pool,
        &NewApiKey {
            name,
            key_hash: generated.hash.clone(),
            key_prefix: generated.prefix.clone(),
            rate_limit,
            rate_limit_period_secs,
        },
    )
    .await
    .expect("Failed to store API key");

    println!("API key created:");
    println!("  id:      {}", key.id);
    println!("  name:    {}", key.name);
    println!("  prefix:  {}", key.key_prefix);
    println!(
        "  limit:   {} requests / {} seconds",
        key.rate_limit, key.rate_limit_period_secs
    );
    println!();
    println!("Plaintext key (shown once, not recoverable):");
    println!("  {}", generated.plaintext);
}
