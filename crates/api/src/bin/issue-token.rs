#!/usr/bin/env cargo
//! Token issuing utility for ChatRelay
//!
//! Mints a bearer token the relay will accept, for local testing and for
//! operators wiring up a dashboard before the account service is in place.
//!
//! Usage:
//!   cargo run --bin issue-token -- admin a1 "Sam"
//!   cargo run --bin issue-token -- customer c42
//!
//! Reads JWT_SECRET from the environment (or .env).

use chatrelay_api::auth::JwtManager;
use chatrelay_shared::PartyKind;
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let mut args = env::args().skip(1);
    let (Some(role), Some(party_id)) = (args.next(), args.next()) else {
        eprintln!("Usage: issue-token <customer|admin> <party-id> [display-name]");
        std::process::exit(1);
    };
    let name = args.next();

    let role = match role.as_str() {
        "customer" => PartyKind::Customer,
        "admin" => PartyKind::Admin,
        other => {
            eprintln!("Error: role must be 'customer' or 'admin', got '{}'", other);
            std::process::exit(1);
        }
    };

    let secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET is not set")?;
    if secret.len() < 32 {
        eprintln!("Warning: JWT_SECRET is shorter than 32 characters; the server will refuse it.");
    }

    let hours: i64 = env::var("TOKEN_EXPIRY_HOURS")
        .ok()
        .and_then(|h| h.parse().ok())
        .unwrap_or(24);

    let token = JwtManager::new(&secret, hours).generate_token(&party_id, role, name.as_deref())?;

    println!("{}", token);
    Ok(())
}
