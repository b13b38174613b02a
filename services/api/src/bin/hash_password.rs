//! services/api/src/bin/hash_password.rs
//!
//! Prints the value to put in `ADMIN_PASSWORD_HASH` for a given password,
//! using the same `GATE_SALT` and `GATE_HASH_SCHEME` the server reads.
//!
//! Usage: `hash-password <password>`

use card_catalog_core::gate::{hash_password, DEFAULT_SALT};
use card_catalog_core::HashScheme;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let password = std::env::args()
        .nth(1)
        .ok_or("usage: hash-password <password>")?;
    let salt = std::env::var("GATE_SALT").unwrap_or_else(|_| DEFAULT_SALT.to_string());
    let scheme = match std::env::var("GATE_HASH_SCHEME") {
        Ok(raw) => raw.parse::<HashScheme>()?,
        Err(_) => HashScheme::Argon2,
    };

    println!("{}", hash_password(&password, &salt, scheme));
    Ok(())
}
