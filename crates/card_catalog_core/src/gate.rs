//! crates/card_catalog_core/src/gate.rs
//!
//! The password gate in front of every privileged catalog action.
//!
//! The gate compares a digest of the entered password against one configured
//! hash. It is a convenience lock for a single-admin catalog, not an
//! access-control boundary: whoever holds the configured hash holds the key.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use argon2::{Algorithm, Argon2, Params, Version};
use serde::Serialize;
use tracing::warn;

/// How long the client shows the "wrong password" affordance.
pub const FLASH_DURATION: Duration = Duration::from_secs(2);

/// Salt used when none is configured.
pub const DEFAULT_SALT: &str = "card-catalog-static-salt";

// Memory cost (KiB), iterations, lanes, output length.
const ARGON2_M_COST: u32 = 8 * 1024;
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;
const DIGEST_LEN: usize = 32;

//=========================================================================================
// Hashing
//=========================================================================================

/// The digest used to turn a password into the string compared by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HashScheme {
    /// Argon2id over the password with the static salt.
    Argon2,
    /// A 32-bit rolling hash. Weak; only for environments that cannot run
    /// the real digest.
    Rolling,
}

impl FromStr for HashScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "argon2" | "argon2id" => Ok(HashScheme::Argon2),
            "rolling" => Ok(HashScheme::Rolling),
            other => Err(format!("'{}' is not a known hash scheme", other)),
        }
    }
}

impl fmt::Display for HashScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashScheme::Argon2 => f.write_str("argon2"),
            HashScheme::Rolling => f.write_str("rolling"),
        }
    }
}

/// Hashes `password` into a lowercase hex string.
///
/// With [`HashScheme::Argon2`], a digest failure (for example a salt shorter
/// than Argon2 accepts) falls back to [`rolling_hash`] instead of failing.
pub fn hash_password(password: &str, salt: &str, scheme: HashScheme) -> String {
    match scheme {
        HashScheme::Rolling => rolling_hash(password),
        HashScheme::Argon2 => match argon2_hex(password, salt) {
            Ok(digest) => digest,
            Err(e) => {
                warn!("Argon2 digest unavailable ({}), using rolling hash", e);
                rolling_hash(password)
            }
        },
    }
}

fn argon2_hex(password: &str, salt: &str) -> Result<String, argon2::Error> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(DIGEST_LEN))?;
    let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut out = [0u8; DIGEST_LEN];
    hasher.hash_password_into(password.as_bytes(), salt.as_bytes(), &mut out)?;
    Ok(out.iter().map(|b| format!("{:02x}", b)).collect())
}

/// `h = h * 31 + unit` over the UTF-16 code units, in wrapping 32-bit signed
/// arithmetic, rendered as the hex of `|h|`.
pub fn rolling_hash(password: &str) -> String {
    let h = password.encode_utf16().fold(0i32, |h, unit| {
        h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit))
    });
    format!("{:x}", h.unsigned_abs())
}

//=========================================================================================
// Session state and the gate itself
//=========================================================================================

/// The per-session verification flag. Once set it stays set for the life of
/// the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdminSession {
    verified: bool,
}

impl AdminSession {
    pub fn is_verified(&self) -> bool {
        self.verified
    }
}

/// The actions that require an unlocked session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegedAction {
    EnterAddPage,
    EditCard,
    DeleteCard,
    ImportCsv,
}

impl fmt::Display for PrivilegedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PrivilegedAction::EnterAddPage => "add a card",
            PrivilegedAction::EditCard => "edit a card",
            PrivilegedAction::DeleteCard => "delete a card",
            PrivilegedAction::ImportCsv => "import cards",
        };
        f.write_str(label)
    }
}

/// Result of one password attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The session was already unlocked; the password was not checked.
    AlreadyVerified,
    /// The password matched and the session is now unlocked.
    Unlocked,
    /// Wrong password. The client clears the input and flashes an error for `flash`.
    Rejected { flash: Duration },
}

impl GateOutcome {
    pub fn is_verified(&self) -> bool {
        !matches!(self, GateOutcome::Rejected { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("Admin password required to {0}")]
    Locked(PrivilegedAction),
}

/// Compares password digests against the one configured hash.
#[derive(Debug, Clone)]
pub struct PasswordGate {
    expected_hash: String,
    salt: String,
    scheme: HashScheme,
}

impl PasswordGate {
    pub fn new(expected_hash: impl Into<String>, salt: impl Into<String>, scheme: HashScheme) -> Self {
        Self {
            expected_hash: expected_hash.into(),
            salt: salt.into(),
            scheme,
        }
    }

    pub fn scheme(&self) -> HashScheme {
        self.scheme
    }

    /// Hashes a password the same way the expected hash was produced.
    pub fn hash(&self, password: &str) -> String {
        hash_password(password, &self.salt, self.scheme)
    }

    /// Exact comparison of an already-hashed entry against the expected hash.
    pub fn verify_hash(&self, entered_hash: &str) -> bool {
        entered_hash == self.expected_hash
    }

    /// Processes one password entry for `session`.
    ///
    /// An unlocked session is never asked again. A rejected attempt leaves the
    /// session exactly as it was.
    pub fn attempt(&self, session: &mut AdminSession, password: &str) -> GateOutcome {
        if session.verified {
            return GateOutcome::AlreadyVerified;
        }
        if self.verify_hash(&self.hash(password)) {
            session.verified = true;
            GateOutcome::Unlocked
        } else {
            warn!("Admin password rejected");
            GateOutcome::Rejected {
                flash: FLASH_DURATION,
            }
        }
    }

    /// Checks whether `session` may perform `action`.
    pub fn authorize(&self, session: &AdminSession, action: PrivilegedAction) -> Result<(), GateError> {
        if session.verified {
            Ok(())
        } else {
            Err(GateError::Locked(action))
        }
    }
}
