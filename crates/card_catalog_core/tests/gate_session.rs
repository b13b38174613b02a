//! Integration tests for the password gate's session semantics.

use card_catalog_core::gate::{hash_password, DEFAULT_SALT, FLASH_DURATION};
use card_catalog_core::{AdminSession, GateOutcome, HashScheme, PasswordGate, PrivilegedAction};

fn gate(scheme: HashScheme) -> PasswordGate {
    let expected = hash_password("mint-condition", DEFAULT_SALT, scheme);
    PasswordGate::new(expected, DEFAULT_SALT, scheme)
}

#[test]
fn three_wrong_attempts_then_the_right_one() {
    let gate = gate(HashScheme::Rolling);
    let mut session = AdminSession::default();

    for wrong in ["mint", "Mint-Condition", "mint-condition "] {
        let outcome = gate.attempt(&mut session, wrong);
        assert_eq!(outcome, GateOutcome::Rejected { flash: FLASH_DURATION });
        assert!(!session.is_verified());
        assert!(gate.authorize(&session, PrivilegedAction::EditCard).is_err());
    }

    assert_eq!(gate.attempt(&mut session, "mint-condition"), GateOutcome::Unlocked);
    assert!(session.is_verified());

    // The rest of the session never prompts again.
    for action in [
        PrivilegedAction::EnterAddPage,
        PrivilegedAction::EditCard,
        PrivilegedAction::DeleteCard,
    ] {
        assert!(gate.authorize(&session, action).is_ok());
    }
    assert_eq!(gate.attempt(&mut session, "anything"), GateOutcome::AlreadyVerified);
}

#[test]
fn argon2_gate_accepts_only_the_configured_password() {
    let gate = gate(HashScheme::Argon2);
    let mut session = AdminSession::default();
    assert!(!gate.attempt(&mut session, "wrong").is_verified());
    assert!(gate.attempt(&mut session, "mint-condition").is_verified());
}

#[test]
fn verify_hash_is_exact_string_equality() {
    let gate = gate(HashScheme::Rolling);
    let good = gate.hash("mint-condition");
    assert!(gate.verify_hash(&good));
    assert!(!gate.verify_hash(&format!("{good} ")));
    assert!(!gate.verify_hash(&format!("0{good}")));
    assert!(!gate.verify_hash(""));
}

#[test]
fn hashing_is_deterministic_for_both_schemes() {
    for scheme in [HashScheme::Argon2, HashScheme::Rolling] {
        assert_eq!(
            hash_password("same input", DEFAULT_SALT, scheme),
            hash_password("same input", DEFAULT_SALT, scheme)
        );
    }
}

#[test]
fn separate_sessions_do_not_share_the_flag() {
    let gate = gate(HashScheme::Rolling);
    let mut unlocked = AdminSession::default();
    let other = AdminSession::default();
    gate.attempt(&mut unlocked, "mint-condition");
    assert!(unlocked.is_verified());
    assert!(!other.is_verified());
}
