//! services/api/src/web/state.rs
//!
//! Defines the service's shared state and the per-browser-session admin flags.

use std::collections::HashMap;
use std::sync::Arc;

use card_catalog_core::{AdminSession, CardStore, GateOutcome, PasswordGate};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub store: Arc<dyn CardStore>,
    pub config: Arc<Config>,
    pub gate: PasswordGate,
    pub sessions: SessionRegistry,
    /// When the collection was last exported, shown on the dashboard.
    pub last_export: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    pub fn new(store: Arc<dyn CardStore>, config: Arc<Config>) -> Self {
        let gate = PasswordGate::new(
            config.admin_password_hash.clone(),
            config.gate_salt.clone(),
            config.gate_hash_scheme,
        );
        Self {
            store,
            config,
            gate,
            sessions: SessionRegistry::default(),
            last_export: Mutex::new(None),
        }
    }
}

//=========================================================================================
// SessionRegistry (One Flag Per Browser Session)
//=========================================================================================

/// Admin flags keyed by the browser's `session` cookie. Flags live as long as
/// the process or until the session is ended.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, AdminSession>>,
}

impl SessionRegistry {
    /// The flag for `id`; unknown sessions are locked.
    pub async fn get(&self, id: Uuid) -> AdminSession {
        self.sessions
            .read()
            .await
            .get(&id)
            .copied()
            .unwrap_or_default()
    }

    /// Runs one password attempt against the session's flag.
    pub async fn attempt(&self, gate: &PasswordGate, id: Uuid, password: &str) -> GateOutcome {
        let mut sessions = self.sessions.write().await;
        let mut session = sessions.get(&id).copied().unwrap_or_default();
        let outcome = gate.attempt(&mut session, password);
        if session.is_verified() {
            sessions.insert(id, session);
        }
        outcome
    }

    pub async fn end(&self, id: Uuid) {
        self.sessions.write().await.remove(&id);
    }
}
