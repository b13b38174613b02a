//! services/api/src/adapters/memory.rs
//!
//! A process-local implementation of the `CardStore` port. Used for local
//! development (`DATABASE_URL=memory://`) and by the router tests.

use async_trait::async_trait;
use card_catalog_core::domain::{Card, CardDetails};
use card_catalog_core::ports::{CardStore, PortError, PortResult};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryCardStore {
    /// Oldest first; `list_all` reverses it.
    cards: RwLock<Vec<Card>>,
}

impl MemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CardStore for MemoryCardStore {
    async fn list_all(&self) -> PortResult<Vec<Card>> {
        Ok(self.cards.read().await.iter().rev().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> PortResult<Card> {
        self.cards
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Card {} not found", id)))
    }

    async fn insert(&self, details: CardDetails) -> PortResult<Uuid> {
        let id = Uuid::new_v4();
        self.cards.write().await.push(Card {
            id,
            details,
            created_at: Utc::now(),
        });
        info!("Inserted card {}", id);
        Ok(id)
    }

    async fn update(&self, id: Uuid, details: CardDetails) -> PortResult<()> {
        let mut cards = self.cards.write().await;
        let card = cards
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Card {} not found", id)))?;
        card.details = details;
        info!("Updated card {}", id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> PortResult<()> {
        let mut cards = self.cards.write().await;
        let before = cards.len();
        cards.retain(|c| c.id != id);
        if cards.len() == before {
            return Err(PortError::NotFound(format!("Card {} not found", id)));
        }
        info!("Deleted card {}", id);
        Ok(())
    }
}
