//! Ephemeral interaction store: a 24h-bounded Redis cache keyed by
//! `interaction:{session_id}:{interaction_id}` (spec §4.4).

use redis::AsyncCommands;
use tg_domain::error::{Error, Result};
use tg_domain::interaction::Interaction;

pub const EPHEMERAL_TTL_SECS: u64 = 24 * 60 * 60;

pub struct EphemeralStore {
    conn: redis::aio::ConnectionManager,
}

impl EphemeralStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| Error::Config(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| Error::Other(format!("redis connect failed: {e}")))?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: redis::aio::ConnectionManager) -> Self {
        Self { conn }
    }

    /// Writes the interaction with the standard 24h expiry.
    pub async fn put(&self, interaction: &Interaction) -> Result<()> {
        let key = Interaction::redis_key(&interaction.session_id, &interaction.interaction_id);
        let payload = serde_json::to_string(interaction)?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(&key, payload, EPHEMERAL_TTL_SECS)
            .await
            .map_err(|e| Error::Other(format!("redis write failed: {e}")))?;
        Ok(())
    }

    pub async fn get(&self, session_id: &str, interaction_id: &str) -> Result<Option<Interaction>> {
        let key = Interaction::redis_key(session_id, interaction_id);
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| Error::Other(format!("redis read failed: {e}")))?;
        match raw {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// Drops the expiry so the entry persists for the rest of the session,
    /// without rewriting the payload (used on `thumbs_up`).
    pub async fn persist(&self, session_id: &str, interaction_id: &str) -> Result<()> {
        let key = Interaction::redis_key(session_id, interaction_id);
        let mut conn = self.conn.clone();
        conn.persist::<_, ()>(&key)
            .await
            .map_err(|e| Error::Other(format!("redis persist failed: {e}")))?;
        Ok(())
    }

    pub async fn delete(&self, session_id: &str, interaction_id: &str) -> Result<()> {
        let key = Interaction::redis_key(session_id, interaction_id);
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&key)
            .await
            .map_err(|e| Error::Other(format!("redis delete failed: {e}")))?;
        Ok(())
    }
}
