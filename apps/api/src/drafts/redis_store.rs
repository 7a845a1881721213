use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, info};

use super::{draft_key, DraftEnvelope, DraftError, DraftStore};
use crate::wizard::steps::WizardKind;

/// Redis-backed draft store. One string key per wizard kind.
#[derive(Clone)]
pub struct RedisDraftStore {
    conn: MultiplexedConnection,
}

impl RedisDraftStore {
    pub async fn connect(client: &redis::Client) -> Result<Self, DraftError> {
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis draft store connected");
        Ok(Self { conn })
    }
}

#[async_trait]
impl DraftStore for RedisDraftStore {
    async fn load(&self, kind: WizardKind) -> Result<Option<DraftEnvelope>, DraftError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(draft_key(kind)).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, draft: &DraftEnvelope) -> Result<(), DraftError> {
        let raw = serde_json::to_string(draft)?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(draft_key(draft.kind), raw).await?;
        debug!("Saved {} draft to redis", draft.kind);
        Ok(())
    }

    async fn delete(&self, kind: WizardKind) -> Result<(), DraftError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(draft_key(kind)).await?;
        Ok(())
    }
}
