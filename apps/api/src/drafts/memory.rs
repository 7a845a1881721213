use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{draft_key, DraftEnvelope, DraftError, DraftStore};
use crate::wizard::steps::WizardKind;

/// Process-local draft store. Values are kept as serialized JSON so a load goes
/// through the same decode path as a real reload.
#[derive(Default)]
pub struct MemoryDraftStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn put_raw(&self, kind: WizardKind, raw: &str) {
        self.entries
            .write()
            .await
            .insert(draft_key(kind), raw.to_string());
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn load(&self, kind: WizardKind) -> Result<Option<DraftEnvelope>, DraftError> {
        let entries = self.entries.read().await;
        match entries.get(&draft_key(kind)) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, draft: &DraftEnvelope) -> Result<(), DraftError> {
        let raw = serde_json::to_string(draft)?;
        self.entries.write().await.insert(draft_key(draft.kind), raw);
        Ok(())
    }

    async fn delete(&self, kind: WizardKind) -> Result<(), DraftError> {
        self.entries.write().await.remove(&draft_key(kind));
        Ok(())
    }
}
