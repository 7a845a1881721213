//! Draft persistence: a local key-value side channel for recovering unfinished wizards.
//!
//! One draft per wizard kind, stored as JSON under a fixed key. Saving overwrites;
//! there is no versioning and no merge. Last writer wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wizard::form::FormState;
use crate::wizard::steps::WizardKind;

pub mod memory;
pub mod redis_store;

pub use memory::MemoryDraftStore;
pub use redis_store::RedisDraftStore;

const KEY_PREFIX: &str = "smartcareer:draft";

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Draft is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// What gets written to the store: the full form plus enough metadata to show
/// "restored from a draft saved at ...".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftEnvelope {
    pub kind: WizardKind,
    pub form: FormState,
    pub saved_at: DateTime<Utc>,
}

impl DraftEnvelope {
    pub fn new(kind: WizardKind, form: FormState) -> Self {
        Self {
            kind,
            form,
            saved_at: Utc::now(),
        }
    }
}

/// Fixed storage key for a wizard kind's draft.
pub fn draft_key(kind: WizardKind) -> String {
    format!("{KEY_PREFIX}:{kind}")
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn load(&self, kind: WizardKind) -> Result<Option<DraftEnvelope>, DraftError>;

    async fn save(&self, draft: &DraftEnvelope) -> Result<(), DraftError>;

    async fn delete(&self, kind: WizardKind) -> Result<(), DraftError>;
}
