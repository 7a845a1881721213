use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::wizard::session::WizardSessions;

/// Periodically writes the drafts of sessions edited since their last save, then
/// closes sessions idle for `evict_after` (when set).
pub fn spawn_autosave(
    sessions: Arc<WizardSessions>,
    every: Duration,
    evict_after: Option<Duration>,
) -> JoinHandle<()> {
    info!("Draft autosave every {}s", every.as_secs());
    if let Some(idle) = evict_after {
        info!("Idle wizard sessions close after {}s", idle.as_secs());
    }
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let saved = sessions.autosave_dirty().await;
            if saved > 0 {
                debug!("Autosaved {saved} draft(s)");
            }
            if let Some(idle) = evict_after {
                sessions.evict_idle(idle).await;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drafts::{DraftStore, MemoryDraftStore};
    use crate::errors::AppError;
    use crate::wizard::steps::WizardKind;

    #[tokio::test(start_paused = true)]
    async fn test_autosave_writes_dirty_session_after_interval() {
        let store = Arc::new(MemoryDraftStore::new());
        let sessions = Arc::new(WizardSessions::new(store.clone()));
        let session = sessions.open(WizardKind::JobApplication).await;
        session
            .edit(|form| form.set("cover_letter", "Dear hiring team"))
            .await
            .unwrap();

        let handle = spawn_autosave(Arc::clone(&sessions), Duration::from_secs(30), None);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(store.load(WizardKind::JobApplication).await.unwrap().is_none());

        tokio::time::sleep(Duration::from_secs(30)).await;
        let draft = store.load(WizardKind::JobApplication).await.unwrap().unwrap();
        assert_eq!(draft.form.text("cover_letter"), Some("Dear hiring team"));
        assert!(!session.is_dirty());
        assert!(sessions.get(session.id).await.is_ok());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_closes_idle_sessions() {
        let store = Arc::new(MemoryDraftStore::new());
        let sessions = Arc::new(WizardSessions::new(store.clone()));
        let session = sessions.open(WizardKind::JobPosting).await;
        session.edit(|form| form.set("title", "QA Lead")).await.unwrap();

        let handle = spawn_autosave(
            Arc::clone(&sessions),
            Duration::from_secs(30),
            Some(Duration::from_secs(120)),
        );
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert!(sessions.get(session.id).await.is_ok());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(matches!(
            sessions.get(session.id).await,
            Err(AppError::NotFound(_))
        ));
        let draft = store.load(WizardKind::JobPosting).await.unwrap().unwrap();
        assert_eq!(draft.form.text("title"), Some("QA Lead"));
        handle.abort();
    }
}
