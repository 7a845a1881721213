//! Live wizard instances, one per open form, keyed by session id.
//!
//! A session owns its `Wizard` behind a mutex and tracks two flags: `busy` for an
//! in-flight generation or submission, and `dirty` for edits the draft store has
//! not seen yet. Sessions nobody has touched for a while are evicted, with their
//! unsaved edits written to the draft first.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::drafts::{DraftEnvelope, DraftStore};
use crate::errors::AppError;
use crate::wizard::busy::BusyFlag;
use crate::wizard::controller::Wizard;
use crate::wizard::form::FormState;
use crate::wizard::steps::WizardKind;

#[derive(Debug, Serialize)]
pub struct StepView {
    pub id: usize,
    pub label: &'static str,
    pub fields: &'static [&'static str],
}

/// Everything a step renderer needs in one payload.
#[derive(Debug, Serialize)]
pub struct WizardView {
    pub session_id: Uuid,
    pub kind: WizardKind,
    pub steps: Vec<StepView>,
    pub current_step: usize,
    pub is_final: bool,
    pub busy: bool,
    pub dirty: bool,
    pub restored_from: Option<DateTime<Utc>>,
    pub form: FormState,
}

pub struct WizardSession {
    pub id: Uuid,
    pub kind: WizardKind,
    wizard: Mutex<Wizard>,
    busy: BusyFlag,
    dirty: AtomicBool,
    /// Set once the session has left the registry.
    closed: AtomicBool,
    restored_from: Option<DateTime<Utc>>,
    opened_at: Instant,
    /// Milliseconds after `opened_at` of the last request that used the session.
    touched_ms: AtomicU64,
}

impl WizardSession {
    fn new(kind: WizardKind, draft: Option<DraftEnvelope>) -> Self {
        let (form, restored_from) = match draft {
            Some(draft) => (draft.form, Some(draft.saved_at)),
            None => (FormState::new(), None),
        };
        Self {
            id: Uuid::new_v4(),
            kind,
            wizard: Mutex::new(Wizard::with_form(kind.definition(), form)),
            busy: BusyFlag::new(),
            dirty: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            restored_from,
            opened_at: Instant::now(),
            touched_ms: AtomicU64::new(0),
        }
    }

    pub fn busy(&self) -> &BusyFlag {
        &self.busy
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Time since a request last read, edited, or navigated this session.
    pub fn idle_for(&self) -> Duration {
        let touched = Duration::from_millis(self.touched_ms.load(Ordering::Relaxed));
        self.opened_at.elapsed().saturating_sub(touched)
    }

    fn touch(&self) {
        let elapsed = u64::try_from(self.opened_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.touched_ms.fetch_max(elapsed, Ordering::Relaxed);
    }

    /// Dirty, not busy, and still registered. An in-flight submit may be about to
    /// delete the draft, so busy sessions wait for the next tick.
    fn needs_autosave(&self) -> bool {
        self.is_dirty() && !self.busy.is_busy() && !self.is_closed()
    }

    fn ensure_idle(&self) -> Result<(), AppError> {
        if self.busy.is_busy() {
            return Err(AppError::Busy(format!(
                "The {} wizard is waiting on a request",
                self.kind
            )));
        }
        Ok(())
    }

    pub async fn read<T>(&self, f: impl FnOnce(&Wizard) -> T) -> T {
        self.touch();
        let wizard = self.wizard.lock().await;
        f(&wizard)
    }

    /// Mutates the form. Refused while a generation or submission is in flight.
    pub async fn edit<T>(&self, f: impl FnOnce(&mut FormState) -> T) -> Result<T, AppError> {
        self.ensure_idle()?;
        self.touch();
        let mut wizard = self.wizard.lock().await;
        let out = f(wizard.form_mut());
        self.dirty.store(true, Ordering::Release);
        Ok(out)
    }

    /// Moves the cursor. The cursor is not part of a draft, so this never dirties.
    pub async fn navigate<T>(&self, f: impl FnOnce(&mut Wizard) -> T) -> Result<T, AppError> {
        self.ensure_idle()?;
        self.touch();
        let mut wizard = self.wizard.lock().await;
        Ok(f(&mut wizard))
    }

    pub async fn view(&self) -> WizardView {
        self.touch();
        let wizard = self.wizard.lock().await;
        let definition = wizard.definition();
        WizardView {
            session_id: self.id,
            kind: self.kind,
            steps: definition
                .steps
                .iter()
                .map(|s| StepView {
                    id: s.id,
                    label: s.label,
                    fields: s.owned_fields,
                })
                .collect(),
            current_step: wizard.current_step(),
            is_final: wizard.is_final(),
            busy: self.busy.is_busy(),
            dirty: self.is_dirty(),
            restored_from: self.restored_from,
            form: wizard.form().clone(),
        }
    }

    /// Writes the current form as this kind's draft. The dirty flag is cleared
    /// before the write and restored if the write fails, so edits made while the
    /// write is in flight are never lost.
    pub async fn save_draft(&self, drafts: &dyn DraftStore) -> Result<DraftEnvelope, AppError> {
        let form = self.wizard.lock().await.form().clone();
        self.dirty.store(false, Ordering::Release);
        let envelope = DraftEnvelope::new(self.kind, form);
        if let Err(e) = drafts.save(&envelope).await {
            self.dirty.store(true, Ordering::Release);
            return Err(e.into());
        }
        debug!("Saved {} draft for session {}", self.kind, self.id);
        Ok(envelope)
    }
}

/// Registry of open wizards plus the draft store they hydrate from.
pub struct WizardSessions {
    sessions: RwLock<HashMap<Uuid, Arc<WizardSession>>>,
    drafts: Arc<dyn DraftStore>,
}

impl WizardSessions {
    pub fn new(drafts: Arc<dyn DraftStore>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            drafts,
        }
    }

    pub fn drafts(&self) -> &dyn DraftStore {
        self.drafts.as_ref()
    }

    /// Mounts a new wizard, restoring the kind's draft when one exists. An
    /// unreadable draft is logged and the wizard starts empty.
    pub async fn open(&self, kind: WizardKind) -> Arc<WizardSession> {
        let draft = match self.drafts.load(kind).await {
            Ok(draft) => draft,
            Err(e) => {
                warn!("Ignoring unreadable {kind} draft: {e}");
                None
            }
        };
        if let Some(draft) = &draft {
            info!("Restoring {kind} draft saved at {}", draft.saved_at);
        }
        let session = Arc::new(WizardSession::new(kind, draft));
        self.sessions
            .write()
            .await
            .insert(session.id, Arc::clone(&session));
        session
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<WizardSession>, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Wizard session {id}")))
    }

    async fn remove(&self, id: Uuid) -> Option<Arc<WizardSession>> {
        let session = self.sessions.write().await.remove(&id)?;
        session.closed.store(true, Ordering::Release);
        Some(session)
    }

    /// Tears a session down without touching its draft.
    pub async fn close(&self, id: Uuid) -> bool {
        self.remove(id).await.is_some()
    }

    /// Closes the session but keeps its draft for the next visit. Unsaved edits
    /// are written first; if that write fails the session stays open.
    pub async fn leave(&self, id: Uuid) -> Result<(), AppError> {
        let session = self.get(id).await?;
        session.ensure_idle()?;
        if session.is_dirty() {
            session.save_draft(self.drafts.as_ref()).await?;
        }
        self.remove(id).await;
        info!("Closed {} wizard {id}, draft kept", session.kind);
        Ok(())
    }

    /// Closes the session and deletes its kind's draft.
    pub async fn discard(&self, id: Uuid) -> Result<(), AppError> {
        let session = self
            .remove(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Wizard session {id}")))?;
        self.drafts.delete(session.kind).await?;
        Ok(())
    }

    pub async fn open_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Saves every dirty session's draft. Returns how many were written.
    pub async fn autosave_dirty(&self) -> usize {
        let sessions: Vec<Arc<WizardSession>> =
            self.sessions.read().await.values().cloned().collect();
        let mut saved = 0;
        for session in sessions.iter().filter(|s| s.needs_autosave()) {
            match session.save_draft(self.drafts.as_ref()).await {
                Ok(_) => saved += 1,
                Err(e) => warn!("Autosave failed for session {}: {e}", session.id),
            }
        }
        saved
    }

    /// Closes sessions untouched for at least `max_idle`, keeping their drafts.
    /// Busy sessions, and sessions whose unsaved edits cannot be written, stay
    /// open. Returns how many were closed.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let idle: Vec<Arc<WizardSession>> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.idle_for() >= max_idle)
            .cloned()
            .collect();

        let mut evicted = 0;
        for session in idle {
            if session.busy().is_busy() {
                continue;
            }
            if session.is_dirty() {
                if let Err(e) = session.save_draft(self.drafts.as_ref()).await {
                    warn!("Keeping idle session {} open, draft save failed: {e}", session.id);
                    continue;
                }
            }
            let mut map = self.sessions.write().await;
            // Used again while its draft was being written.
            if session.idle_for() < max_idle || session.busy().is_busy() || session.is_dirty() {
                continue;
            }
            if map.remove(&session.id).is_some() {
                session.closed.store(true, Ordering::Release);
                evicted += 1;
            }
        }
        if evicted > 0 {
            info!("Evicted {evicted} idle wizard session(s)");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drafts::MemoryDraftStore;
    use crate::wizard::controller::Advance;

    fn sessions() -> (Arc<MemoryDraftStore>, WizardSessions) {
        let store = Arc::new(MemoryDraftStore::new());
        (store.clone(), WizardSessions::new(store))
    }

    #[tokio::test]
    async fn test_open_without_draft_starts_empty() {
        let (_, sessions) = sessions();
        let session = sessions.open(WizardKind::JobPosting).await;
        let view = session.view().await;
        assert!(view.form.is_empty());
        assert_eq!(view.current_step, 0);
        assert_eq!(view.steps.len(), 5);
        assert!(view.restored_from.is_none());
        assert!(!view.dirty);
    }

    #[tokio::test]
    async fn test_saved_draft_restores_into_new_session() {
        let (store, sessions) = sessions();
        let first = sessions.open(WizardKind::ResumeBuilder).await;
        first
            .edit(|form| {
                form.set("full_name", "Grace Hopper");
                form.set("skills", vec!["COBOL".to_string()]);
            })
            .await
            .unwrap();
        assert_eq!(sessions.autosave_dirty().await, 1);

        // A fresh registry over the same store stands in for a reload.
        let reloaded = WizardSessions::new(store);
        let second = reloaded.open(WizardKind::ResumeBuilder).await;
        let view = second.view().await;
        assert_eq!(view.form.text("full_name"), Some("Grace Hopper"));
        assert_eq!(view.form.tags("skills"), vec!["COBOL"]);
        assert!(view.restored_from.is_some());
        assert_eq!(view.current_step, 0);
    }

    #[tokio::test]
    async fn test_corrupt_draft_starts_empty() {
        let (store, sessions) = sessions();
        store.put_raw(WizardKind::JobApplication, "{not json").await;
        let session = sessions.open(WizardKind::JobApplication).await;
        assert!(session.view().await.form.is_empty());
    }

    #[tokio::test]
    async fn test_autosave_skips_clean_sessions() {
        let (_, sessions) = sessions();
        let session = sessions.open(WizardKind::JobPosting).await;
        assert_eq!(sessions.autosave_dirty().await, 0);

        session.edit(|form| form.set("title", "QA")).await.unwrap();
        assert!(session.is_dirty());
        assert_eq!(sessions.autosave_dirty().await, 1);
        assert!(!session.is_dirty());
        assert_eq!(sessions.autosave_dirty().await, 0);
    }

    #[tokio::test]
    async fn test_navigation_does_not_dirty() {
        let (_, sessions) = sessions();
        let session = sessions.open(WizardKind::JobPosting).await;
        let outcome = session.navigate(|w| w.advance()).await.unwrap();
        assert!(matches!(outcome, Advance::Blocked { .. }));
        assert!(!session.is_dirty());
    }

    #[tokio::test]
    async fn test_edits_refused_while_busy() {
        let (_, sessions) = sessions();
        let session = sessions.open(WizardKind::JobPosting).await;
        let guard = session.busy().try_acquire().unwrap();
        let result = session.edit(|form| form.set("title", "QA")).await;
        assert!(matches!(result, Err(AppError::Busy(_))));
        assert!(matches!(
            session.navigate(|w| w.retreat()).await,
            Err(AppError::Busy(_))
        ));
        drop(guard);
        assert!(session.edit(|form| form.set("title", "QA")).await.is_ok());
    }

    #[tokio::test]
    async fn test_discard_removes_session_and_draft() {
        let (store, sessions) = sessions();
        let session = sessions.open(WizardKind::JobPosting).await;
        session.edit(|form| form.set("title", "QA")).await.unwrap();
        session.save_draft(store.as_ref()).await.unwrap();

        sessions.discard(session.id).await.unwrap();
        assert!(matches!(
            sessions.get(session.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(store.load(WizardKind::JobPosting).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_autosave_skips_busy_sessions() {
        let (store, sessions) = sessions();
        let session = sessions.open(WizardKind::JobPosting).await;
        session.edit(|form| form.set("title", "QA")).await.unwrap();

        let guard = session.busy().try_acquire().unwrap();
        assert_eq!(sessions.autosave_dirty().await, 0);
        assert!(store.load(WizardKind::JobPosting).await.unwrap().is_none());
        assert!(session.is_dirty());

        drop(guard);
        assert_eq!(sessions.autosave_dirty().await, 1);
    }

    #[tokio::test]
    async fn test_closed_session_is_not_autosaved() {
        let (_, sessions) = sessions();
        let session = sessions.open(WizardKind::JobPosting).await;
        session.edit(|form| form.set("title", "QA")).await.unwrap();
        assert!(session.needs_autosave());

        assert!(sessions.close(session.id).await);
        assert!(session.is_closed());
        assert!(session.is_dirty());
        assert!(!session.needs_autosave());
    }

    #[tokio::test]
    async fn test_leave_keeps_draft_and_frees_session() {
        let (store, sessions) = sessions();
        let session = sessions.open(WizardKind::ResumeBuilder).await;
        session
            .edit(|form| form.set("full_name", "Grace Hopper"))
            .await
            .unwrap();

        sessions.leave(session.id).await.unwrap();
        assert_eq!(sessions.open_count().await, 0);
        let draft = store.load(WizardKind::ResumeBuilder).await.unwrap().unwrap();
        assert_eq!(draft.form.text("full_name"), Some("Grace Hopper"));

        let reopened = sessions.open(WizardKind::ResumeBuilder).await;
        assert_eq!(reopened.view().await.form.text("full_name"), Some("Grace Hopper"));
    }

    #[tokio::test]
    async fn test_leave_refused_while_busy() {
        let (_, sessions) = sessions();
        let session = sessions.open(WizardKind::JobPosting).await;
        let _guard = session.busy().try_acquire().unwrap();
        assert!(matches!(
            sessions.leave(session.id).await,
            Err(AppError::Busy(_))
        ));
        assert!(sessions.get(session.id).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_evicted_with_draft_saved() {
        let (store, sessions) = sessions();
        let stale = sessions.open(WizardKind::JobPosting).await;
        stale.edit(|form| form.set("title", "QA Lead")).await.unwrap();
        let active = sessions.open(WizardKind::ResumeBuilder).await;

        tokio::time::advance(Duration::from_secs(20 * 60)).await;
        active.view().await;
        tokio::time::advance(Duration::from_secs(15 * 60)).await;

        assert_eq!(sessions.evict_idle(Duration::from_secs(30 * 60)).await, 1);
        assert!(matches!(sessions.get(stale.id).await, Err(AppError::NotFound(_))));
        assert!(sessions.get(active.id).await.is_ok());
        assert!(stale.is_closed());

        let draft = store.load(WizardKind::JobPosting).await.unwrap().unwrap();
        assert_eq!(draft.form.text("title"), Some("QA Lead"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_idle_session_is_not_evicted() {
        let (_, sessions) = sessions();
        let session = sessions.open(WizardKind::JobApplication).await;
        let guard = session.busy().try_acquire().unwrap();

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(sessions.evict_idle(Duration::from_secs(60)).await, 0);
        assert!(sessions.get(session.id).await.is_ok());

        drop(guard);
        assert_eq!(sessions.evict_idle(Duration::from_secs(60)).await, 1);
    }
}
