use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::user_message;
use crate::backend::{BackendClient, BackendError};
use crate::errors::AppError;
use crate::models::application::{Application, ApplicationDraft, ApplicationStatus};
use crate::models::job::{Job, JobDraft};
use crate::models::resume::{Resume, ResumeDraft};

/// A backend collection the UI caches: jobs, applications, resumes.
#[async_trait]
pub trait Resource: Clone + Serialize + Send + Sync + 'static {
    type Draft: Serialize + DeserializeOwned + Send + Sync + 'static;

    const NAME: &'static str;

    fn id(&self) -> Uuid;

    async fn list(api: &dyn BackendClient) -> Result<Vec<Self>, BackendError>;
    async fn create(api: &dyn BackendClient, draft: &Self::Draft) -> Result<Self, BackendError>;
    async fn update(
        api: &dyn BackendClient,
        id: Uuid,
        draft: &Self::Draft,
    ) -> Result<Self, BackendError>;
    async fn delete(api: &dyn BackendClient, id: Uuid) -> Result<(), BackendError>;
}

#[async_trait]
impl Resource for Job {
    type Draft = JobDraft;
    const NAME: &'static str = "job";

    fn id(&self) -> Uuid {
        self.id
    }

    async fn list(api: &dyn BackendClient) -> Result<Vec<Self>, BackendError> {
        api.list_jobs().await
    }

    async fn create(api: &dyn BackendClient, draft: &JobDraft) -> Result<Self, BackendError> {
        api.create_job(draft).await
    }

    async fn update(
        api: &dyn BackendClient,
        id: Uuid,
        draft: &JobDraft,
    ) -> Result<Self, BackendError> {
        api.update_job(id, draft).await
    }

    async fn delete(api: &dyn BackendClient, id: Uuid) -> Result<(), BackendError> {
        api.delete_job(id).await
    }
}

#[async_trait]
impl Resource for Application {
    type Draft = ApplicationDraft;
    const NAME: &'static str = "application";

    fn id(&self) -> Uuid {
        self.id
    }

    async fn list(api: &dyn BackendClient) -> Result<Vec<Self>, BackendError> {
        api.list_applications().await
    }

    async fn create(
        api: &dyn BackendClient,
        draft: &ApplicationDraft,
    ) -> Result<Self, BackendError> {
        api.create_application(draft).await
    }

    async fn update(
        api: &dyn BackendClient,
        id: Uuid,
        draft: &ApplicationDraft,
    ) -> Result<Self, BackendError> {
        api.update_application(id, draft).await
    }

    async fn delete(api: &dyn BackendClient, id: Uuid) -> Result<(), BackendError> {
        api.delete_application(id).await
    }
}

#[async_trait]
impl Resource for Resume {
    type Draft = ResumeDraft;
    const NAME: &'static str = "resume";

    fn id(&self) -> Uuid {
        self.id
    }

    async fn list(api: &dyn BackendClient) -> Result<Vec<Self>, BackendError> {
        api.list_resumes().await
    }

    async fn create(api: &dyn BackendClient, draft: &ResumeDraft) -> Result<Self, BackendError> {
        api.create_resume(draft).await
    }

    async fn update(
        api: &dyn BackendClient,
        id: Uuid,
        draft: &ResumeDraft,
    ) -> Result<Self, BackendError> {
        api.update_resume(id, draft).await
    }

    async fn delete(api: &dyn BackendClient, id: Uuid) -> Result<(), BackendError> {
        api.delete_resume(id).await
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceState<R> {
    pub items: Vec<R>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<R> Default for ResourceState<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            is_loading: false,
            error: None,
        }
    }
}

impl<R: Resource> ResourceState<R> {
    fn upsert(&mut self, item: R) {
        match self.items.iter_mut().find(|i| i.id() == item.id()) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }
}

/// Cached list of one resource plus loading and error flags.
pub struct ResourceStore<R: Resource> {
    backend: Arc<dyn BackendClient>,
    state: RwLock<ResourceState<R>>,
}

impl<R: Resource> ResourceStore<R> {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self {
            backend,
            state: RwLock::new(ResourceState::default()),
        }
    }

    pub async fn snapshot(&self) -> ResourceState<R> {
        self.state.read().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<R> {
        self.state
            .read()
            .await
            .items
            .iter()
            .find(|i| i.id() == id)
            .cloned()
    }

    /// Folds an item created elsewhere (e.g. by a wizard submission) into the cache.
    pub async fn upsert(&self, item: R) {
        self.state.write().await.upsert(item);
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.is_loading = true;
        state.error = None;
    }

    async fn finish<T>(&self, result: Result<T, AppError>) -> Result<T, AppError> {
        let mut state = self.state.write().await;
        state.is_loading = false;
        if let Err(e) = &result {
            state.error = Some(user_message(e));
        }
        result
    }

    pub async fn fetch_all(&self) -> Result<Vec<R>, AppError> {
        self.begin().await;
        let result = R::list(self.backend.as_ref()).await.map_err(AppError::from);
        if let Ok(items) = &result {
            debug!("Loaded {} {}(s)", items.len(), R::NAME);
            self.state.write().await.items = items.clone();
        }
        self.finish(result).await
    }

    pub async fn create(&self, draft: &R::Draft) -> Result<R, AppError> {
        self.begin().await;
        let result = R::create(self.backend.as_ref(), draft)
            .await
            .map_err(AppError::from);
        if let Ok(item) = &result {
            self.state.write().await.upsert(item.clone());
        }
        self.finish(result).await
    }

    pub async fn update(&self, id: Uuid, draft: &R::Draft) -> Result<R, AppError> {
        self.begin().await;
        let result = R::update(self.backend.as_ref(), id, draft)
            .await
            .map_err(AppError::from);
        if let Ok(item) = &result {
            self.state.write().await.upsert(item.clone());
        }
        self.finish(result).await
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.begin().await;
        let result = R::delete(self.backend.as_ref(), id)
            .await
            .map_err(AppError::from);
        if result.is_ok() {
            self.state.write().await.items.retain(|i| i.id() != id);
        }
        self.finish(result).await
    }
}

impl ResourceStore<Application> {
    pub async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application, AppError> {
        self.begin().await;
        let result = self
            .backend
            .update_application_status(id, status)
            .await
            .map_err(AppError::from);
        if let Ok(item) = &result {
            self.state.write().await.upsert(item.clone());
        }
        self.finish(result).await
    }
}
