use std::sync::Arc;

use crate::backend::BackendClient;
use crate::config::Config;
use crate::generation::ContentGenerator;
use crate::models::application::Application;
use crate::models::job::Job;
use crate::models::resume::Resume;
use crate::stores::{AuthStore, ResourceStore};
use crate::wizard::session::WizardSessions;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Holds the session tokens; `auth` and the resource stores read through it.
    pub backend: Arc<dyn BackendClient>,
    /// Pluggable generator. Default: TemplateGenerator. Swap via ENABLE_LLM_GENERATION.
    pub generator: Arc<dyn ContentGenerator>,
    pub sessions: Arc<WizardSessions>,
    pub auth: Arc<AuthStore>,
    pub jobs: Arc<ResourceStore<Job>>,
    pub applications: Arc<ResourceStore<Application>>,
    pub resumes: Arc<ResourceStore<Resume>>,
}

impl AppState {
    pub fn new(
        config: Config,
        backend: Arc<dyn BackendClient>,
        generator: Arc<dyn ContentGenerator>,
        sessions: Arc<WizardSessions>,
    ) -> Self {
        Self {
            auth: Arc::new(AuthStore::new(Arc::clone(&backend))),
            jobs: Arc::new(ResourceStore::new(Arc::clone(&backend))),
            applications: Arc::new(ResourceStore::new(Arc::clone(&backend))),
            resumes: Arc::new(ResourceStore::new(Arc::clone(&backend))),
            config,
            backend,
            generator,
            sessions,
        }
    }
}
