//! In-process `BackendClient` test double.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::{BackendClient, BackendError};
use crate::models::application::{Application, ApplicationDraft, ApplicationStatus};
use crate::models::job::{Job, JobDraft};
use crate::models::resume::{Resume, ResumeDraft};
use crate::models::user::{
    AuthResponse, AuthTokens, LoginRequest, ProfileUpdate, RegisterRequest, User, UserRole,
};

pub const PASSWORD: &str = "correct horse";

#[derive(Default)]
struct MockState {
    tokens: Option<AuthTokens>,
    jobs: Vec<Job>,
    applications: Vec<Application>,
    resumes: Vec<Resume>,
    /// Status of the error every call returns while set.
    failing: Option<(u16, String)>,
    calls: Vec<String>,
}

#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every following call fails with this status and message until `recover`.
    pub fn fail_with(&self, status: u16, message: &str) {
        self.state.lock().unwrap().failing = Some((status, message.to_string()));
    }

    pub fn recover(&self) {
        self.state.lock().unwrap().failing = None;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.state.lock().unwrap().jobs.clone()
    }

    pub fn applications(&self) -> Vec<Application> {
        self.state.lock().unwrap().applications.clone()
    }

    pub fn resumes(&self) -> Vec<Resume> {
        self.state.lock().unwrap().resumes.clone()
    }

    fn enter(&self, call: &str) -> Result<std::sync::MutexGuard<'_, MockState>, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.to_string());
        if let Some((status, message)) = state.failing.clone() {
            return Err(BackendError::Api { status, message });
        }
        Ok(state)
    }

    fn user(email: &str, full_name: &str, role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            role,
            avatar_url: None,
            created_at: None,
        }
    }

    fn not_found(what: &str) -> BackendError {
        BackendError::Api {
            status: 404,
            message: format!("{what} not found"),
        }
    }
}

fn issue_tokens() -> AuthTokens {
    AuthTokens {
        access_token: format!("access-{}", Uuid::new_v4()),
        refresh_token: format!("refresh-{}", Uuid::new_v4()),
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn set_tokens(&self, tokens: Option<AuthTokens>) {
        self.state.lock().unwrap().tokens = tokens;
    }

    async fn tokens(&self) -> Option<AuthTokens> {
        self.state.lock().unwrap().tokens.clone()
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, BackendError> {
        drop(self.enter("login")?);
        if request.password != PASSWORD {
            return Err(BackendError::Api {
                status: 401,
                message: "Invalid email or password".to_string(),
            });
        }
        let tokens = issue_tokens();
        Ok(AuthResponse {
            user: Self::user(&request.email, "Test User", UserRole::Student),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, BackendError> {
        drop(self.enter("register")?);
        let tokens = issue_tokens();
        Ok(AuthResponse {
            user: Self::user(&request.email, &request.full_name, request.role),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<AuthTokens, BackendError> {
        drop(self.enter("refresh")?);
        Ok(issue_tokens())
    }

    async fn logout(&self) -> Result<(), BackendError> {
        let mut state = self.enter("logout")?;
        state.tokens = None;
        Ok(())
    }

    async fn fetch_profile(&self) -> Result<User, BackendError> {
        let state = self.enter("fetch_profile")?;
        if state.tokens.is_none() {
            return Err(BackendError::NotAuthenticated);
        }
        Ok(Self::user("oauth@example.com", "OAuth User", UserRole::Student))
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, BackendError> {
        drop(self.enter("update_profile")?);
        let mut user = Self::user("me@example.com", "Me", UserRole::Student);
        if let Some(name) = &update.full_name {
            user.full_name = name.clone();
        }
        user.avatar_url = update.avatar_url.clone();
        Ok(user)
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, BackendError> {
        Ok(self.enter("list_jobs")?.jobs.clone())
    }

    async fn create_job(&self, draft: &JobDraft) -> Result<Job, BackendError> {
        let mut state = self.enter("create_job")?;
        let job = Job {
            id: Uuid::new_v4(),
            posting: draft.clone(),
            applicant_count: 0,
            created_at: None,
        };
        state.jobs.push(job.clone());
        Ok(job)
    }

    async fn update_job(&self, id: Uuid, draft: &JobDraft) -> Result<Job, BackendError> {
        let mut state = self.enter("update_job")?;
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| Self::not_found("Job"))?;
        job.posting = draft.clone();
        Ok(job.clone())
    }

    async fn delete_job(&self, id: Uuid) -> Result<(), BackendError> {
        let mut state = self.enter("delete_job")?;
        let before = state.jobs.len();
        state.jobs.retain(|j| j.id != id);
        if state.jobs.len() == before {
            return Err(Self::not_found("Job"));
        }
        Ok(())
    }

    async fn list_applications(&self) -> Result<Vec<Application>, BackendError> {
        Ok(self.enter("list_applications")?.applications.clone())
    }

    async fn create_application(
        &self,
        draft: &ApplicationDraft,
    ) -> Result<Application, BackendError> {
        let mut state = self.enter("create_application")?;
        let application = Application {
            id: Uuid::new_v4(),
            submission: draft.clone(),
            status: ApplicationStatus::Pending,
            created_at: None,
        };
        state.applications.push(application.clone());
        Ok(application)
    }

    async fn update_application(
        &self,
        id: Uuid,
        draft: &ApplicationDraft,
    ) -> Result<Application, BackendError> {
        let mut state = self.enter("update_application")?;
        let application = state
            .applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Self::not_found("Application"))?;
        application.submission = draft.clone();
        Ok(application.clone())
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application, BackendError> {
        let mut state = self.enter("update_application_status")?;
        let application = state
            .applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Self::not_found("Application"))?;
        application.status = status;
        Ok(application.clone())
    }

    async fn delete_application(&self, id: Uuid) -> Result<(), BackendError> {
        let mut state = self.enter("delete_application")?;
        state.applications.retain(|a| a.id != id);
        Ok(())
    }

    async fn list_resumes(&self) -> Result<Vec<Resume>, BackendError> {
        Ok(self.enter("list_resumes")?.resumes.clone())
    }

    async fn create_resume(&self, draft: &ResumeDraft) -> Result<Resume, BackendError> {
        let mut state = self.enter("create_resume")?;
        let resume = Resume {
            id: Uuid::new_v4(),
            content: draft.clone(),
            created_at: None,
            updated_at: None,
        };
        state.resumes.push(resume.clone());
        Ok(resume)
    }

    async fn update_resume(&self, id: Uuid, draft: &ResumeDraft) -> Result<Resume, BackendError> {
        let mut state = self.enter("update_resume")?;
        let resume = state
            .resumes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Self::not_found("Resume"))?;
        resume.content = draft.clone();
        Ok(resume.clone())
    }

    async fn delete_resume(&self, id: Uuid) -> Result<(), BackendError> {
        let mut state = self.enter("delete_resume")?;
        state.resumes.retain(|r| r.id != id);
        Ok(())
    }
}
