pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::models::application::Application;
use crate::models::job::Job;
use crate::models::resume::Resume;
use crate::state::AppState;
use crate::stores::handlers as stores;
use crate::wizard::handlers as wizard;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Wizards
        .route(
            "/api/v1/wizards",
            get(wizard::handle_list_kinds).post(wizard::handle_open),
        )
        .route(
            "/api/v1/wizards/:id",
            get(wizard::handle_get).delete(wizard::handle_discard),
        )
        .route(
            "/api/v1/wizards/:id/fields",
            patch(wizard::handle_update_fields),
        )
        .route(
            "/api/v1/wizards/:id/records/:field",
            post(wizard::handle_append_record),
        )
        .route(
            "/api/v1/wizards/:id/records/:field/:record_id",
            put(wizard::handle_update_record).delete(wizard::handle_remove_record),
        )
        .route("/api/v1/wizards/:id/advance", post(wizard::handle_advance))
        .route("/api/v1/wizards/:id/retreat", post(wizard::handle_retreat))
        .route("/api/v1/wizards/:id/jump", post(wizard::handle_jump))
        .route(
            "/api/v1/wizards/:id/validation",
            get(wizard::handle_validation),
        )
        .route("/api/v1/wizards/:id/draft", post(wizard::handle_save_draft))
        .route("/api/v1/wizards/:id/close", post(wizard::handle_close))
        .route("/api/v1/wizards/:id/generate", post(wizard::handle_generate))
        .route("/api/v1/wizards/:id/submit", post(wizard::handle_submit))
        // Auth
        .route("/api/v1/auth/session", get(stores::handle_session))
        .route("/api/v1/auth/login", post(stores::handle_login))
        .route("/api/v1/auth/register", post(stores::handle_register))
        .route("/api/v1/auth/logout", post(stores::handle_logout))
        .route("/api/v1/auth/refresh", post(stores::handle_refresh))
        .route(
            "/api/v1/auth/oauth/callback",
            post(stores::handle_oauth_callback),
        )
        .route(
            "/api/v1/auth/profile",
            get(stores::handle_get_profile).put(stores::handle_update_profile),
        )
        // Resources
        .route(
            "/api/v1/jobs",
            get(stores::handle_list::<Job>).post(stores::handle_create::<Job>),
        )
        .route(
            "/api/v1/jobs/:id",
            get(stores::handle_get::<Job>)
                .put(stores::handle_update::<Job>)
                .delete(stores::handle_delete::<Job>),
        )
        .route(
            "/api/v1/applications",
            get(stores::handle_list::<Application>).post(stores::handle_create::<Application>),
        )
        .route(
            "/api/v1/applications/:id",
            get(stores::handle_get::<Application>)
                .put(stores::handle_update::<Application>)
                .delete(stores::handle_delete::<Application>),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(stores::handle_application_status),
        )
        .route(
            "/api/v1/resumes",
            get(stores::handle_list::<Resume>).post(stores::handle_create::<Resume>),
        )
        .route(
            "/api/v1/resumes/:id",
            get(stores::handle_get::<Resume>)
                .put(stores::handle_update::<Resume>)
                .delete(stores::handle_delete::<Resume>),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::backend::mock::{MockBackend, PASSWORD};
    use crate::config::Config;
    use crate::drafts::MemoryDraftStore;
    use crate::generation::TemplateGenerator;
    use crate::wizard::flows::fixtures::complete_job_posting;
    use crate::wizard::session::WizardSessions;

    fn test_state() -> (Arc<MockBackend>, AppState) {
        let config = Config {
            backend_api_url: "http://backend.test".to_string(),
            redis_url: None,
            anthropic_api_key: None,
            enable_llm_generation: false,
            autosave_interval_secs: 0,
            session_idle_secs: 0,
            backend_timeout_secs: 5,
            port: 0,
            rust_log: "info".to_string(),
        };
        let backend = Arc::new(MockBackend::new());
        let sessions = Arc::new(WizardSessions::new(Arc::new(MemoryDraftStore::new())));
        let state = AppState::new(config, backend.clone(), Arc::new(TemplateGenerator), sessions);
        (backend, state)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn open(app: &Router, kind: &str) -> String {
        let (status, body) = call(app, Method::POST, "/api/v1/wizards", Some(json!({ "kind": kind }))).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (_, state) = test_state();
        let app = build_router(state);
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "smartcareer");
        assert_eq!(body["generator"], "template");
        assert_eq!(body["drafts"], "memory");
    }

    #[tokio::test]
    async fn test_list_kinds() {
        let (_, state) = test_state();
        let app = build_router(state);
        let (status, body) = call(&app, Method::GET, "/api/v1/wizards", None).await;
        assert_eq!(status, StatusCode::OK);
        let kinds: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|k| k["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["resume-builder", "job-posting", "job-application"]);
    }

    #[tokio::test]
    async fn test_blocked_advance_reports_field_errors() {
        let (_, state) = test_state();
        let app = build_router(state);
        let id = open(&app, "job-posting").await;

        let (status, _) = call(
            &app,
            Method::PATCH,
            &format!("/api/v1/wizards/{id}/fields"),
            Some(json!({ "fields": { "title": "QA Lead" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, Method::POST, &format!("/api/v1/wizards/{id}/advance"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "blocked");
        assert!(body["validation"]["errors"]["company"].is_string());
        assert!(body["validation"]["errors"].get("title").is_none());
        assert_eq!(body["wizard"]["current_step"], 0);
    }

    #[tokio::test]
    async fn test_job_posting_end_to_end() {
        let (backend, state) = test_state();
        let app = build_router(state);
        let id = open(&app, "job-posting").await;

        call(
            &app,
            Method::PATCH,
            &format!("/api/v1/wizards/{id}/fields"),
            Some(json!({ "fields": complete_job_posting() })),
        )
        .await;

        for to in 1..=4 {
            let (_, body) = call(&app, Method::POST, &format!("/api/v1/wizards/{id}/advance"), None).await;
            assert_eq!(body["outcome"], "moved");
            assert_eq!(body["to"], to);
        }
        let (_, body) = call(&app, Method::POST, &format!("/api/v1/wizards/{id}/advance"), None).await;
        assert_eq!(body["outcome"], "ready_to_submit");
        assert_eq!(body["wizard"]["is_final"], true);

        let (status, body) = call(&app, Method::POST, &format!("/api/v1/wizards/{id}/submit"), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["job"]["title"], "Senior Rust Engineer");
        assert_eq!(backend.jobs().len(), 1);

        let (status, _) = call(&app, Method::GET, &format!("/api/v1/wizards/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submit_incomplete_form_is_422() {
        let (_, state) = test_state();
        let app = build_router(state);
        let id = open(&app, "job-posting").await;

        let (status, body) = call(&app, Method::POST, &format!("/api/v1/wizards/{id}/submit"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_FORM");
        assert!(body["error"]["fields"]["title"].is_string());
    }

    #[tokio::test]
    async fn test_close_keeps_draft_for_next_visit() {
        let (_, state) = test_state();
        let app = build_router(state);
        let id = open(&app, "resume-builder").await;

        call(
            &app,
            Method::PATCH,
            &format!("/api/v1/wizards/{id}/fields"),
            Some(json!({ "fields": { "full_name": "Grace Hopper" } })),
        )
        .await;
        let (status, _) = call(&app, Method::POST, &format!("/api/v1/wizards/{id}/close"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(&app, Method::GET, &format!("/api/v1/wizards/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, health) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(health["open_wizards"], 0);

        let (status, body) = call(&app, Method::POST, "/api/v1/wizards", Some(json!({ "kind": "resume-builder" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["form"]["full_name"], "Grace Hopper");
        assert!(body["restored_from"].is_string());
    }

    #[tokio::test]
    async fn test_flat_record_patch_keeps_values() {
        let (_, state) = test_state();
        let app = build_router(state);
        let id = open(&app, "resume-builder").await;

        let (status, body) = call(
            &app,
            Method::PATCH,
            &format!("/api/v1/wizards/{id}/fields"),
            Some(json!({ "fields": { "experiences": [{ "company": "Acme", "position": "Dev" }] } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["form"]["experiences"][0]["fields"]["company"], "Acme");
        assert_eq!(body["form"]["experiences"][0]["fields"]["position"], "Dev");
        assert!(body["form"]["experiences"][0]["id"].is_string());
    }

    #[tokio::test]
    async fn test_jump_ahead_is_rejected() {
        let (_, state) = test_state();
        let app = build_router(state);
        let id = open(&app, "resume-builder").await;
        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/wizards/{id}/jump"),
            Some(json!({ "step": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_records_append_and_remove() {
        let (_, state) = test_state();
        let app = build_router(state);
        let id = open(&app, "resume-builder").await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/wizards/{id}/records/experiences"),
            Some(json!({ "fields": { "company": "Acme", "position": "Engineer" } })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let record_id = body["record_id"].as_str().unwrap().to_string();
        assert_eq!(body["wizard"]["form"]["experiences"][0]["fields"]["company"], "Acme");

        let uri = format!("/api/v1/wizards/{id}/records/experiences/{record_id}");
        let (status, body) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["form"]["experiences"], json!([]));

        let (status, _) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_does_not_touch_form() {
        let (_, state) = test_state();
        let app = build_router(state);
        let id = open(&app, "job-posting").await;
        call(
            &app,
            Method::PATCH,
            &format!("/api/v1/wizards/{id}/fields"),
            Some(json!({ "fields": { "title": "Data Engineer", "skills": ["SQL", "Python"] } })),
        )
        .await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/wizards/{id}/generate"),
            Some(json!({ "target": "description" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["text"].as_str().unwrap().len() >= 100);

        let (_, view) = call(&app, Method::GET, &format!("/api/v1/wizards/{id}"), None).await;
        assert!(view["form"].get("description").is_none());
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_backend_message() {
        let (_, state) = test_state();
        let app = build_router(state);
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "a@b.co", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "Invalid email or password");

        let (_, session) = call(&app, Method::GET, "/api/v1/auth/session", None).await;
        assert_eq!(session["is_authenticated"], false);
        assert_eq!(session["error"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_login_then_list_jobs() {
        let (_, state) = test_state();
        let app = build_router(state);
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "a@b.co", "password": PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "a@b.co");

        let (status, body) = call(&app, Method::GET, "/api/v1/jobs", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }
}
