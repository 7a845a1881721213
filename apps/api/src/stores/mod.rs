//! Injected state containers for auth and the backend's resources.
//!
//! Each action flips `is_loading` on entry and always clears it on exit. A failure
//! lands in `error` as a short user-facing message and is also returned to the caller.

use crate::errors::AppError;

pub mod auth;
pub mod handlers;
pub mod resources;

pub use auth::AuthStore;
pub use resources::{Resource, ResourceStore};

fn user_message(error: &AppError) -> String {
    match error {
        AppError::Backend(e) => e.user_message(),
        AppError::Validation(msg) | AppError::NotFound(msg) => msg.clone(),
        AppError::Unauthorized => "Please sign in to continue.".to_string(),
        _ => "Something went wrong. Please try again.".to_string(),
    }
}
