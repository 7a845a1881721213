//! Multi-step wizards: form state, step tables, validation, navigation, and the
//! live sessions that tie them to drafts, generation, and submission.

pub mod actions;
pub mod autosave;
pub mod busy;
pub mod controller;
pub mod flows;
pub mod form;
pub mod handlers;
pub mod session;
pub mod steps;
pub mod validation;
