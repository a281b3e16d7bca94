//! # corretores
//!
//! Server-rendered CRUD for real-estate brokers. Pages are served by axum,
//! rows are read and written through `active_model` models over the
//! `corretores` table, and feedback travels between requests as a flash
//! message in a cookie-identified session.

pub mod app;
pub mod controllers;
pub mod errors;
pub mod helpers;
pub mod migration;
pub mod models;
pub mod session;
pub mod state;
pub mod views;

pub use app::build_router;
pub use errors::{AppError, AppResult};
pub use session::SessionStore;
pub use state::AppState;
