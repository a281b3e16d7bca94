//! Error types for the web layer

use active_model::ModelError;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::views;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Model(err) => {
                tracing::error!(error = %err, "request failed");
                let detail = err
                    .code()
                    .map(|code| format!("Erro interno ({code})."))
                    .unwrap_or_else(|| "Erro interno.".to_string());
                (StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
        };

        (status, Html(views::error_page(status, &message))).into_response()
    }
}
