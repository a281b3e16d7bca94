use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    controllers::site::{
        delete_register, error404, index, not_found, save_register, select_register_to_update,
        update_register,
    },
    session::session_layer,
    state::AppState,
};

/// Every route is mounted under `site.base_path`; anything else redirects to
/// the not-found page
pub fn build_router(state: AppState) -> Router {
    let base = state.site.base_path.clone();

    Router::new()
        .route(&base, get(index))
        .route(&format!("{base}cadastrar"), post(save_register))
        .route(
            &format!("{base}editar/{{id}}"),
            get(select_register_to_update).post(select_register_to_update),
        )
        .route(
            &format!("{base}salvar-edicao/{{id}}"),
            get(update_register).post(update_register),
        )
        .route(&format!("{base}deletar/{{id}}"), get(delete_register))
        .route(&format!("{base}404"), get(error404))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), session_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
