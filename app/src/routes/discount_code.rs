use axum::{Router, routing::get};

use infra::{
    AppState,
    http::handler::discount_code::{lookup, value},
};

pub fn create_discount_code_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/lookup", get(lookup))
        .route("/value", get(value))
        .with_state(app_state)
}
