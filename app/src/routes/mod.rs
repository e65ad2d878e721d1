mod discount_code;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use infra::{AppState, http::handler::health_check};

use crate::routes::discount_code::create_discount_code_routes;

/// ルーターを作成する。
///
/// # 引数
///
/// * `app_state`: アプリケーション状態
pub fn create_router(app_state: AppState) -> Router {
    axum::Router::new()
        .route("/health-check", get(health_check))
        .nest(
            "/discount-codes",
            create_discount_code_routes(app_state.clone()),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
