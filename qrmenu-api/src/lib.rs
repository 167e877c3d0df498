use axum::{
    http::Method,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod middleware;
pub mod notifications;
pub mod orders;
pub mod state;
pub mod webhooks;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Customer-facing surface: submitting and tracking orders needs no
    // account, the payment webhook authenticates at the gateway level.
    let public = Router::new()
        .route("/v1/orders", post(orders::create_order))
        .route("/v1/orders/{id}", get(orders::get_order))
        .route("/v1/webhooks/payments", post(webhooks::handle_payment_webhook));

    // Dashboard surface: every route here reads or mutates vendor-scoped
    // resources and runs behind the JWT middleware.
    let protected = Router::new()
        .route("/v1/orders/{id}/status", patch(orders::update_order_status))
        .route("/v1/vendors/{vendor_id}/orders", get(orders::list_vendor_orders))
        .route("/v1/notifications/stream", get(notifications::notification_stream))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::staff_auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
