use std::sync::Arc;
use tokio::sync::broadcast;

use qrmenu_notify::models::OrderEvent;
use qrmenu_order::repository::OrderRepository;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderRepository>,
    pub events: broadcast::Sender<OrderEvent>,
    pub auth: AuthConfig,
}
