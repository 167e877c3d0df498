use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use qrmenu_core::access::can_access_vendor;
use qrmenu_notify::center::notification_for_order;
use qrmenu_notify::models::OrderEvent;
use qrmenu_order::lifecycle::OrderError;
use qrmenu_order::models::{NewOrder, Order, OrderItemDraft, OrderStatus, PaymentStatus};

use crate::error::{repo_err, AppError};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub vendor_id: i64,
    pub table_name: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemDraft>,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

fn default_payment_method() -> String {
    "cash".to_string()
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub invoice_no: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub total_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: i64,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            invoice_no: order.invoice_no,
            status: order.status,
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            total_amount: order.total_amount,
            transaction_id: order.transaction_id,
            table_name: order.table_name,
            items: order
                .items
                .into_iter()
                .map(|i| OrderItemResponse { id: i.id, name: i.name, quantity: i.quantity, price: i.price })
                .collect(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
/// Customer submits an order from the QR menu. Unauthenticated.
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    if req.items.is_empty() {
        return Err(AppError::ValidationError("Order must contain at least one item".to_string()));
    }

    let items = req.items.into_iter().map(OrderItemDraft::normalize).collect();
    let order = state
        .orders
        .create_order(NewOrder {
            vendor_id: req.vendor_id,
            table_name: req.table_name,
            items,
            payment_method: req.payment_method,
        })
        .await
        .map_err(repo_err)?;

    tracing::info!(order_id = order.id, invoice = %order.invoice_no, "order created");

    // Fan out to connected staff clients; no subscriber is fine.
    let _ = state.events.send(OrderEvent {
        vendor_id: order.vendor_id,
        notification: notification_for_order(&order),
    });

    Ok(Json(OrderResponse::from(order)))
}

/// GET /v1/orders/{id}
/// Customer-facing order view, addressed by order id.
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .orders
        .get_order(order_id)
        .await
        .map_err(repo_err)?
        .ok_or_else(|| AppError::NotFoundError(format!("Order {} not found", order_id)))?;

    Ok(Json(OrderResponse::from(order)))
}

/// GET /v1/vendors/{vendor_id}/orders
/// Dashboard listing, guarded by vendor scope.
pub async fn list_vendor_orders(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(vendor_id): Path<i64>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    if !can_access_vendor(Some(&user), vendor_id) {
        return Err(AppError::AuthorizationError("Access denied for this vendor".to_string()));
    }

    let orders = state.orders.list_vendor_orders(vendor_id).await.map_err(repo_err)?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// PATCH /v1/orders/{id}/status
/// Accept/reject/complete an order. The scope guard runs against the
/// order's owning vendor, recomputed from the caller's current identity.
pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(order_id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let requested: OrderStatus = req
        .status
        .parse()
        .map_err(|e: OrderError| AppError::ValidationError(e.to_string()))?;

    let order = state
        .orders
        .get_order(order_id)
        .await
        .map_err(repo_err)?
        .ok_or_else(|| AppError::NotFoundError(format!("Order {} not found", order_id)))?;

    if !can_access_vendor(Some(&user), order.vendor_id) {
        return Err(AppError::AuthorizationError("Access denied for this vendor".to_string()));
    }

    let updated = state.orders.transition_status(order_id, requested).await.map_err(repo_err)?;
    tracing::info!(order_id, status = %updated.status, "order status updated");

    Ok(Json(OrderResponse::from(updated)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use qrmenu_order::models::OrderItem;

    #[test]
    fn response_matches_customer_facing_shape() {
        let now = Utc::now();
        let order = Order {
            id: 42,
            invoice_no: "INV-20260823-00042".to_string(),
            vendor_id: 7,
            table_name: Some("Table 4".to_string()),
            items: vec![OrderItem { id: 1, name: "Green Curry".into(), quantity: 2, price: 8.95 }],
            total_amount: 17.9,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_method: "cash".to_string(),
            transaction_id: None,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(OrderResponse::from(order)).unwrap();
        assert_eq!(value["invoice_no"], "INV-20260823-00042");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["payment_status"], "unpaid");
        assert_eq!(value["items"][0]["name"], "Green Curry");
        // transaction_id is omitted until payment is confirmed.
        assert!(value.get("transaction_id").is_none());
    }
}
