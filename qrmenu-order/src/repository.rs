use async_trait::async_trait;

use crate::lifecycle::OrderError;
use crate::models::{NewOrder, Order, OrderStatus, PaymentStatus};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Order not found: {0}")]
    NotFound(i64),

    /// A concurrent actor changed the order between read and write; the
    /// losing request fails instead of overwriting state.
    #[error("Conflicting update: order is now {current}, cannot apply {requested}")]
    Conflict { current: String, requested: String },

    #[error(transparent)]
    Lifecycle(#[from] OrderError),

    #[error("Invoice number generation exhausted {0} retries")]
    InvoiceCollision(u32),

    #[error("Database error: {0}")]
    Database(String),
}

/// Authoritative order storage. Status transitions must be applied
/// atomically per order id (compare-and-set on the current status).
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order in the initial state. Regenerates the invoice
    /// number on a storage-detected collision, a bounded number of times.
    async fn create_order(&self, new: NewOrder) -> Result<Order, RepositoryError>;

    async fn get_order(&self, id: i64) -> Result<Option<Order>, RepositoryError>;

    async fn list_vendor_orders(&self, vendor_id: i64) -> Result<Vec<Order>, RepositoryError>;

    /// Validate and apply a status transition against the current stored
    /// status. A racing contradictory update yields `Conflict`.
    async fn transition_status(
        &self,
        id: i64,
        requested: OrderStatus,
    ) -> Result<Order, RepositoryError>;

    /// Apply a payment-status transition; the transaction id is written
    /// only once (first confirmation wins).
    async fn update_payment(
        &self,
        id: i64,
        requested: PaymentStatus,
        transaction_id: Option<String>,
    ) -> Result<Order, RepositoryError>;
}
