use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::invoice::generate_invoice_number;
use crate::lifecycle::{OrderBook, OrderError};
use crate::models::{NewOrder, Order, OrderStatus, PaymentStatus};
use crate::repository::{OrderRepository, RepositoryError};

/// In-memory repository backed by [`OrderBook`], for tests and
/// single-process deployments. The book mutex makes each transition check
/// atomic per process.
pub struct MemoryOrderRepository {
    book: Mutex<OrderBook>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self { book: Mutex::new(OrderBook::new()) }
    }
}

impl Default for MemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn map_order_err(err: OrderError) -> RepositoryError {
    match err {
        OrderError::NotFound(id) => RepositoryError::NotFound(id),
        other => RepositoryError::Lifecycle(other),
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn create_order(&self, new: NewOrder) -> Result<Order, RepositoryError> {
        let mut book = self.book.lock().await;
        Ok(book.create(new, generate_invoice_number()).clone())
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, RepositoryError> {
        Ok(self.book.lock().await.get(id).cloned())
    }

    async fn list_vendor_orders(&self, vendor_id: i64) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.book.lock().await.orders_for_vendor(vendor_id))
    }

    async fn transition_status(
        &self,
        id: i64,
        requested: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut book = self.book.lock().await;
        book.transition(id, requested).map(Clone::clone).map_err(map_order_err)
    }

    async fn update_payment(
        &self,
        id: i64,
        requested: PaymentStatus,
        transaction_id: Option<String>,
    ) -> Result<Order, RepositoryError> {
        let mut book = self.book.lock().await;
        book.update_payment(id, requested, transaction_id)
            .map(Clone::clone)
            .map_err(map_order_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderItem;

    fn new_order(vendor_id: i64) -> NewOrder {
        NewOrder {
            vendor_id,
            table_name: None,
            items: vec![OrderItem { id: 0, name: "Espresso".into(), quantity: 1, price: 3.0 }],
            payment_method: "card".to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_transition_through_the_trait() {
        let repo = MemoryOrderRepository::new();
        let order = repo.create_order(new_order(7)).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.invoice_no.starts_with("INV-"));

        let accepted = repo.transition_status(order.id, OrderStatus::Accepted).await.unwrap();
        assert_eq!(accepted.status, OrderStatus::Accepted);

        // A second, contradictory submission loses.
        let err = repo.transition_status(order.id, OrderStatus::Rejected).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Lifecycle(OrderError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn vendor_listing_is_scoped() {
        let repo = MemoryOrderRepository::new();
        repo.create_order(new_order(7)).await.unwrap();
        repo.create_order(new_order(7)).await.unwrap();
        repo.create_order(new_order(8)).await.unwrap();

        assert_eq!(repo.list_vendor_orders(7).await.unwrap().len(), 2);
        assert_eq!(repo.list_vendor_orders(8).await.unwrap().len(), 1);
        assert!(repo.list_vendor_orders(9).await.unwrap().is_empty());
    }
}
