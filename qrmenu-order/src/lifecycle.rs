use chrono::Utc;
use std::collections::HashMap;

use crate::models::{compute_total, NewOrder, Order, OrderStatus, PaymentStatus};

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(i64),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Unknown order status: {0:?}")]
    UnknownStatus(String),

    #[error("Unknown payment status: {0:?}")]
    UnknownPaymentStatus(String),

    #[error("Cannot complete order while payment status is {0}")]
    CompletionRequiresPayment(PaymentStatus),

    #[error("Invalid payment transition from {from} to {to}")]
    InvalidPaymentTransition { from: PaymentStatus, to: PaymentStatus },
}

/// Validate a status transition against the lifecycle table:
/// pending -> accepted | rejected, accepted -> completed.
/// Rejected and completed are terminal.
///
/// A completed order must be paid; attempting to complete an unpaid order
/// is flagged, never silently allowed.
pub fn validate_transition(
    current: OrderStatus,
    payment: PaymentStatus,
    requested: OrderStatus,
) -> Result<(), OrderError> {
    use OrderStatus::*;

    let allowed = matches!(
        (current, requested),
        (Pending, Accepted) | (Pending, Rejected) | (Accepted, Completed)
    );
    if !allowed {
        return Err(OrderError::InvalidTransition { from: current, to: requested });
    }
    if requested == Completed && payment != PaymentStatus::Paid {
        return Err(OrderError::CompletionRequiresPayment(payment));
    }
    Ok(())
}

/// Payment machine, independent of the order status:
/// unpaid -> pending -> paid, pending -> failed, failed -> pending (retry).
/// Paid is terminal.
pub fn validate_payment_transition(
    current: PaymentStatus,
    requested: PaymentStatus,
) -> Result<(), OrderError> {
    use PaymentStatus::*;

    let allowed = matches!(
        (current, requested),
        (Unpaid, Pending) | (Pending, Paid) | (Pending, Failed) | (Failed, Pending)
    );
    if allowed {
        Ok(())
    } else {
        Err(OrderError::InvalidPaymentTransition { from: current, to: requested })
    }
}

/// In-memory order ledger and transition authority.
///
/// Transitions are checked against the *current* stored status per order
/// id, so the second of two contradictory accept/reject submissions fails
/// with a transition error instead of overwriting state.
pub struct OrderBook {
    orders: HashMap<i64, Order>,
    next_order_id: i64,
    next_item_id: i64,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
            next_order_id: 1,
            next_item_id: 1,
        }
    }

    /// Create an order in the initial state (pending, unpaid).
    pub fn create(&mut self, new: NewOrder, invoice_no: String) -> &Order {
        let id = self.next_order_id;
        self.next_order_id += 1;

        let mut items = new.items;
        for item in &mut items {
            item.id = self.next_item_id;
            self.next_item_id += 1;
        }

        let now = Utc::now();
        let total_amount = compute_total(&items);
        let order = Order {
            id,
            invoice_no,
            vendor_id: new.vendor_id,
            table_name: new.table_name,
            items,
            total_amount,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_method: new.payment_method,
            transaction_id: None,
            created_at: now,
            updated_at: now,
        };
        self.orders.entry(id).or_insert(order)
    }

    pub fn get(&self, id: i64) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn orders_for_vendor(&self, vendor_id: i64) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .values()
            .filter(|o| o.vendor_id == vendor_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Apply a status transition after validating it against the current
    /// stored status and payment status.
    pub fn transition(&mut self, id: i64, requested: OrderStatus) -> Result<&Order, OrderError> {
        let order = self.orders.get_mut(&id).ok_or(OrderError::NotFound(id))?;
        validate_transition(order.status, order.payment_status, requested)?;
        order.status = requested;
        order.updated_at = Utc::now();
        Ok(order)
    }

    /// Apply a payment-status transition. The transaction id is set once;
    /// later writes keep the first value.
    pub fn update_payment(
        &mut self,
        id: i64,
        requested: PaymentStatus,
        transaction_id: Option<String>,
    ) -> Result<&Order, OrderError> {
        let order = self.orders.get_mut(&id).ok_or(OrderError::NotFound(id))?;
        validate_payment_transition(order.payment_status, requested)?;
        order.payment_status = requested;
        if order.transaction_id.is_none() {
            order.transaction_id = transaction_id;
        }
        order.updated_at = Utc::now();
        Ok(order)
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
