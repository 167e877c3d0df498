use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::lifecycle::OrderError;

/// Order status in the lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl OrderStatus {
    /// No transition is defined out of a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "accepted" => Ok(OrderStatus::Accepted),
            "rejected" => Ok(OrderStatus::Rejected),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// Payment status, evolving independently of the order status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(OrderError::UnknownPaymentStatus(other.to_string())),
        }
    }
}

/// A line on a customer order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: i64,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

/// Raw item shape as submitted from the QR menu UI; every field may be
/// missing on a partial payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderItemDraft {
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub price: Option<f64>,
}

impl OrderItemDraft {
    /// Apply documented defaults: missing name becomes "Unnamed Item",
    /// quantity 1, price 0. Item ids are assigned by the store.
    pub fn normalize(self) -> OrderItem {
        OrderItem {
            id: 0,
            name: self.name.unwrap_or_else(|| "Unnamed Item".to_string()),
            quantity: self.quantity.unwrap_or(1),
            price: self.price.unwrap_or(0.0),
        }
    }
}

/// Round to whole cents.
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// An order's total must equal this at creation time.
pub fn compute_total(items: &[OrderItem]) -> f64 {
    round_currency(items.iter().map(|i| i.quantity as f64 * i.price).sum())
}

/// A customer order. Never deleted; closed via a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub invoice_no: String,
    pub vendor_id: i64,
    pub table_name: Option<String>,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    /// Set once, when the gateway confirms payment.
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation payload; id, invoice number and timestamps are assigned by the
/// store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub vendor_id: i64,
    pub table_name: Option<String>,
    pub items: Vec<OrderItem>,
    pub payment_method: String,
}
