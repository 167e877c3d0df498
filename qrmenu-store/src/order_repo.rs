use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use qrmenu_order::invoice::generate_invoice_number;
use qrmenu_order::lifecycle::{validate_payment_transition, validate_transition};
use qrmenu_order::models::{compute_total, NewOrder, Order, OrderItem, OrderStatus, PaymentStatus};
use qrmenu_order::repository::{OrderRepository, RepositoryError};

pub struct PgOrderRepository {
    pool: PgPool,
    invoice_retries: u32,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool, invoice_retries: u32) -> Self {
        Self { pool, invoice_retries }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    invoice_no: String,
    vendor_id: i64,
    table_name: Option<String>,
    total_amount: f64,
    status: String,
    payment_status: String,
    payment_method: String,
    transaction_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    name: String,
    quantity: i32,
    price: f64,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, RepositoryError> {
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|_| RepositoryError::Database(format!("unrecognized stored status: {}", self.status)))?;
        let payment_status: PaymentStatus = self.payment_status.parse().map_err(|_| {
            RepositoryError::Database(format!(
                "unrecognized stored payment status: {}",
                self.payment_status
            ))
        })?;

        Ok(Order {
            id: self.id,
            invoice_no: self.invoice_no,
            vendor_id: self.vendor_id,
            table_name: self.table_name,
            items: items
                .into_iter()
                .map(|i| OrderItem {
                    id: i.id,
                    name: i.name,
                    quantity: i.quantity.max(0) as u32,
                    price: i.price,
                })
                .collect(),
            total_amount: self.total_amount,
            status,
            payment_status,
            payment_method: self.payment_method,
            transaction_id: self.transaction_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn db_err(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation),
        _ => false,
    }
}

const ORDER_COLUMNS: &str = "id, invoice_no, vendor_id, table_name, total_amount, status, \
     payment_status, payment_method, transaction_id, created_at, updated_at";

impl PgOrderRepository {
    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, RepositoryError> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, name, quantity, price FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        row.into_order(items).map(Some)
    }

    async fn require_order(&self, id: i64) -> Result<Order, RepositoryError> {
        self.fetch_order(id).await?.ok_or(RepositoryError::NotFound(id))
    }

    async fn insert_order(
        &self,
        new: &NewOrder,
        invoice_no: &str,
        total: f64,
    ) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let (order_id,): (i64,) = sqlx::query_as(
            "INSERT INTO orders (invoice_no, vendor_id, table_name, total_amount, payment_method) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(invoice_no)
        .bind(new.vendor_id)
        .bind(&new.table_name)
        .bind(total)
        .bind(&new.payment_method)
        .fetch_one(&mut *tx)
        .await?;

        for item in &new.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, name, quantity, price) VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(&item.name)
            .bind(item.quantity as i32)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order_id)
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create_order(&self, new: NewOrder) -> Result<Order, RepositoryError> {
        let total = compute_total(&new.items);

        for attempt in 1..=self.invoice_retries {
            let invoice_no = generate_invoice_number();
            match self.insert_order(&new, &invoice_no, total).await {
                Ok(order_id) => return self.require_order(order_id).await,
                Err(err) if is_unique_violation(&err) => {
                    tracing::warn!(attempt, invoice = %invoice_no, "invoice number collision, regenerating");
                }
                Err(err) => return Err(db_err(err)),
            }
        }

        Err(RepositoryError::InvoiceCollision(self.invoice_retries))
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>, RepositoryError> {
        self.fetch_order(id).await
    }

    async fn list_vendor_orders(&self, vendor_id: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT id FROM orders WHERE vendor_id = $1 ORDER BY created_at DESC",
        )
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut orders = Vec::with_capacity(rows.len());
        for (id,) in rows {
            if let Some(order) = self.fetch_order(id).await? {
                orders.push(order);
            }
        }
        Ok(orders)
    }

    async fn transition_status(
        &self,
        id: i64,
        requested: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let current = self.require_order(id).await?;
        validate_transition(current.status, current.payment_status, requested)?;

        // Compare-and-set on the status read above; a racing update makes
        // this touch zero rows.
        let result = sqlx::query(
            "UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2 AND status = $3",
        )
        .bind(requested.as_str())
        .bind(id)
        .bind(current.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            let now = self.require_order(id).await?;
            tracing::warn!(
                order_id = id,
                current = %now.status,
                requested = %requested,
                "lost status transition race"
            );
            return Err(RepositoryError::Conflict {
                current: now.status.to_string(),
                requested: requested.to_string(),
            });
        }

        self.require_order(id).await
    }

    async fn update_payment(
        &self,
        id: i64,
        requested: PaymentStatus,
        transaction_id: Option<String>,
    ) -> Result<Order, RepositoryError> {
        let current = self.require_order(id).await?;
        validate_payment_transition(current.payment_status, requested)?;

        // COALESCE keeps the first transaction id ever written.
        let result = sqlx::query(
            "UPDATE orders SET payment_status = $1, transaction_id = COALESCE(transaction_id, $2), \
             updated_at = NOW() WHERE id = $3 AND payment_status = $4",
        )
        .bind(requested.as_str())
        .bind(&transaction_id)
        .bind(id)
        .bind(current.payment_status.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            let now = self.require_order(id).await?;
            return Err(RepositoryError::Conflict {
                current: now.payment_status.to_string(),
                requested: requested.to_string(),
            });
        }

        self.require_order(id).await
    }
}
