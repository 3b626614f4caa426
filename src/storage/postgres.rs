use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};
use uuid::Uuid;

use crate::domain::cart::{CartItem, CartQuantity};
use crate::domain::inventory::Product;
use crate::domain::ledger::Transaction;
use crate::domain::order::{Order, OrderItem, OrderRecord, OrderStatus};
use crate::domain::returns::OrderReturn;
use crate::domain::Money;
use crate::lifecycle::{serialize_event, EventEnvelope};
use super::schema::SCHEMA;
use super::{AuditRecord, Store, StoreError, UnitOfWork};

// ============================================================================
// Postgres Store
// ============================================================================
//
// Each unit of work is one sqlx transaction. Stock moves only through
// single-statement conditional UPDATEs, so concurrent checkouts of the same
// product serialise on the row lock and never overdraw. Dropping a unit
// without commit rolls the transaction back.
//
// ============================================================================

const ORDER_COLUMNS: &str = "id, user_id, order_date, total_amount_minor, status, shipping_address";
const RETURN_COLUMNS: &str = "id, order_id, user_id, return_reason, return_description, status, \
     refund_amount_minor, admin_note, refund_transaction_id, created_at, updated_at";
const TRANSACTION_COLUMNS: &str = "id, transaction_type, amount_minor, transaction_date, status, order_id, user_id";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn init(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!(statements = SCHEMA.len(), "Ledger schema ready");
        Ok(())
    }

    /// Catalog-side upsert of a product row
    pub async fn upsert_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO products (id, price_minor, stock, critical_stock_level, is_active)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET
                price_minor = EXCLUDED.price_minor,
                stock = EXCLUDED.stock,
                critical_stock_level = EXCLUDED.critical_stock_level,
                is_active = EXCLUDED.is_active",
        )
        .bind(product.id)
        .bind(product.price.minor_units())
        .bind(product.stock)
        .bind(product.critical_stock_level)
        .bind(product.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    type Unit = PgUnit;

    async fn begin(&self) -> Result<Self::Unit, StoreError> {
        Ok(PgUnit {
            tx: self.pool.begin().await?,
        })
    }
}

pub struct PgUnit {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PgUnit {
    async fn load_order(&mut self, order_id: Uuid, for_update: bool) -> Result<Option<Order>, StoreError> {
        let sql = format!(
            "SELECT {} FROM orders WHERE id = $1{}",
            ORDER_COLUMNS,
            if for_update { " FOR UPDATE" } else { "" }
        );
        let Some(row) = sqlx::query(&sql).bind(order_id).fetch_optional(&mut *self.tx).await? else {
            return Ok(None);
        };

        let item_rows = sqlx::query(
            "SELECT id, order_id, product_id, quantity, unit_price_minor
             FROM order_items WHERE order_id = $1 ORDER BY product_id",
        )
        .bind(order_id)
        .fetch_all(&mut *self.tx)
        .await?;

        let items = item_rows
            .iter()
            .map(|r| -> Result<OrderItem, StoreError> {
                Ok(OrderItem {
                    id: r.try_get("id")?,
                    order_id: r.try_get("order_id")?,
                    product_id: r.try_get("product_id")?,
                    quantity: r.try_get("quantity")?,
                    unit_price: Money::from_minor(r.try_get("unit_price_minor")?),
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let record = OrderRecord {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            order_date: row.try_get("order_date")?,
            total_amount: Money::from_minor(row.try_get("total_amount_minor")?),
            status: parse(row.try_get("status")?)?,
            shipping_address: row.try_get("shipping_address")?,
            items,
        };

        Order::restore(record)
            .map(Some)
            .map_err(|e| StoreError::Corrupt(format!("order {}: {}", order_id, e)))
    }

    async fn load_return(&mut self, return_id: Uuid, for_update: bool) -> Result<Option<OrderReturn>, StoreError> {
        let sql = format!(
            "SELECT {} FROM order_returns WHERE id = $1{}",
            RETURN_COLUMNS,
            if for_update { " FOR UPDATE" } else { "" }
        );
        sqlx::query(&sql)
            .bind(return_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(|row| return_from_row(&row))
            .transpose()
    }
}

#[async_trait]
impl UnitOfWork for PgUnit {
    async fn product(&mut self, product_id: Uuid) -> Result<Option<Product>, StoreError> {
        sqlx::query("SELECT id, price_minor, stock, critical_stock_level, is_active FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(|row| -> Result<Product, StoreError> {
                Ok(Product {
                    id: row.try_get("id")?,
                    price: Money::from_minor(row.try_get("price_minor")?),
                    stock: row.try_get("stock")?,
                    critical_stock_level: row.try_get("critical_stock_level")?,
                    is_active: row.try_get("is_active")?,
                })
            })
            .transpose()
    }

    async fn try_decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn increment_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1")
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn cart_lines(&mut self, user_id: Uuid) -> Result<Vec<CartItem>, StoreError> {
        sqlx::query(
            "SELECT user_id, product_id, count, added_at FROM cart_items
             WHERE user_id = $1 ORDER BY product_id",
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?
        .iter()
        .map(cart_item_from_row)
        .collect()
    }

    async fn cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> Result<Option<CartItem>, StoreError> {
        sqlx::query(
            "SELECT user_id, product_id, count, added_at FROM cart_items
             WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .map(|row| cart_item_from_row(&row))
        .transpose()
    }

    async fn put_cart_line(&mut self, item: &CartItem) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, count, added_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, product_id) DO UPDATE SET count = EXCLUDED.count",
        )
        .bind(item.user_id)
        .bind(item.product_id)
        .bind(item.count.get())
        .bind(item.added_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn merge_cart_line(
        &mut self,
        user_id: Uuid,
        product_id: Uuid,
        count: CartQuantity,
        added_at: DateTime<Utc>,
    ) -> Result<Option<CartItem>, StoreError> {
        // The conflicting row is locked and re-read, so concurrent adds all land.
        sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, count, added_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, product_id) DO UPDATE
                SET count = cart_items.count + EXCLUDED.count
                WHERE cart_items.count + EXCLUDED.count <= $5
             RETURNING user_id, product_id, count, added_at",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(count.get())
        .bind(added_at)
        .bind(CartQuantity::MAX)
        .fetch_optional(&mut *self.tx)
        .await?
        .map(|row| cart_item_from_row(&row))
        .transpose()
    }

    async fn delete_cart_line(&mut self, user_id: Uuid, product_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&mut self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO orders (id, user_id, order_date, total_amount_minor, status, shipping_address)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(order.id())
        .bind(order.user_id())
        .bind(order.order_date())
        .bind(order.total_amount().minor_units())
        .bind(order.status().as_str())
        .bind(order.shipping_address())
        .execute(&mut *self.tx)
        .await?;

        for item in order.items() {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_minor)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(item.id)
            .bind(item.order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price.minor_units())
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn order(&mut self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        self.load_order(order_id, false).await
    }

    async fn lock_order(&mut self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        self.load_order(order_id, true).await
    }

    async fn update_order_status(&mut self, order_id: Uuid, status: OrderStatus) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(order_id)
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() != 1 {
            return Err(StoreError::Corrupt(format!("order {} vanished", order_id)));
        }
        Ok(())
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO transactions (id, transaction_type, amount_minor, transaction_date, status, order_id, user_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(transaction.id)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.amount.minor_units())
        .bind(transaction.transaction_date)
        .bind(transaction.status.as_str())
        .bind(transaction.order_id)
        .bind(transaction.user_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn transaction(&mut self, transaction_id: Uuid) -> Result<Option<Transaction>, StoreError> {
        let sql = format!("SELECT {} FROM transactions WHERE id = $1", TRANSACTION_COLUMNS);
        sqlx::query(&sql)
            .bind(transaction_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(|row| transaction_from_row(&row))
            .transpose()
    }

    async fn transactions_for_order(&mut self, order_id: Uuid) -> Result<Vec<Transaction>, StoreError> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE order_id = $1 ORDER BY transaction_date, id",
            TRANSACTION_COLUMNS
        );
        sqlx::query(&sql)
            .bind(order_id)
            .fetch_all(&mut *self.tx)
            .await?
            .iter()
            .map(transaction_from_row)
            .collect()
    }

    async fn insert_return(&mut self, order_return: &OrderReturn) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO order_returns ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            RETURN_COLUMNS
        );
        sqlx::query(&sql)
            .bind(order_return.id)
            .bind(order_return.order_id)
            .bind(order_return.user_id)
            .bind(order_return.return_reason.as_str())
            .bind(&order_return.return_description)
            .bind(order_return.status.as_str())
            .bind(order_return.refund_amount.map(Money::minor_units))
            .bind(&order_return.admin_note)
            .bind(order_return.refund_transaction_id)
            .bind(order_return.created_at)
            .bind(order_return.updated_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn order_return(&mut self, return_id: Uuid) -> Result<Option<OrderReturn>, StoreError> {
        self.load_return(return_id, false).await
    }

    async fn lock_return(&mut self, return_id: Uuid) -> Result<Option<OrderReturn>, StoreError> {
        self.load_return(return_id, true).await
    }

    async fn returns_for_order(&mut self, order_id: Uuid) -> Result<Vec<OrderReturn>, StoreError> {
        let sql = format!(
            "SELECT {} FROM order_returns WHERE order_id = $1 ORDER BY created_at, id",
            RETURN_COLUMNS
        );
        sqlx::query(&sql)
            .bind(order_id)
            .fetch_all(&mut *self.tx)
            .await?
            .iter()
            .map(return_from_row)
            .collect()
    }

    async fn update_return(&mut self, order_return: &OrderReturn) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE order_returns SET
                status = $2,
                refund_amount_minor = $3,
                admin_note = $4,
                refund_transaction_id = $5,
                updated_at = $6
             WHERE id = $1",
        )
        .bind(order_return.id)
        .bind(order_return.status.as_str())
        .bind(order_return.refund_amount.map(Money::minor_units))
        .bind(&order_return.admin_note)
        .bind(order_return.refund_transaction_id)
        .bind(order_return.updated_at)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() != 1 {
            return Err(StoreError::Corrupt(format!("return {} vanished", order_return.id)));
        }
        Ok(())
    }

    async fn append_audit(&mut self, record: &AuditRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO ledger_audit
                (event_id, aggregate_type, aggregate_id, event_type, event_data, correlation_id, user_id, recorded_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(record.event_id)
        .bind(&record.aggregate_type)
        .bind(record.aggregate_id)
        .bind(&record.event_type)
        .bind(serialize_event(&record.event_data)?)
        .bind(record.correlation_id)
        .bind(record.user_id)
        .bind(record.recorded_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn audit_trail(&mut self, aggregate_id: Uuid) -> Result<Vec<AuditRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT event_id, aggregate_type, aggregate_id, event_type, event_data, correlation_id, user_id, recorded_at
             FROM ledger_audit WHERE aggregate_id = $1 ORDER BY recorded_at, event_id",
        )
        .bind(aggregate_id)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter()
            .map(|row| -> Result<AuditRecord, StoreError> {
                let payload: String = row.try_get("event_data")?;
                Ok(EventEnvelope {
                    event_id: row.try_get("event_id")?,
                    aggregate_type: row.try_get("aggregate_type")?,
                    aggregate_id: row.try_get("aggregate_id")?,
                    event_type: row.try_get("event_type")?,
                    event_data: serde_json::from_str(&payload)?,
                    correlation_id: row.try_get("correlation_id")?,
                    user_id: row.try_get("user_id")?,
                    recorded_at: row.try_get("recorded_at")?,
                })
            })
            .collect()
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

// ============================================================================
// Row Mapping
// ============================================================================

fn parse<T: FromStr<Err = String>>(value: String) -> Result<T, StoreError> {
    value.parse().map_err(StoreError::Corrupt)
}

fn cart_item_from_row(row: &PgRow) -> Result<CartItem, StoreError> {
    let count: i32 = row.try_get("count")?;
    Ok(CartItem {
        user_id: row.try_get("user_id")?,
        product_id: row.try_get("product_id")?,
        count: CartQuantity::new(count).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        added_at: row.try_get("added_at")?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction, StoreError> {
    Ok(Transaction {
        id: row.try_get("id")?,
        transaction_type: parse(row.try_get("transaction_type")?)?,
        amount: Money::from_minor(row.try_get("amount_minor")?),
        transaction_date: row.try_get("transaction_date")?,
        status: parse(row.try_get("status")?)?,
        order_id: row.try_get("order_id")?,
        user_id: row.try_get("user_id")?,
    })
}

fn return_from_row(row: &PgRow) -> Result<OrderReturn, StoreError> {
    let refund_amount: Option<i64> = row.try_get("refund_amount_minor")?;
    Ok(OrderReturn {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        user_id: row.try_get("user_id")?,
        return_reason: parse(row.try_get("return_reason")?)?,
        return_description: row.try_get("return_description")?,
        status: parse(row.try_get("status")?)?,
        refund_amount: refund_amount.map(Money::from_minor),
        admin_note: row.try_get("admin_note")?,
        refund_transaction_id: row.try_get("refund_transaction_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
