use async_trait::async_trait;

use crate::{
    db::{self, DbPool},
    models::{NewOrder, Order, Product},
};

use super::{Store, StoreError, StoreResult};

/// PostgreSQL backend.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    /// Open the pool, check liveness and ensure the schema. Every failure on
    /// this path is a connection error.
    pub async fn connect(database_dsn: &str) -> StoreResult<Self> {
        let pool = db::create_pool(database_dsn)
            .await
            .map_err(StoreError::Connection)?;
        db::ensure_schema(&pool)
            .await
            .map_err(StoreError::Connection)?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgresql"
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, price FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn get_product(&self, id: i32) -> StoreResult<Product> {
        sqlx::query_as::<_, Product>(
            "SELECT id, name, price FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn create_order(&self, order: NewOrder) -> StoreResult<i32> {
        let (id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO orders (product_id, quantity, total)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(order.product_id)
        .bind(order.quantity)
        .bind(order.total)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn get_order(&self, id: i32) -> StoreResult<Order> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, product_id, quantity, total, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn shutdown(&self) {
        self.pool.close().await;
    }
}
