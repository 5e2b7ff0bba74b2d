//! Persistence of products and orders.
//!
//! Handlers only see [`Store`]. [`PgStore`] is the PostgreSQL backend,
//! [`MemoryStore`] is a substitute used where no database is available, and
//! [`Traced`] wraps either one so every call gets its own child span.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewOrder, Order, Product};

pub mod memory;
pub mod postgres;
pub mod traced;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use traced::Traced;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("no rows")]
    NotFound,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name attached to store spans as `db.system`.
    fn backend(&self) -> &'static str;

    /// All products, ascending by id.
    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    async fn get_product(&self, id: i32) -> StoreResult<Product>;

    /// Insert an order and return its id. Inputs are stored as given.
    async fn create_order(&self, order: NewOrder) -> StoreResult<i32>;

    async fn get_order(&self, id: i32) -> StoreResult<Order>;

    /// Release held resources. Calling it more than once is harmless.
    async fn shutdown(&self);
}
