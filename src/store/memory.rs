use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::{
    db::SEED_PRODUCTS,
    models::{NewOrder, Order, Product},
};

use super::{Store, StoreError, StoreResult};

/// In-process store with sequential ids starting at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    products: BTreeMap<i32, Product>,
    orders: BTreeMap<i32, Order>,
    last_product_id: i32,
    last_order_id: i32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the same catalogue the database is seeded with.
    pub fn seeded() -> Self {
        let store = Self::new();
        for (name, price) in SEED_PRODUCTS {
            store.insert_product(name, Decimal::from(price));
        }
        store
    }

    pub fn insert_product(&self, name: impl Into<String>, price: Decimal) -> Product {
        let mut tables = self.tables.write();
        tables.last_product_id += 1;
        let product = Product {
            id: tables.last_product_id,
            name: name.into(),
            price,
        };
        tables.products.insert(product.id, product.clone());
        product
    }

    pub fn order_count(&self) -> usize {
        self.tables.read().orders.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.tables.read().products.values().cloned().collect())
    }

    async fn get_product(&self, id: i32) -> StoreResult<Product> {
        self.tables
            .read()
            .products
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_order(&self, order: NewOrder) -> StoreResult<i32> {
        let mut tables = self.tables.write();
        tables.last_order_id += 1;
        let id = tables.last_order_id;
        tables.orders.insert(
            id,
            Order {
                id,
                product_id: order.product_id,
                quantity: order.quantity,
                total: order.total,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn get_order(&self, id: i32) -> StoreResult<Order> {
        self.tables
            .read()
            .orders
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn shutdown(&self) {}
}
