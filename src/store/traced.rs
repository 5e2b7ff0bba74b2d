use std::future::Future;

use async_trait::async_trait;
use tracing::{Instrument, field};

use crate::models::{NewOrder, Order, Product};

use super::{Store, StoreError, StoreResult};

/// Wraps a [`Store`] so each operation runs inside a `store` span, a child of
/// whatever handler span is current. The OpenTelemetry layer exports it under
/// the operation name.
#[derive(Debug, Clone)]
pub struct Traced<S> {
    inner: S,
}

impl<S: Store> Traced<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    async fn call<T, F>(&self, operation: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        let span = tracing::info_span!(
            "store",
            otel.name = operation,
            otel.kind = "client",
            otel.status_code = field::Empty,
            db.system = self.inner.backend(),
            db.operation = operation,
            error = field::Empty,
        );
        let result = fut.instrument(span.clone()).await;
        match &result {
            // A missing row is an expected answer, not a failed call.
            Ok(_) | Err(StoreError::NotFound) => {}
            Err(err) => {
                span.record("otel.status_code", "ERROR");
                span.record("error", field::display(err));
            }
        }
        result
    }
}

#[async_trait]
impl<S: Store> Store for Traced<S> {
    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        self.call("get_products", self.inner.list_products()).await
    }

    async fn get_product(&self, id: i32) -> StoreResult<Product> {
        self.call("get_product", self.inner.get_product(id)).await
    }

    async fn create_order(&self, order: NewOrder) -> StoreResult<i32> {
        self.call("create_order", self.inner.create_order(order))
            .await
    }

    async fn get_order(&self, id: i32) -> StoreResult<Order> {
        self.call("get_order", self.inner.get_order(id)).await
    }

    async fn shutdown(&self) {
        self.inner.shutdown().await;
    }
}
