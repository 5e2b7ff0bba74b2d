use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Order totals are stored as `DECIMAL(14, 2)`, so they must stay below
/// 10^12.
const ORDER_TOTAL_DIGITS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
}

/// A placed order. `total` is frozen at creation time and never recomputed
/// from the product's current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Order {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewOrder {
    pub product_id: i32,
    pub quantity: i32,
    pub total: Decimal,
}

impl NewOrder {
    /// Price the order at the product's current price. Returns `None` when
    /// the total does not fit the orders table.
    pub fn for_product(product: &Product, quantity: i32) -> Option<Self> {
        let total = product.price.checked_mul(Decimal::from(quantity))?;
        let limit = Decimal::from(10_i64.pow(ORDER_TOTAL_DIGITS));
        if total.abs() >= limit {
            return None;
        }

        Some(Self {
            product_id: product.id,
            quantity,
            total,
        })
    }
}
