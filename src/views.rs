use rust_decimal::Decimal;
use serde::Serialize;
use tera::{Context, Tera};

use crate::models::{Order, Product};

const INDEX: &str = "index.html";
const SUCCESS: &str = "success.html";

/// Page templates, compiled once when the application state is built.
#[derive(Debug)]
pub struct Views {
    tera: Tera,
}

#[derive(Serialize)]
struct ProductView<'a> {
    id: i32,
    name: &'a str,
    price: String,
}

#[derive(Serialize)]
struct OrderView {
    id: i32,
    quantity: i32,
    total: String,
    created_at: String,
}

impl Views {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (INDEX, include_str!("../templates/index.html")),
            (SUCCESS, include_str!("../templates/success.html")),
        ])?;
        Ok(Self { tera })
    }

    pub fn product_list(&self, products: &[Product]) -> Result<String, tera::Error> {
        let products: Vec<_> = products.iter().map(ProductView::from).collect();
        let mut context = Context::new();
        context.insert("products", &products);
        self.tera.render(INDEX, &context)
    }

    pub fn order_success(&self, order: &Order, product: &Product) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert(
            "order",
            &OrderView {
                id: order.id,
                quantity: order.quantity,
                total: money(order.total),
                created_at: order.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            },
        );
        context.insert("product", &ProductView::from(product));
        self.tera.render(SUCCESS, &context)
    }
}

impl<'a> From<&'a Product> for ProductView<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            id: product.id,
            name: &product.name,
            price: money(product.price),
        }
    }
}

fn money(amount: Decimal) -> String {
    format!("{amount:.2}")
}
