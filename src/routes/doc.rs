use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    models::{Order, Product},
    routes::{metrics, shop},
};

#[derive(OpenApi)]
#[openapi(
    paths(shop::home, shop::checkout, shop::success, metrics::render),
    components(schemas(Product, Order, shop::CheckoutForm)),
    tags(
        (name = "Shop", description = "Storefront pages"),
        (name = "Observability", description = "Prometheus scrape endpoint"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
