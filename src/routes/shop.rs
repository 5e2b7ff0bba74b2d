use axum::{
    Form,
    extract::{
        Query, State,
        rejection::{FormRejection, QueryRejection},
    },
    http::Method,
    response::{Html, Redirect},
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::NewOrder,
    state::AppState,
};

/// Fields are kept as raw strings so a missing or malformed value becomes a
/// 400 from the handler instead of an extractor rejection.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckoutForm {
    pub product_id: Option<String>,
    pub quantity: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SuccessQuery {
    /// Identifier of the order to show.
    pub order_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Product listing page", body = String, content_type = "text/html"),
        (status = 500, description = "Store or template failure", body = String),
    ),
    tag = "Shop"
)]
#[tracing::instrument(name = "home_handler", skip_all)]
pub async fn home(State(state): State<AppState>) -> AppResult<Html<String>> {
    let products = state
        .store
        .list_products()
        .await
        .map_err(|err| AppError::from_store(err, "Product not found", "Failed to get products"))?;

    let page = state.views.product_list(&products)?;
    Ok(Html(page))
}

#[utoipa::path(
    post,
    path = "/checkout",
    request_body(content = CheckoutForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Order created, redirect to /success?order_id=N"),
        (status = 400, description = "Missing or malformed form values, or a total too large to store", body = String),
        (status = 404, description = "Unknown product", body = String),
        (status = 405, description = "Method other than POST", body = String),
        (status = 500, description = "Order could not be stored", body = String),
    ),
    tag = "Shop"
)]
#[tracing::instrument(name = "checkout_handler", skip_all, fields(order_id = tracing::field::Empty))]
pub async fn checkout(
    State(state): State<AppState>,
    method: Method,
    form: Result<Form<CheckoutForm>, FormRejection>,
) -> AppResult<Redirect> {
    if method != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }

    let Form(form) = form.map_err(|_| AppError::BadRequest("Invalid form body"))?;
    let product_id = parse_positive(form.product_id.as_deref())
        .ok_or(AppError::BadRequest("Invalid product_id"))?;
    let quantity = parse_positive(form.quantity.as_deref())
        .ok_or(AppError::BadRequest("Invalid quantity"))?;

    let product = state
        .store
        .get_product(product_id)
        .await
        .map_err(|err| AppError::from_store(err, "Product not found", "Failed to get product"))?;

    let new_order = NewOrder::for_product(&product, quantity)
        .ok_or(AppError::BadRequest("Invalid quantity"))?;

    let order_id = state
        .store
        .create_order(new_order)
        .await
        .map_err(|err| AppError::from_store(err, "Product not found", "Failed to create order"))?;

    state.metrics.orders_created_total.inc();
    tracing::Span::current().record("order_id", order_id);
    tracing::info!(order_id, product_id, quantity, "order created");

    Ok(Redirect::to(&format!("/success?order_id={order_id}")))
}

#[utoipa::path(
    get,
    path = "/success",
    params(SuccessQuery),
    responses(
        (status = 200, description = "Order confirmation page", body = String, content_type = "text/html"),
        (status = 400, description = "Missing or malformed order_id", body = String),
        (status = 404, description = "Unknown order or product", body = String),
        (status = 500, description = "Store or template failure", body = String),
    ),
    tag = "Shop"
)]
#[tracing::instrument(name = "success_handler", skip_all)]
pub async fn success(
    State(state): State<AppState>,
    query: Result<Query<SuccessQuery>, QueryRejection>,
) -> AppResult<Html<String>> {
    let Query(query) = query.map_err(|_| AppError::BadRequest("Invalid order_id"))?;
    let order_id = parse_positive(query.order_id.as_deref())
        .ok_or(AppError::BadRequest("Invalid order_id"))?;

    let order = state
        .store
        .get_order(order_id)
        .await
        .map_err(|err| AppError::from_store(err, "Order not found", "Failed to get order"))?;
    let product = state
        .store
        .get_product(order.product_id)
        .await
        .map_err(|err| AppError::from_store(err, "Product not found", "Failed to get product"))?;

    let page = state.views.order_success(&order, &product)?;
    Ok(Html(page))
}

/// Ids and quantities must be positive integers.
fn parse_positive(raw: Option<&str>) -> Option<i32> {
    raw?.trim().parse::<i32>().ok().filter(|value| *value > 0)
}
