use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CheckoutRequest, CheckoutResponse, GuestCheckoutRequest, OrderList, OrderWithItems,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Order,
    payment,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/checkout", post(checkout))
        .route("/guest-checkout", post(guest_checkout))
        .route("/{id}", get(get_order))
        .route("/{id}/confirm-mock", post(confirm_mock))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "List own orders", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Place an order from the caller's cart", body = ApiResponse<CheckoutResponse>),
        (status = 409, description = "Insufficient stock"),
        (status = 422, description = "Cart is empty"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<CheckoutResponse>>> {
    let resp = order_service::checkout(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/guest-checkout",
    request_body = GuestCheckoutRequest,
    responses(
        (status = 200, description = "Place an order from an explicit guest cart", body = ApiResponse<CheckoutResponse>),
        (status = 409, description = "Items unavailable or insufficient stock"),
        (status = 422, description = "Cart is empty"),
    ),
    tag = "Orders"
)]
pub async fn guest_checkout(
    State(state): State<AppState>,
    Json(payload): Json<GuestCheckoutRequest>,
) -> AppResult<Json<ApiResponse<CheckoutResponse>>> {
    let resp = order_service::checkout_guest(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Own order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/confirm-mock",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Demo-only payment confirmation when no provider is configured", body = ApiResponse<Order>),
        (status = 400, description = "Provider configured or illegal transition"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Orders"
)]
pub async fn confirm_mock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    if !payment::mock_enabled(&state.config) {
        return Err(AppError::BadRequest(
            "mock confirmation is disabled when a payment provider is configured".into(),
        ));
    }
    let resp = order_service::mark_order_paid(&state, id).await?;
    Ok(Json(resp))
}
