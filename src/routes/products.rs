use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::catalog::{ProductDetail, ProductList},
    error::AppResult,
    response::ApiResponse,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/featured", get(featured))
        .route("/new-arrivals", get(new_arrivals))
        .route("/{slug}", get(by_slug))
}

#[utoipa::path(
    get,
    path = "/api/products/featured",
    responses(
        (status = 200, description = "Featured products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn featured(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = catalog_service::get_featured(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/new-arrivals",
    responses(
        (status = 200, description = "Most recently added products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn new_arrivals(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = catalog_service::get_new_arrivals(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{slug}",
    params(
        ("slug" = String, Path, description = "Product slug")
    ),
    responses(
        (status = 200, description = "Product with related items", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = catalog_service::get_product_by_slug(&state, &slug).await?;
    Ok(Json(resp))
}
