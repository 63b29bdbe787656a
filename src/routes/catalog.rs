use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::catalog::CatalogData,
    error::AppResult,
    response::ApiResponse,
    routes::params::CatalogQuery,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_catalog))
}

#[utoipa::path(
    get,
    path = "/api/catalog",
    params(
        ("q" = Option<String>, Query, description = "Text search over product and brand names"),
        ("category" = Option<String>, Query, description = "Category slug"),
        ("brand" = Option<String>, Query, description = "Brand slug"),
        ("min" = Option<String>, Query, description = "Minimum price, major units"),
        ("max" = Option<String>, Query, description = "Maximum price, major units"),
        ("in_stock" = Option<String>, Query, description = "true restricts to stock > 0"),
        ("sort" = Option<String>, Query, description = "popularity | newest | price-asc | price-desc"),
        ("page" = Option<String>, Query, description = "Page number, default 1"),
    ),
    responses(
        (status = 200, description = "Catalog page with facets", body = ApiResponse<CatalogData>)
    ),
    tag = "Catalog"
)]
pub async fn get_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<ApiResponse<CatalogData>>> {
    let resp = catalog_service::get_catalog_data(&state, query).await?;
    Ok(Json(resp))
}
