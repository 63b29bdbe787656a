use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Brand, Category, Product};

/// One catalog page plus the facet lists shown alongside it. The facets
/// always reflect the full universe, not the filtered subset.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogData {
    pub items: Vec<Product>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
    pub categories: Vec<Category>,
    pub brands: Vec<Brand>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub related: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct BrandList {
    #[schema(value_type = Vec<Brand>)]
    pub items: Vec<Brand>,
}
