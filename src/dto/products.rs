use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

fn default_specs() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: i32,
    #[serde(default)]
    pub popularity: i32,
    #[serde(default)]
    pub featured: bool,
    pub category_id: Uuid,
    pub brand_id: Uuid,
    /// Must be a JSON object; contents are not interpreted.
    #[serde(default = "default_specs")]
    pub specs: serde_json::Value,
    /// Replaces the product's image list; order defines sort order.
    #[serde(default)]
    pub image_urls: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i32>,
    pub popularity: Option<i32>,
    pub featured: Option<bool>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub specs: Option<serde_json::Value>,
    pub image_urls: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBrandRequest {
    pub name: String,
    pub slug: String,
}
