use serde::Deserialize;
use utoipa::ToSchema;

/// Fixed page size for the public catalog.
pub const CATALOG_PAGE_SIZE: u64 = 12;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}

/// Raw catalog query parameters as they arrive on the URL. Numeric fields
/// stay strings here: parsing is permissive and bad values degrade to
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub in_stock: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSort {
    Popularity,
    Newest,
    PriceAsc,
    PriceDesc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogFilter {
    pub text: Option<String>,
    pub category_slug: Option<String>,
    pub brand_slug: Option<String>,
    pub min_cents: Option<i64>,
    pub max_cents: Option<i64>,
    pub in_stock_only: bool,
    pub sort: CatalogSort,
    pub page: u64,
}

impl CatalogQuery {
    pub fn normalize(&self) -> CatalogFilter {
        CatalogFilter {
            text: self.q.clone().filter(|s| !s.is_empty()),
            category_slug: self.category.clone().filter(|s| !s.is_empty()),
            brand_slug: self.brand.clone().filter(|s| !s.is_empty()),
            min_cents: parse_price_bound(self.min.as_deref()),
            max_cents: parse_price_bound(self.max.as_deref()),
            in_stock_only: self.in_stock.as_deref() == Some("true"),
            sort: parse_sort(self.sort.as_deref()),
            page: parse_page(self.page.as_deref()),
        }
    }
}

/// Major currency units -> integer cents, floored and clamped at zero.
/// Unparseable or non-finite input means "no bound", not an error.
fn parse_price_bound(value: Option<&str>) -> Option<i64> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed: f64 = raw.parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    Some(((parsed * 100.0).floor() as i64).max(0))
}

fn parse_sort(value: Option<&str>) -> CatalogSort {
    match value {
        Some("price-asc") => CatalogSort::PriceAsc,
        Some("price-desc") => CatalogSort::PriceDesc,
        Some("newest") => CatalogSort::Newest,
        _ => CatalogSort::Popularity,
    }
}

fn parse_page(value: Option<&str>) -> u64 {
    let parsed: f64 = match value {
        Some(raw) => raw.trim().parse().unwrap_or(f64::NAN),
        None => 1.0,
    };
    if !parsed.is_finite() || parsed <= 0.0 {
        return 1;
    }
    // Bounded so the derived OFFSET stays inside bigint range.
    parsed.floor().min(9_007_199_254_740_992.0) as u64
}
