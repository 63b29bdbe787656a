use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use uuid::Uuid;

use crate::{
    dto::catalog::{CatalogData, ProductDetail, ProductList},
    entity::{
        brands::{Column as BrandCol, Entity as Brands, Model as BrandModel},
        categories::{Column as CatCol, Entity as Categories, Model as CategoryModel},
        product_images::{Column as ImageCol, Entity as ProductImages},
        products::{self, Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::{Brand, Category, Product, ProductImage},
    response::{ApiResponse, Meta},
    routes::params::{CATALOG_PAGE_SIZE, CatalogFilter, CatalogQuery, CatalogSort},
    state::AppState,
};

pub fn total_pages(total: u64) -> u64 {
    total.div_ceil(CATALOG_PAGE_SIZE).max(1)
}

fn build_condition(filter: &CatalogFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(text) = &filter.text {
        let pattern = format!("%{text}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col((Products, ProdCol::Name)).ilike(pattern.clone()))
                .add(Expr::col((Brands, BrandCol::Name)).ilike(pattern)),
        );
    }

    if let Some(slug) = &filter.category_slug {
        condition = condition.add(CatCol::Slug.eq(slug.clone()));
    }

    if let Some(slug) = &filter.brand_slug {
        condition = condition.add(BrandCol::Slug.eq(slug.clone()));
    }

    if let Some(min) = filter.min_cents {
        condition = condition.add(ProdCol::PriceCents.gte(min));
    }

    if let Some(max) = filter.max_cents {
        condition = condition.add(ProdCol::PriceCents.lte(max));
    }

    if filter.in_stock_only {
        condition = condition.add(ProdCol::Stock.gt(0));
    }

    condition
}

fn apply_sort(
    finder: sea_orm::Select<Products>,
    sort: CatalogSort,
) -> sea_orm::Select<Products> {
    match sort {
        CatalogSort::Popularity => finder.order_by_desc(ProdCol::Popularity),
        CatalogSort::Newest => finder.order_by_desc(ProdCol::CreatedAt),
        CatalogSort::PriceAsc => finder.order_by_asc(ProdCol::PriceCents),
        CatalogSort::PriceDesc => finder.order_by_desc(ProdCol::PriceCents),
    }
}

pub async fn get_catalog_data(
    state: &AppState,
    query: CatalogQuery,
) -> AppResult<ApiResponse<CatalogData>> {
    let filter = query.normalize();

    let mut finder = Products::find()
        .join(JoinType::InnerJoin, products::Relation::Brands.def())
        .join(JoinType::InnerJoin, products::Relation::Categories.def())
        .filter(build_condition(&filter));
    finder = apply_sort(finder, filter.sort);

    let total = finder.clone().count(&state.orm).await?;
    let pages = total_pages(total);

    let page_models = finder
        .limit(CATALOG_PAGE_SIZE)
        .offset((filter.page - 1).saturating_mul(CATALOG_PAGE_SIZE))
        .all(&state.orm)
        .await?;
    let items = hydrate_products(&state.orm, page_models).await?;

    let categories = Categories::find()
        .order_by_asc(CatCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();
    let brands = Brands::find()
        .order_by_asc(BrandCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(brand_from_entity)
        .collect();

    let meta = Meta::new(filter.page as i64, CATALOG_PAGE_SIZE as i64, total as i64);
    let data = CatalogData {
        items,
        total: total as i64,
        page: filter.page as i64,
        total_pages: pages as i64,
        categories,
        brands,
    };
    Ok(ApiResponse::success("Catalog", data, Some(meta)))
}

pub async fn get_featured(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let models = Products::find()
        .filter(ProdCol::Featured.eq(true))
        .order_by_desc(ProdCol::Popularity)
        .limit(8)
        .all(&state.orm)
        .await?;
    let items = hydrate_products(&state.orm, models).await?;
    Ok(ApiResponse::success(
        "Featured products",
        ProductList { items },
        None,
    ))
}

pub async fn get_new_arrivals(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let models = Products::find()
        .order_by_desc(ProdCol::CreatedAt)
        .limit(8)
        .all(&state.orm)
        .await?;
    let items = hydrate_products(&state.orm, models).await?;
    Ok(ApiResponse::success(
        "New arrivals",
        ProductList { items },
        None,
    ))
}

pub async fn get_product_by_slug(
    state: &AppState,
    slug: &str,
) -> AppResult<ApiResponse<ProductDetail>> {
    let model = Products::find()
        .filter(ProdCol::Slug.eq(slug))
        .one(&state.orm)
        .await?;
    let model = match model {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let related_models = Products::find()
        .filter(ProdCol::CategoryId.eq(model.category_id))
        .filter(ProdCol::Id.ne(model.id))
        .order_by_desc(ProdCol::Popularity)
        .limit(4)
        .all(&state.orm)
        .await?;

    let mut products = hydrate_products(&state.orm, vec![model]).await?;
    let product = products
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("product vanished during hydration")))?;
    let related = hydrate_products(&state.orm, related_models).await?;

    Ok(ApiResponse::success(
        "Product",
        ProductDetail { product, related },
        None,
    ))
}

/// Attach category, brand and ordered images to raw product rows with three
/// batch lookups, preserving the input order.
pub async fn hydrate_products<C: ConnectionTrait>(
    conn: &C,
    models: Vec<ProductModel>,
) -> AppResult<Vec<Product>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut category_ids: Vec<Uuid> = models.iter().map(|m| m.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();
    let mut brand_ids: Vec<Uuid> = models.iter().map(|m| m.brand_id).collect();
    brand_ids.sort_unstable();
    brand_ids.dedup();

    let categories: HashMap<Uuid, Category> = Categories::find()
        .filter(CatCol::Id.is_in(category_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|m| (m.id, category_from_entity(m)))
        .collect();
    let brands: HashMap<Uuid, Brand> = Brands::find()
        .filter(BrandCol::Id.is_in(brand_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|m| (m.id, brand_from_entity(m)))
        .collect();

    let mut images: HashMap<Uuid, Vec<ProductImage>> = HashMap::new();
    for image in ProductImages::find()
        .filter(ImageCol::ProductId.is_in(product_ids))
        .order_by_asc(ImageCol::SortOrder)
        .all(conn)
        .await?
    {
        images
            .entry(image.product_id)
            .or_default()
            .push(ProductImage {
                id: image.id,
                url: image.url,
                alt: image.alt,
                sort_order: image.sort_order,
            });
    }

    let mut out = Vec::with_capacity(models.len());
    for model in models {
        let category = categories
            .get(&model.category_id)
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("missing category for product")))?;
        let brand = brands
            .get(&model.brand_id)
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("missing brand for product")))?;
        let product_images = images.remove(&model.id).unwrap_or_default();
        out.push(product_from_entity(model, category, brand, product_images));
    }
    Ok(out)
}

pub fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn brand_from_entity(model: BrandModel) -> Brand {
    Brand {
        id: model.id,
        name: model.name,
        slug: model.slug,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn product_from_entity(
    model: ProductModel,
    category: Category,
    brand: Brand,
    images: Vec<ProductImage>,
) -> Product {
    Product {
        id: model.id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        price_cents: model.price_cents,
        stock: model.stock,
        popularity: model.popularity,
        featured: model.featured,
        specs: model.specs,
        category,
        brand,
        images,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::total_pages;

    #[test]
    fn total_pages_never_drops_below_one() {
        assert_eq!(total_pages(0), 1);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(12), 1);
        assert_eq!(total_pages(13), 2);
        assert_eq!(total_pages(24), 2);
        assert_eq!(total_pages(25), 3);
    }
}
