use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::{
        catalog::{BrandList, CategoryList},
        orders::{OrderList, OrderStats, OrderWithItems},
        products::{
            CreateBrandRequest, CreateCategoryRequest, CreateProductRequest, UpdateProductRequest,
        },
    },
    entity::{
        brands::{ActiveModel as BrandActive, Column as BrandCol, Entity as Brands},
        categories::{ActiveModel as CategoryActive, Column as CatCol, Entity as Categories},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        product_images::{ActiveModel as ImageActive, Column as ImageCol, Entity as ProductImages},
        products::{ActiveModel as ProductActive, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Brand, Category, OrderStatus, Product},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        catalog_service::{brand_from_entity, category_from_entity, hydrate_products},
        order_service::{self, order_from_entity, order_item_from_entity, parse_status},
    },
    state::AppState,
};

fn validate_specs(specs: &serde_json::Value) -> AppResult<()> {
    if !specs.is_object() {
        return Err(AppError::BadRequest(
            "specs must be a JSON object".to_string(),
        ));
    }
    Ok(())
}

async fn replace_images(
    txn: &sea_orm::DatabaseTransaction,
    product_id: Uuid,
    product_name: &str,
    image_urls: &[String],
) -> AppResult<()> {
    ProductImages::delete_many()
        .filter(ImageCol::ProductId.eq(product_id))
        .exec(txn)
        .await?;

    for (index, url) in image_urls.iter().enumerate() {
        ImageActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            url: Set(url.clone()),
            alt: Set(format!("{product_name} image {}", index + 1)),
            sort_order: Set(index as i32),
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    validate_specs(&payload.specs)?;

    if Categories::find_by_id(payload.category_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest("category not found".to_string()));
    }
    if Brands::find_by_id(payload.brand_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest("brand not found".to_string()));
    }

    let txn = state.orm.begin().await?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.clone()),
        slug: Set(payload.slug),
        description: Set(payload.description),
        price_cents: Set(payload.price_cents),
        stock: Set(payload.stock),
        popularity: Set(payload.popularity),
        featured: Set(payload.featured),
        specs: Set(payload.specs),
        category_id: Set(payload.category_id),
        brand_id: Set(payload.brand_id),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    replace_images(&txn, product.id, &payload.name, &payload.image_urls).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let hydrated = hydrate_products(&state.orm, vec![product]).await?;
    let product = hydrated
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("created product not hydrated")))?;
    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if let Some(specs) = &payload.specs {
        validate_specs(specs)?;
    }

    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if let Some(category_id) = payload.category_id
        && Categories::find_by_id(category_id)
            .one(&state.orm)
            .await?
            .is_none()
    {
        return Err(AppError::BadRequest("category not found".to_string()));
    }
    if let Some(brand_id) = payload.brand_id
        && Brands::find_by_id(brand_id).one(&state.orm).await?.is_none()
    {
        return Err(AppError::BadRequest("brand not found".to_string()));
    }

    let txn = state.orm.begin().await?;

    let mut active: ProductActive = existing.into();
    if let Some(name) = payload.name.clone() {
        active.name = Set(name);
    }
    if let Some(slug) = payload.slug {
        active.slug = Set(slug);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price_cents) = payload.price_cents {
        active.price_cents = Set(price_cents);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(popularity) = payload.popularity {
        active.popularity = Set(popularity);
    }
    if let Some(featured) = payload.featured {
        active.featured = Set(featured);
    }
    if let Some(specs) = payload.specs {
        active.specs = Set(specs);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(brand_id) = payload.brand_id {
        active.brand_id = Set(brand_id);
    }

    let product = active.update(&txn).await?;

    if let Some(image_urls) = &payload.image_urls {
        replace_images(&txn, product.id, &product.name, image_urls).await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let hydrated = hydrate_products(&state.orm, vec![product]).await?;
    let product = hydrated
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("updated product not hydrated")))?;
    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_categories(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CategoryList>> {
    ensure_admin(user)?;
    let items = Categories::find()
        .order_by_asc(CatCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        None,
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        slug: Set(payload.slug),
        description: Set(payload.description),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "category_create",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Categories::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "category_delete",
        Some("categories"),
        Some(serde_json::json!({ "category_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_brands(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<BrandList>> {
    ensure_admin(user)?;
    let items = Brands::find()
        .order_by_asc(BrandCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(brand_from_entity)
        .collect();
    Ok(ApiResponse::success("Brands", BrandList { items }, None))
}

pub async fn create_brand(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBrandRequest,
) -> AppResult<ApiResponse<Brand>> {
    ensure_admin(user)?;
    let brand = BrandActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        slug: Set(payload.slug),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "brand_create",
        Some("brands"),
        Some(serde_json::json!({ "brand_id": brand.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Brand created",
        brand_from_entity(brand),
        Some(Meta::empty()),
    ))
}

pub async fn delete_brand(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Brands::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "brand_delete",
        Some("brands"),
        Some(serde_json::json!({ "brand_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Order found",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Status changes go through the transition table; PENDING -> PAID,
/// PENDING -> CANCELLED and PAID -> FULFILLED are the only legal moves.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    status: OrderStatus,
) -> AppResult<ApiResponse<crate::models::Order>> {
    ensure_admin(user)?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let current = parse_status(&existing.status)?;
    if current == status {
        return Ok(ApiResponse::success(
            "Order unchanged",
            order_from_entity(existing),
            Some(Meta::empty()),
        ));
    }
    if !current.can_transition_to(status) {
        return Err(AppError::BadRequest(format!(
            "illegal status transition {current} -> {status}"
        )));
    }

    let mut active: OrderActive = existing.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn get_stats(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderStats>> {
    ensure_admin(user)?;
    let stats = order_service::order_stats(state).await?;
    Ok(ApiResponse::success("Stats", stats, Some(Meta::empty())))
}
