use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{
        AddToCartRequest, CartItemDto, CartList, GuestCartItem, SyncCartRequest,
        UpdateCartItemRequest,
    },
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartCol, Entity as CartItems},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartItem,
    response::{ApiResponse, Meta},
    services::catalog_service::hydrate_products,
    state::AppState,
};

const MAX_LINE_QUANTITY: i32 = 50;

fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "quantity must not exceed {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let product_ids: Vec<Uuid> = rows.iter().map(|r| r.product_id).collect();
    let products = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&state.orm)
        .await?;
    let products: HashMap<Uuid, _> = hydrate_products(&state.orm, products)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut items = Vec::with_capacity(rows.len());
    let mut total_cents = 0_i64;
    for row in rows {
        let product = match products.get(&row.product_id) {
            Some(p) => p.clone(),
            // Row pointing at a product deleted mid-request; skip it.
            None => continue,
        };
        let line_cents = product.price_cents * i64::from(row.quantity);
        total_cents += line_cents;
        items.push(CartItemDto {
            id: row.id,
            product,
            quantity: row.quantity,
            line_cents,
        });
    }

    let total = items.len() as i64;
    let meta = Meta::new(1, total.max(1), total);
    Ok(ApiResponse::success(
        "OK",
        CartList { items, total_cents },
        Some(meta),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    validate_quantity(payload.quantity)?;

    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?;
    if product.is_none() {
        return Err(AppError::BadRequest("product not found".to_string()));
    }

    let existing = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(payload.product_id))
        .one(&state.orm)
        .await?;

    let cart_item = if let Some(item) = existing {
        let merged = item.quantity + payload.quantity;
        let mut active: CartItemActive = item.into();
        active.quantity = Set(merged);
        active.update(&state.orm).await?
    } else {
        CartItemActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.user_id),
            product_id: Set(payload.product_id),
            quantity: Set(payload.quantity),
            created_at: NotSet,
        }
        .insert(&state.orm)
        .await?
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "OK",
        cart_item_from_entity(cart_item),
        None,
    ))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.quantity > MAX_LINE_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "quantity must not exceed {MAX_LINE_QUANTITY}"
        )));
    }

    let existing = CartItems::find_by_id(item_id)
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    let existing = match existing {
        Some(item) => item,
        None => return Err(AppError::NotFound),
    };

    // Zero or negative quantity removes the line instead of keeping a dead row.
    if payload.quantity <= 0 {
        CartItems::delete_by_id(existing.id).exec(&state.orm).await?;
        return Ok(ApiResponse::success(
            "Removed from cart",
            serde_json::json!({}),
            Some(Meta::empty()),
        ));
    }

    let mut active: CartItemActive = existing.into();
    active.quantity = Set(payload.quantity);
    active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn remove_cart_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::Id.eq(item_id))
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "item_id": item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Reconcile a client-held guest cart into the server-side cart: quantities
/// merge additively per product. Callers must invoke this at most once per
/// sign-in; a repeat double-counts.
pub async fn sync_guest_cart(
    state: &AppState,
    user: &AuthUser,
    payload: SyncCartRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.items.is_empty() {
        return Ok(ApiResponse::success(
            "Nothing to sync",
            serde_json::json!({}),
            Some(Meta::empty()),
        ));
    }

    for item in &payload.items {
        validate_quantity(item.quantity)?;
    }

    let product_ids: Vec<Uuid> = payload.items.iter().map(|i| i.product_id).collect();
    let known: Vec<Uuid> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    let mut merged = 0_usize;
    for GuestCartItem {
        product_id,
        quantity,
    } in payload.items
    {
        if !known.contains(&product_id) {
            // Stale guest line (product removed since it was added); drop it.
            continue;
        }

        let existing = CartItems::find()
            .filter(CartCol::UserId.eq(user.user_id))
            .filter(CartCol::ProductId.eq(product_id))
            .one(&state.orm)
            .await?;

        if let Some(item) = existing {
            let combined = item.quantity + quantity;
            let mut active: CartItemActive = item.into();
            active.quantity = Set(combined);
            active.update(&state.orm).await?;
        } else {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await?;
        }
        merged += 1;
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_sync",
        Some("cart_items"),
        Some(serde_json::json!({ "merged": merged })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Cart synced",
        serde_json::json!({ "merged": merged }),
        Some(Meta::empty()),
    ))
}

fn cart_item_from_entity(model: crate::entity::cart_items::Model) -> CartItem {
    CartItem {
        id: model.id,
        user_id: model.user_id,
        product_id: model.product_id,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
