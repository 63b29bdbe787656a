use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::{
        cart::GuestCartItem,
        orders::{
            CheckoutRequest, CheckoutResponse, GuestCheckoutRequest, OrderList, OrderStats,
            OrderWithItems, PaymentInfo,
        },
    },
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus},
    payment::{self, CheckoutMode},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// One order line with name and unit price snapshotted from the product at
/// order time. Later product edits never touch it.
struct OrderLine {
    product_id: Uuid,
    name: String,
    unit_cents: i64,
    quantity: i32,
}

fn validate_checkout(payload: &CheckoutRequest) -> AppResult<()> {
    let CheckoutRequest {
        customer_name,
        customer_email,
        address_line1,
        city,
        country,
    } = payload;
    if customer_name.trim().len() < 2 {
        return Err(AppError::BadRequest("customer name is too short".into()));
    }
    if !customer_email.contains('@') {
        return Err(AppError::BadRequest("invalid email address".into()));
    }
    if address_line1.trim().len() < 5 {
        return Err(AppError::BadRequest("address is too short".into()));
    }
    if city.trim().len() < 2 || country.trim().len() < 2 {
        return Err(AppError::BadRequest("invalid city or country".into()));
    }
    Ok(())
}

/// Lock the products behind `lines`, verify stock per product, then write the
/// order row, its items, and the per-product stock/popularity deltas. Runs
/// entirely inside the caller's transaction.
async fn persist_order(
    txn: &DatabaseTransaction,
    user_id: Option<Uuid>,
    checkout: &CheckoutRequest,
    lines: Vec<OrderLine>,
) -> AppResult<(OrderModel, Vec<OrderItemModel>)> {
    let mut per_product: HashMap<Uuid, i32> = HashMap::new();
    for line in &lines {
        *per_product.entry(line.product_id).or_insert(0) += line.quantity;
    }

    let product_ids: Vec<Uuid> = per_product.keys().copied().collect();
    let locked = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .lock(LockType::Update)
        .all(txn)
        .await?;

    for product in &locked {
        let wanted = per_product.get(&product.id).copied().unwrap_or(0);
        if product.stock < wanted {
            return Err(AppError::InsufficientStock(product.id));
        }
    }

    let total_cents: i64 = lines
        .iter()
        .map(|line| line.unit_cents * i64::from(line.quantity))
        .sum();

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        customer_name: Set(checkout.customer_name.clone()),
        customer_email: Set(checkout.customer_email.clone()),
        address_line1: Set(checkout.address_line1.clone()),
        city: Set(checkout.city.clone()),
        country: Set(checkout.country.clone()),
        total_cents: Set(total_cents),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(line.product_id)),
            name: Set(line.name.clone()),
            unit_cents: Set(line.unit_cents),
            quantity: Set(line.quantity),
            created_at: NotSet,
        }
        .insert(txn)
        .await?;
        items.push(item);
    }

    for (product_id, quantity) in per_product {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(quantity))
            .col_expr(
                ProdCol::Popularity,
                Expr::col(ProdCol::Popularity).add(quantity),
            )
            .filter(ProdCol::Id.eq(product_id))
            .exec(txn)
            .await?;
    }

    Ok((order, items))
}

/// Convert the caller's server-side cart into an order. The order row, its
/// items, the stock/popularity deltas and the cart clear all commit as one
/// unit or not at all.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    validate_checkout(&payload)?;

    let txn = state.orm.begin().await?;

    let cart_rows = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .all(&txn)
        .await?;
    if cart_rows.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let product_ids: Vec<Uuid> = cart_rows.iter().map(|r| r.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut lines = Vec::with_capacity(cart_rows.len());
    for row in &cart_rows {
        // Prices may have moved since add-to-cart; snapshot the current one.
        let product = products
            .get(&row.product_id)
            .ok_or(AppError::UnavailableItems)?;
        lines.push(OrderLine {
            product_id: product.id,
            name: product.name.clone(),
            unit_cents: product.price_cents,
            quantity: row.quantity,
        });
    }

    let (order, items) = persist_order(&txn, Some(user.user_id), &payload, lines).await?;

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(checkout_response(state, order, items))
}

/// Guest checkout: the cart arrives as an explicit list of lines, the created
/// order has no owning user.
pub async fn checkout_guest(
    state: &AppState,
    payload: GuestCheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    validate_checkout(&payload.checkout)?;
    if payload.items.is_empty() {
        return Err(AppError::EmptyCart);
    }
    for item in &payload.items {
        if item.quantity <= 0 || item.quantity > 50 {
            return Err(AppError::BadRequest("invalid line quantity".into()));
        }
    }

    let txn = state.orm.begin().await?;

    let product_ids: Vec<Uuid> = payload.items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut lines = Vec::with_capacity(payload.items.len());
    for GuestCartItem {
        product_id,
        quantity,
    } in &payload.items
    {
        // Covers products deleted between cart population and checkout.
        let product = products.get(product_id).ok_or(AppError::UnavailableItems)?;
        lines.push(OrderLine {
            product_id: product.id,
            name: product.name.clone(),
            unit_cents: product.price_cents,
            quantity: *quantity,
        });
    }

    let (order, items) = persist_order(&txn, None, &payload.checkout, lines).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "guest_checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(checkout_response(state, order, items))
}

fn checkout_response(
    state: &AppState,
    order: OrderModel,
    items: Vec<OrderItemModel>,
) -> ApiResponse<CheckoutResponse> {
    let payment = match payment::checkout_mode(&state.config, order.id) {
        CheckoutMode::Provider { checkout_url } => PaymentInfo {
            mode: "provider".to_string(),
            checkout_url: Some(checkout_url),
        },
        CheckoutMode::Mock => PaymentInfo {
            mode: "mock".to_string(),
            checkout_url: None,
        },
    };

    ApiResponse::success(
        format!(
            "Order placed, total {}",
            crate::money::format_price(order.total_cents)
        ),
        CheckoutResponse {
            order: order_from_entity(order),
            items: items.into_iter().map(order_item_from_entity).collect(),
            payment,
        },
        Some(Meta::empty()),
    )
}

/// PENDING -> PAID, idempotent for repeated confirmations of an already-PAID
/// order. Any other starting state is rejected.
pub async fn mark_order_paid(
    state: &AppState,
    order_id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let current = parse_status(&order.status)?;
    if current == OrderStatus::Paid {
        txn.commit().await?;
        return Ok(ApiResponse::success(
            "Already paid",
            order_from_entity(order),
            Some(Meta::empty()),
        ));
    }
    if !current.can_transition_to(OrderStatus::Paid) {
        return Err(AppError::BadRequest(format!(
            "cannot mark a {current} order as paid"
        )));
    }

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Paid.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        order.user_id,
        "order_paid",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment recorded",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
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
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
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
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn order_stats(state: &AppState) -> AppResult<OrderStats> {
    let revenue: (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(total_cents), 0)::BIGINT FROM orders WHERE status = $1",
    )
    .bind(OrderStatus::Paid.as_str())
    .fetch_one(&state.pool)
    .await?;

    let pending = Orders::find()
        .filter(OrderCol::Status.eq(OrderStatus::Pending.as_str()))
        .count(&state.orm)
        .await? as i64;
    let paid = Orders::find()
        .filter(OrderCol::Status.eq(OrderStatus::Paid.as_str()))
        .count(&state.orm)
        .await? as i64;
    let all = Orders::find().count(&state.orm).await? as i64;

    Ok(OrderStats {
        total_revenue_cents: revenue.0,
        pending_count: pending,
        paid_count: paid,
        orders_count: all,
    })
}

pub fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    OrderStatus::parse(raw)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown order status in store: {raw}")))
}

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        status: OrderStatus::parse(&model.status).unwrap_or(OrderStatus::Pending),
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        address_line1: model.address_line1,
        city: model.city,
        country: model.country,
        total_cents: model.total_cents,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        name: model.name,
        unit_cents: model.unit_cents,
        quantity: model.quantity,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
