use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::cart::GuestCartItem,
    models::{Order, OrderItem},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub address_line1: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GuestCheckoutRequest {
    #[serde(flatten)]
    pub checkout: CheckoutRequest,
    pub items: Vec<GuestCartItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// How the caller should complete payment for a freshly created order.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentInfo {
    /// `provider` when an external checkout page is configured, else `mock`.
    pub mode: String,
    pub checkout_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: PaymentInfo,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStats {
    pub total_revenue_cents: i64,
    pub pending_count: i64,
    pub paid_count: i64,
    pub orders_count: i64,
}
