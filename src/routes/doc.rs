use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddToCartRequest, CartItemDto, CartList, GuestCartItem, SyncCartRequest, UpdateCartItemRequest},
        catalog::{BrandList, CatalogData, CategoryList, ProductDetail, ProductList},
        orders::{
            CheckoutRequest, CheckoutResponse, GuestCheckoutRequest, OrderList, OrderStats,
            OrderWithItems, PaymentInfo,
        },
        products::{
            CreateBrandRequest, CreateCategoryRequest, CreateProductRequest, UpdateProductRequest,
        },
    },
    models::{Brand, CartItem, Category, Order, OrderItem, OrderStatus, Product, ProductImage, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, catalog, health, orders, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        catalog::get_catalog,
        products::featured,
        products::new_arrivals,
        products::by_slug,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        cart::sync_cart,
        orders::list_orders,
        orders::checkout,
        orders::guest_checkout,
        orders::get_order,
        orders::confirm_mock,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::list_categories,
        admin::create_category,
        admin::delete_category,
        admin::list_brands,
        admin::create_brand,
        admin::delete_brand,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::stats
    ),
    components(
        schemas(
            User,
            Product,
            ProductImage,
            Category,
            Brand,
            CartItem,
            Order,
            OrderItem,
            OrderStatus,
            CatalogData,
            ProductList,
            ProductDetail,
            CategoryList,
            BrandList,
            AddToCartRequest,
            UpdateCartItemRequest,
            GuestCartItem,
            SyncCartRequest,
            CartItemDto,
            CartList,
            CheckoutRequest,
            GuestCheckoutRequest,
            CheckoutResponse,
            PaymentInfo,
            OrderList,
            OrderWithItems,
            OrderStats,
            CreateProductRequest,
            UpdateProductRequest,
            CreateCategoryRequest,
            CreateBrandRequest,
            admin::UpdateOrderStatusRequest,
            params::Pagination,
            params::CatalogQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<CatalogData>,
            ApiResponse<CartList>,
            ApiResponse<CheckoutResponse>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Catalog", description = "Catalog search, filters and facets"),
        (name = "Products", description = "Storefront product endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
