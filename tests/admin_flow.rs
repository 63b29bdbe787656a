use gearon_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::products::{
        CreateBrandRequest, CreateCategoryRequest, CreateProductRequest, UpdateProductRequest,
    },
    entity::users::ActiveModel as UserActive,
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::CatalogQuery,
    services::{admin_service, catalog_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Admin back-office flow: category/brand/product CRUD with image
// replacement, surfaced through the public catalog.
#[tokio::test]
async fn admin_catalog_management_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    let state = setup_state(&database_url).await?;

    let admin_id = create_user(&state, "admin", "admin@example.com").await?;
    let user_id = create_user(&state, "user", "user@example.com").await?;
    let auth_admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };
    let auth_user = AuthUser {
        user_id,
        role: "user".into(),
    };

    // Plain users are rejected before any write.
    let forbidden = admin_service::create_brand(
        &state,
        &auth_user,
        CreateBrandRequest {
            name: "Razer".into(),
            slug: "razer".into(),
        },
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let category = admin_service::create_category(
        &state,
        &auth_admin,
        CreateCategoryRequest {
            name: "Headsets".into(),
            slug: "headsets".into(),
            description: Some("Immersive competitive audio gear.".into()),
        },
    )
    .await?
    .data
    .expect("category");
    let brand = admin_service::create_brand(
        &state,
        &auth_admin,
        CreateBrandRequest {
            name: "SteelSeries".into(),
            slug: "steelseries".into(),
        },
    )
    .await?
    .data
    .expect("brand");

    // A non-object specs payload never reaches the store.
    let bad_specs = admin_service::create_product(
        &state,
        &auth_admin,
        product_request(category.id, brand.id, serde_json::json!("not an object")),
    )
    .await;
    assert!(matches!(bad_specs, Err(AppError::BadRequest(_))));

    let product = admin_service::create_product(
        &state,
        &auth_admin,
        product_request(
            category.id,
            brand.id,
            serde_json::json!({ "driver": "40mm", "connection": "wireless" }),
        ),
    )
    .await?
    .data
    .expect("product");
    assert_eq!(product.images.len(), 2);
    assert_eq!(product.images[0].sort_order, 0);
    assert_eq!(product.category.slug, "headsets");

    // Update replaces the image list wholesale and keeps order.
    let updated = admin_service::update_product(
        &state,
        &auth_admin,
        product.id,
        UpdateProductRequest {
            price_cents: Some(17999),
            image_urls: Some(vec!["https://img.example.com/new-front.jpg".into()]),
            name: None,
            slug: None,
            description: None,
            stock: None,
            popularity: None,
            featured: None,
            category_id: None,
            brand_id: None,
            specs: None,
        },
    )
    .await?
    .data
    .expect("updated product");
    assert_eq!(updated.price_cents, 17999);
    assert_eq!(updated.images.len(), 1);
    assert_eq!(updated.images[0].url, "https://img.example.com/new-front.jpg");

    // The storefront sees the admin edit.
    let data = catalog_service::get_catalog_data(
        &state,
        CatalogQuery {
            category: Some("headsets".into()),
            ..CatalogQuery::default()
        },
    )
    .await?
    .data
    .expect("catalog data");
    assert_eq!(data.total, 1);
    assert_eq!(data.items[0].price_cents, 17999);

    // Deleting a referenced category is rejected by the store.
    let blocked = admin_service::delete_category(&state, &auth_admin, category.id).await;
    assert!(blocked.is_err());

    admin_service::delete_product(&state, &auth_admin, product.id).await?;
    let missing = admin_service::delete_product(&state, &auth_admin, product.id).await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    // With no products left the category can go.
    admin_service::delete_category(&state, &auth_admin, category.id).await?;
    admin_service::delete_brand(&state, &auth_admin, brand.id).await?;

    Ok(())
}

fn product_request(
    category_id: Uuid,
    brand_id: Uuid,
    specs: serde_json::Value,
) -> CreateProductRequest {
    CreateProductRequest {
        name: "Arctis Nova Pro".into(),
        slug: "arctis-nova-pro".into(),
        description: "Flagship wireless headset with active noise cancelling.".into(),
        price_cents: 24999,
        stock: 12,
        popularity: 40,
        featured: true,
        category_id,
        brand_id,
        specs,
        image_urls: vec![
            "https://img.example.com/front.jpg".into(),
            "https://img.example.com/side.jpg".into(),
        ],
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(database_url).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, cart_items, product_images, audit_logs, products, categories, brands, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState {
        pool,
        orm,
        config: AppConfig {
            database_url: database_url.to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            payment_checkout_url: None,
        },
    })
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}
