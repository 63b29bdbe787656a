use gearon_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{
        brands::ActiveModel as BrandActive, categories::ActiveModel as CategoryActive,
        products::ActiveModel as ProductActive,
    },
    routes::params::CatalogQuery,
    services::catalog_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Catalog resolution against a live store: filters, sorting, pagination and
// facets over a seeded gaming-hardware matrix.
#[tokio::test]
async fn catalog_filters_sorting_and_pagination() -> anyhow::Result<()> {
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

    let mice = seed_category(&state, "Mice", "mice").await?;
    let keyboards = seed_category(&state, "Keyboards", "keyboards").await?;
    let razer = seed_brand(&state, "Razer", "razer").await?;
    let logitech = seed_brand(&state, "Logitech", "logitech").await?;

    // Twelve mice priced 1000..12000, popularity descending with price.
    for i in 0..12_i32 {
        seed_product(
            &state,
            &format!("Viper {i}"),
            &format!("viper-{i}"),
            1000 + i64::from(i) * 1000,
            if i == 11 { 0 } else { 5 },
            100 - i,
            mice,
            razer,
        )
        .await?;
    }
    seed_product(&state, "Logitech Apex X1", "logitech-apex-x1", 9999, 8, 3, keyboards, logitech)
        .await?;
    seed_product(&state, "Logitech Nova G3", "logitech-nova-g3", 19999, 8, 2, keyboards, logitech)
        .await?;

    // Unfiltered: 14 products, fixed page size 12.
    let data = catalog(&state, CatalogQuery::default()).await?;
    assert_eq!(data.total, 14);
    assert_eq!(data.items.len(), 12);
    assert_eq!(data.page, 1);
    assert_eq!(data.total_pages, 2);
    // Default sort is popularity, descending.
    assert!(
        data.items
            .windows(2)
            .all(|pair| pair[0].popularity >= pair[1].popularity)
    );
    // Facets are the full universe, alphabetical.
    let category_names: Vec<&str> = data.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(category_names, vec!["Keyboards", "Mice"]);
    let brand_names: Vec<&str> = data.brands.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(brand_names, vec!["Logitech", "Razer"]);

    // Second page carries the remainder.
    let data = catalog(
        &state,
        CatalogQuery {
            page: Some("2".into()),
            ..CatalogQuery::default()
        },
    )
    .await?;
    assert_eq!(data.items.len(), 2);
    assert_eq!(data.total, 14);

    // A page beyond the end is not an error.
    let data = catalog(
        &state,
        CatalogQuery {
            page: Some("99".into()),
            ..CatalogQuery::default()
        },
    )
    .await?;
    assert!(data.items.is_empty());
    assert_eq!(data.total, 14);
    assert_eq!(data.total_pages, 2);
    assert_eq!(data.page, 99);

    // Text search matches the brand name even when the product name misses it.
    let data = catalog(
        &state,
        CatalogQuery {
            q: Some("razer".into()),
            ..CatalogQuery::default()
        },
    )
    .await?;
    assert_eq!(data.total, 12);
    assert!(data.items.iter().all(|p| p.brand.slug == "razer"));
    // Facets ignore the active filter.
    assert_eq!(data.categories.len(), 2);
    assert_eq!(data.brands.len(), 2);

    // Combined filters: category + brand + price band + stock.
    let data = catalog(
        &state,
        CatalogQuery {
            q: Some("razer".into()),
            category: Some("mice".into()),
            brand: Some("razer".into()),
            min: Some("50".into()),
            max: Some("120".into()),
            in_stock: Some("true".into()),
            ..CatalogQuery::default()
        },
    )
    .await?;
    // Mice priced 5000..=12000 minus the out-of-stock one.
    assert_eq!(data.total, 7);
    for product in &data.items {
        assert_eq!(product.category.slug, "mice");
        assert_eq!(product.brand.slug, "razer");
        assert!(product.price_cents >= 5000 && product.price_cents <= 12000);
        assert!(product.stock > 0);
    }

    // An unparseable lower bound is ignored, the upper bound still applies.
    let data = catalog(
        &state,
        CatalogQuery {
            min: Some("abc".into()),
            max: Some("10".into()),
            ..CatalogQuery::default()
        },
    )
    .await?;
    assert!(data.items.iter().all(|p| p.price_cents <= 1000));
    assert_eq!(data.total, 1);

    // Price sorts.
    let data = catalog(
        &state,
        CatalogQuery {
            sort: Some("price-asc".into()),
            ..CatalogQuery::default()
        },
    )
    .await?;
    assert_eq!(data.items[0].price_cents, 1000);
    let data = catalog(
        &state,
        CatalogQuery {
            sort: Some("price-desc".into()),
            ..CatalogQuery::default()
        },
    )
    .await?;
    assert_eq!(data.items[0].price_cents, 19999);

    // Detail by slug with related products from the same category.
    let detail = catalog_service::get_product_by_slug(&state, "viper-0")
        .await?
        .data
        .expect("detail data");
    assert_eq!(detail.product.slug, "viper-0");
    assert_eq!(detail.related.len(), 4);
    assert!(detail.related.iter().all(|p| p.category.slug == "mice"));
    assert!(detail.related.iter().all(|p| p.slug != "viper-0"));

    // Missing slug is a NotFound, not an empty success.
    assert!(
        catalog_service::get_product_by_slug(&state, "no-such-product")
            .await
            .is_err()
    );

    Ok(())
}

async fn catalog(
    state: &AppState,
    query: CatalogQuery,
) -> anyhow::Result<gearon_api::dto::catalog::CatalogData> {
    Ok(catalog_service::get_catalog_data(state, query)
        .await?
        .data
        .expect("catalog data"))
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

async fn seed_category(state: &AppState, name: &str, slug: &str) -> anyhow::Result<Uuid> {
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        description: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

async fn seed_brand(state: &AppState, name: &str, slug: &str) -> anyhow::Result<Uuid> {
    let brand = BrandActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(brand.id)
}

#[allow(clippy::too_many_arguments)]
async fn seed_product(
    state: &AppState,
    name: &str,
    slug: &str,
    price_cents: i64,
    stock: i32,
    popularity: i32,
    category_id: Uuid,
    brand_id: Uuid,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        description: Set(format!("{name} for testing")),
        price_cents: Set(price_cents),
        stock: Set(stock),
        popularity: Set(popularity),
        featured: Set(false),
        specs: Set(serde_json::json!({})),
        category_id: Set(category_id),
        brand_id: Set(brand_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}
