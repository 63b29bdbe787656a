use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use gearon_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@gearon.dev", "Admin123!", "admin").await?;
    let user_id = ensure_user(&pool, "user@gearon.dev", "User123!", "user").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            'a'..='z' | '0'..='9' => slug.push(ch),
            'A'..='Z' => slug.push(ch.to_ascii_lowercase()),
            ' ' | '-' | '_' => {
                if !slug.ends_with('-') {
                    slug.push('-');
                }
            }
            _ => {}
        }
    }
    slug.trim_matches('-').to_string()
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = [
        ("Keyboards", "Mechanical and low profile gaming keyboards."),
        ("Mice", "Wired and wireless precision mice."),
        ("Headsets", "Immersive competitive audio gear."),
        ("GPUs", "Graphics cards for modern gaming builds."),
        ("CPUs", "Processors for streaming and high FPS gaming."),
        ("Monitors", "Fast refresh displays and ultrawides."),
    ];
    let brands = [
        "Logitech",
        "Razer",
        "Corsair",
        "ASUS",
        "MSI",
        "SteelSeries",
        "HyperX",
        "NVIDIA",
    ];

    let mut category_ids = Vec::new();
    for (name, description) in categories {
        let id = ensure_category(pool, name, description).await?;
        category_ids.push(id);
    }

    let mut brand_ids = Vec::new();
    for name in brands {
        let id = ensure_brand(pool, name).await?;
        brand_ids.push(id);
    }

    let adjectives = ["Apex", "Nova", "Pulse", "Vector", "Nebula", "Titan"];
    let model_codes = ["X1", "G3", "Pro", "V2", "Max", "Ultra"];

    let mut seeded = 0;
    for (i, (adjective, model)) in adjectives.iter().zip(model_codes.iter()).enumerate() {
        let brand_idx = i % brand_ids.len();
        let category_idx = i % category_ids.len();
        let name = format!("{} {adjective} {model}", brands[brand_idx]);
        let slug = slugify(&name);
        let price_cents = 4999 + (i as i64) * 3000;
        let specs = serde_json::json!({
            "connection": if i % 2 == 0 { "wireless" } else { "wired" },
            "weight": format!("{}g", 60 + i * 15),
        });

        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, slug, description, price_cents, stock, popularity, featured, specs, category_id, brand_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(&slug)
        .bind(format!("The {name} built for competitive play."))
        .bind(price_cents)
        .bind(25_i32)
        .bind((30 - i as i32) * 4)
        .bind(i < 2)
        .bind(specs)
        .bind(category_ids[category_idx])
        .bind(brand_ids[brand_idx])
        .execute(pool)
        .await?;
        seeded += 1;
    }

    println!("Seeded {seeded} products");
    Ok(())
}

async fn ensure_category(
    pool: &sqlx::PgPool,
    name: &str,
    description: &str,
) -> anyhow::Result<Uuid> {
    let slug = slugify(name);
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name, slug, description)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (slug) DO UPDATE SET description = EXCLUDED.description
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(&slug)
    .bind(description)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn ensure_brand(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<Uuid> {
    let slug = slugify(name);
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO brands (id, name, slug)
        VALUES ($1, $2, $3)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(&slug)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}
