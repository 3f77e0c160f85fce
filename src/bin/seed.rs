use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use password_hash::rand_core::OsRng;
use retail_order_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@example.com", "admin123", "ADMIN", true).await?;
    let manager_id =
        ensure_user(&pool, "manager", "manager@example.com", "manager123", "MANAGER", true).await?;
    let user_id = ensure_user(&pool, "alice", "alice@example.com", "alice123", "USER", true).await?;
    ensure_user(&pool, "mallory", "mallory@example.com", "mallory123", "USER", false).await?;

    seed_catalog(&pool).await?;

    println!("Seed completed. Admin: {admin_id}, Manager: {manager_id}, User: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
    enabled: bool,
) -> anyhow::Result<i64> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        INSERT INTO users (username, email, password_hash, enabled, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO UPDATE SET role = EXCLUDED.role, enabled = EXCLUDED.enabled
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(enabled)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (i64,) = sqlx::query_as("SELECT id FROM users WHERE username = $1")
                .bind(username)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {username} (role={role}, enabled={enabled})");
    Ok(user_id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = ["Apparel", "Mugs", "Stickers", "Books"];
    for name in categories {
        sqlx::query(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .execute(pool)
        .await?;
    }

    let products = vec![
        ("Axum Hoodie", "Warm hoodie for Rustaceans", 550_000_i64, 50, Some("Apparel")),
        ("Ferris Mug", "Coffee tastes better with Ferris", 120_000, 100, Some("Mugs")),
        ("Rust Sticker Pack", "Decorate your laptop", 50_000, 200, Some("Stickers")),
        ("E-book: Async Rust", "Learn async Rust patterns", 250_000, 75, Some("Books")),
        ("Mystery Box", "Uncategorized surprise", 99_000, 10, None),
    ];

    for (name, desc, price, stock, category) in products {
        sqlx::query(
            r#"
            INSERT INTO products (name, description, price, stock, category_id)
            VALUES ($1, $2, $3, $4, (SELECT id FROM categories WHERE name = $5))
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .bind(category)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}
