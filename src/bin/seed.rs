use grocery_storefront_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    models::{ROLE_ADMIN, ROLE_CUSTOMER},
    services::auth_service::hash_password,
};
use uuid::Uuid;

/// Name, category, price, stock, variants as (name, price delta, stock).
type SeedProduct = (&'static str, &'static str, i64, i32, &'static [(&'static str, i64, i32)]);

const CATALOG: &[SeedProduct] = &[
    ("Indomie Mi Goreng", "mie", 150, 200, &[]),
    ("Indomie Soto Mie", "mie", 150, 120, &[]),
    ("Kecap Manis Bango 275ml", "bumbu", 620, 40, &[]),
    (
        "Sambal ABC",
        "bumbu",
        480,
        30,
        &[("Original", 0, 15), ("Extra Pedas", 40, 15)],
    ),
    ("Tempe Beku 250g", "frozen", 380, 4, &[]),
    (
        "Kerupuk Udang Finna",
        "camilan",
        520,
        25,
        &[("Kecil", 0, 10), ("Besar", 280, 10)],
    ),
    ("Teh Botol Sosro", "minuman", 210, 0, &[]),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_profile(&pool, "admin@example.com", "admin12345", ROLE_ADMIN).await?;
    let customer_id =
        ensure_profile(&pool, "pelanggan@example.com", "pelanggan123", ROLE_CUSTOMER).await?;
    seed_products(&pool).await?;
    seed_settings(&pool, &config.default_commission_rate, admin_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_profile(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO profiles (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured profile {email} (role={role})");
    Ok(id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    for &(name, category, price, stock, variants) in CATALOG {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_some() {
            continue;
        }

        let product_id = Uuid::new_v4();
        let status = if stock > 0 { "active" } else { "out_of_stock" };
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, category, stock, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product_id)
        .bind(name)
        .bind(price)
        .bind(category)
        .bind(stock)
        .bind(status)
        .execute(&mut *tx)
        .await?;

        for &(variant, delta, variant_stock) in variants {
            sqlx::query(
                r#"
                INSERT INTO variant_options (id, product_id, name, price_delta, stock)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(product_id)
            .bind(variant)
            .bind(delta)
            .bind(variant_stock)
            .execute(&mut *tx)
            .await?;
        }
    }
    tx.commit().await?;

    println!("Seeded products");
    Ok(())
}

async fn seed_settings(
    pool: &sqlx::PgPool,
    commission_rate: &str,
    admin_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO app_settings (key, value, description, updated_by)
        VALUES ('commission_rate', $1, 'Referral commission percentage applied to order totals', $2)
        ON CONFLICT (key) DO NOTHING
        "#,
    )
    .bind(serde_json::Value::String(commission_rate.to_string()))
    .bind(admin_id)
    .execute(pool)
    .await?;

    println!("Seeded settings");
    Ok(())
}
