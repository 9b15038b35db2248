use cart_sync_api::{config::AppConfig, db::create_pool};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let shop_id = Uuid::new_v4();

    let tax_id = seed_tax(&pool, "VAT 20%", 20.0).await?;
    seed_default_currency(&pool, "EUR").await?;
    seed_shop_settings(&pool, shop_id, tax_id).await?;

    let customer_id = seed_customer(&pool, "jane.doe@example.com", "Jane", "Doe").await?;
    let hoodie = seed_product(&pool, "Storefront Hoodie", 5500).await?;
    let mug = seed_product(&pool, "Ferris Mug", 1200).await?;

    let cart_id = seed_cart(&pool, shop_id, customer_id).await?;
    seed_cart_line(&pool, cart_id, hoodie, Some(Uuid::new_v4()), 1).await?;
    seed_cart_line(&pool, cart_id, mug, None, 2).await?;

    println!("Seed completed. Shop ID: {shop_id}, Cart ID: {cart_id}");
    Ok(())
}

async fn seed_tax(pool: &sqlx::PgPool, name: &str, rate: f64) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        "INSERT INTO taxes (id, name, rate, active) VALUES ($1, $2, $3, TRUE) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(rate)
    .fetch_one(pool)
    .await?;

    println!("Seeded tax {name} ({rate}%)");
    Ok(row.0)
}

async fn seed_default_currency(pool: &sqlx::PgPool, iso_code: &str) -> anyhow::Result<()> {
    // Only one default currency should exist.
    sqlx::query("UPDATE currencies SET is_default = FALSE WHERE is_default = TRUE")
        .execute(pool)
        .await?;
    sqlx::query("INSERT INTO currencies (id, iso_code, is_default) VALUES ($1, $2, TRUE)")
        .bind(Uuid::new_v4())
        .bind(iso_code)
        .execute(pool)
        .await?;

    println!("Seeded default currency {iso_code}");
    Ok(())
}

async fn seed_shop_settings(
    pool: &sqlx::PgPool,
    shop_id: Uuid,
    tax_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO shop_settings (id, shop_id, tax_id, carts_synced_at)
        VALUES ($1, $2, $3, NULL)
        ON CONFLICT (shop_id) DO UPDATE SET tax_id = EXCLUDED.tax_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(shop_id)
    .bind(tax_id)
    .execute(pool)
    .await?;

    println!("Provisioned shop {shop_id} for cart sync");
    Ok(())
}

async fn seed_customer(
    pool: &sqlx::PgPool,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO customers (id, email, first_name, last_name, newsletter, language, birthday)
        VALUES ($1, $2, $3, $4, TRUE, 'en', $5)
        ON CONFLICT (email) DO UPDATE SET first_name = EXCLUDED.first_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .bind(NaiveDate::from_ymd_opt(1990, 4, 12))
    .fetch_one(pool)
    .await?;

    println!("Seeded customer {email}");
    Ok(row.0)
}

async fn seed_product(pool: &sqlx::PgPool, name: &str, price: i64) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO products (id, name, price)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO UPDATE SET price = EXCLUDED.price
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(price)
    .fetch_one(pool)
    .await?;

    println!("Seeded product {name}");
    Ok(row.0)
}

async fn seed_cart(
    pool: &sqlx::PgPool,
    shop_id: Uuid,
    customer_id: Uuid,
) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO carts (id, shop_id, customer_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(shop_id)
    .bind(customer_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

async fn seed_cart_line(
    pool: &sqlx::PgPool,
    cart_id: Uuid,
    product_id: Uuid,
    attribute_id: Option<Uuid>,
    quantity: i32,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO cart_lines (id, cart_id, product_id, attribute_id, quantity)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(cart_id)
    .bind(product_id)
    .bind(attribute_id)
    .bind(quantity)
    .execute(pool)
    .await?;

    Ok(())
}
