use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use garagematch_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
};
use uuid::Uuid;

const DEMO_GARAGE_ID: Uuid = Uuid::from_u128(0x6761_7261_6765_0000_0000_0000_0000_0001);
const DEMO_PHOTO_ID: Uuid = Uuid::from_u128(0x6761_7261_6765_0000_0000_0000_0000_0101);
const DEMO_PHOTO_URL: &str =
    "https://images.unsplash.com/photo-1483721310020-03333e577078?w=1200&q=80";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let env_or = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_string());
    let password = env_or("SEED_PASSWORD", "password");

    let admin_id = ensure_user(
        &pool,
        &env_or("SEED_ADMIN_EMAIL", "admin@garagematch.com"),
        &password,
        "Root Admin",
        "admin",
        None,
    )
    .await?;
    let owner_id = ensure_user(
        &pool,
        &env_or("SEED_OWNER_EMAIL", "owner@garagematch.com"),
        &password,
        "Demo Garage Owner",
        "garage_owner",
        Some("+1 555-0101"),
    )
    .await?;
    let client_id = ensure_user(
        &pool,
        &env_or("SEED_CLIENT_EMAIL", "client@garagematch.com"),
        &password,
        "Demo Client",
        "client",
        Some("+1 555-0102"),
    )
    .await?;
    seed_demo_garage(&pool, owner_id).await?;

    println!(
        "Seed completed. Admin ID: {admin_id}, Owner ID: {owner_id}, Client ID: {client_id}, Garage ID: {DEMO_GARAGE_ID}"
    );
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    name: &str,
    role: &str,
    phone: Option<&str>,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, name, role, phone)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO UPDATE
        SET password_hash = EXCLUDED.password_hash,
            name = EXCLUDED.name,
            role = EXCLUDED.role,
            phone = EXCLUDED.phone,
            updated_at = now()
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(role)
    .bind(phone)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_demo_garage(pool: &sqlx::PgPool, owner_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO garages (
            id, owner_id, name, description, address_line1, city, state,
            postal_code, country, hourly_rate, daily_rate, status, is_verified
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'active', TRUE)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name,
            description = EXCLUDED.description,
            address_line1 = EXCLUDED.address_line1,
            city = EXCLUDED.city,
            state = EXCLUDED.state,
            postal_code = EXCLUDED.postal_code,
            country = EXCLUDED.country,
            hourly_rate = EXCLUDED.hourly_rate,
            daily_rate = EXCLUDED.daily_rate,
            status = EXCLUDED.status,
            is_verified = EXCLUDED.is_verified,
            updated_at = now()
        "#,
    )
    .bind(DEMO_GARAGE_ID)
    .bind(owner_id)
    .bind("Downtown Secure Garage")
    .bind("Well-lit indoor parking with 24/7 access. Fits SUVs and sedans.")
    .bind("123 Main St")
    .bind("San Francisco")
    .bind("CA")
    .bind("94105")
    .bind("USA")
    .bind(500_i64)
    .bind(2500_i64)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO garage_photos (id, garage_id, url, is_primary)
        VALUES ($1, $2, $3, TRUE)
        ON CONFLICT (id) DO UPDATE SET url = EXCLUDED.url, is_primary = TRUE
        "#,
    )
    .bind(DEMO_PHOTO_ID)
    .bind(DEMO_GARAGE_ID)
    .bind(DEMO_PHOTO_URL)
    .execute(pool)
    .await?;

    println!("Seeded demo garage");
    Ok(())
}
