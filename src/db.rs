use rust_decimal::Decimal;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::Instrument;

pub type DbPool = PgPool;

const SCHEMA: &str = include_str!("../migrations/0001_schema.sql");

/// Key for the advisory lock held while the schema is applied.
const SCHEMA_LOCK_KEY: i64 = 0x5354_4f52_4546_524f;

/// Products inserted when the catalogue is empty at startup. Prices are in
/// whole currency units.
pub const SEED_PRODUCTS: [(&str, i64); 4] = [
    ("Gaming Laptop", 15_000_000),
    ("Wireless Mouse", 300_000),
    ("Mechanical Keyboard", 800_000),
    ("4K Monitor", 3_500_000),
];

/// Open a pool with default settings and make sure the server answers.
pub async fn create_pool(database_dsn: &str) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new().connect(database_dsn).await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}

/// Create the tables if they are missing and seed the catalogue when empty.
/// Runs in one transaction under an advisory lock, so replicas starting
/// together create and seed at most once.
pub async fn ensure_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    async {
        let mut tx = pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SCHEMA_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        // Prepared statements cannot contain multiple commands.
        for stmt in SCHEMA.split(';') {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            sqlx::query(stmt).execute(&mut *tx).await?;
        }

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *tx)
            .await?;
        if count == 0 {
            for (name, price) in SEED_PRODUCTS {
                sqlx::query("INSERT INTO products (name, price) VALUES ($1, $2)")
                    .bind(name)
                    .bind(Decimal::from(price))
                    .execute(&mut *tx)
                    .await?;
            }
            tracing::info!(count = SEED_PRODUCTS.len(), "seeded products");
        }

        tx.commit().await
    }
    .instrument(tracing::info_span!("setup_tables"))
    .await
}
