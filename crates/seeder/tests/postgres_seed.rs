//! Integration tests for seeding a real PostgreSQL database.
//!
//! These tests verify:
//! - The bundled dataset lands in all four tables
//! - A second run inserts nothing
//! - Stored passwords are Argon2 hashes of the seed passwords
//! - Duplicate revenue months are stored once
//! - Tables larger than one statement's bind parameter limit still seed
//!
//! To run these tests, you need:
//! 1. A PostgreSQL database the test user may create schemas in
//! 2. DATABASE_URL environment variable set
//!
//! Run with: `DATABASE_URL=postgres://... cargo nextest run -p seeder postgres`
//!
//! Note: Each test works in its own freshly created schema and drops it
//! afterwards, so they can safely run against a development database. The
//! uuid-ossp extension is installed into `public` so dropping a test schema
//! never takes it away from the other tests.

use seeder::prelude::*;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::env;
use uuid::Uuid;

/// Get a pool scoped to a fresh schema, skipping tests if DATABASE_URL is not set.
async fn get_test_pool() -> Option<(PgPool, String)> {
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: DATABASE_URL not set");
            return None;
        }
    };

    let schema = format!("seed_test_{}", Uuid::new_v4().simple());

    // A single connection keeps the search_path set below for every query.
    let pool = match PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: Failed to connect to database: {e}");
            return None;
        }
    };

    ensure_uuid_extension(&pool).await;

    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&pool)
        .await
        .expect("Failed to create test schema");
    sqlx::query(&format!("SET search_path TO {schema}, public"))
        .execute(&pool)
        .await
        .expect("Failed to set search_path");

    Some((pool, schema))
}

/// Installs uuid-ossp into `public`, tolerating a concurrent test winning the race.
async fn ensure_uuid_extension(pool: &PgPool) {
    if sqlx::query(r#"CREATE EXTENSION IF NOT EXISTS "uuid-ossp" SCHEMA public"#)
        .execute(pool)
        .await
        .is_ok()
    {
        return;
    }

    let installed: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_extension WHERE extname = 'uuid-ossp')")
            .fetch_one(pool)
            .await
            .expect("Failed to check for uuid-ossp");
    assert!(installed, "Failed to install uuid-ossp into public");
}

/// Cleanup helper to remove the test schema.
async fn cleanup_schema(pool: &PgPool, schema: &str) {
    let _ = sqlx::query(&format!("DROP SCHEMA {schema} CASCADE"))
        .execute(pool)
        .await;
}

async fn count(pool: &PgPool, table: Table) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table.as_str()))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}

#[tokio::test]
async fn test_postgres_seed_is_idempotent() {
    let Some((pool, schema)) = get_test_pool().await else {
        return;
    };

    let data = SeedData::placeholder().unwrap();
    let seeder = Seeder::new(PgStore::new(pool.clone()), SeedConfig::default());

    let first = seeder.seed_all(&data).await.unwrap();
    assert_eq!(first.inserted() as usize, data.total_rows());

    let second = seeder.seed_all(&data).await.unwrap();
    assert_eq!(second.inserted(), 0);

    assert_eq!(count(&pool, Table::Users).await, 1);
    assert_eq!(count(&pool, Table::Customers).await, 6);
    assert_eq!(count(&pool, Table::Invoices).await, 13);
    assert_eq!(count(&pool, Table::Revenue).await, 12);

    cleanup_schema(&pool, &schema).await;
}

#[tokio::test]
async fn test_postgres_passwords_are_hashed() {
    let Some((pool, schema)) = get_test_pool().await else {
        return;
    };

    let data = SeedData::placeholder().unwrap();
    let seeder = Seeder::new(PgStore::new(pool.clone()), SeedConfig::default());
    seeder.seed_all(&data).await.unwrap();

    let user = &data.users[0];
    let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_ne!(stored, user.password);
    assert!(verify_password(&user.password, &stored).unwrap());

    cleanup_schema(&pool, &schema).await;
}

#[tokio::test]
async fn test_postgres_schema_setup_twice() {
    let Some((pool, schema)) = get_test_pool().await else {
        return;
    };

    let seeder = Seeder::new(PgStore::new(pool.clone()), SeedConfig::default());
    seeder.ensure_schema().await.unwrap();
    seeder.ensure_schema().await.unwrap();

    for table in Table::ALL {
        assert_eq!(count(&pool, table).await, 0);
    }

    cleanup_schema(&pool, &schema).await;
}

#[tokio::test]
async fn test_postgres_failed_group_rolls_back() {
    let Some((pool, schema)) = get_test_pool().await else {
        return;
    };

    let mut data = SeedData::placeholder().unwrap();
    let mut duplicate = data.users[0].clone();
    duplicate.id = Uuid::new_v4();
    data.users.push(duplicate);

    let seeder = Seeder::new(PgStore::new(pool.clone()), SeedConfig::default());
    let err = seeder.seed_all(&data).await.unwrap_err();
    assert!(matches!(err, SeedError::GroupsFailed(_)));

    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = $1",
    )
    .bind(&schema)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(tables, 0);

    cleanup_schema(&pool, &schema).await;
}

#[tokio::test]
async fn test_postgres_duplicate_month_is_stored_once() {
    let Some((pool, schema)) = get_test_pool().await else {
        return;
    };

    let mut data = SeedData::placeholder().unwrap();
    let first_jan = data.revenue.iter().find(|r| r.month == "Jan").unwrap().revenue;
    data.revenue.push(SeedRevenue {
        month: "Jan".to_string(),
        revenue: first_jan + 1,
    });

    let seeder = Seeder::new(PgStore::new(pool.clone()), SeedConfig::default());
    let report = seeder.seed_all(&data).await.unwrap();
    assert_eq!(report.inserted(), 32);

    let stored: Vec<i32> = sqlx::query_scalar("SELECT revenue FROM revenue WHERE month = 'Jan'")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(stored, vec![first_jan]);
    assert_eq!(count(&pool, Table::Revenue).await, 12);

    cleanup_schema(&pool, &schema).await;
}

#[tokio::test]
async fn test_postgres_batch_larger_than_statement_limit() {
    let Some((pool, schema)) = get_test_pool().await else {
        return;
    };

    // 17,000 rows of 4 columns would need 68,000 parameters in one statement.
    let data = SeedData {
        customers: (0..17_000)
            .map(|i| SeedCustomer {
                id: Uuid::new_v4(),
                name: format!("Customer {i}"),
                email: format!("customer{i}@example.com"),
                image_url: format!("/customers/{i}.png"),
            })
            .collect(),
        ..Default::default()
    };

    let seeder = Seeder::new(
        PgStore::new(pool.clone()),
        SeedConfig::default().with_batch_size(20_000),
    );
    let report = seeder.seed_all(&data).await.unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(report.inserted(), 17_000);
    assert_eq!(count(&pool, Table::Customers).await, 17_000);

    cleanup_schema(&pool, &schema).await;
}
