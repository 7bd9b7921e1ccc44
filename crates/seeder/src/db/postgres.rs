//! PostgreSQL implementation of the seeding store.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::{SeedStore, SeedTransaction, StoreError};
use crate::{
    data::{SeedCustomer, SeedInvoice, SeedRevenue},
    hashing::HashedUser,
    schema::{Table, UUID_EXTENSION_SQL},
};

/// Seeding store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeedStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn SeedTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSeedTransaction { tx }))
    }
}

/// Wraps a pooled transaction; sqlx rolls it back if dropped uncommitted.
struct PgSeedTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgSeedTransaction {
    async fn execute(&mut self, sql: &str) -> Result<(), StoreError> {
        sqlx::query(sql).execute(&mut *self.tx).await?;
        Ok(())
    }
}

fn savepoint_name(table: Table) -> String {
    format!("seed_{}", table.as_str())
}

#[async_trait]
impl SeedTransaction for PgSeedTransaction {
    async fn ensure_extensions(&mut self) -> Result<(), StoreError> {
        self.execute(UUID_EXTENSION_SQL).await
    }

    async fn ensure_table(&mut self, table: Table) -> Result<(), StoreError> {
        self.execute(table.create_sql()).await
    }

    async fn savepoint(&mut self, table: Table) -> Result<(), StoreError> {
        self.execute(&format!("SAVEPOINT {}", savepoint_name(table))).await
    }

    async fn release_savepoint(&mut self, table: Table) -> Result<(), StoreError> {
        self.execute(&format!("RELEASE SAVEPOINT {}", savepoint_name(table))).await
    }

    async fn rollback_to_savepoint(&mut self, table: Table) -> Result<(), StoreError> {
        self.execute(&format!("ROLLBACK TO SAVEPOINT {}", savepoint_name(table))).await
    }

    async fn insert_users(&mut self, users: &[HashedUser]) -> Result<u64, StoreError> {
        if users.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO users (id, name, email, password) ");
        builder.push_values(users, |mut row, user| {
            row.push_bind(user.id)
                .push_bind(user.name.clone())
                .push_bind(user.email.clone())
                .push_bind(user.password_hash.clone());
        });
        builder.push(" ON CONFLICT (id) DO NOTHING");

        let result = builder.build().execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }

    async fn insert_customers(&mut self, customers: &[SeedCustomer]) -> Result<u64, StoreError> {
        if customers.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO customers (id, name, email, image_url) ");
        builder.push_values(customers, |mut row, customer| {
            row.push_bind(customer.id)
                .push_bind(customer.name.clone())
                .push_bind(customer.email.clone())
                .push_bind(customer.image_url.clone());
        });
        builder.push(" ON CONFLICT (id) DO NOTHING");

        let result = builder.build().execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }

    async fn insert_invoices(&mut self, invoices: &[SeedInvoice]) -> Result<u64, StoreError> {
        if invoices.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO invoices (id, customer_id, amount, status, date) ");
        builder.push_values(invoices, |mut row, invoice| {
            row.push_bind(invoice.id)
                .push_bind(invoice.customer_id)
                .push_bind(invoice.amount)
                .push_bind(invoice.status.clone())
                .push_bind(invoice.date);
        });
        builder.push(" ON CONFLICT (id) DO NOTHING");

        let result = builder.build().execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }

    async fn insert_revenue(&mut self, revenue: &[SeedRevenue]) -> Result<u64, StoreError> {
        if revenue.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO revenue (month, revenue) ");
        builder.push_values(revenue, |mut row, rev| {
            row.push_bind(rev.month.clone()).push_bind(rev.revenue);
        });
        builder.push(" ON CONFLICT (month) DO NOTHING");

        let result = builder.build().execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
