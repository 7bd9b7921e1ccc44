//! Database integration for seeding.
//!
//! The [`Seeder`] talks to the database only through [`SeedStore`] and
//! [`SeedTransaction`]. [`PgStore`] is the PostgreSQL implementation; [`MemoryStore`]
//! mirrors its semantics in memory for tests.

mod memory;
mod postgres;
mod seeder;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    data::{SeedCustomer, SeedInvoice, SeedRevenue},
    hashing::HashedUser,
    schema::Table,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use seeder::{GroupFailure, SeedError, SeedReport, Seeder, TableReport};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("function uuid_generate_v4() does not exist")]
    MissingExtension,
    #[error("relation \"{0}\" does not exist")]
    MissingTable(Table),
    #[error("duplicate value for unique column {column} in {table}")]
    UniqueViolation { table: Table, column: &'static str },
    #[error("Injected failure while writing {0}")]
    Injected(Table),
    #[error("too many arguments for query: {params} (insert into {table})")]
    TooManyParameters { table: Table, params: usize },
    #[error("No savepoint for {0}")]
    NoSavepoint(Table),
}

/// A database that can open seeding transactions.
#[async_trait]
pub trait SeedStore: Send + Sync {
    /// Acquires a connection and begins a transaction on it.
    async fn begin(&self) -> Result<Box<dyn SeedTransaction>, StoreError>;
}

/// One open transaction.
///
/// Dropping a transaction without calling [`commit`](SeedTransaction::commit)
/// rolls it back and releases its connection.
#[async_trait]
pub trait SeedTransaction: Send {
    async fn ensure_extensions(&mut self) -> Result<(), StoreError>;

    async fn ensure_table(&mut self, table: Table) -> Result<(), StoreError>;

    /// Marks a point the transaction can return to if `table`'s group fails.
    async fn savepoint(&mut self, table: Table) -> Result<(), StoreError>;

    async fn release_savepoint(&mut self, table: Table) -> Result<(), StoreError>;

    /// Discards everything written since [`savepoint`](SeedTransaction::savepoint)
    /// and clears any error state the failure left on the transaction.
    async fn rollback_to_savepoint(&mut self, table: Table) -> Result<(), StoreError>;

    /// Inserts users, skipping ids already present. Returns rows inserted.
    async fn insert_users(&mut self, users: &[HashedUser]) -> Result<u64, StoreError>;

    async fn insert_customers(&mut self, customers: &[SeedCustomer]) -> Result<u64, StoreError>;

    async fn insert_invoices(&mut self, invoices: &[SeedInvoice]) -> Result<u64, StoreError>;

    /// Inserts revenue rows, skipping months already present.
    async fn insert_revenue(&mut self, revenue: &[SeedRevenue]) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
