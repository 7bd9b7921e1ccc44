//! Database seeding orchestration.

use std::{fmt, sync::Arc};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use super::{SeedStore, SeedTransaction, StoreError};
use crate::{
    config::SeedConfig,
    data::{DataError, SeedCustomer, SeedData, SeedInvoice, SeedRevenue},
    hashing::{HashError, HashedUser, hash_users},
    schema::Table,
};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Hashing(#[from] HashError),
    #[error("Seeding failed for {}", describe_failures(.0))]
    GroupsFailed(Vec<GroupFailure>),
}

fn describe_failures(failures: &[GroupFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Outcome of seeding one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: Table,
    /// Seed records submitted.
    pub attempted: usize,
    /// Rows actually written.
    pub inserted: u64,
    /// Records skipped because their identity already existed.
    pub skipped: u64,
}

impl TableReport {
    fn new(table: Table, attempted: usize, inserted: u64) -> Self {
        Self {
            table,
            attempted,
            inserted,
            skipped: (attempted as u64).saturating_sub(inserted),
        }
    }
}

/// A table whose group failed and was rolled back to its savepoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupFailure {
    pub table: Table,
    pub reason: String,
}

impl fmt::Display for GroupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.table, self.reason)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    pub tables: Vec<TableReport>,
    pub failures: Vec<GroupFailure>,
}

impl SeedReport {
    pub fn inserted(&self) -> u64 {
        self.tables.iter().map(|t| t.inserted).sum()
    }

    pub fn skipped(&self) -> u64 {
        self.tables.iter().map(|t| t.skipped).sum()
    }

    pub fn table(&self, table: Table) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == table)
    }
}

/// Seeds the dashboard tables through a [`SeedStore`].
#[derive(Clone)]
pub struct Seeder {
    store: Arc<dyn SeedStore>,
    config: SeedConfig,
}

impl Seeder {
    pub fn new(store: impl SeedStore + 'static, config: SeedConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    /// Creates the extension and all four tables in one transaction.
    pub async fn ensure_schema(&self) -> Result<(), SeedError> {
        let mut tx = self.store.begin().await?;
        for table in Table::ALL {
            prepare_table(tx.as_mut(), table).await?;
        }
        tx.commit().await?;

        info!("Schema ready");
        Ok(())
    }

    /// Seeds every table inside a single transaction.
    ///
    /// Tables are seeded in [`Table::ALL`] order, each inside its own savepoint.
    /// A failed table is rolled back to its savepoint and the remaining tables are
    /// still attempted. Afterwards the transaction commits when nothing failed or
    /// when `tolerate_group_failures` is set, and rolls back otherwise.
    pub async fn seed_all(&self, data: &SeedData) -> Result<SeedReport, SeedError> {
        data.validate()?;
        for invoice in data.orphaned_invoices() {
            warn!(
                invoice_id = %invoice.id,
                customer_id = %invoice.customer_id,
                "Invoice references a customer missing from the seed data"
            );
        }

        info!("Hashing {} user passwords...", data.users.len());
        let users = hash_users(&data.users, self.config.hash_workers).await?;

        let mut tx = self.store.begin().await?;
        match self.seed_groups(tx.as_mut(), &users, data).await {
            Ok(report) if report.failures.is_empty() || self.config.tolerate_group_failures => {
                tx.commit().await?;
                info!(
                    "Seeded {} rows ({} skipped, {} failed tables)",
                    report.inserted(),
                    report.skipped(),
                    report.failures.len()
                );
                Ok(report)
            }
            Ok(report) => {
                rollback(tx).await;
                Err(SeedError::GroupsFailed(report.failures))
            }
            Err(e) => {
                rollback(tx).await;
                Err(e)
            }
        }
    }

    async fn seed_groups(
        &self,
        tx: &mut dyn SeedTransaction,
        users: &[HashedUser],
        data: &SeedData,
    ) -> Result<SeedReport, SeedError> {
        let mut report = SeedReport::default();

        for table in Table::ALL {
            tx.savepoint(table).await?;

            let outcome = match table {
                Table::Users => self.seed_users(tx, users).await,
                Table::Customers => self.seed_customers(tx, &data.customers).await,
                Table::Invoices => self.seed_invoices(tx, &data.invoices).await,
                Table::Revenue => self.seed_revenue(tx, &data.revenue).await,
            };

            match outcome {
                Ok(table_report) => {
                    tx.release_savepoint(table).await?;
                    info!(
                        "Seeded {} {} ({} already present)",
                        table_report.inserted, table, table_report.skipped
                    );
                    report.tables.push(table_report);
                }
                Err(e) => {
                    error!("Error seeding {table}: {e}");
                    tx.rollback_to_savepoint(table).await?;
                    tx.release_savepoint(table).await?;
                    report.failures.push(GroupFailure {
                        table,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Rows per insert for `table`, capped so one statement stays within the
    /// bind parameter limit.
    fn batch_size(&self, table: Table) -> usize {
        self.config
            .batch_size
            .clamp(1, table.max_rows_per_statement())
    }

    /// Seeds users whose passwords are already hashed.
    async fn seed_users(
        &self,
        tx: &mut dyn SeedTransaction,
        users: &[HashedUser],
    ) -> Result<TableReport, StoreError> {
        prepare_table(tx, Table::Users).await?;

        let mut inserted = 0;
        for chunk in users.chunks(self.batch_size(Table::Users)) {
            inserted += tx.insert_users(chunk).await?;
        }

        Ok(TableReport::new(Table::Users, users.len(), inserted))
    }

    async fn seed_customers(
        &self,
        tx: &mut dyn SeedTransaction,
        customers: &[SeedCustomer],
    ) -> Result<TableReport, StoreError> {
        prepare_table(tx, Table::Customers).await?;

        let mut inserted = 0;
        for chunk in customers.chunks(self.batch_size(Table::Customers)) {
            inserted += tx.insert_customers(chunk).await?;
        }

        Ok(TableReport::new(Table::Customers, customers.len(), inserted))
    }

    async fn seed_invoices(
        &self,
        tx: &mut dyn SeedTransaction,
        invoices: &[SeedInvoice],
    ) -> Result<TableReport, StoreError> {
        prepare_table(tx, Table::Invoices).await?;

        let mut inserted = 0;
        for chunk in invoices.chunks(self.batch_size(Table::Invoices)) {
            inserted += tx.insert_invoices(chunk).await?;
        }

        Ok(TableReport::new(Table::Invoices, invoices.len(), inserted))
    }

    async fn seed_revenue(
        &self,
        tx: &mut dyn SeedTransaction,
        revenue: &[SeedRevenue],
    ) -> Result<TableReport, StoreError> {
        prepare_table(tx, Table::Revenue).await?;

        let mut inserted = 0;
        for chunk in revenue.chunks(self.batch_size(Table::Revenue)) {
            inserted += tx.insert_revenue(chunk).await?;
        }

        Ok(TableReport::new(Table::Revenue, revenue.len(), inserted))
    }
}

async fn prepare_table(tx: &mut dyn SeedTransaction, table: Table) -> Result<(), StoreError> {
    if table.needs_uuid_extension() {
        tx.ensure_extensions().await?;
    }
    tx.ensure_table(table).await
}

async fn rollback(tx: Box<dyn SeedTransaction>) {
    if let Err(e) = tx.rollback().await {
        warn!("Rollback failed: {e}");
    }
}
