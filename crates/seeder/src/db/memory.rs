//! In-memory implementation of the seeding store for testing and development.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use uuid::Uuid;

use super::{SeedStore, SeedTransaction, StoreError};
use crate::{
    data::{SeedCustomer, SeedInvoice, SeedRevenue},
    hashing::HashedUser,
    schema::{MAX_BIND_PARAMS, Table},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    uuid_extension: bool,
    created: BTreeSet<Table>,
    users: BTreeMap<Uuid, HashedUser>,
    customers: BTreeMap<Uuid, SeedCustomer>,
    invoices: BTreeMap<Uuid, SeedInvoice>,
    revenue: BTreeMap<String, i32>,
}

impl Tables {
    fn require(&self, table: Table) -> Result<(), StoreError> {
        if self.created.contains(&table) {
            Ok(())
        } else {
            Err(StoreError::MissingTable(table))
        }
    }

    fn len(&self, table: Table) -> usize {
        match table {
            Table::Users => self.users.len(),
            Table::Customers => self.customers.len(),
            Table::Invoices => self.invoices.len(),
            Table::Revenue => self.revenue.len(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Faults {
    unreachable: bool,
    failing: BTreeSet<Table>,
}

/// Seeding store held in process memory.
///
/// Follows the PostgreSQL store's rules: tables must be created before use,
/// identity conflicts are skipped, user emails are unique, statements are held to
/// the bind parameter limit, a failing statement
/// writes nothing, and nothing is visible to other handles until commit.
/// Concurrent transactions are not isolated from each other; the last commit wins.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    faults: Faults,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose connections always fail.
    pub fn unreachable() -> Self {
        Self {
            faults: Faults {
                unreachable: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Makes every insert into `table` fail.
    pub fn failing_on(mut self, table: Table) -> Self {
        self.faults.failing.insert(table);
        self
    }

    /// Committed rows in `table`.
    pub fn row_count(&self, table: Table) -> usize {
        self.lock().len(table)
    }

    pub fn total_rows(&self) -> usize {
        Table::ALL.iter().map(|t| self.row_count(*t)).sum()
    }

    pub fn table_exists(&self, table: Table) -> bool {
        self.lock().created.contains(&table)
    }

    pub fn password_hash(&self, user_id: Uuid) -> Option<String> {
        self.lock()
            .users
            .get(&user_id)
            .map(|u| u.password_hash.clone())
    }

    pub fn revenue_for(&self, month: &str) -> Option<i32> {
        self.lock().revenue.get(month).copied()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SeedStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn SeedTransaction>, StoreError> {
        if self.faults.unreachable {
            return Err(StoreError::Unavailable(
                "connection refused by in-memory store".to_string(),
            ));
        }

        let working = self.lock().clone();
        Ok(Box::new(MemoryTransaction {
            shared: self.tables.clone(),
            working,
            savepoints: Vec::new(),
            faults: self.faults.clone(),
        }))
    }
}

struct MemoryTransaction {
    shared: Arc<Mutex<Tables>>,
    working: Tables,
    savepoints: Vec<(Table, Tables)>,
    faults: Faults,
}

impl MemoryTransaction {
    fn check_writable(&self, table: Table, rows: usize) -> Result<(), StoreError> {
        if self.faults.failing.contains(&table) {
            return Err(StoreError::Injected(table));
        }
        self.working.require(table)?;

        let params = rows * table.column_count();
        if params > MAX_BIND_PARAMS {
            return Err(StoreError::TooManyParameters { table, params });
        }
        Ok(())
    }

    fn savepoint_position(&self, table: Table) -> Result<usize, StoreError> {
        self.savepoints
            .iter()
            .rposition(|(t, _)| *t == table)
            .ok_or(StoreError::NoSavepoint(table))
    }
}

#[async_trait]
impl SeedTransaction for MemoryTransaction {
    async fn ensure_extensions(&mut self) -> Result<(), StoreError> {
        self.working.uuid_extension = true;
        Ok(())
    }

    async fn ensure_table(&mut self, table: Table) -> Result<(), StoreError> {
        if table.needs_uuid_extension() && !self.working.uuid_extension {
            return Err(StoreError::MissingExtension);
        }
        self.working.created.insert(table);
        Ok(())
    }

    async fn savepoint(&mut self, table: Table) -> Result<(), StoreError> {
        self.savepoints.push((table, self.working.clone()));
        Ok(())
    }

    async fn release_savepoint(&mut self, table: Table) -> Result<(), StoreError> {
        let position = self.savepoint_position(table)?;
        self.savepoints.truncate(position);
        Ok(())
    }

    async fn rollback_to_savepoint(&mut self, table: Table) -> Result<(), StoreError> {
        let position = self.savepoint_position(table)?;
        // The savepoint itself survives a rollback to it.
        self.savepoints.truncate(position + 1);
        self.working = self.savepoints[position].1.clone();
        Ok(())
    }

    async fn insert_users(&mut self, users: &[HashedUser]) -> Result<u64, StoreError> {
        self.check_writable(Table::Users, users.len())?;

        let mut rows = self.working.users.clone();
        let mut inserted = 0;
        for user in users {
            if rows.contains_key(&user.id) {
                continue;
            }
            if rows.values().any(|u| u.email == user.email) {
                return Err(StoreError::UniqueViolation {
                    table: Table::Users,
                    column: "email",
                });
            }
            rows.insert(user.id, user.clone());
            inserted += 1;
        }

        self.working.users = rows;
        Ok(inserted)
    }

    async fn insert_customers(&mut self, customers: &[SeedCustomer]) -> Result<u64, StoreError> {
        self.check_writable(Table::Customers, customers.len())?;

        let mut inserted = 0;
        for customer in customers {
            if !self.working.customers.contains_key(&customer.id) {
                self.working.customers.insert(customer.id, customer.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn insert_invoices(&mut self, invoices: &[SeedInvoice]) -> Result<u64, StoreError> {
        self.check_writable(Table::Invoices, invoices.len())?;

        let mut inserted = 0;
        for invoice in invoices {
            if !self.working.invoices.contains_key(&invoice.id) {
                self.working.invoices.insert(invoice.id, invoice.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn insert_revenue(&mut self, revenue: &[SeedRevenue]) -> Result<u64, StoreError> {
        self.check_writable(Table::Revenue, revenue.len())?;

        let mut inserted = 0;
        for rev in revenue {
            if !self.working.revenue.contains_key(&rev.month) {
                self.working.revenue.insert(rev.month.clone(), rev.revenue);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        let mut shared = this.shared.lock().unwrap_or_else(|e| e.into_inner());
        *shared = this.working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
