//! Idempotent seeding for the dashboard database.
//!
//! This crate creates the `users`, `customers`, `invoices` and `revenue` tables when
//! they are missing and inserts a fixed dataset into them. Rows whose identity is
//! already present are skipped, so seeding can be repeated safely.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use seeder::prelude::*;
//!
//! let store = PgStore::new(pool);
//! let seeder = Seeder::new(store, SeedConfig::default());
//!
//! let report = seeder.seed_all(&SeedData::placeholder()?).await?;
//! ```

pub mod config;
pub mod data;
pub mod db;
pub mod hashing;
pub mod schema;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::SeedConfig;
    pub use crate::data::{DataError, SeedCustomer, SeedData, SeedInvoice, SeedRevenue, SeedUser};
    pub use crate::db::{
        GroupFailure, MemoryStore, PgStore, SeedError, SeedReport, SeedStore, SeedTransaction,
        Seeder, StoreError, TableReport,
    };
    pub use crate::hashing::{HashError, HashedUser, hash_password, verify_password};
    pub use crate::schema::Table;
}
