//! Configuration for seeding operations.

use std::env;

use serde::{Deserialize, Serialize};

/// Configuration for seeding operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Rows per insert statement.
    pub batch_size: usize,

    /// Threads used for password hashing.
    pub hash_workers: usize,

    /// Commit the groups that succeeded even when another group failed.
    ///
    /// When false, any failed group rolls back the whole seed.
    pub tolerate_group_failures: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            hash_workers: 4,
            tolerate_group_failures: false,
        }
    }
}

impl SeedConfig {
    /// Reads `SEED_BATCH_SIZE`, `SEED_HASH_WORKERS` and `SEED_TOLERATE_FAILURES`,
    /// falling back to the defaults for missing or unparsable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let batch_size = lookup("SEED_BATCH_SIZE")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.batch_size);

        let hash_workers = lookup("SEED_HASH_WORKERS")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.hash_workers);

        let tolerate_group_failures = lookup("SEED_TOLERATE_FAILURES")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.tolerate_group_failures);

        Self {
            batch_size,
            hash_workers,
            tolerate_group_failures,
        }
        .normalized()
    }

    /// Sets the batch size for bulk inserts.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self.normalized()
    }

    /// Sets the number of password hashing threads.
    pub fn with_hash_workers(mut self, workers: usize) -> Self {
        self.hash_workers = workers;
        self.normalized()
    }

    pub fn tolerating_group_failures(mut self, tolerate: bool) -> Self {
        self.tolerate_group_failures = tolerate;
        self
    }

    // Zero would make `chunks` panic and the thread pool empty.
    fn normalized(mut self) -> Self {
        self.batch_size = self.batch_size.max(1);
        self.hash_workers = self.hash_workers.max(1);
        self
    }
}
