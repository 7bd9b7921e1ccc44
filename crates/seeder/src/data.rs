//! Seed records and the compiled-in dashboard dataset.

use std::{collections::HashSet, fmt, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Date;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

const PLACEHOLDER_JSON: &str = include_str!("../data/placeholder.json");

time::serde::format_description!(seed_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Failed to read seed data: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse seed data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid {entity} at index {index}: {errors}")]
    Invalid {
        entity: &'static str,
        index: usize,
        errors: ValidationErrors,
    },
}

/// A dashboard user. The password is plaintext here and hashed before insertion.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct SeedUser {
    pub id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

impl fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedUser")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SeedCustomer {
    pub id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub image_url: String,
}

/// An invoice. `amount` is in minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SeedInvoice {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: i32,
    #[validate(length(min = 1, max = 255))]
    pub status: String,
    #[serde(with = "seed_date")]
    pub date: Date,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SeedRevenue {
    #[validate(length(min = 1, max = 4))]
    pub month: String,
    pub revenue: i32,
}

/// The full set of records written by one seed run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub customers: Vec<SeedCustomer>,
    #[serde(default)]
    pub invoices: Vec<SeedInvoice>,
    #[serde(default)]
    pub revenue: Vec<SeedRevenue>,
}

impl SeedData {
    /// The dashboard dataset bundled with the crate.
    pub fn placeholder() -> Result<Self, DataError> {
        Ok(serde_json::from_str(PLACEHOLDER_JSON)?)
    }

    /// Loads a dataset from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Checks every record against the column constraints of its table.
    ///
    /// Stops at the first invalid record.
    pub fn validate(&self) -> Result<(), DataError> {
        validate_all("user", &self.users)?;
        validate_all("customer", &self.customers)?;
        validate_all("invoice", &self.invoices)?;
        validate_all("revenue row", &self.revenue)?;
        Ok(())
    }

    /// Invoices whose customer is not part of this dataset.
    pub fn orphaned_invoices(&self) -> Vec<&SeedInvoice> {
        let customers: HashSet<Uuid> = self.customers.iter().map(|c| c.id).collect();
        self.invoices
            .iter()
            .filter(|i| !customers.contains(&i.customer_id))
            .collect()
    }

    pub fn total_rows(&self) -> usize {
        self.users.len() + self.customers.len() + self.invoices.len() + self.revenue.len()
    }
}

fn validate_all<T: Validate>(entity: &'static str, records: &[T]) -> Result<(), DataError> {
    for (index, record) in records.iter().enumerate() {
        record.validate().map_err(|errors| DataError::Invalid {
            entity,
            index,
            errors,
        })?;
    }
    Ok(())
}
