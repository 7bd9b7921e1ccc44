//! Fixed table definitions for the dashboard database.

use std::fmt;

use serde::Serialize;

/// Extension providing `uuid_generate_v4()` for the generated primary keys.
pub const UUID_EXTENSION_SQL: &str = r#"CREATE EXTENSION IF NOT EXISTS "uuid-ossp""#;

/// Most bind parameters PostgreSQL accepts in one statement.
pub const MAX_BIND_PARAMS: usize = u16::MAX as usize;

/// The seeded tables, in seeding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Users,
    Customers,
    Invoices,
    Revenue,
}

impl Table {
    /// Seeding order. Customers precede invoices so invoice references resolve,
    /// although no foreign key enforces it.
    pub const ALL: [Table; 4] = [Table::Users, Table::Customers, Table::Invoices, Table::Revenue];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Customers => "customers",
            Table::Invoices => "invoices",
            Table::Revenue => "revenue",
        }
    }

    /// Whether the table's primary key defaults to `uuid_generate_v4()`.
    pub fn needs_uuid_extension(&self) -> bool {
        !matches!(self, Table::Revenue)
    }

    /// Column whose conflict causes an insert to be skipped.
    pub fn identity_column(&self) -> &'static str {
        match self {
            Table::Revenue => "month",
            _ => "id",
        }
    }

    /// Columns written per seeded row.
    pub fn column_count(&self) -> usize {
        match self {
            Table::Users | Table::Customers => 4,
            Table::Invoices => 5,
            Table::Revenue => 2,
        }
    }

    /// Rows one multi-row insert can carry before exceeding [`MAX_BIND_PARAMS`].
    pub fn max_rows_per_statement(&self) -> usize {
        MAX_BIND_PARAMS / self.column_count()
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table.
    pub fn create_sql(&self) -> &'static str {
        match self {
            Table::Users => {
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
                    name VARCHAR(255) NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    password TEXT NOT NULL
                )
                "#
            }
            Table::Customers => {
                r#"
                CREATE TABLE IF NOT EXISTS customers (
                    id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
                    name VARCHAR(255) NOT NULL,
                    email VARCHAR(255) NOT NULL,
                    image_url VARCHAR(255) NOT NULL
                )
                "#
            }
            Table::Invoices => {
                r#"
                CREATE TABLE IF NOT EXISTS invoices (
                    id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
                    customer_id UUID NOT NULL,
                    amount INT NOT NULL,
                    status VARCHAR(255) NOT NULL,
                    date DATE NOT NULL
                )
                "#
            }
            Table::Revenue => {
                r#"
                CREATE TABLE IF NOT EXISTS revenue (
                    month VARCHAR(4) NOT NULL UNIQUE,
                    revenue INT NOT NULL
                )
                "#
            }
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
