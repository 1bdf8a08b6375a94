//! Table definitions the stores rely on.
//!
//! `property.name` must stay a real UNIQUE constraint: property resolution
//! upserts against it and relies on Postgres blocking a concurrent insert of
//! the same name until the first transaction settles (READ COMMITTED or
//! stronger).

pub const CREATE_PRODUCT_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS product (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        upc TEXT NOT NULL UNIQUE,
        available_on DATE
    )
"#;

pub const CREATE_PROPERTY_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS property (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
"#;

pub const CREATE_PRODUCT_PROPERTIES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS product_properties (
        id SERIAL PRIMARY KEY,
        value TEXT,
        property_id INTEGER NOT NULL REFERENCES property (id),
        product_id INTEGER NOT NULL REFERENCES product (id)
    )
"#;

/// In dependency order
pub const SCHEMA_STATEMENTS: [&str; 3] = [
    CREATE_PRODUCT_TABLE,
    CREATE_PROPERTY_TABLE,
    CREATE_PRODUCT_PROPERTIES_TABLE,
];
