use anyhow::{bail, Context, Result};
use sqlx::types::Json;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Row, Transaction};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::model::{
    NewProduct, Product, ProductId, ProductSummary, ProductUpdate, PropertyEntry, PropertyId,
};
use crate::store::schema::SCHEMA_STATEMENTS;
use crate::store::traits::ProductStore;

const INSERT_PRODUCT: &str =
    "INSERT INTO product (name, upc, available_on) VALUES ($1, $2, $3::date) RETURNING id";

// Skips names that already exist (RETURNING then yields no row) without
// locking the existing row.
const INSERT_PROPERTY: &str = r#"
    INSERT INTO property (name) VALUES ($1)
    ON CONFLICT (name) DO NOTHING
    RETURNING id
"#;

const SELECT_PROPERTY_ID: &str = "SELECT id FROM property WHERE name = $1 LIMIT 1";

const INSERT_PRODUCT_PROPERTY: &str =
    "INSERT INTO product_properties (value, property_id, product_id) VALUES ($1, $2, $3)";

const LIST_PRODUCTS: &str = r#"
    SELECT
        product.id,
        product.name,
        product.upc,
        product.available_on,
        COALESCE(
            json_agg(
                json_build_object(
                    'propertyName', property.name,
                    'propertyValue', product_properties.value
                )
                ORDER BY product_properties.id
            ) FILTER (WHERE product_properties.id IS NOT NULL),
            '[]'::json
        ) AS properties
    FROM product
    LEFT JOIN product_properties ON product.id = product_properties.product_id
    LEFT JOIN property ON product_properties.property_id = property.id
    GROUP BY product.id
    ORDER BY product.id
"#;

const UPDATE_PRODUCT: &str = r#"
    UPDATE product SET
        name = COALESCE($1, name),
        upc = COALESCE($2, upc),
        available_on = COALESCE($3::date, available_on)
    WHERE id = $4
    RETURNING id, name, upc, available_on
"#;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create the connection pool. Each creation request checks out one
    /// connection for the whole transaction; requests beyond `max_connections`
    /// wait up to `acquire_timeout_secs` for one to free up.
    pub async fn connect(database_url: &str, config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.unwrap_or(20))
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs.unwrap_or(30)))
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the product tables if they do not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to create product schema")?;
        }
        Ok(())
    }

    /// Wait for checked-out connections to return, then close the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Steps 3 and 4 of product creation, run on an open transaction
async fn insert_product_graph(
    tx: &mut Transaction<'_, Postgres>,
    product: &NewProduct,
) -> Result<ProductId> {
    let product_id: ProductId = sqlx::query_scalar(INSERT_PRODUCT)
        .bind(&product.name)
        .bind(&product.upc)
        .bind(&product.available_on)
        .fetch_one(&mut **tx)
        .await
        .context("Failed to insert product")?;

    let mut property_ids = HashMap::new();
    for name in product.property_names_in_lock_order() {
        let property_id = resolve_property_id(tx, name).await?;
        property_ids.insert(name, property_id);
    }

    for entry in product.bounded_properties() {
        let name = entry.property_name.as_deref();
        let Some(property_id) = property_ids.get(&name).copied() else {
            bail!("Property {:?} was not resolved", name);
        };

        sqlx::query(INSERT_PRODUCT_PROPERTY)
            .bind(&entry.property_value)
            .bind(property_id)
            .bind(product_id)
            .execute(&mut **tx)
            .await
            .with_context(|| {
                format!(
                    "Failed to link property {} to product {}",
                    property_id, product_id
                )
            })?;
    }

    Ok(product_id)
}

/// Id of the property row named `name`, creating it if needed.
///
/// A conflicting insert waits for the transaction that holds the name to
/// settle. Under READ COMMITTED the follow-up lookup takes a fresh snapshot
/// and sees that row once committed. `fetch_one` turns a missing row into an
/// error so the transaction fails instead of linking to a null property.
async fn resolve_property_id(
    tx: &mut Transaction<'_, Postgres>,
    name: Option<&str>,
) -> Result<PropertyId> {
    let inserted = sqlx::query_scalar::<_, PropertyId>(INSERT_PROPERTY)
        .bind(name)
        .fetch_optional(&mut **tx)
        .await
        .with_context(|| format!("Failed to resolve property {:?}", name))?;

    if let Some(property_id) = inserted {
        return Ok(property_id);
    }

    sqlx::query_scalar::<_, PropertyId>(SELECT_PROPERTY_ID)
        .bind(name)
        .fetch_one(&mut **tx)
        .await
        .with_context(|| format!("Failed to look up existing property {:?}", name))
}

#[async_trait::async_trait]
impl ProductStore for PostgresStore {
    async fn create_product(&self, product: NewProduct) -> Result<ProductId> {
        // Dropping an uncommitted transaction rolls it back and returns the
        // connection to the pool, so every early exit below is covered.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin product transaction")?;

        let outcome = insert_product_graph(&mut tx, &product).await;
        match outcome {
            Ok(product_id) => {
                tx.commit()
                    .await
                    .context("Failed to commit product transaction")?;
                Ok(product_id)
            }
            Err(e) => {
                if let Err(rollback_error) = tx.rollback().await {
                    log::warn!("Rollback of product transaction failed: {}", rollback_error);
                }
                Err(e)
            }
        }
    }

    async fn list_products(&self) -> Result<Vec<ProductSummary>> {
        let rows = sqlx::query(LIST_PRODUCTS)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list products")?;

        rows.into_iter()
            .map(|row| {
                let properties: Json<Vec<PropertyEntry>> = row.try_get("properties")?;
                Ok(ProductSummary::new(
                    row.try_get("name")?,
                    row.try_get("upc")?,
                    row.try_get("available_on")?,
                    properties.0,
                ))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .context("Failed to decode product listing")
    }

    async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Option<Product>> {
        let row = sqlx::query(UPDATE_PRODUCT)
            .bind(&update.name)
            .bind(&update.upc)
            .bind(&update.available_on)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to update product")?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Product {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            upc: row.try_get("upc")?,
            available_on: row.try_get("available_on")?,
        }))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin delete transaction")?;

        sqlx::query("DELETE FROM product_properties WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete product properties")?;

        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete product")?;

        tx.commit()
            .await
            .context("Failed to commit delete transaction")?;

        Ok(result.rows_affected() > 0)
    }
}
