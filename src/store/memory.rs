use anyhow::{anyhow, bail, Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::model::{
    parse_available_on, NewProduct, Product, ProductId, ProductSummary, ProductUpdate,
    Property, PropertyEntry, PropertyId,
};
use crate::store::traits::ProductStore;

/// A `product_properties` row
#[derive(Clone, Debug)]
struct ProductPropertyRow {
    product_id: ProductId,
    property_id: PropertyId,
    value: Option<String>,
}

/// All three tables plus their id sequences
#[derive(Clone, Debug, Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    properties: BTreeMap<PropertyId, Property>,
    property_names: HashMap<String, PropertyId>,
    product_properties: Vec<ProductPropertyRow>,
    next_product_id: ProductId,
    next_property_id: PropertyId,
}

impl Tables {
    fn insert_product(&mut self, product: &NewProduct) -> Result<ProductId> {
        let name = product
            .name
            .clone()
            .ok_or_else(|| anyhow!("null value in column \"name\" of relation \"product\""))?;
        let upc = product
            .upc
            .clone()
            .ok_or_else(|| anyhow!("null value in column \"upc\" of relation \"product\""))?;
        let available_on = match product.available_on.as_deref() {
            Some(raw) => Some(
                parse_available_on(raw)
                    .ok_or_else(|| anyhow!("invalid input syntax for type date: {:?}", raw))?,
            ),
            None => None,
        };

        if self.products.values().any(|existing| existing.upc == upc) {
            bail!("duplicate key value violates unique constraint \"product_upc_key\"");
        }

        self.next_product_id += 1;
        let id = self.next_product_id;
        self.products.insert(
            id,
            Product {
                id,
                name,
                upc,
                available_on,
            },
        );
        Ok(id)
    }

    fn upsert_property(&mut self, name: Option<&str>) -> Result<PropertyId> {
        let name =
            name.ok_or_else(|| anyhow!("null value in column \"name\" of relation \"property\""))?;

        if let Some(id) = self.property_names.get(name) {
            return Ok(*id);
        }

        self.next_property_id += 1;
        let id = self.next_property_id;
        self.properties.insert(
            id,
            Property {
                id,
                name: name.to_string(),
            },
        );
        self.property_names.insert(name.to_string(), id);
        Ok(id)
    }

    fn summarize(&self, product: &Product) -> ProductSummary {
        let properties = self
            .product_properties
            .iter()
            .filter(|row| row.product_id == product.id)
            .map(|row| PropertyEntry {
                property_name: self.properties.get(&row.property_id).map(|p| p.name.clone()),
                property_value: row.value.clone(),
            })
            .collect();

        ProductSummary::new(
            product.name.clone(),
            product.upc.clone(),
            product.available_on,
            properties,
        )
    }
}

/// In-process `ProductStore` with the same all-or-nothing creation contract as
/// the Postgres store. Writes are staged on a copy of the tables and only
/// published when every step succeeds.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    /// Association value that makes the link insert fail; only set by tests
    failing_value: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any creation at the moment it links a property carrying `value`
    #[cfg(test)]
    pub fn failing_on_property_value(value: &str) -> Self {
        Self {
            tables: Arc::default(),
            failing_value: Some(value.to_string()),
        }
    }

    /// Number of rows in `property`
    pub async fn property_count(&self) -> usize {
        self.tables.read().await.properties.len()
    }

    /// Number of rows in `product_properties`
    pub async fn association_count(&self) -> usize {
        self.tables.read().await.product_properties.len()
    }

    /// Number of `product_properties` rows pointing at the property named `name`
    pub async fn association_count_for(&self, name: &str) -> usize {
        let tables = self.tables.read().await;
        let Some(property_id) = tables.property_names.get(name) else {
            return 0;
        };
        tables
            .product_properties
            .iter()
            .filter(|row| row.property_id == *property_id)
            .count()
    }

    fn link(&self, staged: &mut Tables, row: ProductPropertyRow) -> Result<()> {
        if self.failing_value.is_some() && row.value == self.failing_value {
            bail!("injected failure linking property {}", row.property_id);
        }
        staged.product_properties.push(row);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProductStore for MemoryStore {
    async fn create_product(&self, product: NewProduct) -> Result<ProductId> {
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();

        let product_id = staged
            .insert_product(&product)
            .context("Failed to insert product")?;

        let mut property_ids = HashMap::new();
        for name in product.property_names_in_lock_order() {
            let property_id = staged
                .upsert_property(name)
                .with_context(|| format!("Failed to resolve property {:?}", name))?;
            property_ids.insert(name, property_id);
        }

        for entry in product.bounded_properties() {
            let name = entry.property_name.as_deref();
            let Some(property_id) = property_ids.get(&name).copied() else {
                bail!("Property {:?} was not resolved", name);
            };

            self.link(
                &mut staged,
                ProductPropertyRow {
                    product_id,
                    property_id,
                    value: entry.property_value.clone(),
                },
            )
            .with_context(|| {
                format!(
                    "Failed to link property {} to product {}",
                    property_id, product_id
                )
            })?;
        }

        *tables = staged;
        Ok(product_id)
    }

    async fn list_products(&self) -> Result<Vec<ProductSummary>> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .map(|product| tables.summarize(product))
            .collect())
    }

    async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Option<Product>> {
        let mut tables = self.tables.write().await;

        let available_on = match update.available_on.as_deref() {
            Some(raw) => Some(
                parse_available_on(raw)
                    .ok_or_else(|| anyhow!("invalid input syntax for type date: {:?}", raw))?,
            ),
            None => None,
        };

        if let Some(upc) = &update.upc {
            if tables
                .products
                .values()
                .any(|existing| existing.id != id && &existing.upc == upc)
            {
                bail!("duplicate key value violates unique constraint \"product_upc_key\"");
            }
        }

        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            product.name = name;
        }
        if let Some(upc) = update.upc {
            product.upc = upc;
        }
        if available_on.is_some() {
            product.available_on = available_on;
        }

        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut tables = self.tables.write().await;

        if tables.products.remove(&id).is_none() {
            return Ok(false);
        }
        tables.product_properties.retain(|row| row.product_id != id);
        Ok(true)
    }
}
