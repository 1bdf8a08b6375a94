use crate::model::{NewProduct, Product, ProductId, ProductSummary, ProductUpdate};
use anyhow::Result;

#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    /// Persist a product, its (deduplicated) properties and the links between them.
    ///
    /// Runs as one transaction: either every row is written or none is.
    /// Only the first `MAX_PROPERTIES_PER_PRODUCT` entries are processed.
    async fn create_product(&self, product: NewProduct) -> Result<ProductId>;
    /// Every product with its property pairs, one entry per product
    async fn list_products(&self) -> Result<Vec<ProductSummary>>;
    /// Returns `None` when no product has the given id
    async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Option<Product>>;
    /// Returns `false` when no product has the given id
    async fn delete_product(&self, id: ProductId) -> Result<bool>;
}
