use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::property::{lenient_property_list, lenient_text};
use crate::model::{format_available_on, ProductId, PropertyEntry, MAX_PROPERTIES_PER_PRODUCT};

/// Body of `POST /products`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub upc: Option<String>,
    /// Raw date text; parsing is left to the store
    #[serde(default, deserialize_with = "lenient_text")]
    pub available_on: Option<String>,
    #[serde(default, deserialize_with = "lenient_property_list")]
    pub properties: Vec<PropertyEntry>,
}

impl NewProduct {
    pub fn new(name: &str, upc: &str, available_on: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            upc: Some(upc.to_string()),
            available_on: Some(available_on.to_string()),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: &str, value: &str) -> Self {
        self.properties.push(PropertyEntry::new(name, value));
        self
    }

    /// The entries a creation actually processes, in the order supplied
    pub fn bounded_properties(&self) -> &[PropertyEntry] {
        let len = self.properties.len().min(MAX_PROPERTIES_PER_PRODUCT);
        &self.properties[..len]
    }

    /// Distinct property names of the bounded entries, sorted.
    ///
    /// Creations resolve their properties in this order, so two of them
    /// inserting the same new names wait on each other in one direction only.
    pub fn property_names_in_lock_order(&self) -> Vec<Option<&str>> {
        let mut names: Vec<_> = self
            .bounded_properties()
            .iter()
            .map(|entry| entry.property_name.as_deref())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// A stored `product` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub upc: String,
    pub available_on: Option<NaiveDate>,
}

/// Body of `PUT /products/:id`; absent fields keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub upc: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub available_on: Option<String>,
}

/// One entry of the `GET /products` listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub name: String,
    pub upc: String,
    /// `MM/DD/YYYY`
    pub availableon: Option<String>,
    pub properties: Vec<PropertyEntry>,
}

impl ProductSummary {
    pub fn new(
        name: String,
        upc: String,
        available_on: Option<NaiveDate>,
        properties: Vec<PropertyEntry>,
    ) -> Self {
        Self {
            name,
            upc,
            availableon: available_on.map(format_available_on),
            properties,
        }
    }
}
