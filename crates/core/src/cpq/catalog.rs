use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rust_decimal::Decimal;

use crate::errors::{CatalogError, UnknownProduct};

/// Read-only price list keyed by product name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    prices: BTreeMap<String, Decimal>,
}

impl Catalog {
    pub fn new(prices: BTreeMap<String, Decimal>) -> Result<Self, CatalogError> {
        if let Some((product, price)) = prices.iter().find(|(_, price)| price.is_sign_negative()) {
            return Err(CatalogError::InvalidPrice { product: product.clone(), price: *price });
        }

        Ok(Self { prices })
    }

    /// Parses a flat JSON object of `"product name": unit_price` pairs.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let prices: BTreeMap<String, Decimal> =
            serde_json::from_str(raw).map_err(CatalogError::Parse)?;
        Self::new(prices)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_json_str(&raw)
    }

    pub fn lookup(&self, product: &str) -> Result<Decimal, UnknownProduct> {
        self.prices
            .get(product)
            .copied()
            .ok_or_else(|| UnknownProduct { product: product.to_string() })
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.prices.iter().map(|(name, price)| (name.as_str(), *price))
    }
}
