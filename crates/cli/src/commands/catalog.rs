use std::path::PathBuf;

use quoter_core::config::ConfigOverrides;
use quoter_core::domain::quote::round_currency;
use serde_json::json;

use crate::commands::{config_load_options, load_catalog, load_config, CommandResult};

pub fn run(catalog_path: Option<PathBuf>, config_path: Option<PathBuf>) -> CommandResult {
    let options = config_load_options(
        config_path,
        ConfigOverrides { catalog_path, ..ConfigOverrides::default() },
    );
    let config = match load_config("catalog", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let catalog = match load_catalog("catalog", &config) {
        Ok(catalog) => catalog,
        Err(failure) => return failure,
    };

    let products: Vec<_> = catalog
        .iter()
        .map(|(name, price)| json!({ "name": name, "unit_price": round_currency(price).to_string() }))
        .collect();

    CommandResult::success_with_details(
        "catalog",
        format!("{} products loaded from `{}`", catalog.len(), config.catalog.path.display()),
        Some(json!({ "count": catalog.len(), "products": products })),
    )
}
