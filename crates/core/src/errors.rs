use std::path::PathBuf;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown product `{product}` is not present in the price catalog")]
pub struct UnknownProduct {
    pub product: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QuotationError {
    #[error(transparent)]
    UnknownProduct(#[from] UnknownProduct),
    #[error("order line for `{product}` has quantity 0; quantity must be positive")]
    InvalidQuantity { product: String },
    #[error("order line for `{product}` has discount {discount_percent}%; expected 0..=100")]
    DiscountOutOfRange { product: String, discount_percent: Decimal },
    #[error("order line for `{product}` has unrecognized payment type `{payment_type}`")]
    UnrecognizedPaymentType { product: String, payment_type: String },
    #[error("order has no lines")]
    EmptyOrder,
    #[error("amounts for `{product}` exceed the representable decimal range")]
    AmountOverflow { product: String },
    #[error("quotation totals exceed the representable decimal range")]
    TotalsOverflow,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read price catalog `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse price catalog: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("price for `{product}` must not be negative (got {price})")]
    InvalidPrice { product: String, price: Decimal },
}

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("could not read order file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse order file `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}
