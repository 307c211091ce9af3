pub mod config;
pub mod cpq;
pub mod document;
pub mod domain;
pub mod errors;

pub use cpq::catalog::Catalog;
pub use cpq::pricing::{DeterministicPricingEngine, PricingEngine, UnclassifiedPolicy};
pub use cpq::{Quotation, QuotationBuilder};
pub use document::{DocumentSettings, QuotationPayload, SenderIdentity, TokenValue};
pub use domain::customer::Customer;
pub use domain::order::{OrderLine, OrderRequest, PaymentType};
pub use domain::quote::{PricedQuotation, PricedRow, QuotationTotals};
pub use errors::{CatalogError, OrderError, QuotationError, UnknownProduct};
