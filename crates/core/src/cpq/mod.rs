pub mod catalog;
pub mod pricing;

use chrono::NaiveDate;

use crate::document::{assemble_payload, DocumentSettings, QuotationPayload};
use crate::domain::customer::Customer;
use crate::domain::order::OrderLine;
use crate::domain::quote::PricedQuotation;
use crate::errors::QuotationError;

use self::{
    catalog::Catalog,
    pricing::{DeterministicPricingEngine, PricingEngine},
};

/// A fully built quotation: the priced breakdown and the payload derived from it.
#[derive(Clone, Debug, PartialEq)]
pub struct Quotation {
    pub priced: PricedQuotation,
    pub payload: QuotationPayload,
}

/// Turns an order into a ready-to-submit payload. Holds no per-call state.
pub struct QuotationBuilder<'a, P = DeterministicPricingEngine> {
    catalog: &'a Catalog,
    settings: &'a DocumentSettings,
    pricing_engine: P,
}

impl<'a> QuotationBuilder<'a, DeterministicPricingEngine> {
    pub fn new(catalog: &'a Catalog, settings: &'a DocumentSettings) -> Self {
        Self::with_engine(catalog, settings, DeterministicPricingEngine::default())
    }
}

impl<'a, P: PricingEngine> QuotationBuilder<'a, P> {
    pub fn with_engine(catalog: &'a Catalog, settings: &'a DocumentSettings, pricing_engine: P) -> Self {
        Self { catalog, settings, pricing_engine }
    }

    pub fn build(
        &self,
        customer: &Customer,
        lines: &[OrderLine],
        issued_on: NaiveDate,
    ) -> Result<QuotationPayload, QuotationError> {
        self.quote(customer, lines, issued_on).map(|quotation| quotation.payload)
    }

    /// Same as [`build`](Self::build) but keeps the unrounded breakdown alongside.
    pub fn quote(
        &self,
        customer: &Customer,
        lines: &[OrderLine],
        issued_on: NaiveDate,
    ) -> Result<Quotation, QuotationError> {
        let priced = self.pricing_engine.price(self.catalog, lines)?;
        let payload = assemble_payload(&priced, customer, self.settings, issued_on);

        Ok(Quotation { priced, payload })
    }
}
