//! Document-creation payload for the quotation template.
//!
//! Field and token names below are the contract with the downstream template and
//! must not be renamed. Every amount is rounded to cents here and nowhere else.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::Customer;
use crate::domain::quote::{round_currency, PricedQuotation, PricedRow, QuotationTotals};

pub mod token {
    pub const CLIENT: &str = "client";
    pub const CLIENT_FIRST_NAME: &str = "Client.FirstName";
    pub const CLIENT_EMAIL: &str = "cliente.Email";
    pub const CLIENT_CITY: &str = "Client.City";
    pub const SENDER_FIRST_NAME: &str = "Sender.FirstName";
    pub const SENDER_LAST_NAME: &str = "Sender.LastName";
    pub const SENDER_COMPANY: &str = "Sender.Company";
    pub const DATE: &str = "date";
    pub const TOTAL: &str = "total";
    pub const TOTAL_LIST: &str = "total_lista";
    pub const TOTAL_DISCOUNT: &str = "total_descuento";
    pub const TAXES: &str = "impuestos";
    pub const ONE_TIME_WITH_TAX: &str = "Total.Pagounico";
    pub const RECURRING_WITH_TAX: &str = "Total.Pagomensual";
    pub const ONE_TIME_INSTALLMENT_FIRST: &str = "PagoUnico.50_1";
    pub const ONE_TIME_INSTALLMENT_SECOND: &str = "PagoUnico.50_2";
    pub const DOCUMENT_NAME: &str = "document_name";

    /// Tax token scoped to the pricing table, e.g. `quotation_table.Tax`.
    pub fn table_tax(pricing_table_name: &str) -> String {
        format!("{pricing_table_name}.Tax")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderIdentity {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
}

/// Template wiring that used to be hard-coded next to the pricing logic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentSettings {
    pub template_id: String,
    pub pricing_table_name: String,
    pub section_title: String,
    pub sender: SenderIdentity,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuotationPayload {
    pub name: String,
    pub template_uuid: String,
    pub recipients: Vec<Recipient>,
    pub fields: DocumentFields,
    pub tokens: Vec<Token>,
    pub pricing_tables: Vec<PricingTable>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenValue {
    Text(String),
    #[serde(with = "rust_decimal::serde::float")]
    Amount(Decimal),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldValue {
    pub value: TokenValue,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DocumentFields {
    pub client_name: FieldValue,
    pub date: FieldValue,
    pub total: FieldValue,
    #[serde(rename = "total_lista")]
    pub total_list: FieldValue,
    #[serde(rename = "total_descuento")]
    pub total_discount: FieldValue,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Token {
    pub name: String,
    pub value: TokenValue,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricingTable {
    pub name: String,
    pub data_merge: bool,
    pub options: serde_json::Map<String, serde_json::Value>,
    pub sections: Vec<PricingSection>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricingSection {
    pub title: String,
    pub default: bool,
    pub rows: Vec<PricingRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricingRow {
    pub data: RowData,
    pub options: RowOptions,
    pub custom_fields: RowCustomFields,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RowData {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Price", with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "QTY")]
    pub quantity: u32,
    #[serde(rename = "Discount")]
    pub discount: Adjustment,
    #[serde(rename = "Tax")]
    pub tax: Adjustment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Percent,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Adjustment {
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

impl Adjustment {
    pub fn percent(value: Decimal) -> Self {
        Self { kind: AdjustmentKind::Percent, value }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowOptions {
    pub optional: bool,
    pub optional_selected: bool,
    pub qty_editable: bool,
}

impl Default for RowOptions {
    fn default() -> Self {
        Self { optional: false, optional_selected: true, qty_editable: false }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowCustomFields {
    #[serde(rename = "Text")]
    pub payment_type: String,
}

impl QuotationPayload {
    pub fn token(&self, name: &str) -> Option<&TokenValue> {
        self.tokens.iter().find(|token| token.name == name).map(|token| &token.value)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub fn document_title(customer_name: &str, issued_on: NaiveDate) -> String {
    format!("Quotation - {customer_name} - {}", issued_on.format("%B %Y"))
}

fn display_date(issued_on: NaiveDate) -> String {
    issued_on.format("%d/%m/%Y").to_string()
}

fn amount(value: Decimal) -> TokenValue {
    TokenValue::Amount(round_currency(value))
}

fn text(value: impl Into<String>) -> TokenValue {
    TokenValue::Text(value.into())
}

fn named(name: impl Into<String>, value: TokenValue) -> Token {
    Token { name: name.into(), value }
}

pub fn assemble_payload(
    priced: &PricedQuotation,
    customer: &Customer,
    settings: &DocumentSettings,
    issued_on: NaiveDate,
) -> QuotationPayload {
    let title = document_title(&customer.name, issued_on);
    let date = display_date(issued_on);
    let totals = &priced.totals;

    QuotationPayload {
        name: title.clone(),
        template_uuid: settings.template_id.clone(),
        recipients: vec![Recipient {
            email: customer.email.clone(),
            first_name: customer.name.clone(),
            last_name: String::new(),
        }],
        fields: DocumentFields {
            client_name: FieldValue { value: text(&customer.name) },
            date: FieldValue { value: text(&date) },
            total: FieldValue { value: amount(totals.total_final) },
            total_list: FieldValue { value: amount(totals.total_list) },
            total_discount: FieldValue { value: amount(totals.total_discount) },
        },
        tokens: tokens(customer, settings, totals, &date, &title),
        pricing_tables: vec![PricingTable {
            name: settings.pricing_table_name.clone(),
            data_merge: true,
            options: serde_json::Map::new(),
            sections: vec![PricingSection {
                title: settings.section_title.clone(),
                default: true,
                rows: priced.rows.iter().map(pricing_row).collect(),
            }],
        }],
    }
}

fn tokens(
    customer: &Customer,
    settings: &DocumentSettings,
    totals: &QuotationTotals,
    date: &str,
    title: &str,
) -> Vec<Token> {
    let mut tokens = vec![
        named(token::CLIENT, text(&customer.name)),
        named(token::CLIENT_FIRST_NAME, text(&customer.name)),
        named(token::CLIENT_EMAIL, text(&customer.email)),
    ];
    if let Some(city) = &customer.city {
        tokens.push(named(token::CLIENT_CITY, text(city)));
    }

    tokens.extend([
        named(token::SENDER_FIRST_NAME, text(&settings.sender.first_name)),
        named(token::SENDER_LAST_NAME, text(&settings.sender.last_name)),
        named(token::SENDER_COMPANY, text(&settings.sender.company)),
        named(token::DATE, text(date)),
        named(token::TOTAL, amount(totals.total_final)),
        named(token::TOTAL_LIST, amount(totals.total_list)),
        named(token::TOTAL_DISCOUNT, amount(totals.total_discount)),
        named(token::TAXES, amount(totals.total_tax)),
        named(token::table_tax(&settings.pricing_table_name), amount(totals.total_tax)),
        named(token::ONE_TIME_WITH_TAX, amount(totals.total_one_time_with_tax)),
        named(token::RECURRING_WITH_TAX, amount(totals.total_recurring_with_tax)),
        named(token::ONE_TIME_INSTALLMENT_FIRST, amount(totals.one_time_installment_first)),
        named(token::ONE_TIME_INSTALLMENT_SECOND, amount(totals.one_time_installment_second)),
        named(token::DOCUMENT_NAME, text(title)),
    ]);

    tokens
}

fn pricing_row(row: &PricedRow) -> PricingRow {
    PricingRow {
        data: RowData {
            name: row.product.clone(),
            description: format!("Cantidad: {}", row.quantity),
            price: round_currency(row.unit_price),
            quantity: row.quantity,
            discount: Adjustment::percent(row.discount_percent),
            tax: Adjustment::percent(row.tax_percent),
        },
        options: RowOptions::default(),
        custom_fields: RowCustomFields { payment_type: row.payment_type.clone() },
    }
}
