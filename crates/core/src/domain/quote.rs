use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::order::PaymentType;

/// Tax applied to every classified line, in percent.
pub const TAX_PERCENT: Decimal = Decimal::from_parts(7, 0, 0, false, 0);

pub fn tax_rate() -> Decimal {
    TAX_PERCENT / Decimal::ONE_HUNDRED
}

/// Rounds a currency amount to cents. Only payload assembly calls this; every
/// accumulator upstream stays unrounded.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// One order line after catalog resolution. Amounts are exact and unrounded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedRow {
    pub product: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub tax_percent: Decimal,
    pub line_subtotal: Decimal,
    pub line_discount_amount: Decimal,
    pub line_final_amount: Decimal,
    pub payment_type: String,
    pub payment_class: Option<PaymentType>,
}

impl PricedRow {
    pub fn is_classified(&self) -> bool {
        self.payment_class.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationTotals {
    pub total_list: Decimal,
    pub total_discount: Decimal,
    pub total_tax: Decimal,
    pub total_final: Decimal,
    pub one_time_subtotal: Decimal,
    pub recurring_subtotal: Decimal,
    pub unclassified_subtotal: Decimal,
    pub total_one_time_with_tax: Decimal,
    pub total_recurring_with_tax: Decimal,
    pub one_time_installment_first: Decimal,
    pub one_time_installment_second: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedQuotation {
    pub rows: Vec<PricedRow>,
    pub totals: QuotationTotals,
}

impl PricedQuotation {
    pub fn unclassified_rows(&self) -> impl Iterator<Item = &PricedRow> {
        self.rows.iter().filter(|row| !row.is_classified())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{round_currency, tax_rate, TAX_PERCENT};

    #[test]
    fn tax_constants_describe_seven_percent() {
        assert_eq!(TAX_PERCENT, Decimal::from(7));
        assert_eq!(tax_rate(), Decimal::new(7, 2));
    }

    #[test]
    fn rounding_goes_to_cents_with_midpoint_away_from_zero() {
        assert_eq!(round_currency(Decimal::new(12_345, 3)), Decimal::new(1235, 2));
        assert_eq!(round_currency(Decimal::new(12_344, 3)), Decimal::new(1234, 2));
        assert_eq!(round_currency(Decimal::new(-12_345, 3)), Decimal::new(-1235, 2));
        assert_eq!(round_currency(Decimal::new(1926, 1)), Decimal::new(19_260, 2));
    }
}
