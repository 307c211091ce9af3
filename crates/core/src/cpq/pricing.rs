use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::catalog::Catalog;
use crate::domain::order::{OrderLine, PaymentType};
use crate::domain::quote::{tax_rate, PricedQuotation, PricedRow, QuotationTotals, TAX_PERCENT};
use crate::errors::QuotationError;

/// What to do with a line whose payment type matches neither bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnclassifiedPolicy {
    /// Keep the row, count it in list/discount totals, leave it out of both
    /// payment buckets and therefore out of the tax base.
    #[default]
    Exclude,
    Reject,
}

impl std::str::FromStr for UnclassifiedPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exclude" => Ok(Self::Exclude),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unsupported unclassified policy `{other}` (expected exclude|reject)")),
        }
    }
}

pub trait PricingEngine: Send + Sync {
    fn price(&self, catalog: &Catalog, lines: &[OrderLine]) -> Result<PricedQuotation, QuotationError>;
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicPricingEngine {
    pub unclassified_policy: UnclassifiedPolicy,
}

impl DeterministicPricingEngine {
    pub fn new(unclassified_policy: UnclassifiedPolicy) -> Self {
        Self { unclassified_policy }
    }
}

impl PricingEngine for DeterministicPricingEngine {
    fn price(&self, catalog: &Catalog, lines: &[OrderLine]) -> Result<PricedQuotation, QuotationError> {
        price_lines(catalog, lines, self.unclassified_policy)
    }
}

/// Running sums of the per-line fold. Never rounded.
#[derive(Default)]
struct Buckets {
    list: Decimal,
    discount: Decimal,
    one_time: Decimal,
    recurring: Decimal,
    unclassified: Decimal,
}

impl Buckets {
    fn add(mut self, row: &PricedRow) -> Result<Self, QuotationError> {
        let overflow = || QuotationError::AmountOverflow { product: row.product.clone() };

        self.list = self.list.checked_add(row.line_subtotal).ok_or_else(overflow)?;
        self.discount = self.discount.checked_add(row.line_discount_amount).ok_or_else(overflow)?;
        let bucket = match row.payment_class {
            Some(PaymentType::OneTime) => &mut self.one_time,
            Some(PaymentType::Recurring) => &mut self.recurring,
            None => &mut self.unclassified,
        };
        *bucket = bucket.checked_add(row.line_final_amount).ok_or_else(overflow)?;

        Ok(self)
    }

    fn into_totals(self) -> Result<QuotationTotals, QuotationError> {
        self.checked_totals().ok_or(QuotationError::TotalsOverflow)
    }

    fn checked_totals(self) -> Option<QuotationTotals> {
        let rate = tax_rate();
        let gross_rate = Decimal::ONE + rate;
        let total_tax = self.one_time.checked_add(self.recurring)?.checked_mul(rate)?;
        let total_one_time_with_tax = self.one_time.checked_mul(gross_rate)?;
        let installment = total_one_time_with_tax.checked_div(Decimal::TWO)?;

        Some(QuotationTotals {
            total_list: self.list,
            total_discount: self.discount,
            total_tax,
            total_final: self.list.checked_sub(self.discount)?.checked_add(total_tax)?,
            one_time_subtotal: self.one_time,
            recurring_subtotal: self.recurring,
            unclassified_subtotal: self.unclassified,
            total_one_time_with_tax,
            total_recurring_with_tax: self.recurring.checked_mul(gross_rate)?,
            one_time_installment_first: installment,
            one_time_installment_second: installment,
        })
    }
}

pub fn price_lines(
    catalog: &Catalog,
    lines: &[OrderLine],
    unclassified_policy: UnclassifiedPolicy,
) -> Result<PricedQuotation, QuotationError> {
    if lines.is_empty() {
        return Err(QuotationError::EmptyOrder);
    }

    let rows = lines
        .iter()
        .map(|line| price_line(catalog, line, unclassified_policy))
        .collect::<Result<Vec<_>, _>>()?;

    let totals = rows.iter().try_fold(Buckets::default(), Buckets::add)?.into_totals()?;

    Ok(PricedQuotation { rows, totals })
}

pub fn price_line(
    catalog: &Catalog,
    line: &OrderLine,
    unclassified_policy: UnclassifiedPolicy,
) -> Result<PricedRow, QuotationError> {
    let unit_price = catalog.lookup(&line.product)?;

    if line.quantity == 0 {
        return Err(QuotationError::InvalidQuantity { product: line.product.clone() });
    }
    if line.discount_percent < Decimal::ZERO || line.discount_percent > Decimal::ONE_HUNDRED {
        return Err(QuotationError::DiscountOutOfRange {
            product: line.product.clone(),
            discount_percent: line.discount_percent,
        });
    }

    let payment_class = line.payment_class();
    if payment_class.is_none() && unclassified_policy == UnclassifiedPolicy::Reject {
        return Err(QuotationError::UnrecognizedPaymentType {
            product: line.product.clone(),
            payment_type: line.payment_type.clone(),
        });
    }

    let overflow = || QuotationError::AmountOverflow { product: line.product.clone() };
    let quantity = Decimal::from(line.quantity);
    let line_subtotal = unit_price.checked_mul(quantity).ok_or_else(overflow)?;
    let line_discount_amount = unit_price
        .checked_mul(line.discount_percent / Decimal::ONE_HUNDRED)
        .and_then(|discount| discount.checked_mul(quantity))
        .ok_or_else(overflow)?;
    let line_final_amount = line_subtotal.checked_sub(line_discount_amount).ok_or_else(overflow)?;

    Ok(PricedRow {
        product: line.product.clone(),
        quantity: line.quantity,
        unit_price,
        discount_percent: line.discount_percent,
        tax_percent: TAX_PERCENT,
        line_subtotal,
        line_discount_amount,
        line_final_amount,
        payment_type: line.payment_type.clone(),
        payment_class,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use super::{price_line, price_lines, DeterministicPricingEngine, PricingEngine, UnclassifiedPolicy};
    use crate::cpq::catalog::Catalog;
    use crate::domain::order::{OrderLine, PaymentType};
    use crate::domain::quote::round_currency;
    use crate::errors::QuotationError;

    fn catalog(entries: &[(&str, Decimal)]) -> Catalog {
        let prices: BTreeMap<String, Decimal> =
            entries.iter().map(|(name, price)| (name.to_string(), *price)).collect();
        Catalog::new(prices).expect("catalog fixture")
    }

    fn widget_catalog() -> Catalog {
        catalog(&[("Widget", Decimal::from(100))])
    }

    #[test]
    fn single_discounted_one_time_line() {
        let lines = vec![OrderLine::new("Widget", 2, Decimal::from(10), "Unico")];

        let priced = price_lines(&widget_catalog(), &lines, UnclassifiedPolicy::Exclude)
            .expect("pricing should succeed");
        let row = &priced.rows[0];
        let totals = &priced.totals;

        assert_eq!(row.line_subtotal, Decimal::from(200));
        assert_eq!(row.line_discount_amount, Decimal::from(20));
        assert_eq!(row.line_final_amount, Decimal::from(180));
        assert_eq!(totals.one_time_subtotal, Decimal::from(180));
        assert_eq!(totals.total_tax, Decimal::new(1260, 2));
        assert_eq!(totals.total_final, Decimal::new(19_260, 2));
        assert_eq!(totals.total_one_time_with_tax, Decimal::new(19_260, 2));
        assert_eq!(totals.total_recurring_with_tax, Decimal::ZERO);
    }

    #[test]
    fn one_time_and_recurring_lines_split_into_buckets() {
        let lines = vec![
            OrderLine::new("Widget", 1, Decimal::ZERO, "Unico"),
            OrderLine::new("Widget", 1, Decimal::ZERO, "Mensual"),
        ];

        let totals = price_lines(&widget_catalog(), &lines, UnclassifiedPolicy::Exclude)
            .expect("pricing should succeed")
            .totals;

        assert_eq!(totals.total_list, Decimal::from(200));
        assert_eq!(totals.total_discount, Decimal::ZERO);
        assert_eq!(totals.total_tax, Decimal::from(14));
        assert_eq!(totals.total_final, Decimal::from(214));
        assert_eq!(totals.total_one_time_with_tax, Decimal::from(107));
        assert_eq!(totals.total_recurring_with_tax, Decimal::from(107));
    }

    #[test]
    fn one_time_total_splits_into_two_installments() {
        let lines = vec![OrderLine::new("Widget", 1, Decimal::ZERO, "unico")];

        let totals = price_lines(&widget_catalog(), &lines, UnclassifiedPolicy::Exclude)
            .expect("pricing should succeed")
            .totals;

        assert_eq!(totals.one_time_installment_first, Decimal::new(535, 1));
        assert_eq!(totals.one_time_installment_second, Decimal::new(535, 1));
    }

    #[test]
    fn classification_is_case_insensitive() {
        for label in ["Unico", "UNICO", "unico"] {
            let row = price_line(
                &widget_catalog(),
                &OrderLine::new("Widget", 1, Decimal::ZERO, label),
                UnclassifiedPolicy::Reject,
            )
            .expect("label should classify");
            assert_eq!(row.payment_class, Some(PaymentType::OneTime));
            assert_eq!(row.payment_type, label, "raw label should be preserved");
        }
    }

    #[test]
    fn unknown_product_aborts_the_whole_order() {
        let lines = vec![
            OrderLine::new("Widget", 1, Decimal::ZERO, "Unico"),
            OrderLine::new("Gadget", 1, Decimal::ZERO, "Unico"),
        ];

        let error = price_lines(&widget_catalog(), &lines, UnclassifiedPolicy::Exclude)
            .expect_err("unknown product should fail");

        assert!(matches!(error, QuotationError::UnknownProduct(ref inner) if inner.product == "Gadget"));
    }

    #[test]
    fn unrecognized_payment_type_is_excluded_from_buckets_by_default() {
        let lines = vec![
            OrderLine::new("Widget", 1, Decimal::ZERO, "Unico"),
            OrderLine::new("Widget", 1, Decimal::ZERO, "Anual"),
        ];

        let priced = price_lines(&widget_catalog(), &lines, UnclassifiedPolicy::Exclude)
            .expect("exclude policy keeps building");

        assert_eq!(priced.totals.total_list, Decimal::from(200));
        assert_eq!(priced.totals.unclassified_subtotal, Decimal::from(100));
        assert_eq!(priced.totals.total_tax, Decimal::from(7));
        assert_eq!(priced.totals.total_final, Decimal::from(207));
        assert_eq!(priced.unclassified_rows().count(), 1);
    }

    #[test]
    fn unrecognized_payment_type_fails_under_reject_policy() {
        let engine = DeterministicPricingEngine::new(UnclassifiedPolicy::Reject);
        let lines = vec![OrderLine::new("Widget", 1, Decimal::ZERO, "Anual")];

        let error = engine.price(&widget_catalog(), &lines).expect_err("reject policy should fail");

        assert_eq!(
            error,
            QuotationError::UnrecognizedPaymentType {
                product: "Widget".to_string(),
                payment_type: "Anual".to_string(),
            }
        );
    }

    #[test]
    fn invalid_lines_are_rejected() {
        let zero_quantity = price_line(
            &widget_catalog(),
            &OrderLine::new("Widget", 0, Decimal::ZERO, "Unico"),
            UnclassifiedPolicy::Exclude,
        );
        assert!(matches!(zero_quantity, Err(QuotationError::InvalidQuantity { .. })));

        for discount in [Decimal::from(-1), Decimal::new(1001, 1)] {
            let result = price_line(
                &widget_catalog(),
                &OrderLine::new("Widget", 1, discount, "Unico"),
                UnclassifiedPolicy::Exclude,
            );
            assert!(matches!(result, Err(QuotationError::DiscountOutOfRange { .. })));
        }

        assert_eq!(
            price_lines(&widget_catalog(), &[], UnclassifiedPolicy::Exclude),
            Err(QuotationError::EmptyOrder)
        );
    }

    #[test]
    fn oversized_amounts_fail_instead_of_panicking() {
        let huge = catalog(&[("Big", Decimal::MAX)]);

        let line_overflow = price_lines(
            &huge,
            &[OrderLine::new("Big", 1_000_000_000, Decimal::ZERO, "Unico")],
            UnclassifiedPolicy::Exclude,
        );
        assert_eq!(line_overflow, Err(QuotationError::AmountOverflow { product: "Big".to_string() }));

        let sum_overflow = price_lines(
            &huge,
            &[
                OrderLine::new("Big", 1, Decimal::ZERO, "Unico"),
                OrderLine::new("Big", 1, Decimal::ZERO, "Mensual"),
            ],
            UnclassifiedPolicy::Exclude,
        );
        assert_eq!(sum_overflow, Err(QuotationError::AmountOverflow { product: "Big".to_string() }));

        let totals_overflow = price_lines(
            &huge,
            &[OrderLine::new("Big", 1, Decimal::ZERO, "Unico")],
            UnclassifiedPolicy::Exclude,
        );
        assert_eq!(totals_overflow, Err(QuotationError::TotalsOverflow));
    }

    #[test]
    fn full_discount_zeroes_the_line() {
        let row = price_line(
            &widget_catalog(),
            &OrderLine::new("Widget", 3, Decimal::ONE_HUNDRED, "Unico"),
            UnclassifiedPolicy::Exclude,
        )
        .expect("full discount is allowed");

        assert_eq!(row.line_final_amount, Decimal::ZERO);
        assert_eq!(row.line_discount_amount, row.line_subtotal);
    }

    #[test]
    fn accumulators_stay_unrounded_until_output() {
        let catalog = catalog(&[("Cable", Decimal::new(333, 2))]);
        let lines = vec![OrderLine::new("Cable", 3, Decimal::new(333, 1), "Unico")];

        let totals = price_lines(&catalog, &lines, UnclassifiedPolicy::Exclude)
            .expect("pricing should succeed")
            .totals;

        assert_eq!(totals.total_discount, Decimal::new(3_326_670, 6));
        assert_eq!(round_currency(totals.total_discount), Decimal::new(333, 2));
    }

    fn arb_line() -> impl Strategy<Value = OrderLine> {
        (
            prop_oneof![Just("Widget"), Just("Cable"), Just("Terminal")],
            1u32..500,
            0u32..=10_000,
            prop_oneof![Just("Unico"), Just("MENSUAL"), Just("mensual"), Just("other")],
        )
            .prop_map(|(product, quantity, discount_bp, payment_type)| {
                OrderLine::new(product, quantity, Decimal::new(i64::from(discount_bp), 2), payment_type)
            })
    }

    fn arb_catalog() -> Catalog {
        catalog(&[
            ("Widget", Decimal::new(10_000, 2)),
            ("Cable", Decimal::new(333, 2)),
            ("Terminal", Decimal::new(129_999, 2)),
        ])
    }

    proptest! {
        #[test]
        fn zero_discount_keeps_final_equal_to_subtotal(quantity in 1u32..1_000) {
            let row = price_line(
                &arb_catalog(),
                &OrderLine::new("Terminal", quantity, Decimal::ZERO, "Unico"),
                UnclassifiedPolicy::Exclude,
            ).expect("pricing should succeed");
            prop_assert_eq!(row.line_final_amount, row.line_subtotal);
        }

        #[test]
        fn both_discount_orderings_agree(line in arb_line()) {
            let row = price_line(&arb_catalog(), &line, UnclassifiedPolicy::Exclude)
                .expect("pricing should succeed");
            let discount_then_multiply = (row.unit_price
                - row.unit_price * row.discount_percent / Decimal::ONE_HUNDRED)
                * Decimal::from(row.quantity);

            prop_assert_eq!(row.line_subtotal - row.line_discount_amount, row.line_final_amount);
            prop_assert!((discount_then_multiply - row.line_final_amount).abs() < Decimal::new(1, 9));
        }

        #[test]
        fn final_total_reconciles_at_two_decimals(lines in prop::collection::vec(arb_line(), 1..12)) {
            let totals = price_lines(&arb_catalog(), &lines, UnclassifiedPolicy::Exclude)
                .expect("pricing should succeed")
                .totals;

            prop_assert_eq!(
                round_currency(totals.total_final),
                round_currency(totals.total_list - totals.total_discount + totals.total_tax)
            );
            prop_assert_eq!(
                totals.total_list - totals.total_discount,
                totals.one_time_subtotal + totals.recurring_subtotal + totals.unclassified_subtotal
            );
        }
    }
}
