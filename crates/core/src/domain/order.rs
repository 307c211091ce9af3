use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::Customer;
use crate::errors::OrderError;

/// Which aggregate bucket a line contributes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    OneTime,
    Recurring,
}

impl PaymentType {
    /// Classifies a free-form payment label. Matching ignores case and surrounding
    /// whitespace; unrecognized labels yield `None`.
    pub fn classify(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "unico" | "único" | "one_time" | "one-time" | "onetime" => Some(Self::OneTime),
            "mensual" | "recurring" | "monthly" => Some(Self::Recurring),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneTime => "one_time",
            Self::Recurring => "recurring",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product: String,
    pub quantity: u32,
    #[serde(default)]
    pub discount_percent: Decimal,
    /// Raw label as supplied by the caller; forwarded untouched as row metadata.
    pub payment_type: String,
}

impl OrderLine {
    pub fn new(
        product: impl Into<String>,
        quantity: u32,
        discount_percent: Decimal,
        payment_type: impl Into<String>,
    ) -> Self {
        Self {
            product: product.into(),
            quantity,
            discount_percent,
            payment_type: payment_type.into(),
        }
    }

    pub fn payment_class(&self) -> Option<PaymentType> {
        PaymentType::classify(&self.payment_type)
    }
}

/// A customer plus the lines they asked to be quoted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer: Customer,
    pub lines: Vec<OrderLine>,
}

impl OrderRequest {
    pub fn load(path: &Path) -> Result<Self, OrderError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| OrderError::ReadFile { path: path.to_path_buf(), source })?;

        serde_json::from_str(&raw)
            .map_err(|source| OrderError::Parse { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{OrderRequest, PaymentType};
    use crate::errors::OrderError;

    #[test]
    fn classification_ignores_case_and_whitespace() {
        for label in ["Unico", "UNICO", "unico", "  unico ", "Único"] {
            assert_eq!(PaymentType::classify(label), Some(PaymentType::OneTime), "{label}");
        }
        for label in ["Mensual", "MENSUAL", "recurring", "Monthly"] {
            assert_eq!(PaymentType::classify(label), Some(PaymentType::Recurring), "{label}");
        }
    }

    #[test]
    fn unknown_labels_are_not_classified() {
        assert_eq!(PaymentType::classify("anual"), None);
        assert_eq!(PaymentType::classify(""), None);
        assert_eq!(PaymentType::classify("unicoo"), None);
    }

    #[test]
    fn order_file_defaults_missing_discount_to_zero() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("order.json");
        fs::write(
            &path,
            r#"{
                "customer": { "name": "HNL", "email": "contact@hnl.example" },
                "lines": [
                    { "product": "Widget", "quantity": 2, "discount_percent": 7.5, "payment_type": "Unico" },
                    { "product": "Gadget", "quantity": 1, "payment_type": "Mensual" }
                ]
            }"#,
        )
        .expect("write order");

        let order = OrderRequest::load(&path).expect("order should parse");

        assert_eq!(order.customer.name, "HNL");
        assert_eq!(order.customer.city, None);
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].discount_percent, Decimal::new(75, 1));
        assert_eq!(order.lines[1].discount_percent, Decimal::ZERO);
        assert_eq!(order.lines[1].payment_class(), Some(PaymentType::Recurring));
    }

    #[test]
    fn negative_quantity_is_a_parse_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("order.json");
        fs::write(
            &path,
            r#"{ "customer": { "name": "A", "email": "a@example.com" },
                 "lines": [ { "product": "Widget", "quantity": -1, "payment_type": "Unico" } ] }"#,
        )
        .expect("write order");

        let error = OrderRequest::load(&path).expect_err("negative quantity should fail");
        assert!(matches!(error, OrderError::Parse { .. }));
    }

    #[test]
    fn missing_order_file_reports_path() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("missing.json");

        let error = OrderRequest::load(&path).expect_err("missing file should fail");
        assert!(error.to_string().contains("missing.json"));
    }
}
