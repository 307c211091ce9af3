pub mod catalog;
pub mod config;
pub mod preview;
pub mod submit;

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Args;
use quoter_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use quoter_core::{Catalog, OrderRequest, Quotation, QuotationBuilder, UnclassifiedPolicy};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;
pub const EXIT_QUOTATION: u8 = 4;
pub const EXIT_SUBMISSION: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_details(command, message, None)
    }

    pub fn success_with_details(
        command: &str,
        message: impl Into<String>,
        details: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            details,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::failure_with_details(command, error_class, message, exit_code, None)
    }

    pub fn failure_with_details(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
        details: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            details,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Inputs shared by every command that builds a quotation.
#[derive(Debug, Clone, Args)]
pub struct QuotationArgs {
    #[arg(long, help = "Order JSON file: customer plus line items")]
    pub order: PathBuf,
    #[arg(long, help = "Price catalog JSON (overrides catalog.path)")]
    pub catalog: Option<PathBuf>,
    #[arg(long, help = "Config file (defaults to quoter.toml or config/quoter.toml)")]
    pub config: Option<PathBuf>,
    #[arg(long, value_name = "YYYY-MM-DD", help = "Issue date for the document (defaults to today)")]
    pub date: Option<NaiveDate>,
    #[arg(
        long,
        value_name = "POLICY",
        help = "Handling of unrecognized payment types: exclude|reject"
    )]
    pub unclassified: Option<UnclassifiedPolicy>,
    #[arg(long, value_name = "LEVEL", help = "Log level override: trace|debug|info|warn|error")]
    pub log_level: Option<String>,
}

impl QuotationArgs {
    pub fn new(order: impl Into<PathBuf>) -> Self {
        Self {
            order: order.into(),
            catalog: None,
            config: None,
            date: None,
            unclassified: None,
            log_level: None,
        }
    }

    fn load_options(&self) -> LoadOptions {
        config_load_options(self.config.clone(), ConfigOverrides {
            catalog_path: self.catalog.clone(),
            log_level: self.log_level.clone(),
            unclassified_policy: self.unclassified,
        })
    }
}

pub(crate) fn config_load_options(config_path: Option<PathBuf>, overrides: ConfigOverrides) -> LoadOptions {
    LoadOptions { require_file: config_path.is_some(), config_path, overrides }
}

pub(crate) fn load_config(command: &str, options: LoadOptions) -> Result<AppConfig, CommandResult> {
    let config = AppConfig::load(options).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })?;
    crate::logging::init(&config.logging);
    Ok(config)
}

pub(crate) fn load_catalog(command: &str, config: &AppConfig) -> Result<Catalog, CommandResult> {
    Catalog::load(&config.catalog.path).map_err(|error| {
        CommandResult::failure(command, "catalog_load", error.to_string(), EXIT_INPUT)
    })
}

/// A built quotation plus what the command needs to report on it.
pub(crate) struct Prepared {
    pub config: AppConfig,
    pub quotation: Quotation,
    pub correlation_id: String,
}

pub(crate) fn prepare_quotation(command: &str, args: &QuotationArgs) -> Result<Prepared, CommandResult> {
    let correlation_id = Uuid::new_v4().to_string();
    let config = load_config(command, args.load_options())?;

    let catalog = load_catalog(command, &config)?;
    let order = OrderRequest::load(&args.order).map_err(|error| {
        CommandResult::failure(command, "order_load", error.to_string(), EXIT_INPUT)
    })?;
    info!(
        event_name = "cli.quotation.inputs_loaded",
        correlation_id = %correlation_id,
        catalog_products = catalog.len(),
        order_lines = order.lines.len(),
        "catalog and order loaded"
    );

    let issued_on = args.date.unwrap_or_else(|| Local::now().date_naive());
    let settings = config.document_settings();
    let builder = QuotationBuilder::with_engine(&catalog, &settings, config.pricing_engine());
    let quotation = builder.quote(&order.customer, &order.lines, issued_on).map_err(|error| {
        CommandResult::failure(command, "quotation_build", error.to_string(), EXIT_QUOTATION)
    })?;

    for row in quotation.priced.unclassified_rows() {
        warn!(
            event_name = "cli.quotation.unclassified_line",
            correlation_id = %correlation_id,
            product = %row.product,
            payment_type = %row.payment_type,
            "payment type not recognized; line excluded from one-time and recurring totals"
        );
    }
    info!(
        event_name = "cli.quotation.built",
        correlation_id = %correlation_id,
        document_name = %quotation.payload.name,
        rows = quotation.priced.rows.len(),
        "quotation built"
    );

    Ok(Prepared { config, quotation, correlation_id })
}
