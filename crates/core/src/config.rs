use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpq::pricing::{DeterministicPricingEngine, UnclassifiedPolicy};
use crate::document::{DocumentSettings, SenderIdentity};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub documents: DocumentsConfig,
    pub sender: SenderIdentity,
    pub catalog: CatalogConfig,
    pub quotation: QuotationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DocumentsConfig {
    pub api_key: Option<SecretString>,
    pub template_id: String,
    pub pricing_table_name: String,
    pub section_title: String,
    pub base_url: String,
    pub app_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct QuotationConfig {
    pub unclassified_policy: UnclassifiedPolicy,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub unclassified_policy: Option<UnclassifiedPolicy>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            documents: DocumentsConfig {
                api_key: None,
                template_id: String::new(),
                pricing_table_name: "quotation_table".to_string(),
                section_title: "Quotation".to_string(),
                base_url: "https://api.pandadoc.com/public/v1".to_string(),
                app_url: "https://app.pandadoc.com/a/#/documents".to_string(),
                timeout_secs: 30,
            },
            sender: SenderIdentity::default(),
            catalog: CatalogConfig { path: PathBuf::from("prices.json") },
            quotation: QuotationConfig { unclassified_policy: UnclassifiedPolicy::Exclude },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("quoter.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn document_settings(&self) -> DocumentSettings {
        DocumentSettings {
            template_id: self.documents.template_id.clone(),
            pricing_table_name: self.documents.pricing_table_name.clone(),
            section_title: self.documents.section_title.clone(),
            sender: self.sender.clone(),
        }
    }

    pub fn pricing_engine(&self) -> DeterministicPricingEngine {
        DeterministicPricingEngine::new(self.quotation.unclassified_policy)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(documents) = patch.documents {
            if let Some(api_key_value) = documents.api_key {
                self.documents.api_key = Some(secret_value(api_key_value));
            }
            if let Some(template_id) = documents.template_id {
                self.documents.template_id = template_id;
            }
            if let Some(pricing_table_name) = documents.pricing_table_name {
                self.documents.pricing_table_name = pricing_table_name;
            }
            if let Some(section_title) = documents.section_title {
                self.documents.section_title = section_title;
            }
            if let Some(base_url) = documents.base_url {
                self.documents.base_url = base_url;
            }
            if let Some(app_url) = documents.app_url {
                self.documents.app_url = app_url;
            }
            if let Some(timeout_secs) = documents.timeout_secs {
                self.documents.timeout_secs = timeout_secs;
            }
        }

        if let Some(sender) = patch.sender {
            if let Some(first_name) = sender.first_name {
                self.sender.first_name = first_name;
            }
            if let Some(last_name) = sender.last_name {
                self.sender.last_name = last_name;
            }
            if let Some(company) = sender.company {
                self.sender.company = company;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = path;
            }
        }

        if let Some(quotation) = patch.quotation {
            if let Some(unclassified_policy) = quotation.unclassified_policy {
                self.quotation.unclassified_policy = unclassified_policy;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("QUOTER_DOCUMENTS_API_KEY") {
            self.documents.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("QUOTER_DOCUMENTS_TEMPLATE_ID") {
            self.documents.template_id = value;
        }
        if let Some(value) = read_env("QUOTER_DOCUMENTS_PRICING_TABLE_NAME") {
            self.documents.pricing_table_name = value;
        }
        if let Some(value) = read_env("QUOTER_DOCUMENTS_SECTION_TITLE") {
            self.documents.section_title = value;
        }
        if let Some(value) = read_env("QUOTER_DOCUMENTS_BASE_URL") {
            self.documents.base_url = value;
        }
        if let Some(value) = read_env("QUOTER_DOCUMENTS_APP_URL") {
            self.documents.app_url = value;
        }
        if let Some(value) = read_env("QUOTER_DOCUMENTS_TIMEOUT_SECS") {
            self.documents.timeout_secs = parse_u64("QUOTER_DOCUMENTS_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("QUOTER_SENDER_FIRST_NAME") {
            self.sender.first_name = value;
        }
        if let Some(value) = read_env("QUOTER_SENDER_LAST_NAME") {
            self.sender.last_name = value;
        }
        if let Some(value) = read_env("QUOTER_SENDER_COMPANY") {
            self.sender.company = value;
        }

        if let Some(value) = read_env("QUOTER_CATALOG_PATH") {
            self.catalog.path = PathBuf::from(value);
        }

        if let Some(value) = read_env("QUOTER_QUOTATION_UNCLASSIFIED_POLICY") {
            self.quotation.unclassified_policy = value.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "QUOTER_QUOTATION_UNCLASSIFIED_POLICY".to_string(),
                    value: value.clone(),
                }
            })?;
        }

        let log_level = read_env("QUOTER_LOGGING_LEVEL").or_else(|| read_env("QUOTER_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("QUOTER_LOGGING_FORMAT").or_else(|| read_env("QUOTER_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = catalog_path;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(unclassified_policy) = overrides.unclassified_policy {
            self.quotation.unclassified_policy = unclassified_policy;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_documents(&self.documents)?;
        validate_logging(&self.logging)?;
        Ok(())
    }

    /// Checks that hold only when a document is actually going to be created.
    pub fn validate_for_submission(&self) -> Result<(), ConfigError> {
        let missing_key = self
            .documents
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing_key {
            return Err(ConfigError::Validation(
                "documents.api_key is required to submit a quotation (set QUOTER_DOCUMENTS_API_KEY)"
                    .to_string(),
            ));
        }

        if self.documents.template_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "documents.template_id is required to submit a quotation".to_string(),
            ));
        }

        if self.sender.company.trim().is_empty() {
            return Err(ConfigError::Validation(
                "sender.company is required to submit a quotation".to_string(),
            ));
        }

        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("quoter.toml"), PathBuf::from("config/quoter.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_documents(documents: &DocumentsConfig) -> Result<(), ConfigError> {
    if documents.timeout_secs == 0 || documents.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "documents.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if documents.pricing_table_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "documents.pricing_table_name must not be empty".to_string(),
        ));
    }

    for (key, url) in [("documents.base_url", &documents.base_url), ("documents.app_url", &documents.app_url)] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "{key} must start with http:// or https://"
            )));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    documents: Option<DocumentsPatch>,
    sender: Option<SenderPatch>,
    catalog: Option<CatalogPatch>,
    quotation: Option<QuotationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentsPatch {
    api_key: Option<String>,
    template_id: Option<String>,
    pricing_table_name: Option<String>,
    section_title: Option<String>,
    base_url: Option<String>,
    app_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SenderPatch {
    first_name: Option<String>,
    last_name: Option<String>,
    company: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct QuotationPatch {
    unclassified_policy: Option<UnclassifiedPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
