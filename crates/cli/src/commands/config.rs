use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use quoter_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let api_key = config
        .documents
        .api_key
        .as_ref()
        .map(|key| redact_secret(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    let entries: Vec<(&str, String, &str)> = vec![
        ("documents.api_key", api_key, "QUOTER_DOCUMENTS_API_KEY"),
        ("documents.template_id", or_unset(&config.documents.template_id), "QUOTER_DOCUMENTS_TEMPLATE_ID"),
        (
            "documents.pricing_table_name",
            config.documents.pricing_table_name.clone(),
            "QUOTER_DOCUMENTS_PRICING_TABLE_NAME",
        ),
        ("documents.section_title", config.documents.section_title.clone(), "QUOTER_DOCUMENTS_SECTION_TITLE"),
        ("documents.base_url", config.documents.base_url.clone(), "QUOTER_DOCUMENTS_BASE_URL"),
        ("documents.app_url", config.documents.app_url.clone(), "QUOTER_DOCUMENTS_APP_URL"),
        (
            "documents.timeout_secs",
            config.documents.timeout_secs.to_string(),
            "QUOTER_DOCUMENTS_TIMEOUT_SECS",
        ),
        ("sender.first_name", or_unset(&config.sender.first_name), "QUOTER_SENDER_FIRST_NAME"),
        ("sender.last_name", or_unset(&config.sender.last_name), "QUOTER_SENDER_LAST_NAME"),
        ("sender.company", or_unset(&config.sender.company), "QUOTER_SENDER_COMPANY"),
        ("catalog.path", config.catalog.path.display().to_string(), "QUOTER_CATALOG_PATH"),
        (
            "quotation.unclassified_policy",
            format!("{:?}", config.quotation.unclassified_policy),
            "QUOTER_QUOTATION_UNCLASSIFIED_POLICY",
        ),
        ("logging.level", config.logging.level.clone(), "QUOTER_LOGGING_LEVEL"),
        ("logging.format", format!("{:?}", config.logging.format), "QUOTER_LOGGING_FORMAT"),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_key) in entries {
        let source =
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("quoter.toml"), PathBuf::from("config/quoter.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let set_key = std::iter::once(env_key)
        .chain(env_alias(env_key))
        .find(|key| env::var_os(key).is_some());
    if let Some(set_key) = set_key {
        return format!("env ({set_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

/// Short spellings the loader also accepts for a canonical env key.
fn env_alias(env_key: &str) -> Option<&'static str> {
    match env_key {
        "QUOTER_LOGGING_LEVEL" => Some("QUOTER_LOG_LEVEL"),
        "QUOTER_LOGGING_FORMAT" => Some("QUOTER_LOG_FORMAT"),
        _ => None,
    }
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn or_unset(value: &str) -> String {
    if value.trim().is_empty() {
        "<unset>".to_string()
    } else {
        value.to_string()
    }
}

fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let visible: String = trimmed.chars().take(4).collect();
    if trimmed.chars().count() > 8 {
        return format!("{visible}***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, field_source, or_unset, redact_secret};

    #[test]
    fn secrets_keep_only_a_short_prefix() {
        assert_eq!(redact_secret("b312bd6063d6a1b3"), "b312***");
        assert_eq!(redact_secret("short"), "<redacted>");
        assert_eq!(redact_secret("   "), "<empty>");
    }

    #[test]
    fn nested_keys_are_found_in_config_documents() {
        let doc: Value = "[documents]\ntemplate_id = \"tpl\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "documents.template_id"));
        assert!(!contains_path(&doc, "documents.api_key"));
        assert!(!contains_path(&doc, "sender.company"));
    }

    #[test]
    fn env_alias_is_reported_as_source() {
        let keys = ["QUOTER_LOGGING_FORMAT", "QUOTER_LOG_FORMAT"];
        let previous: Vec<_> = keys.iter().map(|key| (*key, std::env::var(key).ok())).collect();
        std::env::remove_var("QUOTER_LOGGING_FORMAT");
        std::env::set_var("QUOTER_LOG_FORMAT", "json");

        let source = field_source("logging.format", "QUOTER_LOGGING_FORMAT", None, None);

        for (key, value) in previous {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
        assert_eq!(source, "env (QUOTER_LOG_FORMAT)");
    }

    #[test]
    fn empty_values_render_as_unset() {
        assert_eq!(or_unset(""), "<unset>");
        assert_eq!(or_unset("Acme"), "Acme");
    }
}
