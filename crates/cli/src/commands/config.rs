use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use pricerule_core::config::{AppConfig, LoadOptions};
use pricerule_core::errors::ApplicationError;
use toml::Value;

use crate::commands::CommandResult;

const COMMAND: &str = "config";

pub fn run(options: LoadOptions) -> CommandResult {
    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error(COMMAND, &ApplicationError::from(error)),
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let policies_path = config
        .catalog
        .policies_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unset>".to_string());

    let lines = [
        "effective config (source precedence: override > env > file > default):".to_string(),
        render_line(
            "engine.markup_tolerance_pct",
            &config.engine.markup_tolerance_pct.to_string(),
            source("engine.markup_tolerance_pct", &["PRICERULE_ENGINE_MARKUP_TOLERANCE_PCT"]),
        ),
        render_line(
            "engine.include_trace",
            &config.engine.include_trace.to_string(),
            source("engine.include_trace", &["PRICERULE_ENGINE_INCLUDE_TRACE"]),
        ),
        render_line(
            "catalog.policies_path",
            &policies_path,
            source("catalog.policies_path", &["PRICERULE_CATALOG_POLICIES_PATH"]),
        ),
        render_line(
            "logging.level",
            &config.logging.level,
            source("logging.level", &["PRICERULE_LOGGING_LEVEL", "PRICERULE_LOG_LEVEL"]),
        ),
        render_line(
            "logging.format",
            &format!("{:?}", config.logging.format).to_ascii_lowercase(),
            source("logging.format", &["PRICERULE_LOGGING_FORMAT", "PRICERULE_LOG_FORMAT"]),
        ),
    ];

    CommandResult::success(COMMAND, lines.join("\n"))
}

fn detect_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from("pricerule.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/pricerule.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
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

#[cfg(test)]
mod tests {
    use super::{contains_path, render_line};

    #[test]
    fn nested_key_lookup_follows_dotted_path() {
        let doc: toml::Value =
            "[engine]\ninclude_trace = true\n".parse().expect("toml document parses");

        assert!(contains_path(&doc, "engine.include_trace"));
        assert!(!contains_path(&doc, "engine.markup_tolerance_pct"));
        assert!(!contains_path(&doc, "logging.level"));
    }

    #[test]
    fn rendered_line_names_its_source() {
        assert_eq!(
            render_line("logging.level", "info", "default".to_string()),
            "- logging.level = info (source: default)"
        );
    }
}
