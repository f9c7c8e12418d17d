use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use toml::Value;
use varisearch_core::config::{
    AppConfig, LoadOptions, DEFAULT_CONFIG_FILE, NESTED_CONFIG_FILE,
};

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_OK};

const COMMAND: &str = "config";

pub fn run(options: LoadOptions) -> CommandResult {
    let explicit_path = options.config_path.clone();
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), EXIT_CONFIG);
        }
    };

    let config_file_path = detect_config_path(explicit_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let search = &config.search;
    let lines = [
        "effective config (source precedence: env > file > default):".to_string(),
        render_line(
            "search.use_last_graduation_for_cheapest_price",
            &search.use_last_graduation_for_cheapest_price.to_string(),
            source(
                "search.use_last_graduation_for_cheapest_price",
                &["VARISEARCH_SEARCH_USE_LAST_GRADUATION"],
            ),
        ),
        render_line(
            "search.hide_no_in_stock",
            &search.hide_no_in_stock.to_string(),
            source("search.hide_no_in_stock", &["VARISEARCH_SEARCH_HIDE_NO_IN_STOCK"]),
        ),
        render_line(
            "search.parallel_threshold",
            &search.parallel_threshold.to_string(),
            source("search.parallel_threshold", &["VARISEARCH_SEARCH_PARALLEL_THRESHOLD"]),
        ),
        render_line(
            "search.customer_group",
            &search.customer_group,
            source("search.customer_group", &["VARISEARCH_SEARCH_CUSTOMER_GROUP"]),
        ),
        render_line(
            "search.fallback_customer_group",
            &search.fallback_customer_group,
            source(
                "search.fallback_customer_group",
                &["VARISEARCH_SEARCH_FALLBACK_CUSTOMER_GROUP"],
            ),
        ),
        render_line(
            "logging.level",
            &config.logging.level,
            source("logging.level", &["VARISEARCH_LOGGING_LEVEL", "VARISEARCH_LOG_LEVEL"]),
        ),
        render_line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            source("logging.format", &["VARISEARCH_LOGGING_FORMAT", "VARISEARCH_LOG_FORMAT"]),
        ),
    ];

    CommandResult { exit_code: EXIT_OK, output: lines.join("\n") }
}

fn detect_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
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
