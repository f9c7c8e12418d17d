use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::price::DEFAULT_CUSTOMER_GROUP;
use crate::search::DEFAULT_PARALLEL_THRESHOLD;

pub const DEFAULT_CONFIG_FILE: &str = "varisearch.toml";
pub const NESTED_CONFIG_FILE: &str = "config/varisearch.toml";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    pub use_last_graduation_for_cheapest_price: bool,
    pub hide_no_in_stock: bool,
    pub parallel_threshold: usize,
    pub customer_group: String,
    pub fallback_customer_group: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
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
    pub use_last_graduation_for_cheapest_price: Option<bool>,
    pub hide_no_in_stock: Option<bool>,
    pub parallel_threshold: Option<usize>,
    pub customer_group: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
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
            search: SearchConfig {
                use_last_graduation_for_cheapest_price: false,
                hide_no_in_stock: false,
                parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
                customer_group: DEFAULT_CUSTOMER_GROUP.to_string(),
                fallback_customer_group: DEFAULT_CUSTOMER_GROUP.to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
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
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(search) = patch.search {
            if let Some(use_last) = search.use_last_graduation_for_cheapest_price {
                self.search.use_last_graduation_for_cheapest_price = use_last;
            }
            if let Some(hide_no_in_stock) = search.hide_no_in_stock {
                self.search.hide_no_in_stock = hide_no_in_stock;
            }
            if let Some(parallel_threshold) = search.parallel_threshold {
                self.search.parallel_threshold = parallel_threshold;
            }
            if let Some(customer_group) = search.customer_group {
                self.search.customer_group = customer_group;
            }
            if let Some(fallback_customer_group) = search.fallback_customer_group {
                self.search.fallback_customer_group = fallback_customer_group;
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
        if let Some(value) = read_env("VARISEARCH_SEARCH_USE_LAST_GRADUATION") {
            self.search.use_last_graduation_for_cheapest_price =
                parse_bool("VARISEARCH_SEARCH_USE_LAST_GRADUATION", &value)?;
        }
        if let Some(value) = read_env("VARISEARCH_SEARCH_HIDE_NO_IN_STOCK") {
            self.search.hide_no_in_stock = parse_bool("VARISEARCH_SEARCH_HIDE_NO_IN_STOCK", &value)?;
        }
        if let Some(value) = read_env("VARISEARCH_SEARCH_PARALLEL_THRESHOLD") {
            self.search.parallel_threshold =
                parse_usize("VARISEARCH_SEARCH_PARALLEL_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("VARISEARCH_SEARCH_CUSTOMER_GROUP") {
            self.search.customer_group = value;
        }
        if let Some(value) = read_env("VARISEARCH_SEARCH_FALLBACK_CUSTOMER_GROUP") {
            self.search.fallback_customer_group = value;
        }

        let log_level =
            read_env("VARISEARCH_LOGGING_LEVEL").or_else(|| read_env("VARISEARCH_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("VARISEARCH_LOGGING_FORMAT").or_else(|| read_env("VARISEARCH_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(use_last) = overrides.use_last_graduation_for_cheapest_price {
            self.search.use_last_graduation_for_cheapest_price = use_last;
        }
        if let Some(hide_no_in_stock) = overrides.hide_no_in_stock {
            self.search.hide_no_in_stock = hide_no_in_stock;
        }
        if let Some(parallel_threshold) = overrides.parallel_threshold {
            self.search.parallel_threshold = parallel_threshold;
        }
        if let Some(customer_group) = overrides.customer_group {
            self.search.customer_group = customer_group;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_search(&self.search)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
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

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    if search.parallel_threshold == 0 {
        return Err(ConfigError::Validation(
            "search.parallel_threshold must be greater than zero".to_string(),
        ));
    }

    if search.customer_group.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search.customer_group must not be empty (the storefront default is `EK`)".to_string(),
        ));
    }

    if search.fallback_customer_group.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search.fallback_customer_group must not be empty".to_string(),
        ));
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

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    search: Option<SearchPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    use_last_graduation_for_cheapest_price: Option<bool>,
    hide_no_in_stock: Option<bool>,
    parallel_threshold: Option<usize>,
    customer_group: Option<String>,
    fallback_customer_group: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
