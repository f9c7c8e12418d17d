use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use clap::Parser;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tempfile::TempDir;
use varisearch_cli::commands::search::SearchRequest;
use varisearch_cli::commands::{config, search, validate};
use varisearch_cli::{execute, Cli};
use varisearch_core::config::AppConfig;
use varisearch_core::search::builder::{CatalogBuilder, ProductSpec};
use varisearch_core::search::catalog::CatalogSnapshot;
use varisearch_core::search::sorting::SortDirection;

fn catalog() -> CatalogSnapshot {
    let mut builder = CatalogBuilder::default();
    builder.group("color", &["red", "green"]);
    builder.group("size", &["xl", "l"]);
    builder
        .product(
            ProductSpec::new("A")
                .options("color", &["red", "green"])
                .options("size", &["xl", "l"])
                .graduation([60, 50])
                .graduation([60, 20])
                .graduation([70, 30])
                .graduation([80, 40]),
        )
        .expect("product A");
    builder
        .product(
            ProductSpec::new("B")
                .options("color", &["green"])
                .options("size", &["xl"])
                .graduation([Decimal::new(6050, 2), Decimal::new(5525, 2)]),
        )
        .expect("product B");
    builder
        .product(ProductSpec::new("C").options("color", &["red", "green"]).stock([0, 0]))
        .expect("product C");
    builder.build().expect("valid catalog")
}

fn write_catalog(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("catalog.json");
    let encoded = serde_json::to_string_pretty(&catalog()).expect("encode catalog");
    fs::write(&path, encoded).expect("write catalog");
    path
}

fn write_json(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, value.to_string()).expect("write json");
    path
}

fn size_query(snapshot: &CatalogSnapshot, expand: bool) -> Value {
    let configurator = snapshot.configurator();
    let size = configurator.group_named("size").expect("size group");
    let options = size.options.iter().map(|option| option.id.0).collect::<Vec<_>>();
    json!({
        "conditions": [{ "group_id": size.id.0, "option_ids": options, "expand": expand }],
        "sorting": { "direction": "ascending" }
    })
}

fn last_graduation_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.search.use_last_graduation_for_cheapest_price = true;
    config
}

fn run_search(config: &AppConfig, catalog: &Path, query: &Path, sort: Option<SortDirection>) -> Value {
    let result = search::run(
        config,
        SearchRequest { catalog, query, sort, correlation_id: "req-test" },
    );
    let payload = parse_payload(&result.output);
    if payload["status"] == "ok" {
        assert_eq!(result.exit_code, 0, "successful search should exit 0");
    }
    payload
}

fn row_numbers(payload: &Value) -> Vec<String> {
    payload["data"]["rows"]
        .as_array()
        .expect("rows array")
        .iter()
        .map(|row| row["number"].as_str().expect("row number").to_string())
        .collect()
}

#[test]
fn search_expands_and_sorts_rows() {
    let dir = TempDir::new().expect("temp dir");
    let catalog_path = write_catalog(&dir);
    let query_path = write_json(&dir, "query.json", &size_query(&catalog(), true));

    let payload = run_search(&last_graduation_config(), &catalog_path, &query_path, None);

    assert_eq!(payload["command"], "search");
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["data"]["total"], 3);
    assert_eq!(row_numbers(&payload), vec!["A2", "A1", "B1"]);
    assert_eq!(payload["data"]["rows"][2]["price"], "55.25");
}

#[test]
fn command_line_sort_overrides_query_sorting() {
    let dir = TempDir::new().expect("temp dir");
    let catalog_path = write_catalog(&dir);
    let query_path = write_json(&dir, "query.json", &size_query(&catalog(), true));

    let payload = run_search(
        &last_graduation_config(),
        &catalog_path,
        &query_path,
        Some(SortDirection::Descending),
    );

    assert_eq!(row_numbers(&payload), vec!["B1", "A1", "A2"]);
}

#[test]
fn empty_query_lists_every_product_in_snapshot_order() {
    let dir = TempDir::new().expect("temp dir");
    let catalog_path = write_catalog(&dir);
    let query_path = write_json(&dir, "query.json", &json!({}));

    let payload = run_search(&AppConfig::default(), &catalog_path, &query_path, None);

    assert_eq!(row_numbers(&payload), vec!["A1", "B1", "C1"]);
    assert_eq!(payload["data"]["rows"][0]["price"], "60");
}

#[test]
fn malformed_condition_is_reported_as_bad_request() {
    let dir = TempDir::new().expect("temp dir");
    let catalog_path = write_catalog(&dir);
    let query_path = write_json(
        &dir,
        "query.json",
        &json!({ "conditions": [{ "group_id": 2, "option_ids": [] }] }),
    );

    let result = search::run(
        &AppConfig::default(),
        SearchRequest { catalog: &catalog_path, query: &query_path, sort: None, correlation_id: "req-42" },
    );

    assert_eq!(result.exit_code, 4, "search failures exit with 4");
    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "bad_request");
    assert_eq!(payload["correlation_id"], "req-42");
}

#[test]
fn structurally_invalid_catalog_is_rejected_on_load() {
    let dir = TempDir::new().expect("temp dir");
    let catalog_path = write_json(
        &dir,
        "catalog.json",
        &json!({
            "configurator": [],
            "products": [{ "id": "A", "variants": [] }]
        }),
    );

    let result = validate::run(&AppConfig::default(), &catalog_path);

    assert_eq!(result.exit_code, 3, "catalog failures exit with 3");
    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "validate");
    assert_eq!(payload["error_class"], "unprocessable_catalog");
    assert!(payload["message"].as_str().expect("message").contains("product A has no variants"));
}

#[test]
fn missing_query_file_is_an_input_failure() {
    let dir = TempDir::new().expect("temp dir");
    let catalog_path = write_catalog(&dir);
    let query_path = dir.path().join("missing.json");

    let result = search::run(
        &AppConfig::default(),
        SearchRequest { catalog: &catalog_path, query: &query_path, sort: None, correlation_id: "req-test" },
    );

    assert_eq!(result.exit_code, 3);
    let payload = parse_payload(&result.output);
    assert!(payload["message"].as_str().expect("message").contains("could not read query"));
}

#[test]
fn validate_reports_catalog_size() {
    let dir = TempDir::new().expect("temp dir");
    let catalog_path = write_catalog(&dir);

    let result = validate::run(&AppConfig::default(), &catalog_path);

    assert_eq!(result.exit_code, 0);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["data"]["groups"], 2);
    assert_eq!(payload["data"]["options"], 4);
    assert_eq!(payload["data"]["products"], 3);
    assert_eq!(payload["data"]["variants"], 7);
    assert_eq!(payload["data"]["out_of_stock_variants"], 2);
    assert_eq!(payload["data"]["customer_group"], "EK");
}

#[test]
fn malformed_catalog_json_is_a_bad_request() {
    let dir = TempDir::new().expect("temp dir");
    let catalog_path = dir.path().join("catalog.json");
    fs::write(&catalog_path, "{\"configurator\": [").expect("write catalog");

    let result = validate::run(&AppConfig::default(), &catalog_path);

    assert_eq!(result.exit_code, 3);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["error_class"], "bad_request");
    assert!(payload["message"].as_str().expect("message").contains("could not parse catalog"));
}

#[test]
fn validate_rejects_broken_price_tiers() {
    let encoded = serde_json::to_value(catalog()).expect("encode catalog");

    let mut empty = encoded.clone();
    empty["products"][0]["variants"][0]["prices"] = json!([]);

    let mut gapped = encoded;
    let second = &mut gapped["products"][1]["variants"][0]["prices"][1];
    let from = second["from"].as_u64().expect("tier start");
    second["from"] = json!(from + 1);

    for (document, variant) in [(empty, "A1"), (gapped, "B1")] {
        let dir = TempDir::new().expect("temp dir");
        let catalog_path = write_json(&dir, "catalog.json", &document);

        let result = validate::run(&AppConfig::default(), &catalog_path);

        assert_eq!(result.exit_code, 3, "broken tiers for {variant}");
        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "unprocessable_catalog");
        let message = payload["message"].as_str().expect("message");
        assert!(message.contains(&format!("variant {variant}")), "{message}");
    }
}

#[test]
fn config_reports_sources() {
    with_env(&[("VARISEARCH_SEARCH_CUSTOMER_GROUP", "H")], || {
        let result = config::run(Default::default());
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("- search.customer_group = H (source: env (VARISEARCH_SEARCH_CUSTOMER_GROUP))"));
        assert!(result.output.contains("- search.hide_no_in_stock = false (source: default)"));
    });
}

#[test]
fn config_file_values_are_attributed_to_the_file() {
    with_env(&[], || {
        let dir = TempDir::new().expect("temp dir");
        let config_path = write_toml(&dir, "[search]\nparallel_threshold = 16\n");

        let cli = Cli::try_parse_from(["varisearch", "--config", path_str(&config_path), "config"])
            .expect("valid arguments");
        let result = execute(cli);

        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("- search.parallel_threshold = 16 (source: file ("));
    });
}

#[test]
fn cli_flags_override_environment() {
    with_env(&[("VARISEARCH_SEARCH_HIDE_NO_IN_STOCK", "false")], || {
        let dir = TempDir::new().expect("temp dir");
        let catalog_path = write_catalog(&dir);
        let query_path = write_json(&dir, "query.json", &json!({}));

        let cli = Cli::try_parse_from([
            "varisearch",
            "search",
            "--catalog",
            path_str(&catalog_path),
            "--query",
            path_str(&query_path),
            "--hide-no-in-stock",
        ])
        .expect("valid arguments");
        let result = execute(cli);

        assert_eq!(result.exit_code, 0);
        let payload = parse_payload(last_line(&result.output));
        assert_eq!(row_numbers(&payload), vec!["A1", "B1"]);
    });
}

#[test]
fn invalid_environment_fails_with_config_exit_code() {
    with_env(&[("VARISEARCH_SEARCH_PARALLEL_THRESHOLD", "0")], || {
        let dir = TempDir::new().expect("temp dir");
        let catalog_path = write_catalog(&dir);

        let cli = Cli::try_parse_from(["varisearch", "validate", "--catalog", path_str(&catalog_path)])
            .expect("valid arguments");
        let result = execute(cli);

        assert_eq!(result.exit_code, 2, "expected config validation failure code");
        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "validate");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

fn write_toml(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("varisearch.toml");
    fs::write(&path, contents).expect("write config");
    path
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn last_line(output: &str) -> &str {
    output.lines().last().unwrap_or_default()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "VARISEARCH_SEARCH_USE_LAST_GRADUATION",
        "VARISEARCH_SEARCH_HIDE_NO_IN_STOCK",
        "VARISEARCH_SEARCH_PARALLEL_THRESHOLD",
        "VARISEARCH_SEARCH_CUSTOMER_GROUP",
        "VARISEARCH_SEARCH_FALLBACK_CUSTOMER_GROUP",
        "VARISEARCH_LOGGING_LEVEL",
        "VARISEARCH_LOGGING_FORMAT",
        "VARISEARCH_LOG_LEVEL",
        "VARISEARCH_LOG_FORMAT",
    ];

    let previous = keys.iter().map(|key| (*key, env::var(key).ok())).collect::<Vec<_>>();
    for key in keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test_fn));

    for (key, value) in previous {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }

    if let Err(panic) = outcome {
        std::panic::resume_unwind(panic);
    }
}
