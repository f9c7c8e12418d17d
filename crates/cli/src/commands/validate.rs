use std::path::Path;

use serde::Serialize;
use tracing::info;
use varisearch_core::config::AppConfig;
use varisearch_core::errors::ApplicationError;
use varisearch_core::search::pricing::GraduatedPriceResolver;
use varisearch_core::search::SearchPolicy;

use crate::commands::{load_snapshot, CommandResult};

const COMMAND: &str = "validate";

#[derive(Debug, Serialize)]
struct CatalogSummary {
    groups: usize,
    options: usize,
    products: usize,
    variants: usize,
    out_of_stock_variants: usize,
    customer_group: String,
}

/// Loads a catalog snapshot, which runs every structural check, then resolves
/// each variant's price tiers for the configured customer group, and reports
/// the catalog's size.
pub fn run(config: &AppConfig, catalog: &Path) -> CommandResult {
    let correlation_id = "cli-validate";
    match summarize(config, catalog) {
        Ok(summary) => {
            info!(
                event_name = "cli.validate.completed",
                correlation_id,
                products = summary.products,
                variants = summary.variants,
                "catalog snapshot validated"
            );
            CommandResult::success_with_data(
                COMMAND,
                format!("catalog `{}` is valid", catalog.display()),
                Some(summary),
            )
        }
        Err(error) => CommandResult::application_failure(COMMAND, error, correlation_id),
    }
}

fn summarize(config: &AppConfig, catalog: &Path) -> Result<CatalogSummary, ApplicationError> {
    let snapshot = load_snapshot(catalog)?;
    let pricing = SearchPolicy::from(&config.search).pricing();
    let variants = snapshot.check_price_tiers(&GraduatedPriceResolver, &pricing)?;

    let groups = snapshot.configurator().groups();
    Ok(CatalogSummary {
        groups: groups.len(),
        options: groups.iter().map(|group| group.options.len()).sum(),
        products: snapshot.products().len(),
        variants,
        out_of_stock_variants: variants - snapshot.without_out_of_stock().variant_count(),
        customer_group: pricing.customer_group.0,
    })
}
