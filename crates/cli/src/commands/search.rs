use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use varisearch_core::config::AppConfig;
use varisearch_core::domain::condition::VariantCondition;
use varisearch_core::errors::ApplicationError;
use varisearch_core::search::sorting::{PriceSorting, SortDirection};
use varisearch_core::search::{
    DeterministicSearchRuntime, SearchInput, SearchPolicy, SearchResult, SearchRuntime,
};

use crate::commands::{load_snapshot, read_json, CommandResult};

const COMMAND: &str = "search";

/// Query file contents: the conditions to apply and an optional price sort.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchQuery {
    #[serde(default)]
    pub conditions: Vec<VariantCondition>,
    #[serde(default)]
    pub sorting: Option<PriceSorting>,
}

#[derive(Clone, Debug)]
pub struct SearchRequest<'a> {
    pub catalog: &'a Path,
    pub query: &'a Path,
    pub sort: Option<SortDirection>,
    pub correlation_id: &'a str,
}

pub fn run(config: &AppConfig, request: SearchRequest<'_>) -> CommandResult {
    match execute(config, &request) {
        Ok(result) => {
            let message = format!("{} result row(s)", result.total);
            CommandResult::success_with_data(COMMAND, message, Some(result))
        }
        Err(error) => CommandResult::application_failure(COMMAND, error, request.correlation_id),
    }
}

fn execute(config: &AppConfig, request: &SearchRequest<'_>) -> Result<SearchResult, ApplicationError> {
    let snapshot = load_snapshot(request.catalog)?;
    let query: SearchQuery = read_json(request.query, "query")?;

    // a direction given on the command line wins over the query file
    let sorting = request.sort.map(|direction| PriceSorting { direction }).or(query.sorting);
    let policy = SearchPolicy::from(&config.search);

    info!(
        event_name = "cli.search.started",
        correlation_id = request.correlation_id,
        catalog = %request.catalog.display(),
        products = snapshot.products().len(),
        conditions = query.conditions.len(),
        "running variant search"
    );

    let result = DeterministicSearchRuntime::default().search(SearchInput {
        snapshot: &snapshot,
        conditions: &query.conditions,
        sorting: sorting.as_ref(),
        policy: &policy,
        correlation_id: request.correlation_id,
    })?;

    Ok(result)
}
