pub mod assembler;
pub mod builder;
pub mod catalog;
pub mod conditions;
pub mod pricing;
pub mod sorting;

use std::borrow::Cow;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::domain::condition::VariantCondition;
use crate::domain::price::CustomerGroupKey;
use crate::domain::product::Product;
use crate::domain::result::ResultRow;
use crate::errors::SearchError;

use self::{
    assembler::assemble_partition,
    catalog::CatalogSnapshot,
    conditions::{validate_conditions, ConditionEngine, DeterministicConditionEngine, ProductMatch},
    pricing::{GraduatedPriceResolver, PriceResolver, PricingPolicy},
    sorting::{PriceSorting, ResultSorter, StablePriceSorter},
};

/// Snapshot size from which products are evaluated on the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPolicy {
    pub use_last_graduation_for_cheapest_price: bool,
    pub hide_no_in_stock: bool,
    pub parallel_threshold: usize,
    pub customer_group: CustomerGroupKey,
    pub fallback_customer_group: CustomerGroupKey,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            use_last_graduation_for_cheapest_price: false,
            hide_no_in_stock: false,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            customer_group: CustomerGroupKey::default(),
            fallback_customer_group: CustomerGroupKey::default(),
        }
    }
}

impl SearchPolicy {
    pub fn pricing(&self) -> PricingPolicy {
        PricingPolicy {
            use_last_graduation_for_cheapest_price: self.use_last_graduation_for_cheapest_price,
            customer_group: self.customer_group.clone(),
            fallback_customer_group: self.fallback_customer_group.clone(),
        }
    }
}

impl From<&SearchConfig> for SearchPolicy {
    fn from(config: &SearchConfig) -> Self {
        Self {
            use_last_graduation_for_cheapest_price: config.use_last_graduation_for_cheapest_price,
            hide_no_in_stock: config.hide_no_in_stock,
            parallel_threshold: config.parallel_threshold,
            customer_group: CustomerGroupKey(config.customer_group.clone()),
            fallback_customer_group: CustomerGroupKey(config.fallback_customer_group.clone()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SearchInput<'a> {
    pub snapshot: &'a CatalogSnapshot,
    pub conditions: &'a [VariantCondition],
    pub sorting: Option<&'a PriceSorting>,
    pub policy: &'a SearchPolicy,
    pub correlation_id: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub rows: Vec<ResultRow>,
    pub total: usize,
}

pub trait SearchRuntime: Send + Sync {
    fn search(&self, input: SearchInput<'_>) -> Result<SearchResult, SearchError>;
}

pub struct DeterministicSearchRuntime<C, P, S> {
    condition_engine: C,
    price_resolver: P,
    sorter: S,
}

impl<C, P, S> DeterministicSearchRuntime<C, P, S> {
    pub fn new(condition_engine: C, price_resolver: P, sorter: S) -> Self {
        Self { condition_engine, price_resolver, sorter }
    }
}

impl Default
    for DeterministicSearchRuntime<DeterministicConditionEngine, GraduatedPriceResolver, StablePriceSorter>
{
    fn default() -> Self {
        Self::new(DeterministicConditionEngine, GraduatedPriceResolver, StablePriceSorter)
    }
}

impl<C, P, S> DeterministicSearchRuntime<C, P, S>
where
    C: ConditionEngine,
    P: PriceResolver,
{
    fn evaluate_product(
        &self,
        product: &Product,
        conditions: &[VariantCondition],
        pricing: &PricingPolicy,
        correlation_id: &str,
    ) -> Result<Vec<ResultRow>, SearchError> {
        match self.condition_engine.partition(product, conditions) {
            ProductMatch::Excluded(reason) => {
                debug!(
                    event_name = "search.product.excluded",
                    correlation_id,
                    product_id = %product.id,
                    reason = ?reason,
                    "product excluded by variant conditions"
                );
                Ok(Vec::new())
            }
            ProductMatch::Matched(partitions) => partitions
                .iter()
                .map(|partition| {
                    assemble_partition(product, partition, &self.price_resolver, pricing)
                })
                .collect(),
        }
    }
}

impl<C, P, S> SearchRuntime for DeterministicSearchRuntime<C, P, S>
where
    C: ConditionEngine,
    P: PriceResolver,
    S: ResultSorter,
{
    fn search(&self, input: SearchInput<'_>) -> Result<SearchResult, SearchError> {
        let correlation_id = input.correlation_id;
        if let Err(error) = validate_conditions(input.snapshot.configurator(), input.conditions) {
            warn!(
                event_name = "search.query.rejected",
                correlation_id,
                error = %error,
                "variant conditions rejected"
            );
            return Err(error);
        }

        let snapshot = if input.policy.hide_no_in_stock {
            Cow::Owned(input.snapshot.without_out_of_stock())
        } else {
            Cow::Borrowed(input.snapshot)
        };

        let pricing = input.policy.pricing();
        let products = snapshot.products();
        let parallel = products.len() >= input.policy.parallel_threshold;

        let evaluated: Vec<Result<Vec<ResultRow>, SearchError>> = if parallel {
            products
                .par_iter()
                .map(|product| {
                    self.evaluate_product(product, input.conditions, &pricing, correlation_id)
                })
                .collect()
        } else {
            products
                .iter()
                .map(|product| {
                    self.evaluate_product(product, input.conditions, &pricing, correlation_id)
                })
                .collect()
        };

        // first failure in snapshot order wins, independent of scheduling
        let mut rows = Vec::new();
        for product_rows in evaluated {
            match product_rows {
                Ok(product_rows) => rows.extend(product_rows),
                Err(error) => {
                    warn!(
                        event_name = "search.query.failed",
                        correlation_id,
                        error = %error,
                        "search failed closed"
                    );
                    return Err(error);
                }
            }
        }

        self.sorter.sort(&mut rows, input.sorting);

        info!(
            event_name = "search.query.completed",
            correlation_id,
            products = products.len(),
            conditions = input.conditions.len(),
            rows = rows.len(),
            parallel,
            "variant search completed"
        );

        let total = rows.len();
        Ok(SearchResult { rows, total })
    }
}
