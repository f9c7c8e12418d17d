use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::configurator::{Configurator, GroupId, OptionId};
use crate::domain::product::{Product, ProductId, VariantNumber};
use crate::search::pricing::{PriceResolver, PricingPolicy, TierListError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate configurator group {0}")]
    DuplicateGroup(GroupId),
    #[error("duplicate configurator option {0}")]
    DuplicateOption(OptionId),
    #[error("{option_id} is listed under {listed_under} but claims {claimed}")]
    OptionGroupMismatch { option_id: OptionId, listed_under: GroupId, claimed: GroupId },
    #[error("unknown configurator group `{0}`")]
    UnknownGroupName(String),
    #[error("unknown option `{option}` in group `{group}`")]
    UnknownOptionName { group: String, option: String },
    #[error("duplicate product {0}")]
    DuplicateProduct(ProductId),
    #[error("product {0} has no variants")]
    EmptyProduct(ProductId),
    #[error("duplicate variant number {0}")]
    DuplicateVariantNumber(VariantNumber),
    #[error("product {product_id} repeats generation index {generation_index}")]
    DuplicateGenerationIndex { product_id: ProductId, generation_index: u32 },
    #[error("variant {variant} references unknown {group_id}")]
    UnknownGroup { variant: VariantNumber, group_id: GroupId },
    #[error("variant {variant} assigns {option_id}, which is not an option of {group_id}")]
    ForeignOption { variant: VariantNumber, group_id: GroupId, option_id: OptionId },
    #[error("variant {variant} assigns {group_id} more than once")]
    DuplicateAssignment { variant: VariantNumber, group_id: GroupId },
    #[error("variant {variant} does not cover the same groups as the other variants of {product_id}")]
    InconsistentGroups { product_id: ProductId, variant: VariantNumber },
    #[error("product {0} has more variants than generation indices can number")]
    GenerationIndexOverflow(ProductId),
    #[error("invalid tier list for variant {variant} of product {product_id}: {reason}")]
    InvalidTierList { product_id: ProductId, variant: VariantNumber, reason: TierListError },
}

/// Immutable catalog handed to one query. Construction checks the structural
/// invariants; price tiers are checked lazily by the resolver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CatalogParts")]
pub struct CatalogSnapshot {
    configurator: Configurator,
    products: Vec<Product>,
}

/// Snapshot contents as read from a file, before any invariant is checked.
#[derive(Clone, Debug, Deserialize)]
pub struct CatalogParts {
    pub configurator: Configurator,
    pub products: Vec<Product>,
}

impl TryFrom<CatalogParts> for CatalogSnapshot {
    type Error = CatalogError;

    fn try_from(parts: CatalogParts) -> Result<Self, Self::Error> {
        Self::new(parts.configurator, parts.products)
    }
}

impl CatalogSnapshot {
    pub fn new(configurator: Configurator, products: Vec<Product>) -> Result<Self, CatalogError> {
        validate_configurator(&configurator)?;

        let mut product_ids = HashSet::new();
        let mut variant_numbers = HashSet::new();
        for product in &products {
            if !product_ids.insert(product.id.clone()) {
                return Err(CatalogError::DuplicateProduct(product.id.clone()));
            }
            validate_product(&configurator, product)?;
            for variant in &product.variants {
                if !variant_numbers.insert(variant.number.clone()) {
                    return Err(CatalogError::DuplicateVariantNumber(variant.number.clone()));
                }
            }
        }

        Ok(Self { configurator, products })
    }

    pub fn configurator(&self) -> &Configurator {
        &self.configurator
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn variant_count(&self) -> usize {
        self.products.iter().map(|product| product.variants.len()).sum()
    }

    /// Drops zero-stock variants and products left without variants. Removing
    /// variants keeps every structural invariant intact.
    pub fn without_out_of_stock(&self) -> Self {
        let products = self
            .products
            .iter()
            .filter_map(|product| {
                let variants = product
                    .variants
                    .iter()
                    .filter(|variant| variant.in_stock())
                    .cloned()
                    .collect::<Vec<_>>();
                (!variants.is_empty()).then(|| Product { variants, ..product.clone() })
            })
            .collect();

        Self { configurator: self.configurator.clone(), products }
    }

    /// Resolves every variant's tiers the way a search would, so a broken tier
    /// list is reported before any query runs. Returns the number of variants
    /// checked.
    pub fn check_price_tiers<P: PriceResolver + ?Sized>(
        &self,
        resolver: &P,
        policy: &PricingPolicy,
    ) -> Result<usize, CatalogError> {
        for product in &self.products {
            for variant in product.variants_in_generation_order() {
                resolver.effective_price(variant, policy).map_err(|reason| {
                    CatalogError::InvalidTierList {
                        product_id: product.id.clone(),
                        variant: variant.number.clone(),
                        reason,
                    }
                })?;
            }
        }

        Ok(self.variant_count())
    }
}

fn validate_configurator(configurator: &Configurator) -> Result<(), CatalogError> {
    let mut group_ids = HashSet::new();
    let mut option_ids = HashSet::new();

    for group in configurator.groups() {
        if !group_ids.insert(group.id) {
            return Err(CatalogError::DuplicateGroup(group.id));
        }
        for option in &group.options {
            if option.group_id != group.id {
                return Err(CatalogError::OptionGroupMismatch {
                    option_id: option.id,
                    listed_under: group.id,
                    claimed: option.group_id,
                });
            }
            if !option_ids.insert(option.id) {
                return Err(CatalogError::DuplicateOption(option.id));
            }
        }
    }

    Ok(())
}

fn validate_product(configurator: &Configurator, product: &Product) -> Result<(), CatalogError> {
    if product.main_variant().is_none() {
        return Err(CatalogError::EmptyProduct(product.id.clone()));
    }

    let mut generation_indices = HashSet::new();
    let mut expected_groups: Option<BTreeSet<GroupId>> = None;

    for variant in &product.variants {
        if !generation_indices.insert(variant.generation_index) {
            return Err(CatalogError::DuplicateGenerationIndex {
                product_id: product.id.clone(),
                generation_index: variant.generation_index,
            });
        }

        let mut seen = BTreeSet::new();
        for assignment in &variant.options {
            let Some(group) = configurator.group(assignment.group_id) else {
                return Err(CatalogError::UnknownGroup {
                    variant: variant.number.clone(),
                    group_id: assignment.group_id,
                });
            };
            if !group.contains(assignment.option_id) {
                return Err(CatalogError::ForeignOption {
                    variant: variant.number.clone(),
                    group_id: assignment.group_id,
                    option_id: assignment.option_id,
                });
            }
            if !seen.insert(assignment.group_id) {
                return Err(CatalogError::DuplicateAssignment {
                    variant: variant.number.clone(),
                    group_id: assignment.group_id,
                });
            }
        }

        match &expected_groups {
            None => expected_groups = Some(seen),
            Some(expected) if *expected != seen => {
                return Err(CatalogError::InconsistentGroups {
                    product_id: product.id.clone(),
                    variant: variant.number.clone(),
                });
            }
            Some(_) => {}
        }
    }

    Ok(())
}
