use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::condition::VariantCondition;
use crate::domain::configurator::{Configurator, GroupId, OptionId};
use crate::domain::product::{Product, Variant};
use crate::errors::SearchError;

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionViolation {
    #[error("group is not part of the catalog configurator")]
    UnknownGroup,
    #[error("no options were selected")]
    EmptyOptionSet,
    #[error("{option_id} does not belong to the group")]
    ForeignOption { option_id: OptionId },
}

/// Matching variants of one product that share an expand key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition<'a> {
    pub key: Vec<OptionId>,
    pub representative: &'a Variant,
    /// Non-empty, ascending generation order; `representative` is the first.
    pub members: Vec<&'a Variant>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionReason {
    MissingExpandGroup(GroupId),
    NoEligibleVariant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductMatch<'a> {
    Excluded(ExclusionReason),
    Matched(Vec<Partition<'a>>),
}

pub trait ConditionEngine: Send + Sync {
    fn partition<'a>(&self, product: &'a Product, conditions: &[VariantCondition]) -> ProductMatch<'a>;
}

#[derive(Default)]
pub struct DeterministicConditionEngine;

impl ConditionEngine for DeterministicConditionEngine {
    fn partition<'a>(&self, product: &'a Product, conditions: &[VariantCondition]) -> ProductMatch<'a> {
        partition_product(product, conditions)
    }
}

/// Rejects the whole query when any condition is malformed.
pub fn validate_conditions(
    configurator: &Configurator,
    conditions: &[VariantCondition],
) -> Result<(), SearchError> {
    for condition in conditions {
        let invalid = |violation| SearchError::InvalidCondition { group_id: condition.group_id, violation };

        let Some(group) = configurator.group(condition.group_id) else {
            return Err(invalid(ConditionViolation::UnknownGroup));
        };
        if condition.option_ids.is_empty() {
            return Err(invalid(ConditionViolation::EmptyOptionSet));
        }
        if let Some(option_id) = condition.option_ids.iter().find(|option_id| !group.contains(**option_id)) {
            return Err(invalid(ConditionViolation::ForeignOption { option_id: *option_id }));
        }
    }

    Ok(())
}

pub fn partition_product<'a>(product: &'a Product, conditions: &[VariantCondition]) -> ProductMatch<'a> {
    let used_groups = product.groups();

    if let Some(missing) =
        conditions.iter().find(|condition| condition.expand && !used_groups.contains(&condition.group_id))
    {
        return ProductMatch::Excluded(ExclusionReason::MissingExpandGroup(missing.group_id));
    }

    // non-expand conditions on a group the product lacks pass through
    let active = conditions
        .iter()
        .filter(|condition| used_groups.contains(&condition.group_id))
        .collect::<Vec<_>>();

    let mut expand_groups: Vec<GroupId> = Vec::new();
    for condition in conditions.iter().filter(|condition| condition.expand) {
        if !expand_groups.contains(&condition.group_id) {
            expand_groups.push(condition.group_id);
        }
    }

    let mut partitions: Vec<Partition<'a>> = Vec::new();
    let mut slots: HashMap<Vec<OptionId>, usize> = HashMap::new();

    for variant in product.variants_in_generation_order() {
        let eligible = active.iter().all(|condition| {
            variant.option_for(condition.group_id).is_some_and(|option_id| condition.accepts(option_id))
        });
        if !eligible {
            continue;
        }

        let key = expand_groups
            .iter()
            .filter_map(|group_id| variant.option_for(*group_id))
            .collect::<Vec<_>>();

        match slots.get(&key).copied() {
            Some(slot) => partitions[slot].members.push(variant),
            None => {
                slots.insert(key.clone(), partitions.len());
                partitions.push(Partition { key, representative: variant, members: vec![variant] });
            }
        }
    }

    if partitions.is_empty() {
        return ProductMatch::Excluded(ExclusionReason::NoEligibleVariant);
    }

    ProductMatch::Matched(partitions)
}
