use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::price::{CustomerGroupKey, PriceTier};
use crate::domain::product::Variant;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub use_last_graduation_for_cheapest_price: bool,
    pub customer_group: CustomerGroupKey,
    pub fallback_customer_group: CustomerGroupKey,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            use_last_graduation_for_cheapest_price: false,
            customer_group: CustomerGroupKey::default(),
            fallback_customer_group: CustomerGroupKey::default(),
        }
    }
}

/// The single comparable price of one variant plus the tier it came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePrice {
    pub price: Decimal,
    pub pseudo_price: Decimal,
    pub from: u32,
    pub to: Option<u32>,
}

impl From<&PriceTier> for EffectivePrice {
    fn from(tier: &PriceTier) -> Self {
        Self { price: tier.price, pseudo_price: tier.pseudo_price, from: tier.from, to: tier.to }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TierListError {
    #[error("no price tiers for customer group {customer_group}")]
    Empty { customer_group: CustomerGroupKey },
    #[error("first tier starts at quantity {from} instead of 1")]
    FirstTierNotAtOne { from: u32 },
    #[error("tier {index} has inverted range {from}..{to}")]
    InvertedRange { index: usize, from: u32, to: u32 },
    #[error("tier {index} starts at {from}, before the previous tier start {previous_from}")]
    Unordered { index: usize, from: u32, previous_from: u32 },
    #[error("tier {index} starts at {from} but the quantity axis continues at {expected}")]
    Gap { index: usize, from: u32, expected: u32 },
    #[error("tier {index} starts at {from}, overlapping the previous tier ending at {previous_to}")]
    Overlap { index: usize, from: u32, previous_to: u32 },
    #[error("tier {index} is open-ended but is not the last tier")]
    OpenEndedBeforeLast { index: usize },
    #[error("last tier is bounded at {to}; it must be open-ended")]
    LastTierBounded { to: u32 },
}

pub trait PriceResolver: Send + Sync {
    fn effective_price(
        &self,
        variant: &Variant,
        policy: &PricingPolicy,
    ) -> Result<EffectivePrice, TierListError>;
}

#[derive(Default)]
pub struct GraduatedPriceResolver;

impl PriceResolver for GraduatedPriceResolver {
    fn effective_price(
        &self,
        variant: &Variant,
        policy: &PricingPolicy,
    ) -> Result<EffectivePrice, TierListError> {
        let tiers = select_tiers(variant, policy);
        resolve_effective_price(&tiers, variant.stock, policy.use_last_graduation_for_cheapest_price)
            .map_err(|error| match error {
                TierListError::Empty { .. } => {
                    TierListError::Empty { customer_group: policy.customer_group.clone() }
                }
                other => other,
            })
    }
}

/// Picks the variant's tiers for the policy's customer group, falling back to
/// the fallback group when the variant has none. Source order is preserved so
/// that ordering defects surface in validation.
pub fn select_tiers<'a>(variant: &'a Variant, policy: &PricingPolicy) -> Vec<&'a PriceTier> {
    let scoped = tiers_for(variant, &policy.customer_group);
    if !scoped.is_empty() || policy.customer_group == policy.fallback_customer_group {
        return scoped;
    }

    tiers_for(variant, &policy.fallback_customer_group)
}

fn tiers_for<'a>(variant: &'a Variant, customer_group: &CustomerGroupKey) -> Vec<&'a PriceTier> {
    variant.prices.iter().filter(|tier| &tier.customer_group == customer_group).collect()
}

pub fn validate_tiers(tiers: &[&PriceTier]) -> Result<(), TierListError> {
    let Some(first) = tiers.first() else {
        return Err(TierListError::Empty { customer_group: CustomerGroupKey::default() });
    };
    if first.from != 1 {
        return Err(TierListError::FirstTierNotAtOne { from: first.from });
    }

    let last_index = tiers.len() - 1;
    for (index, tier) in tiers.iter().enumerate() {
        if let Some(to) = tier.to {
            if to < tier.from {
                return Err(TierListError::InvertedRange { index, from: tier.from, to });
            }
        }

        if index > 0 {
            let previous = tiers[index - 1];
            if tier.from < previous.from {
                return Err(TierListError::Unordered {
                    index,
                    from: tier.from,
                    previous_from: previous.from,
                });
            }
            // an open-ended predecessor is reported below when visited
            if let Some(previous_to) = previous.to {
                let expected = previous_to.saturating_add(1);
                if tier.from <= previous_to {
                    return Err(TierListError::Overlap { index, from: tier.from, previous_to });
                }
                if tier.from > expected {
                    return Err(TierListError::Gap { index, from: tier.from, expected });
                }
            }
        }

        if index != last_index && tier.is_open_ended() {
            return Err(TierListError::OpenEndedBeforeLast { index });
        }
        if let (true, Some(to)) = (index == last_index, tier.to) {
            return Err(TierListError::LastTierBounded { to });
        }
    }

    Ok(())
}

/// Stocked variants honour the last graduation when the policy asks for it;
/// unavailable variants always fall back to their base tier.
pub fn resolve_effective_price(
    tiers: &[&PriceTier],
    stock: u32,
    use_last_graduation: bool,
) -> Result<EffectivePrice, TierListError> {
    validate_tiers(tiers)?;

    let tier = if stock > 0 && use_last_graduation { tiers.last() } else { tiers.first() };
    tier.map(|tier| EffectivePrice::from(*tier))
        .ok_or(TierListError::Empty { customer_group: CustomerGroupKey::default() })
}
