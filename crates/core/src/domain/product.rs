use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::configurator::{GroupId, OptionId};
use crate::domain::price::PriceTier;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantNumber(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for VariantNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionAssignment {
    pub group_id: GroupId,
    pub option_id: OptionId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub number: VariantNumber,
    /// Position in the configurator's enumeration of option combinations.
    /// Representative selection keys off this, never off list position.
    pub generation_index: u32,
    #[serde(default)]
    pub options: Vec<OptionAssignment>,
    #[serde(default)]
    pub stock: u32,
    pub prices: Vec<PriceTier>,
}

impl Variant {
    pub fn option_for(&self, group_id: GroupId) -> Option<OptionId> {
        self.options
            .iter()
            .find(|assignment| assignment.group_id == group_id)
            .map(|assignment| assignment.option_id)
    }

    pub fn groups(&self) -> BTreeSet<GroupId> {
        self.options.iter().map(|assignment| assignment.group_id).collect()
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    pub variants: Vec<Variant>,
}

impl Product {
    /// The main variant is the first one the configurator generated.
    pub fn main_variant(&self) -> Option<&Variant> {
        self.variants.iter().min_by_key(|variant| variant.generation_index)
    }

    pub fn uses_group(&self, group_id: GroupId) -> bool {
        self.variants.iter().any(|variant| variant.option_for(group_id).is_some())
    }

    pub fn groups(&self) -> BTreeSet<GroupId> {
        self.variants.iter().flat_map(|variant| variant.groups()).collect()
    }

    pub fn variants_in_generation_order(&self) -> Vec<&Variant> {
        let mut variants = self.variants.iter().collect::<Vec<_>>();
        variants.sort_by_key(|variant| variant.generation_index);
        variants
    }
}
