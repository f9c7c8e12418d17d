use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::configurator::{GroupId, OptionId};

/// Search-time filter on one configurator group. With `expand` set the
/// matching variants are split into one result per selected option instead of
/// collapsing into one result per product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantCondition {
    pub group_id: GroupId,
    pub option_ids: BTreeSet<OptionId>,
    #[serde(default)]
    pub expand: bool,
}

impl VariantCondition {
    pub fn new(group_id: GroupId, option_ids: impl IntoIterator<Item = OptionId>, expand: bool) -> Self {
        Self { group_id, option_ids: option_ids.into_iter().collect(), expand }
    }

    pub fn accepts(&self, option_id: OptionId) -> bool {
        self.option_ids.contains(&option_id)
    }
}
