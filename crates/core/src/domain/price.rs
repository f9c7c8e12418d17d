use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CUSTOMER_GROUP: &str = "EK";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerGroupKey(pub String);

impl Default for CustomerGroupKey {
    fn default() -> Self {
        Self(DEFAULT_CUSTOMER_GROUP.to_string())
    }
}

impl fmt::Display for CustomerGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One graduation of a variant's price list. `to: None` is the open-ended
/// "and above" tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    pub from: u32,
    pub to: Option<u32>,
    pub price: Decimal,
    pub pseudo_price: Decimal,
    #[serde(default)]
    pub customer_group: CustomerGroupKey,
}

impl PriceTier {
    pub fn is_open_ended(&self) -> bool {
        self.to.is_none()
    }
}
