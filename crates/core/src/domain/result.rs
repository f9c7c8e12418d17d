use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::{ProductId, VariantNumber};

/// One listing entry. `number` is the partition's representative while
/// `price_variant` is the member whose effective price won the minimum; the two
/// may differ.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub number: VariantNumber,
    pub product_id: ProductId,
    pub price: Decimal,
    pub pseudo_price: Decimal,
    pub price_variant: VariantNumber,
}
