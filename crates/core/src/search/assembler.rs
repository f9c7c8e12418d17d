use crate::domain::product::{Product, Variant};
use crate::domain::result::ResultRow;
use crate::errors::SearchError;
use crate::search::conditions::Partition;
use crate::search::pricing::{EffectivePrice, PriceResolver, PricingPolicy};

/// Reduces one partition to its listing row: the representative's number and
/// the cheapest effective price among the members. Ties on the price keep the
/// earliest generated member.
pub fn assemble_partition<P: PriceResolver + ?Sized>(
    product: &Product,
    partition: &Partition<'_>,
    resolver: &P,
    policy: &PricingPolicy,
) -> Result<ResultRow, SearchError> {
    let mut cheapest: Option<(&Variant, EffectivePrice)> = None;

    for member in partition.members.iter().copied() {
        let effective = resolver.effective_price(member, policy).map_err(|reason| {
            SearchError::InvalidTierList {
                product_id: product.id.clone(),
                variant: member.number.clone(),
                reason,
            }
        })?;

        let replace = match &cheapest {
            None => true,
            Some((_, current)) => effective.price < current.price,
        };
        if replace {
            cheapest = Some((member, effective));
        }
    }

    let Some((price_variant, effective)) = cheapest else {
        return Err(SearchError::EmptyPartition { product_id: product.id.clone() });
    };

    Ok(ResultRow {
        number: partition.representative.number.clone(),
        product_id: product.id.clone(),
        price: effective.price,
        pseudo_price: effective.pseudo_price,
        price_variant: price_variant.number.clone(),
    })
}
