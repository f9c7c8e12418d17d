use rust_decimal::Decimal;

use crate::domain::configurator::{
    Configurator, ConfiguratorGroup, ConfiguratorOption, GroupId, OptionId,
};
use crate::domain::price::{CustomerGroupKey, PriceTier};
use crate::domain::product::{OptionAssignment, Product, ProductId, Variant, VariantNumber};
use crate::search::catalog::{CatalogError, CatalogSnapshot};

const GRADUATION_WIDTH: u32 = 10;
const PSEUDO_PRICE_MARKUP: i64 = 110;
const DEFAULT_STOCK: u32 = 100;
const DEFAULT_PRICE: i64 = 100;

/// Declarative description of one configurator product.
#[derive(Clone, Debug, Default)]
pub struct ProductSpec {
    id: String,
    groups: Vec<(String, Vec<String>)>,
    graduations: Vec<Vec<Decimal>>,
    stock: Vec<u32>,
    price: Option<Decimal>,
}

impl ProductSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    pub fn options(mut self, group: &str, options: &[&str]) -> Self {
        self.groups.push((group.to_string(), options.iter().map(|option| option.to_string()).collect()));
        self
    }

    /// Adds the graduated prices of the next generated variant, one price per
    /// tier of ten units.
    pub fn graduation<P: Into<Decimal>>(mut self, prices: impl IntoIterator<Item = P>) -> Self {
        self.graduations.push(prices.into_iter().map(Into::into).collect());
        self
    }

    pub fn stock(mut self, stock: impl IntoIterator<Item = u32>) -> Self {
        self.stock = stock.into_iter().collect();
        self
    }

    /// Flat price for variants without explicit graduations.
    pub fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }
}

/// Builds synthetic catalogs. Groups and options receive sequential ids in
/// registration order; variants are the cartesian product of a product's
/// groups with the last group varying fastest.
#[derive(Clone, Debug)]
pub struct CatalogBuilder {
    groups: Vec<ConfiguratorGroup>,
    products: Vec<Product>,
    customer_group: CustomerGroupKey,
    next_group_id: u32,
    next_option_id: u32,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            products: Vec::new(),
            customer_group: CustomerGroupKey::default(),
            next_group_id: 1,
            next_option_id: 1,
        }
    }
}

impl CatalogBuilder {
    pub fn with_customer_group(mut self, customer_group: CustomerGroupKey) -> Self {
        self.customer_group = customer_group;
        self
    }

    pub fn group(&mut self, name: &str, options: &[&str]) -> GroupId {
        let group_id = GroupId(self.next_group_id);
        self.next_group_id += 1;

        let options = options
            .iter()
            .map(|option| {
                let option_id = OptionId(self.next_option_id);
                self.next_option_id += 1;
                ConfiguratorOption { id: option_id, group_id, name: option.to_string() }
            })
            .collect();

        self.groups.push(ConfiguratorGroup { id: group_id, name: name.to_string(), options });
        group_id
    }

    pub fn group_id(&self, name: &str) -> Option<GroupId> {
        self.groups.iter().find(|group| group.name == name).map(|group| group.id)
    }

    pub fn option_id(&self, group: &str, option: &str) -> Option<OptionId> {
        self.groups
            .iter()
            .find(|candidate| candidate.name == group)?
            .option_named(option)
            .map(|option| option.id)
    }

    pub fn product(&mut self, spec: ProductSpec) -> Result<&Product, CatalogError> {
        let dimensions = spec
            .groups
            .iter()
            .map(|(group_name, option_names)| self.resolve_dimension(group_name, option_names))
            .collect::<Result<Vec<_>, _>>()?;

        let default_price = spec.price.unwrap_or_else(|| Decimal::new(DEFAULT_PRICE, 0));
        let product_id = ProductId(spec.id.clone());
        let variants = combinations(&dimensions)
            .into_iter()
            .enumerate()
            .map(|(index, options)| {
                let generation_index = u32::try_from(index)
                    .map_err(|_| CatalogError::GenerationIndexOverflow(product_id.clone()))?;
                let prices = match spec.graduations.get(index) {
                    Some(prices) if !prices.is_empty() => graduated_tiers(prices, &self.customer_group),
                    _ => graduated_tiers(&[default_price], &self.customer_group),
                };
                Ok(Variant {
                    number: VariantNumber(format!("{}{}", spec.id, index + 1)),
                    generation_index,
                    options,
                    stock: spec.stock.get(index).copied().unwrap_or(DEFAULT_STOCK),
                    prices,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        self.products.push(Product { id: product_id.clone(), name: spec.id, variants });
        self.products.last().ok_or(CatalogError::EmptyProduct(product_id))
    }

    pub fn build(self) -> Result<CatalogSnapshot, CatalogError> {
        CatalogSnapshot::new(Configurator::new(self.groups), self.products)
    }

    fn resolve_dimension(
        &self,
        group_name: &str,
        option_names: &[String],
    ) -> Result<Vec<OptionAssignment>, CatalogError> {
        let group = self
            .groups
            .iter()
            .find(|group| group.name == group_name)
            .ok_or_else(|| CatalogError::UnknownGroupName(group_name.to_string()))?;

        if let Some(unknown) = option_names.iter().find(|name| group.option_named(name).is_none()) {
            return Err(CatalogError::UnknownOptionName {
                group: group_name.to_string(),
                option: unknown.clone(),
            });
        }

        // catalog order, not the order the caller listed them in
        Ok(group
            .options
            .iter()
            .filter(|option| option_names.contains(&option.name))
            .map(|option| OptionAssignment { group_id: group.id, option_id: option.id })
            .collect())
    }
}

fn combinations(dimensions: &[Vec<OptionAssignment>]) -> Vec<Vec<OptionAssignment>> {
    dimensions.iter().fold(vec![Vec::new()], |acc, dimension| {
        acc.iter()
            .flat_map(|prefix| {
                dimension.iter().map(move |assignment| {
                    let mut combination = prefix.clone();
                    combination.push(*assignment);
                    combination
                })
            })
            .collect()
    })
}

/// Tiers `1-10`, `11-20`, ... with the last one open-ended; the pseudo price
/// sits a fixed markup above the price.
pub fn graduated_tiers(prices: &[Decimal], customer_group: &CustomerGroupKey) -> Vec<PriceTier> {
    let last = prices.len().saturating_sub(1);
    prices
        .iter()
        .enumerate()
        .map(|(index, price)| {
            let from = 1 + GRADUATION_WIDTH * index as u32;
            PriceTier {
                from,
                to: (index != last).then_some(from + GRADUATION_WIDTH - 1),
                price: *price,
                pseudo_price: *price + Decimal::new(PSEUDO_PRICE_MARKUP, 0),
                customer_group: customer_group.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{graduated_tiers, CatalogBuilder, ProductSpec};
    use crate::domain::price::CustomerGroupKey;
    use crate::search::catalog::CatalogError;

    #[test]
    fn generates_variants_with_last_group_varying_fastest() {
        let mut builder = CatalogBuilder::default();
        builder.group("color", &["red", "green"]);
        builder.group("size", &["xl", "l"]);

        let product = builder
            .product(ProductSpec::new("A").options("color", &["green", "red"]).options("size", &["l", "xl"]))
            .expect("product A")
            .clone();

        let red = builder.option_id("color", "red").expect("red");
        let xl = builder.option_id("size", "xl").expect("xl");
        let l = builder.option_id("size", "l").expect("l");
        let color = builder.group_id("color").expect("color");
        let size = builder.group_id("size").expect("size");

        let combos = product
            .variants
            .iter()
            .map(|variant| (variant.number.0.as_str(), variant.option_for(color), variant.option_for(size)))
            .collect::<Vec<_>>();
        assert_eq!(combos[0], ("A1", Some(red), Some(xl)));
        assert_eq!(combos[1], ("A2", Some(red), Some(l)));
        assert_eq!(combos.len(), 4);
        assert_eq!(product.variants[3].generation_index, 3);
    }

    #[test]
    fn assigns_graduations_and_stock_in_generation_order() {
        let mut builder = CatalogBuilder::default();
        builder.group("size", &["xl", "l"]);
        builder
            .product(
                ProductSpec::new("A")
                    .options("size", &["xl", "l"])
                    .graduation([80, 60])
                    .stock([0]),
            )
            .expect("product A");

        let snapshot = builder.build().expect("valid catalog");
        let variants = &snapshot.products()[0].variants;

        assert_eq!(variants[0].stock, 0);
        assert_eq!(variants[0].prices.len(), 2);
        assert_eq!(variants[0].prices[1].price, Decimal::new(60, 0));
        assert_eq!(variants[1].stock, 100);
        assert_eq!(variants[1].prices.len(), 1);
        assert_eq!(variants[1].prices[0].price, Decimal::new(100, 0));
    }

    #[test]
    fn tiers_cover_the_quantity_axis() {
        let tiers = graduated_tiers(
            &[Decimal::new(60, 0), Decimal::new(50, 0), Decimal::new(40, 0)],
            &CustomerGroupKey::default(),
        );

        let ranges = tiers.iter().map(|tier| (tier.from, tier.to)).collect::<Vec<_>>();
        assert_eq!(ranges, vec![(1, Some(10)), (11, Some(20)), (21, None)]);
        assert_eq!(tiers[0].pseudo_price, Decimal::new(170, 0));
    }

    #[test]
    fn tiers_are_scoped_to_the_builder_customer_group() {
        let mut builder = CatalogBuilder::default().with_customer_group(CustomerGroupKey("H".to_string()));
        builder.group("size", &["xl"]);
        builder.product(ProductSpec::new("A").options("size", &["xl"]).graduation([60, 50])).expect("product A");

        let snapshot = builder.build().expect("valid catalog");
        let tiers = &snapshot.products()[0].variants[0].prices;

        assert_eq!(tiers.len(), 2);
        assert!(tiers.iter().all(|tier| tier.customer_group.0 == "H"));
        assert!(tiers[1].is_open_ended());
    }

    #[test]
    fn unknown_names_are_reported() {
        let mut builder = CatalogBuilder::default();
        builder.group("size", &["xl"]);

        let missing_group = builder.product(ProductSpec::new("A").options("color", &["red"])).expect_err("group");
        assert_eq!(missing_group, CatalogError::UnknownGroupName("color".to_string()));

        let missing_option = builder.product(ProductSpec::new("A").options("size", &["s"])).expect_err("option");
        assert_eq!(
            missing_option,
            CatalogError::UnknownOptionName { group: "size".to_string(), option: "s".to_string() }
        );
    }
}
