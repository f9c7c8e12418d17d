pub mod config;
pub mod domain;
pub mod errors;
pub mod search;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::condition::VariantCondition;
pub use domain::configurator::{Configurator, ConfiguratorGroup, ConfiguratorOption, GroupId, OptionId};
pub use domain::price::{CustomerGroupKey, PriceTier};
pub use domain::product::{OptionAssignment, Product, ProductId, Variant, VariantNumber};
pub use domain::result::ResultRow;
pub use errors::{ApplicationError, InterfaceError, SearchError};
pub use search::builder::{CatalogBuilder, ProductSpec};
pub use search::catalog::{CatalogError, CatalogParts, CatalogSnapshot};
pub use search::sorting::{PriceSorting, SortDirection};
pub use search::{DeterministicSearchRuntime, SearchInput, SearchPolicy, SearchResult, SearchRuntime};
