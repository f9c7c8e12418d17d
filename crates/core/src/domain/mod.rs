pub mod condition;
pub mod configurator;
pub mod price;
pub mod product;
pub mod result;
