use thiserror::Error;

use crate::domain::configurator::GroupId;
use crate::domain::product::{ProductId, VariantNumber};
use crate::search::catalog::CatalogError;
use crate::search::conditions::ConditionViolation;
use crate::search::pricing::TierListError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("invalid condition on {group_id}: {violation}")]
    InvalidCondition { group_id: GroupId, violation: ConditionViolation },
    #[error("invalid tier list for variant {variant} of product {product_id}: {reason}")]
    InvalidTierList { product_id: ProductId, variant: VariantNumber, reason: TierListError },
    #[error("product {product_id} produced an empty partition")]
    EmptyPartition { product_id: ProductId },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("snapshot failure: {0}")]
    Snapshot(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("unprocessable catalog: {message}")]
    UnprocessableCatalog { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The search filters could not be applied. Check the selected options and try again."
            }
            Self::UnprocessableCatalog { .. } => {
                "The catalog contains inconsistent data and could not be searched."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::UnprocessableCatalog { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::UnprocessableCatalog { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Search(error @ SearchError::InvalidCondition { .. }) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::Search(error) => {
                Self::UnprocessableCatalog { message: error.to_string(), correlation_id }
            }
            ApplicationError::Catalog(error) => {
                Self::UnprocessableCatalog { message: error.to_string(), correlation_id }
            }
            ApplicationError::Snapshot(message) => Self::BadRequest { message, correlation_id },
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::configurator::GroupId;
    use crate::domain::price::CustomerGroupKey;
    use crate::domain::product::{ProductId, VariantNumber};
    use crate::errors::{ApplicationError, InterfaceError, SearchError};
    use crate::search::conditions::ConditionViolation;
    use crate::search::pricing::TierListError;

    #[test]
    fn invalid_condition_maps_to_bad_request() {
        let interface = ApplicationError::from(SearchError::InvalidCondition {
            group_id: GroupId(2),
            violation: ConditionViolation::EmptyOptionSet,
        })
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref correlation_id, ref message }
                if correlation_id == "req-1" && message.contains("group#2")
        ));
        assert_eq!(
            interface.user_message(),
            "The search filters could not be applied. Check the selected options and try again."
        );
    }

    #[test]
    fn invalid_tier_list_maps_to_unprocessable_catalog() {
        let interface = ApplicationError::from(SearchError::InvalidTierList {
            product_id: ProductId("A".to_owned()),
            variant: VariantNumber("A2".to_owned()),
            reason: TierListError::Empty { customer_group: CustomerGroupKey::default() },
        })
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::UnprocessableCatalog { .. }));
        assert_eq!(interface.correlation_id(), "req-2");
        assert!(interface.to_string().contains("variant A2 of product A"));
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("invalid log level".to_owned()).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
