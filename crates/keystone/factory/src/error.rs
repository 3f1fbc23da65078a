use keystone_definitions::DefinitionError;
use keystone_types::{Address, PaymentDetails};
use thiserror::Error;

/// Errors from the Controlled Factory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    // --- Authorization ---
    #[error("only the factory itself may call this operation, caller was {caller}")]
    NotSelf { caller: Address },

    #[error("{0} is not an instance created by this factory")]
    NoPermission(Address),

    #[error("re-entrant call rejected")]
    ReentrantCall,

    // --- Identity ---
    #[error("{0} does not advertise the base state machine capability")]
    NotAComponent(Address),

    #[error("{0} does not accept custom initialization data")]
    UnsupportedInitialization(Address),

    #[error("template {0} is not whitelisted")]
    NotWhitelisted(Address),

    #[error("index {index} out of bounds for {len} entries")]
    IndexOutOfBounds { index: usize, len: usize },

    // --- Creation ---
    #[error("creating an instance of {template} failed")]
    CreationFailed { template: Address },

    #[error("malformed execution params: {0}")]
    MalformedParams(String),

    // --- Integrity ---
    #[error("payment for {template} does not match its clone price: expected {expected:?}, got {actual:?}")]
    InvalidPayment {
        template: Address,
        expected: PaymentDetails,
        actual: PaymentDetails,
    },

    #[error("definition error: {0}")]
    Definitions(#[from] DefinitionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_error_names_template() {
        let template = Address::derive("template");
        let err = FactoryError::InvalidPayment {
            template,
            expected: PaymentDetails::native(Address::derive("r"), 5),
            actual: PaymentDetails::native(Address::derive("r"), 4),
        };
        let s = err.to_string();
        assert!(s.contains(&template.to_string()));
        assert!(s.contains("native_amount: 5"));
    }

    #[test]
    fn definition_errors_convert() {
        let inner = DefinitionError::UnknownSchema(keystone_types::Selector([0; 4]));
        let err: FactoryError = inner.clone().into();
        assert_eq!(err, FactoryError::Definitions(inner));
    }
}
