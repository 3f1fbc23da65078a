use serde::{Deserialize, Serialize};

use crate::ids::Address;

/// Value attached to an operation: a native amount and/or an amount of an
/// alternate token, both payable to `recipient`.
///
/// The all-zero value means "no payment".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub recipient: Address,
    pub native_amount: u128,
    pub token: Address,
    pub token_amount: u128,
}

/// Per-template instantiation price. Same shape as the payment it is checked against.
pub type PriceConfig = PaymentDetails;

impl PaymentDetails {
    pub fn native(recipient: Address, amount: u128) -> Self {
        Self {
            recipient,
            native_amount: amount,
            ..Self::default()
        }
    }

    pub fn token(recipient: Address, token: Address, amount: u128) -> Self {
        Self {
            recipient,
            token,
            token_amount: amount,
            ..Self::default()
        }
    }

    pub fn is_free(&self) -> bool {
        *self == Self::default()
    }

    /// Names of the fields that differ from `other`, in declaration order.
    pub fn mismatched_fields(&self, other: &PaymentDetails) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.recipient != other.recipient {
            fields.push("recipient");
        }
        if self.native_amount != other.native_amount {
            fields.push("native_amount");
        }
        if self.token != other.token {
            fields.push("token");
        }
        if self.token_amount != other.token_amount {
            fields.push("token_amount");
        }
        fields
    }
}
