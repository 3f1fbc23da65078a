use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Failure to parse a fixed-width identifier from its hex form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// Fixed-width identifiers displayed and serialized as `0x`-prefixed hex.
macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s.strip_prefix("0x").unwrap_or(s);
                let raw =
                    hex::decode(digits).map_err(|e| IdParseError::InvalidHex(e.to_string()))?;
                let bytes: [u8; $len] =
                    raw.as_slice()
                        .try_into()
                        .map_err(|_| IdParseError::WrongLength {
                            expected: $len,
                            actual: raw.len(),
                        })?;
                Ok(Self(bytes))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_id!(
    /// Identity of an account, component, template, or instance on the host ledger.
    Address,
    20
);

hex_id!(
    /// Fixed-width identifier naming one operation of a component.
    ///
    /// Derived from the canonical signature string with
    /// [`Selector::from_signature`].
    Selector,
    4
);

hex_id!(
    /// Reference to a role held in the external role store.
    RoleId,
    32
);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    /// Deterministic address for fixtures and well-known components.
    pub fn derive(seed: &str) -> Self {
        let hash = blake3::hash(seed.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash.as_bytes()[..20]);
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl Selector {
    /// First four bytes of the BLAKE3 hash of the canonical signature,
    /// e.g. `"setClonePrice(address,(address,uint256,address,uint256))"`.
    pub fn from_signature(signature: &str) -> Self {
        let hash = blake3::hash(signature.as_bytes());
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&hash.as_bytes()[..4]);
        Self(bytes)
    }
}

impl RoleId {
    pub fn from_name(name: &str) -> Self {
        Self(*blake3::hash(name.as_bytes()).as_bytes())
    }
}

/// Grouping tag for operations. Not consulted for authorization.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct OperationType(pub String);

impl OperationType {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical signatures of the operations this layer exposes.
pub mod signatures {
    /// Dispatch macro entry point the execution engine routes guarded calls through.
    pub const GUARDED_EXECUTION: &str = "executeGuarded(address,bytes4,bytes)";

    pub const CREATE: &str = "create(address,address,address,address,uint256,bytes)";
    pub const ADD_TO_WHITELIST: &str =
        "addToWhitelist(address,(address,uint256,address,uint256))";
    pub const REMOVE_FROM_WHITELIST: &str = "removeFromWhitelist(address)";
    pub const SET_CLONE_PRICE: &str = "setClonePrice(address,(address,uint256,address,uint256))";
    pub const SET_EVENT_FORWARDER: &str = "setEventForwarder(address)";
}

/// Built-in roles every component is created with.
pub mod roles {
    use super::RoleId;

    pub const OWNER: &str = "OWNER_ROLE";
    pub const BROADCASTER: &str = "BROADCASTER_ROLE";
    pub const RECOVERY: &str = "RECOVERY_ROLE";

    pub fn owner() -> RoleId {
        RoleId::from_name(OWNER)
    }

    pub fn broadcaster() -> RoleId {
        RoleId::from_name(BROADCASTER)
    }

    pub fn recovery() -> RoleId {
        RoleId::from_name(RECOVERY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_is_stable_per_signature() {
        let a = Selector::from_signature(signatures::CREATE);
        let b = Selector::from_signature(signatures::CREATE);
        let c = Selector::from_signature(signatures::SET_CLONE_PRICE);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn address_hex_roundtrip() {
        let addr = Address::derive("template-a");
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);
        assert!(addr.to_string().starts_with("0x"));
        assert_eq!(addr.to_string().len(), 2 + 40);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = "0x1234".parse::<Address>().unwrap_err();
        assert_eq!(
            err,
            IdParseError::WrongLength {
                expected: 20,
                actual: 2
            }
        );
    }

    #[test]
    fn parse_rejects_bad_hex() {
        assert!(matches!(
            "0xzz".parse::<Selector>(),
            Err(IdParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn selector_serializes_as_hex_string() {
        let sel = Selector([0xde, 0xad, 0xbe, 0xef]);
        let json = serde_json::to_string(&sel).unwrap();
        assert_eq!(json, "\"0xdeadbeef\"");
        let back: Selector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sel);
    }

    #[test]
    fn built_in_roles_are_distinct() {
        assert_ne!(roles::owner(), roles::broadcaster());
        assert_ne!(roles::broadcaster(), roles::recovery());
        assert!(Address::ZERO.is_zero());
    }
}
