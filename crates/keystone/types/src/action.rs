//! Authorization actions.
//!
//! A privileged operation moves through one of two workflows, both enforced
//! by the external execution engine:
//!
//! ```text
//! time-delay:  REQUEST ──(elapsed)──▶ APPROVE            (or CANCEL)
//! co-signed:   SIGN(off-band) ──▶ EXECUTE(on-path)       (request-and-approve,
//!                                                         approve, cancel)
//! ```
//!
//! Each step is one bit. An operation schema declares the union of steps it
//! supports; a role grant is always a subset of that union.
//!
//! ```
//! use keystone_types::TxAction;
//!
//! let schema = TxAction::TIME_DELAY | TxAction::META_SIGN;
//! let grant = TxAction::TIME_DELAY_REQUEST | TxAction::SIGN_META_APPROVE;
//! assert!(grant.is_subset_of(schema));
//! assert!(!TxAction::EXECUTE_META_APPROVE.is_subset_of(schema));
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

bitflags! {
    /// Authorization actions, one bit each.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct TxAction: u16 {
        const TIME_DELAY_REQUEST               = 1 << 0;
        const TIME_DELAY_APPROVE               = 1 << 1;
        const TIME_DELAY_CANCEL                = 1 << 2;
        const SIGN_META_REQUEST_AND_APPROVE    = 1 << 3;
        const SIGN_META_APPROVE                = 1 << 4;
        const SIGN_META_CANCEL                 = 1 << 5;
        const EXECUTE_META_REQUEST_AND_APPROVE = 1 << 6;
        const EXECUTE_META_APPROVE             = 1 << 7;
        const EXECUTE_META_CANCEL              = 1 << 8;

        /// Every time-delay step.
        const TIME_DELAY = Self::TIME_DELAY_REQUEST.bits()
            | Self::TIME_DELAY_APPROVE.bits()
            | Self::TIME_DELAY_CANCEL.bits();

        /// Every co-signed "sign" sub-action.
        const META_SIGN = Self::SIGN_META_REQUEST_AND_APPROVE.bits()
            | Self::SIGN_META_APPROVE.bits()
            | Self::SIGN_META_CANCEL.bits();

        /// Every co-signed "execute" sub-action.
        const META_EXECUTE = Self::EXECUTE_META_REQUEST_AND_APPROVE.bits()
            | Self::EXECUTE_META_APPROVE.bits()
            | Self::EXECUTE_META_CANCEL.bits();
    }
}

/// A raw bitmap carried bits outside the defined action set.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("bitmap {raw:#06x} has undefined action bits {undefined:#06x}")]
pub struct InvalidBitmap {
    pub raw: u16,
    pub undefined: u16,
}

impl TxAction {
    /// Checked conversion from a raw bitmap.
    pub fn from_raw(raw: u16) -> Result<Self, InvalidBitmap> {
        Self::from_bits(raw).ok_or(InvalidBitmap {
            raw,
            undefined: raw & !Self::all().bits(),
        })
    }

    /// True when every action in `self` is also in `declared`.
    pub fn is_subset_of(self, declared: TxAction) -> bool {
        declared.contains(self)
    }

    /// Actions in `self` that `declared` does not cover.
    pub fn excess_over(self, declared: TxAction) -> TxAction {
        self.difference(declared)
    }
}

impl Default for TxAction {
    fn default() -> Self {
        Self::empty()
    }
}

/// Text form: `"TIME_DELAY_REQUEST | SIGN_META_APPROVE"`.
impl Serialize for TxAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        bitflags::serde::serialize(self, serializer)
    }
}

/// Accepts flag names or hex, but only defined action bits.
impl<'de> Deserialize<'de> for TxAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed: TxAction = bitflags::serde::deserialize(deserializer)?;
        TxAction::from_raw(parsed.bits()).map_err(serde::de::Error::custom)
    }
}
