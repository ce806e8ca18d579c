//! Identity types for bindings and registries.
//!
//! `ProviderId` identifies the plugin that owns a data model or a modifier
//! type. The remaining ids are plain `u32` newtypes handed out by their owners.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of a data model or modifier-type provider.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(pub Uuid);

impl ProviderId {
    /// Provider of the modifier types shipped with this crate.
    pub const BUILTIN: ProviderId = ProviderId(Uuid::from_u128(0x6c1f_5e4a_7b2d_4c8e_9a31_0f5d_2e7b_c001));

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Debug for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderId({})", self.0)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Identifies a modifier within its direct binding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModifierId(pub u32);

/// Identifies a condition within its conditional binding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConditionId(pub u32);

/// Handle returned by observer lists, used to unsubscribe.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SubscriptionId(pub u32);

impl SubscriptionId {
    pub const INVALID: SubscriptionId = SubscriptionId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

macro_rules! impl_id_fmt {
    ($ty:ident) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($ty), "({})"), self.0)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

impl_id_fmt!(ModifierId);
impl_id_fmt!(ConditionId);
impl_id_fmt!(SubscriptionId);
