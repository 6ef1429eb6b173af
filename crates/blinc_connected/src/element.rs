//! Element identities and navigation parameters
//!
//! The coordinator never owns UI objects. Elements and list controls are
//! referenced by slotmap keys that the host maps onto its own node ids, the
//! same way layout nodes are addressed elsewhere in Blinc. The null key
//! stands in for a missing element.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, Key, KeyData};

new_key_type! {
    /// Identity of a UI element that can take part in a connected animation
    pub struct ElementId;
    /// Identity of a virtualized list control
    pub struct ListId;
}

impl ElementId {
    /// Convert to raw u64 for storage
    pub fn to_raw(&self) -> u64 {
        self.data().as_ffi()
    }

    /// Reconstruct from raw u64
    pub fn from_raw(raw: u64) -> Self {
        KeyData::from_ffi(raw).into()
    }
}

impl ListId {
    /// Convert to raw u64 for storage
    pub fn to_raw(&self) -> u64 {
        self.data().as_ffi()
    }

    /// Reconstruct from raw u64
    pub fn from_raw(raw: u64) -> Self {
        KeyData::from_ffi(raw).into()
    }
}

/// Parameter carried by a navigation
///
/// List animations use it to find the item that was (or will be) navigated
/// to inside a list's bound collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NavParam {
    Int(i64),
    Text(String),
}

impl NavParam {
    /// An empty text parameter counts as no parameter at all
    pub fn is_empty(&self) -> bool {
        matches!(self, NavParam::Text(text) if text.is_empty())
    }

    /// Normalize an optional parameter, dropping empty ones
    pub fn effective(param: Option<&NavParam>) -> Option<&NavParam> {
        param.filter(|p| !p.is_empty())
    }
}

impl From<i64> for NavParam {
    fn from(value: i64) -> Self {
        NavParam::Int(value)
    }
}

impl From<&str> for NavParam {
    fn from(value: &str) -> Self {
        NavParam::Text(value.to_string())
    }
}

impl From<String> for NavParam {
    fn from(value: String) -> Self {
        NavParam::Text(value)
    }
}

impl std::fmt::Display for NavParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavParam::Int(value) => write!(f, "{}", value),
            NavParam::Text(value) => write!(f, "{:?}", value),
        }
    }
}
