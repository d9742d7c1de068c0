//! Which resources a pull or push covers

use std::fmt;

use crate::resource::{CodeType, ResourceId};
use crate::{Error, Result};

/// Resources covered by one sync invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncScope {
    /// Every app and driver
    All,
    /// Every resource of one type
    Type(CodeType),
    /// A single resource
    Resource(CodeType, ResourceId),
}

impl SyncScope {
    /// Build a scope from optional `[type] [id]` arguments.
    ///
    /// An id is only meaningful together with a type.
    pub fn new(kind: Option<CodeType>, id: Option<ResourceId>) -> Result<Self> {
        match (kind, id) {
            (None, None) => Ok(SyncScope::All),
            (Some(kind), None) => Ok(SyncScope::Type(kind)),
            (Some(kind), Some(id)) => Ok(SyncScope::Resource(kind, id)),
            (None, Some(id)) => Err(Error::InvalidId {
                value: format!("{id} (an id requires a type)"),
            }),
        }
    }

    /// Code types visited, in order.
    pub fn kinds(&self) -> Vec<CodeType> {
        match self {
            SyncScope::All => CodeType::ALL.to_vec(),
            SyncScope::Type(kind) | SyncScope::Resource(kind, _) => vec![*kind],
        }
    }

    pub fn includes(&self, kind: CodeType, id: ResourceId) -> bool {
        match self {
            SyncScope::All => true,
            SyncScope::Type(k) => *k == kind,
            SyncScope::Resource(k, i) => *k == kind && *i == id,
        }
    }
}

impl fmt::Display for SyncScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncScope::All => f.write_str("all"),
            SyncScope::Type(kind) => write!(f, "{kind}"),
            SyncScope::Resource(kind, id) => write!(f, "{kind} {id}"),
        }
    }
}
