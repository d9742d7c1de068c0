//! Resource identity and type parsing
//!
//! Type strings from the command line are parsed exactly once, here, into
//! closed enums. Everything downstream works with [`CodeType`] or
//! [`ResourceType`] only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Remote-assigned resource identifier
pub type ResourceId = u64;

/// Code-bearing resource types, the only ones that are synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeType {
    App,
    Driver,
}

impl CodeType {
    /// Both code types, in the order bulk operations visit them.
    pub const ALL: [CodeType; 2] = [CodeType::App, CodeType::Driver];

    pub fn as_str(self) -> &'static str {
        match self {
            CodeType::App => "app",
            CodeType::Driver => "driver",
        }
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.parse::<ResourceType>()? {
            ResourceType::App => Ok(CodeType::App),
            ResourceType::Driver => Ok(CodeType::Driver),
            _ => Err(Error::InvalidType {
                value: s.to_string(),
            }),
        }
    }
}

/// Every resource type the hub lists.
///
/// Devices and installed apps are read-only listings outside the sync core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    App,
    Driver,
    Device,
    InstalledApp,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::App => "app",
            ResourceType::Driver => "driver",
            ResourceType::Device => "device",
            ResourceType::InstalledApp => "installedapp",
        }
    }

    /// The code type for synchronizable resources.
    pub fn code_type(self) -> Option<CodeType> {
        match self {
            ResourceType::App => Some(CodeType::App),
            ResourceType::Driver => Some(CodeType::Driver),
            ResourceType::Device | ResourceType::InstalledApp => None,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CodeType> for ResourceType {
    fn from(kind: CodeType) -> Self {
        match kind {
            CodeType::App => ResourceType::App,
            CodeType::Driver => ResourceType::Driver,
        }
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    /// Accepts singular and plural spellings, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "app" | "apps" => Ok(ResourceType::App),
            "driver" | "drivers" => Ok(ResourceType::Driver),
            "device" | "devices" => Ok(ResourceType::Device),
            "installedapp" | "installedapps" | "installed" => Ok(ResourceType::InstalledApp),
            _ => Err(Error::InvalidType {
                value: s.to_string(),
            }),
        }
    }
}

/// Parse a resource id argument.
pub fn parse_id(value: &str) -> Result<ResourceId> {
    value.trim().parse().map_err(|_| Error::InvalidId {
        value: value.to_string(),
    })
}

/// A code resource as listed by the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub kind: CodeType,
    pub name: String,
    pub namespace: String,
}
