//! Device registry domain model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum number of distinct fingerprints a user may register.
pub const MAX_DEVICES: usize = 3;

/// A client device, identified by its fingerprint. Any other fields the
/// client sends are kept verbatim in `metadata`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceInfo {
    pub fingerprint: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl DeviceInfo {
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Which registry entries a removal applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    Fingerprint(String),
    All,
}

/// Versioned registry record as persisted in the cache store.
///
/// Every write bumps `version`; writers compare the raw stored value
/// before swapping so concurrent updates cannot silently overwrite each
/// other.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceRegistryRecord {
    pub version: u64,
    pub devices: Vec<DeviceInfo>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRegistry {
    Versioned(DeviceRegistryRecord),
    Legacy(Vec<DeviceInfo>),
}

impl DeviceRegistryRecord {
    /// Parse a stored record. A bare JSON array (the pre-versioning
    /// layout) is read as version 0.
    pub fn from_stored(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(match serde_json::from_str(raw)? {
            StoredRegistry::Versioned(record) => record,
            StoredRegistry::Legacy(devices) => Self {
                version: 0,
                devices,
            },
        })
    }

    pub fn to_stored(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.devices.iter().any(|d| d.fingerprint == fingerprint)
    }

    pub fn is_full(&self) -> bool {
        self.devices.len() >= MAX_DEVICES
    }

    /// The successor record holding `devices`.
    pub fn next(&self, devices: Vec<DeviceInfo>) -> Self {
        Self {
            version: self.version + 1,
            devices,
        }
    }
}
