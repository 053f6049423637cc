//! Type-safe wrappers for host target domain types.

use std::fmt;

use crate::error::{Error, Result};

/// Identifier of a volume exposed by the device under test.
///
/// Opaque to the service; fio receives it verbatim as an exercise target.
/// The `Ord` impl makes volume sets iterate in a stable order, which keeps
/// job file rendering deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VolumeId(String);

impl VolumeId {
    /// Construct a volume id from a raw request field.
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::EmptyVolumeId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
