//! Identifiers shared by the host model.

use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Processing element (PE) identifier within a host.
pub type PeId = u32;

/// Unique VM identity.
///
/// In contrast to the numeric VM id, which may be reused by different users, the uid identifies a VM across the whole
/// simulation and is kept when the VM migrates between hosts.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct VmUid(String);

impl VmUid {
    /// Creates uid in the conventional `<user id>-<vm id>` form.
    pub fn new(user_id: u32, vm_id: u32) -> Self {
        Self(format!("{}-{}", user_id, vm_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VmUid {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VmUid {
    fn from(uid: &str) -> Self {
        Self(uid.to_string())
    }
}

impl From<String> for VmUid {
    fn from(uid: String) -> Self {
        Self(uid)
    }
}
