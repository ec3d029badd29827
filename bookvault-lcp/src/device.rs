//! Device identity for license-server interactions.
//!
//! The register, renew and return calls all identify the device with a
//! stable id and a human-readable name, passed as query parameters.

use uuid::Uuid;

/// The identity this device presents to license servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceService {
    id: String,
    name: String,
}

impl DeviceService {
    /// Creates a device identity with explicit values. The id must stay
    /// stable across launches for the server to recognize the device.
    #[must_use]
    pub fn new(id: String, name: String) -> Self {
        Self { id, name }
    }

    /// Generates an identity with a random id and the machine hostname as
    /// the name. The caller is expected to persist the id and hand it back
    /// through [`Self::new`] on later launches.
    #[must_use]
    pub fn generate() -> Self {
        let name = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .unwrap_or_else(|| "unknown device".to_string());
        Self {
            id: Uuid::new_v4().to_string(),
            name,
        }
    }

    /// The stable device identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The human-readable device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The identity as protocol query parameters.
    #[must_use]
    pub fn as_query_parameters(&self) -> Vec<(&str, &str)> {
        vec![("id", self.id.as_str()), ("name", self.name.as_str())]
    }
}
