//! Per-license serialization of mutating operations.
//!
//! Every rights-consuming and protocol operation runs under a per-license
//! flag. A second caller does not queue: it fails fast with
//! [`LcpError::LicenseIsBusy`] so the UI can disable the action instead of
//! blocking. Distinct license ids proceed fully concurrently.

use crate::error::{LcpError, LcpResult};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Hands out at most one guard per license id at a time.
#[derive(Clone, Default)]
pub struct AccessCoordinator {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl AccessCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the flag for a license id, or fails immediately.
    ///
    /// The plain (non-async) mutex only protects the flag set itself and
    /// is never held across an await point; the returned guard is what
    /// spans the operation.
    pub fn try_acquire(&self, license_id: &str) -> LcpResult<LicenseGuard> {
        let mut in_flight = self.in_flight.lock().unwrap();
        if !in_flight.insert(license_id.to_string()) {
            return Err(LcpError::LicenseIsBusy(license_id.to_string()));
        }
        Ok(LicenseGuard {
            license_id: license_id.to_string(),
            in_flight: Arc::clone(&self.in_flight),
        })
    }
}

/// Exclusive access to one license id. Released unconditionally on drop,
/// whether the operation completed or failed.
pub struct LicenseGuard {
    license_id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for LicenseGuard {
    fn drop(&mut self) {
        self.in_flight.lock().unwrap().remove(&self.license_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_fast() {
        let coordinator = AccessCoordinator::new();
        let guard = coordinator.try_acquire("lic-1").unwrap();
        assert!(matches!(
            coordinator.try_acquire("lic-1"),
            Err(LcpError::LicenseIsBusy(_))
        ));
        drop(guard);
        assert!(coordinator.try_acquire("lic-1").is_ok());
    }

    #[test]
    fn distinct_ids_are_independent() {
        let coordinator = AccessCoordinator::new();
        let _one = coordinator.try_acquire("lic-1").unwrap();
        let _two = coordinator.try_acquire("lic-2").unwrap();
    }

    #[test]
    fn guard_releases_on_panic_unwind() {
        let coordinator = AccessCoordinator::new();
        let result = std::panic::catch_unwind({
            let coordinator = coordinator.clone();
            move || {
                let _guard = coordinator.try_acquire("lic-1").unwrap();
                panic!("operation failed");
            }
        });
        assert!(result.is_err());
        assert!(coordinator.try_acquire("lic-1").is_ok());
    }
}
