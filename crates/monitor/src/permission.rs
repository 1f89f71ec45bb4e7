//! Radio capability flag supplied by the platform layer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use proximity_core::error::CoreError;

/// Shared grant for the radio capability.
///
/// The platform grants or revokes it (e.g. when the user toggles a
/// system permission); the monitor only reads it. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RadioPermission {
    granted: Arc<AtomicBool>,
}

impl RadioPermission {
    pub fn granted() -> Self {
        let permission = Self::default();
        permission.grant();
        permission
    }

    pub fn denied() -> Self {
        Self::default()
    }

    pub fn grant(&self) {
        self.granted.store(true, Ordering::SeqCst);
    }

    pub fn revoke(&self) {
        self.granted.store(false, Ordering::SeqCst);
    }

    pub fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    pub fn ensure_granted(&self) -> Result<(), CoreError> {
        if self.is_granted() {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn clones_share_state() {
        let permission = RadioPermission::denied();
        let platform_side = permission.clone();

        assert_matches!(permission.ensure_granted(), Err(CoreError::PermissionDenied));
        platform_side.grant();
        assert!(permission.ensure_granted().is_ok());
        platform_side.revoke();
        assert!(!permission.is_granted());
    }
}
