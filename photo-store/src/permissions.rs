use crate::platform::StorageCapabilities;
use std::collections::HashMap;

/// Runtime permissions the galleries depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReadExternalStorage,
    WriteExternalStorage,
}

impl Permission {
    pub fn manifest_name(&self) -> &'static str {
        match self {
            Permission::ReadExternalStorage => "android.permission.READ_EXTERNAL_STORAGE",
            Permission::WriteExternalStorage => "android.permission.WRITE_EXTERNAL_STORAGE",
        }
    }

    pub fn from_manifest_name(name: &str) -> Option<Self> {
        match name {
            "android.permission.READ_EXTERNAL_STORAGE" => Some(Permission::ReadExternalStorage),
            "android.permission.WRITE_EXTERNAL_STORAGE" => Some(Permission::WriteExternalStorage),
            _ => None,
        }
    }
}

/// Read/write storage permissions held by the process.
///
/// The record is immutable; every grant event produces a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionState {
    pub read_granted: bool,
    pub write_granted: bool,
}

impl PermissionState {
    /// Derives the state from what the platform reports at startup. Write access
    /// counts as granted wherever the platform implies it.
    pub fn derive(has_read: bool, has_write: bool, caps: &StorageCapabilities) -> Self {
        Self {
            read_granted: has_read,
            write_granted: has_write || caps.implicit_write_permission,
        }
    }

    /// Permissions still to request, write first
    pub fn missing(&self) -> Vec<Permission> {
        let mut missing = Vec::new();
        if !self.write_granted {
            missing.push(Permission::WriteExternalStorage);
        }
        if !self.read_granted {
            missing.push(Permission::ReadExternalStorage);
        }
        missing
    }

    /// Merges the result of a permission dialog. Permissions absent from the
    /// grant map keep their previous value.
    pub fn with_grants(&self, grants: &HashMap<Permission, bool>) -> Self {
        Self {
            read_granted: grants
                .get(&Permission::ReadExternalStorage)
                .copied()
                .unwrap_or(self.read_granted),
            write_granted: grants
                .get(&Permission::WriteExternalStorage)
                .copied()
                .unwrap_or(self.write_granted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ApiLevel;

    #[test]
    fn test_write_is_implicit_on_scoped_storage() {
        let caps = StorageCapabilities::for_api_level(ApiLevel(30));
        let state = PermissionState::derive(false, false, &caps);
        assert!(state.write_granted);
        assert!(!state.read_granted);
        assert_eq!(state.missing(), vec![Permission::ReadExternalStorage]);
    }

    #[test]
    fn test_legacy_requests_both_write_first() {
        let caps = StorageCapabilities::for_api_level(ApiLevel(28));
        let state = PermissionState::derive(false, false, &caps);
        assert_eq!(
            state.missing(),
            vec![
                Permission::WriteExternalStorage,
                Permission::ReadExternalStorage
            ]
        );
    }

    #[test]
    fn test_grants_keep_absent_values() {
        let state = PermissionState {
            read_granted: false,
            write_granted: true,
        };
        let mut grants = HashMap::new();
        grants.insert(Permission::ReadExternalStorage, true);

        let updated = state.with_grants(&grants);
        assert!(updated.read_granted);
        assert!(updated.write_granted);
        // the previous record is untouched
        assert!(!state.read_granted);
    }

    #[test]
    fn test_denied_grant_overrides() {
        let state = PermissionState {
            read_granted: true,
            write_granted: true,
        };
        let grants = HashMap::from([(Permission::WriteExternalStorage, false)]);
        let updated = state.with_grants(&grants);
        assert!(updated.read_granted);
        assert!(!updated.write_granted);
    }

    #[test]
    fn test_manifest_names_round_trip() {
        for permission in [
            Permission::ReadExternalStorage,
            Permission::WriteExternalStorage,
        ] {
            assert_eq!(
                Permission::from_manifest_name(permission.manifest_name()),
                Some(permission)
            );
        }
    }
}
