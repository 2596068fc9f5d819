use crate::error::AppError;
use photo_store::{has_permission, request_permissions, Permission, PermissionState, StorageCapabilities};

/// Reads the current grants from the platform
pub fn current_permissions(caps: &StorageCapabilities) -> PermissionState {
    let has_read = check(Permission::ReadExternalStorage);
    let has_write = check(Permission::WriteExternalStorage);
    PermissionState::derive(has_read, has_write, caps)
}

fn check(permission: Permission) -> bool {
    match has_permission(permission) {
        Ok(granted) => granted,
        Err(e) => {
            log::warn!("Could not check {}: {}", permission.manifest_name(), e);
            false
        }
    }
}

/// Asks for whatever `state` is missing and returns the merged state.
/// Without anything missing no dialog is shown.
pub fn request_missing(state: PermissionState) -> Result<PermissionState, AppError> {
    let missing = state.missing();
    if missing.is_empty() {
        return Ok(state);
    }
    log::info!("Requesting {} storage permission(s)", missing.len());
    let grants = request_permissions(&missing)?;
    Ok(state.with_grants(&grants))
}

/// Startup sequence: derive, then request the missing grants on a blocking thread
pub async fn init_permissions(caps: StorageCapabilities) -> PermissionState {
    let result = tokio::task::spawn_blocking(move || {
        let state = current_permissions(&caps);
        request_missing(state).unwrap_or_else(|e| {
            log::error!("Permission request failed: {}", e);
            state
        })
    })
    .await;
    match result {
        Ok(state) => state,
        Err(e) => {
            log::error!("Permission task failed: {}", e);
            PermissionState::default()
        }
    }
}

#[cfg(all(test, not(target_os = "android")))]
mod tests {
    use super::*;
    use photo_store::ApiLevel;

    #[test]
    fn test_desktop_grants_everything() {
        let caps = StorageCapabilities::for_api_level(ApiLevel(28));
        let state = current_permissions(&caps);
        assert!(state.read_granted);
        assert!(state.write_granted);
    }

    #[test]
    fn test_request_missing_merges_grants() {
        let state = PermissionState::default();
        let merged = request_missing(state).unwrap();
        assert_eq!(
            merged,
            PermissionState {
                read_granted: true,
                write_granted: true,
            }
        );
    }

    #[tokio::test]
    async fn test_init_permissions_on_scoped_storage() {
        let caps = StorageCapabilities::for_api_level(ApiLevel(30));
        let state = init_permissions(caps).await;
        assert!(state.write_granted);
    }
}
