// Platform-specific camera capture and runtime permissions
//
// On Android this calls into MainActivity over JNI and polls for the result the
// activity stores once the user is done. Other platforms have no camera surface
// and no runtime permission dialog.

use crate::permissions::Permission;
use image::DynamicImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum PickerError {
    PermissionDenied(String),
    Timeout(String),
    Cancelled(String),
    PlatformNotSupported(String),
    Other(String),
}

impl std::fmt::Display for PickerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickerError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            PickerError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            PickerError::Cancelled(msg) => write!(f, "Cancelled: {}", msg),
            PickerError::PlatformNotSupported(msg) => write!(f, "Platform not supported: {}", msg),
            PickerError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for PickerError {}

const DEFAULT_MAIN_ACTIVITY_CLASS: &str = "dev/dioxus/main/MainActivity";

/// Configuration for the activity bridge on Android
#[derive(Debug, Clone)]
pub struct AndroidPickerConfig {
    /// Fully qualified class name in slash format (e.g., "com/example/myapp/MainActivity")
    pub main_activity_class: String,
    /// How long to wait for the user, in 100ms polls
    pub max_polls: u32,
}

impl Default for AndroidPickerConfig {
    fn default() -> Self {
        Self {
            main_activity_class: DEFAULT_MAIN_ACTIVITY_CLASS.to_string(),
            max_polls: 600,
        }
    }
}

/// Parses the `name=true|false` lines MainActivity reports after a permission dialog
pub fn parse_permission_result(result: &str) -> HashMap<Permission, bool> {
    result
        .lines()
        .filter_map(|line| {
            let (name, granted) = line.trim().split_once('=')?;
            let permission = Permission::from_manifest_name(name.trim())?;
            Some((permission, granted.trim() == "true"))
        })
        .collect()
}

#[cfg(target_os = "android")]
pub(crate) mod bridge {
    use super::{AndroidPickerConfig, PickerError};
    use jni::objects::{JClass, JObject, JString, JValue};
    use jni::{JNIEnv, JavaVM};

    fn jni_err(context: &str) -> impl Fn(jni::errors::Error) -> PickerError + '_ {
        move |e| PickerError::Other(format!("{} failed: {}", context, e))
    }

    pub fn java_vm() -> Result<JavaVM, PickerError> {
        let vm_ptr = ndk_context::android_context().vm() as *mut jni::sys::JavaVM;
        unsafe { JavaVM::from_raw(vm_ptr) }.map_err(jni_err("JavaVM"))
    }

    fn app_class_loader<'a>(env: &mut JNIEnv<'a>) -> Result<JObject<'a>, PickerError> {
        let at = env
            .call_static_method(
                "android/app/ActivityThread",
                "currentActivityThread",
                "()Landroid/app/ActivityThread;",
                &[],
            )
            .map_err(jni_err("currentActivityThread"))?
            .l()
            .map_err(jni_err("currentActivityThread"))?;
        let app = env
            .call_method(&at, "getApplication", "()Landroid/app/Application;", &[])
            .map_err(jni_err("getApplication"))?
            .l()
            .map_err(jni_err("getApplication"))?;
        if app.is_null() {
            return Err(PickerError::Other("Application not initialized".to_string()));
        }
        env.call_method(&app, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])
            .map_err(jni_err("getClassLoader"))?
            .l()
            .map_err(jni_err("getClassLoader"))
    }

    /// Loads the activity class through the app class loader (FindClass only
    /// sees system classes from a native thread) and fetches its instance.
    pub fn activity_instance<'a>(
        env: &mut JNIEnv<'a>,
        config: &AndroidPickerConfig,
    ) -> Result<(JObject<'a>, JClass<'a>), PickerError> {
        let loader = app_class_loader(env)?;
        let name: JString = env
            .new_string(config.main_activity_class.replace('/', "."))
            .map_err(jni_err("new_string"))?;
        let cls = env
            .call_method(
                &loader,
                "loadClass",
                "(Ljava/lang/String;)Ljava/lang/Class;",
                &[JValue::Object(&name)],
            )
            .map_err(jni_err("ClassLoader.loadClass"))?
            .l()
            .map_err(jni_err("ClassLoader.loadClass"))?;
        let cls = JClass::from(cls);

        let signature = format!("()L{};", config.main_activity_class);
        let instance = match env.call_static_method(&cls, "getInstance", &signature, &[]) {
            Ok(value) => value.l().map_err(jni_err("getInstance"))?,
            Err(_) => {
                if env.exception_check().unwrap_or(false) {
                    let _ = env.exception_clear();
                }
                // Kotlin companion without @JvmStatic
                let companion_signature = format!("L{}$Companion;", config.main_activity_class);
                let companion = env
                    .get_static_field(&cls, "Companion", &companion_signature)
                    .map_err(jni_err("Companion field"))?
                    .l()
                    .map_err(jni_err("Companion field"))?;
                if companion.is_null() {
                    return Err(PickerError::Other(
                        "MainActivity.Companion is null - activity not initialized?".to_string(),
                    ));
                }
                env.call_method(&companion, "getInstance", &signature, &[])
                    .map_err(jni_err("Companion.getInstance"))?
                    .l()
                    .map_err(jni_err("Companion.getInstance"))?
            }
        };

        if instance.is_null() {
            return Err(PickerError::Other(
                "MainActivity instance is null - activity not initialized?".to_string(),
            ));
        }
        Ok((instance, cls))
    }

    fn static_string<'a>(
        env: &mut JNIEnv<'a>,
        cls: &JClass<'a>,
        method: &str,
    ) -> Result<Option<String>, PickerError> {
        let obj = env
            .call_static_method(cls, method, "()Ljava/lang/String;", &[])
            .map_err(jni_err(method))?
            .l()
            .map_err(jni_err(method))?;
        if obj.is_null() {
            return Ok(None);
        }
        let value: String = env
            .get_string(&JString::from(obj))
            .map_err(jni_err("String conversion"))?
            .into();
        Ok(Some(value))
    }

    pub fn clear_last_error<'a>(env: &mut JNIEnv<'a>, cls: &JClass<'a>) -> Result<(), PickerError> {
        env.call_static_method(cls, "clearLastError", "()V", &[])
            .map_err(jni_err("clearLastError"))?;
        Ok(())
    }

    /// Polls `result_method` until the activity reports a value or an error
    pub fn poll_result<'a>(
        env: &mut JNIEnv<'a>,
        cls: &JClass<'a>,
        result_method: &str,
        config: &AndroidPickerConfig,
    ) -> Result<String, PickerError> {
        for _ in 0..config.max_polls {
            std::thread::sleep(std::time::Duration::from_millis(100));

            if let Some(result) = static_string(env, cls, result_method)? {
                return Ok(result);
            }
            if let Some(err) = static_string(env, cls, "getLastError")? {
                if err.to_ascii_lowercase().contains("cancel") {
                    return Err(PickerError::Cancelled(err));
                }
                return Err(PickerError::PermissionDenied(err));
            }
        }
        Err(PickerError::Timeout(format!(
            "{} - no answer from the activity",
            result_method
        )))
    }
}

/// Capture a photo using the camera
///
/// On Android, this launches the camera app and waits for the user to take a photo.
/// Returns the absolute path to the captured image.
#[cfg(target_os = "android")]
pub fn capture_photo() -> Result<PathBuf, PickerError> {
    capture_photo_with_config(&AndroidPickerConfig::default())
}

#[cfg(target_os = "android")]
pub fn capture_photo_with_config(config: &AndroidPickerConfig) -> Result<PathBuf, PickerError> {
    let vm = bridge::java_vm()?;
    let mut env = vm
        .attach_current_thread()
        .map_err(|e| PickerError::Other(format!("JNI attach failed: {}", e)))?;
    let (activity, main_cls) = bridge::activity_instance(&mut env, config)?;

    bridge::clear_last_error(&mut env, &main_cls)?;
    env.call_method(&activity, "launchCamera", "()V", &[])
        .map_err(|e| PickerError::Other(format!("launchCamera failed: {}", e)))?;

    bridge::poll_result(&mut env, &main_cls, "getLastPhotoPath", config).map(PathBuf::from)
}

/// Check a runtime permission
#[cfg(target_os = "android")]
pub fn has_permission(permission: Permission) -> Result<bool, PickerError> {
    use jni::objects::JValue;

    let config = AndroidPickerConfig::default();
    let vm = bridge::java_vm()?;
    let mut env = vm
        .attach_current_thread()
        .map_err(|e| PickerError::Other(format!("JNI attach failed: {}", e)))?;
    let (activity, _cls) = bridge::activity_instance(&mut env, &config)?;

    let name = env
        .new_string(permission.manifest_name())
        .map_err(|e| PickerError::Other(format!("new_string failed: {}", e)))?;
    let status = env
        .call_method(
            &activity,
            "checkSelfPermission",
            "(Ljava/lang/String;)I",
            &[JValue::Object(&name)],
        )
        .map_err(|e| PickerError::Other(format!("checkSelfPermission failed: {}", e)))?
        .i()
        .map_err(|e| PickerError::Other(format!("Int conversion failed: {}", e)))?;

    // PackageManager.PERMISSION_GRANTED
    Ok(status == 0)
}

/// Shows the permission dialog for `permissions` and returns the grant map
#[cfg(target_os = "android")]
pub fn request_permissions(
    permissions: &[Permission],
) -> Result<HashMap<Permission, bool>, PickerError> {
    use jni::objects::{JObject, JValue};

    if permissions.is_empty() {
        return Ok(HashMap::new());
    }

    let config = AndroidPickerConfig::default();
    let vm = bridge::java_vm()?;
    let mut env = vm
        .attach_current_thread()
        .map_err(|e| PickerError::Other(format!("JNI attach failed: {}", e)))?;
    let (activity, main_cls) = bridge::activity_instance(&mut env, &config)?;

    let jni_err = |e: jni::errors::Error| PickerError::Other(format!("JNI error: {}", e));
    let array = env
        .new_object_array(permissions.len() as i32, "java/lang/String", JObject::null())
        .map_err(jni_err)?;
    for (i, permission) in permissions.iter().enumerate() {
        let name = env.new_string(permission.manifest_name()).map_err(jni_err)?;
        env.set_object_array_element(&array, i as i32, &name)
            .map_err(jni_err)?;
    }

    bridge::clear_last_error(&mut env, &main_cls)?;
    env.call_method(
        &activity,
        "requestStoragePermissions",
        "([Ljava/lang/String;)V",
        &[JValue::Object(&array)],
    )
    .map_err(|e| PickerError::Other(format!("requestStoragePermissions failed: {}", e)))?;

    let result = bridge::poll_result(&mut env, &main_cls, "getLastPermissionResult", &config)?;
    Ok(parse_permission_result(&result))
}

#[cfg(not(target_os = "android"))]
pub fn capture_photo() -> Result<PathBuf, PickerError> {
    Err(PickerError::PlatformNotSupported(
        "Camera not available on this platform".to_string(),
    ))
}

/// Desktop builds have no runtime permissions
#[cfg(not(target_os = "android"))]
pub fn has_permission(_permission: Permission) -> Result<bool, PickerError> {
    Ok(true)
}

#[cfg(not(target_os = "android"))]
pub fn request_permissions(
    permissions: &[Permission],
) -> Result<HashMap<Permission, bool>, PickerError> {
    Ok(permissions.iter().map(|p| (*p, true)).collect())
}

/// Captures one image from the camera and decodes it.
///
/// `Ok(None)` means the user closed the camera without taking a photo. Where
/// there is no camera, `fallback` (if set) is read instead.
pub fn capture_image(fallback: Option<&Path>) -> Result<Option<DynamicImage>, PickerError> {
    let path = match capture_photo() {
        Ok(path) => path,
        Err(PickerError::Cancelled(msg)) => {
            log::debug!("Capture cancelled: {}", msg);
            return Ok(None);
        }
        Err(PickerError::PlatformNotSupported(msg)) => match fallback {
            Some(path) => {
                log::debug!("{}; using {:?}", msg, path);
                path.to_path_buf()
            }
            None => return Err(PickerError::PlatformNotSupported(msg)),
        },
        Err(e) => return Err(e),
    };

    image::open(&path)
        .map(Some)
        .map_err(|e| PickerError::Other(format!("Could not decode {:?}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_permission_result() {
        let grants = parse_permission_result(
            "android.permission.WRITE_EXTERNAL_STORAGE=true\n\
             android.permission.READ_EXTERNAL_STORAGE=false\n\
             android.permission.CAMERA=true\n",
        );
        assert_eq!(grants.len(), 2);
        assert_eq!(grants.get(&Permission::WriteExternalStorage), Some(&true));
        assert_eq!(grants.get(&Permission::ReadExternalStorage), Some(&false));
    }

    #[cfg(not(target_os = "android"))]
    #[test]
    fn test_capture_uses_fallback_off_device() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("fallback.png");
        image::RgbImage::new(5, 7).save(&path).unwrap();

        let image = capture_image(Some(&path)).unwrap().unwrap();
        assert_eq!((image.width(), image.height()), (5, 7));
    }

    #[cfg(not(target_os = "android"))]
    #[test]
    fn test_capture_without_camera_or_fallback() {
        assert!(matches!(
            capture_image(None),
            Err(PickerError::PlatformNotSupported(_))
        ));
    }
}
