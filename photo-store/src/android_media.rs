// MediaStore bridge over JNI
//
// Every call attaches the current thread, runs inside a local reference frame
// and talks to the activity's ContentResolver. Java exceptions are cleared
// before the next JNI call; a SecurityException on delete becomes a
// StoreError::SecurityDenied carrying the recovery intent when there is one.

use crate::error::StoreError;
use crate::media_index::MediaIndex;
use crate::models::{
    ConfirmationKind, ConfirmationRequest, ConfirmationResult, Locator, MediaRow, NewMediaEntry,
    SecurityDenial,
};
use crate::picker::{bridge, AndroidPickerConfig, PickerError};
use crate::platform::CollectionUri;
use jni::objects::{GlobalRef, JObject, JString, JValue};
use jni::JNIEnv;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

const READ_CHUNK: i32 = 64 * 1024;

pub struct AndroidMediaStore {
    config: AndroidPickerConfig,
    /// IntentSenders waiting to be shown, keyed by confirmation token
    pending: Mutex<HashMap<u64, GlobalRef>>,
    next_token: AtomicU64,
}

impl Default for AndroidMediaStore {
    fn default() -> Self {
        Self::new(AndroidPickerConfig::default())
    }
}

impl AndroidMediaStore {
    pub fn new(config: AndroidPickerConfig) -> Self {
        Self {
            config,
            pending: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    fn with_env<T>(
        &self,
        f: impl FnOnce(&mut JNIEnv) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let vm = bridge::java_vm()?;
        let mut env = vm.attach_current_thread()?;
        env.with_local_frame(32, |env| f(env))
    }

    fn keep_intent_sender(&self, env: &mut JNIEnv, sender: &JObject) -> Result<u64, StoreError> {
        let global = env.new_global_ref(sender)?;
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.pending
            .lock()
            .map_err(|_| StoreError::Other("Pending intent lock poisoned".to_string()))?
            .insert(token, global);
        Ok(token)
    }

    fn take_intent_sender(&self, token: u64) -> Result<Option<GlobalRef>, StoreError> {
        Ok(self
            .pending
            .lock()
            .map_err(|_| StoreError::Other("Pending intent lock poisoned".to_string()))?
            .remove(&token))
    }
}

/// Turns a pending Java exception into an error and clears it
fn java_exception(env: &mut JNIEnv, context: &str) -> StoreError {
    let message = match env.exception_occurred() {
        Ok(throwable) if !throwable.is_null() => {
            let _ = env.exception_clear();
            env.call_method(&throwable, "toString", "()Ljava/lang/String;", &[])
                .and_then(|v| v.l())
                .and_then(|obj| env.get_string(&JString::from(obj)).map(String::from))
                .unwrap_or_else(|_| "unknown exception".to_string())
        }
        _ => "JNI call failed".to_string(),
    };
    StoreError::Platform(format!("{}: {}", context, message))
}

/// Runs a JNI call, converting a thrown exception into a [`StoreError`]
fn call<'local, T>(
    env: &mut JNIEnv<'local>,
    context: &str,
    f: impl FnOnce(&mut JNIEnv<'local>) -> jni::errors::Result<T>,
) -> Result<T, StoreError> {
    match f(env) {
        Ok(value) => Ok(value),
        Err(jni::errors::Error::JavaException) => Err(java_exception(env, context)),
        Err(e) => Err(StoreError::Platform(format!("{}: {}", context, e))),
    }
}

fn content_resolver<'local>(env: &mut JNIEnv<'local>) -> Result<JObject<'local>, StoreError> {
    let context = unsafe {
        JObject::from_raw(ndk_context::android_context().context() as jni::sys::jobject)
    };
    call(env, "getContentResolver", |env| {
        env.call_method(
            &context,
            "getContentResolver",
            "()Landroid/content/ContentResolver;",
            &[],
        )?
        .l()
    })
}

fn parse_uri<'local>(env: &mut JNIEnv<'local>, uri: &str) -> Result<JObject<'local>, StoreError> {
    let uri = env.new_string(uri)?;
    call(env, "Uri.parse", |env| {
        env.call_static_method(
            "android/net/Uri",
            "parse",
            "(Ljava/lang/String;)Landroid/net/Uri;",
            &[JValue::Object(&uri)],
        )?
        .l()
    })
}

fn java_string(env: &mut JNIEnv, obj: JObject) -> Result<String, StoreError> {
    if obj.is_null() {
        return Ok(String::new());
    }
    Ok(env.get_string(&JString::from(obj))?.into())
}

fn put_string(
    env: &mut JNIEnv,
    values: &JObject,
    key: &str,
    value: &str,
) -> Result<(), StoreError> {
    let key = env.new_string(key)?;
    let value = env.new_string(value)?;
    call(env, "ContentValues.put", |env| {
        env.call_method(
            values,
            "put",
            "(Ljava/lang/String;Ljava/lang/String;)V",
            &[JValue::Object(&key), JValue::Object(&value)],
        )
        .map(|_| ())
    })
}

fn put_int(env: &mut JNIEnv, values: &JObject, key: &str, value: u32) -> Result<(), StoreError> {
    let key = env.new_string(key)?;
    let boxed = env.new_object("java/lang/Integer", "(I)V", &[JValue::Int(value as i32)])?;
    call(env, "ContentValues.put", |env| {
        env.call_method(
            values,
            "put",
            "(Ljava/lang/String;Ljava/lang/Integer;)V",
            &[JValue::Object(&key), JValue::Object(&boxed)],
        )
        .map(|_| ())
    })
}

/// Extracts `userAction.actionIntent.intentSender` from a RecoverableSecurityException
fn recovery_intent_sender<'local>(
    env: &mut JNIEnv<'local>,
    throwable: &JObject<'local>,
) -> Result<Option<JObject<'local>>, StoreError> {
    let recoverable =
        env.is_instance_of(throwable, "android/app/RecoverableSecurityException")?;
    if !recoverable {
        return Ok(None);
    }
    let sender = call(env, "RecoverableSecurityException.getUserAction", |env| {
        let action = env
            .call_method(throwable, "getUserAction", "()Landroid/app/RemoteAction;", &[])?
            .l()?;
        let intent = env
            .call_method(&action, "getActionIntent", "()Landroid/app/PendingIntent;", &[])?
            .l()?;
        env.call_method(&intent, "getIntentSender", "()Landroid/content/IntentSender;", &[])?
            .l()
    })?;
    Ok(if sender.is_null() { None } else { Some(sender) })
}

impl MediaIndex for AndroidMediaStore {
    fn insert(
        &self,
        collection: CollectionUri,
        entry: &NewMediaEntry,
    ) -> Result<Option<Locator>, StoreError> {
        self.with_env(|env| {
            let resolver = content_resolver(env)?;
            let collection_uri = parse_uri(env, collection.as_uri())?;
            let values = env.new_object("android/content/ContentValues", "()V", &[])?;
            put_string(env, &values, "_display_name", &entry.display_name)?;
            put_string(env, &values, "mime_type", &entry.mime_type)?;
            put_int(env, &values, "width", entry.width)?;
            put_int(env, &values, "height", entry.height)?;

            let uri = call(env, "ContentResolver.insert", |env| {
                env.call_method(
                    &resolver,
                    "insert",
                    "(Landroid/net/Uri;Landroid/content/ContentValues;)Landroid/net/Uri;",
                    &[JValue::Object(&collection_uri), JValue::Object(&values)],
                )?
                .l()
            })?;
            if uri.is_null() {
                return Ok(None);
            }

            let uri_string = call(env, "Uri.toString", |env| {
                env.call_method(&uri, "toString", "()Ljava/lang/String;", &[])?
                    .l()
            })?;
            Ok(Some(Locator::new(java_string(env, uri_string)?)))
        })
    }

    fn write_content(&self, locator: &Locator, bytes: &[u8]) -> Result<(), StoreError> {
        self.with_env(|env| {
            let resolver = content_resolver(env)?;
            let uri = parse_uri(env, locator.as_str())?;
            let stream = call(env, "ContentResolver.openOutputStream", |env| {
                env.call_method(
                    &resolver,
                    "openOutputStream",
                    "(Landroid/net/Uri;)Ljava/io/OutputStream;",
                    &[JValue::Object(&uri)],
                )?
                .l()
            })?;
            if stream.is_null() {
                return Err(StoreError::Platform(format!(
                    "No output stream for {}",
                    locator
                )));
            }

            let array = env.byte_array_from_slice(bytes)?;
            let written = call(env, "OutputStream.write", |env| {
                env.call_method(&stream, "write", "([B)V", &[JValue::Object(&array)])
                    .map(|_| ())
            });
            // The stream is closed on every path
            let closed = call(env, "OutputStream.close", |env| {
                env.call_method(&stream, "close", "()V", &[]).map(|_| ())
            });
            written.and(closed)
        })
    }

    fn read_content(&self, locator: &Locator) -> Result<Vec<u8>, StoreError> {
        self.with_env(|env| {
            let resolver = content_resolver(env)?;
            let uri = parse_uri(env, locator.as_str())?;
            let stream = call(env, "ContentResolver.openInputStream", |env| {
                env.call_method(
                    &resolver,
                    "openInputStream",
                    "(Landroid/net/Uri;)Ljava/io/InputStream;",
                    &[JValue::Object(&uri)],
                )?
                .l()
            })?;
            if stream.is_null() {
                return Err(StoreError::NotFound(locator.to_string()));
            }

            let buffer = env.new_byte_array(READ_CHUNK)?;
            let mut chunk = vec![0i8; READ_CHUNK as usize];
            let mut bytes = Vec::new();
            let result = loop {
                let read = call(env, "InputStream.read", |env| {
                    env.call_method(&stream, "read", "([B)I", &[JValue::Object(&buffer)])?
                        .i()
                });
                match read {
                    Ok(n) if n < 0 => break Ok(()),
                    Ok(n) => {
                        let n = n as usize;
                        env.get_byte_array_region(&buffer, 0, &mut chunk[..n])?;
                        bytes.extend(chunk[..n].iter().map(|b| *b as u8));
                    }
                    Err(e) => break Err(e),
                }
            };
            let closed = call(env, "InputStream.close", |env| {
                env.call_method(&stream, "close", "()V", &[]).map(|_| ())
            });
            result.and(closed).map(|()| bytes)
        })
    }

    fn query_images(&self, collection: CollectionUri) -> Result<Vec<MediaRow>, StoreError> {
        self.with_env(|env| {
            let resolver = content_resolver(env)?;
            let collection_uri = parse_uri(env, collection.as_uri())?;

            let columns = ["_id", "_display_name", "width", "height"];
            let projection =
                env.new_object_array(columns.len() as i32, "java/lang/String", JObject::null())?;
            for (i, column) in columns.iter().enumerate() {
                let name = env.new_string(column)?;
                env.set_object_array_element(&projection, i as i32, &name)?;
            }
            let sort_order = env.new_string("date_added DESC")?;

            let cursor = call(env, "ContentResolver.query", |env| {
                env.call_method(
                    &resolver,
                    "query",
                    "(Landroid/net/Uri;[Ljava/lang/String;Ljava/lang/String;[Ljava/lang/String;Ljava/lang/String;)Landroid/database/Cursor;",
                    &[
                        JValue::Object(&collection_uri),
                        JValue::Object(&projection),
                        JValue::Object(&JObject::null()),
                        JValue::Object(&JObject::null()),
                        JValue::Object(&sort_order),
                    ],
                )?
                .l()
            })?;
            if cursor.is_null() {
                return Ok(Vec::new());
            }

            let mut indices = [0i32; 4];
            for (slot, column) in indices.iter_mut().zip(columns) {
                let name = env.new_string(column)?;
                *slot = call(env, "Cursor.getColumnIndexOrThrow", |env| {
                    env.call_method(
                        &cursor,
                        "getColumnIndexOrThrow",
                        "(Ljava/lang/String;)I",
                        &[JValue::Object(&name)],
                    )?
                    .i()
                })?;
            }
            let [id_col, name_col, width_col, height_col] = indices;

            let mut rows = Vec::new();
            let read = (|| -> Result<(), StoreError> {
                while call(env, "Cursor.moveToNext", |env| {
                    env.call_method(&cursor, "moveToNext", "()Z", &[])?.z()
                })? {
                    let row = env.with_local_frame(8, |env| -> Result<MediaRow, StoreError> {
                        let id = call(env, "Cursor.getLong", |env| {
                            env.call_method(&cursor, "getLong", "(I)J", &[JValue::Int(id_col)])?
                                .j()
                        })?;
                        let name = call(env, "Cursor.getString", |env| {
                            env.call_method(
                                &cursor,
                                "getString",
                                "(I)Ljava/lang/String;",
                                &[JValue::Int(name_col)],
                            )?
                            .l()
                        })?;
                        let display_name = java_string(env, name)?;
                        let width = call(env, "Cursor.getInt", |env| {
                            env.call_method(&cursor, "getInt", "(I)I", &[JValue::Int(width_col)])?
                                .i()
                        })?;
                        let height = call(env, "Cursor.getInt", |env| {
                            env.call_method(&cursor, "getInt", "(I)I", &[JValue::Int(height_col)])?
                                .i()
                        })?;
                        Ok(MediaRow {
                            id,
                            display_name,
                            width: width.max(0) as u32,
                            height: height.max(0) as u32,
                        })
                    })?;
                    rows.push(row);
                }
                Ok(())
            })();
            let closed = call(env, "Cursor.close", |env| {
                env.call_method(&cursor, "close", "()V", &[]).map(|_| ())
            });
            read.and(closed).map(|()| rows)
        })
    }

    fn delete(&self, locator: &Locator) -> Result<usize, StoreError> {
        self.with_env(|env| {
            let resolver = content_resolver(env)?;
            let uri = parse_uri(env, locator.as_str())?;
            let result = env.call_method(
                &resolver,
                "delete",
                "(Landroid/net/Uri;Ljava/lang/String;[Ljava/lang/String;)I",
                &[
                    JValue::Object(&uri),
                    JValue::Object(&JObject::null()),
                    JValue::Object(&JObject::null()),
                ],
            );

            match result {
                Ok(value) => Ok(value.i()?.max(0) as usize),
                Err(jni::errors::Error::JavaException) => {
                    let throwable = env.exception_occurred()?;
                    env.exception_clear()?;
                    let security = env.is_instance_of(&throwable, "java/lang/SecurityException")?;
                    if !security {
                        let message = call(env, "Throwable.toString", |env| {
                            env.call_method(&throwable, "toString", "()Ljava/lang/String;", &[])?
                                .l()
                        })?;
                        return Err(StoreError::Platform(java_string(env, message)?));
                    }

                    let recovery_token = match recovery_intent_sender(env, &throwable)? {
                        Some(sender) => Some(self.keep_intent_sender(env, &sender)?),
                        None => None,
                    };
                    Err(StoreError::SecurityDenied(SecurityDenial {
                        locator: locator.clone(),
                        message: "SecurityException from ContentResolver.delete".to_string(),
                        recovery_token,
                    }))
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    fn create_delete_request(
        &self,
        locators: &[Locator],
    ) -> Result<ConfirmationRequest, StoreError> {
        let token = self.with_env(|env| {
            let resolver = content_resolver(env)?;
            let uris = env.new_object("java/util/ArrayList", "()V", &[])?;
            for locator in locators {
                let uri = parse_uri(env, locator.as_str())?;
                call(env, "ArrayList.add", |env| {
                    env.call_method(&uris, "add", "(Ljava/lang/Object;)Z", &[JValue::Object(&uri)])
                        .map(|_| ())
                })?;
            }

            let sender = call(env, "MediaStore.createDeleteRequest", |env| {
                let pending = env
                    .call_static_method(
                        "android/provider/MediaStore",
                        "createDeleteRequest",
                        "(Landroid/content/ContentResolver;Ljava/util/Collection;)Landroid/app/PendingIntent;",
                        &[JValue::Object(&resolver), JValue::Object(&uris)],
                    )?
                    .l()?;
                env.call_method(&pending, "getIntentSender", "()Landroid/content/IntentSender;", &[])?
                    .l()
            })?;
            self.keep_intent_sender(env, &sender)
        })?;

        Ok(ConfirmationRequest {
            locators: locators.to_vec(),
            kind: ConfirmationKind::DeleteRequest,
            token,
        })
    }

    fn present_confirmation(
        &self,
        request: &ConfirmationRequest,
    ) -> Result<ConfirmationResult, StoreError> {
        let sender = self.take_intent_sender(request.token)?.ok_or_else(|| {
            StoreError::NotFound(format!("No pending confirmation {}", request.token))
        })?;

        let vm = bridge::java_vm()?;
        let mut env = vm.attach_current_thread()?;
        let (activity, main_cls) = bridge::activity_instance(&mut env, &self.config)?;
        bridge::clear_last_error(&mut env, &main_cls)?;
        call(&mut env, "launchIntentSender", |env| {
            env.call_method(
                &activity,
                "launchIntentSender",
                "(Landroid/content/IntentSender;)V",
                &[JValue::Object(sender.as_obj())],
            )
            .map(|_| ())
        })?;

        match bridge::poll_result(&mut env, &main_cls, "getLastIntentResult", &self.config) {
            Ok(result) if result == "ok" => Ok(ConfirmationResult::Confirmed),
            Ok(_) | Err(PickerError::Cancelled(_)) | Err(PickerError::Timeout(_)) => {
                Ok(ConfirmationResult::Denied)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn apply_confirmation(&self, request: &ConfirmationRequest) -> Result<(), StoreError> {
        // The system already deleted the rows (delete request) or granted
        // access (recoverable action) when the user approved the intent.
        self.take_intent_sender(request.token)?;
        Ok(())
    }

    fn discard_confirmation(&self, token: u64) -> Result<(), StoreError> {
        self.take_intent_sender(token)?;
        Ok(())
    }
}
