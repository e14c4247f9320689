//! Cache of selected files so a half-filled application survives a restart.
//! Each file is stored as base64 JSON under `role_upgrade.<field>`.

use super::{Role, UploadedFile};
use crate::{
    errors::AppError,
    session::{KeyValueStore, SessionStore},
};
use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

pub const CACHE_KEY_PREFIX: &str = "role_upgrade.";

#[derive(Serialize, Deserialize)]
struct CachedFile {
    name: String,
    content_type: String,
    data: String,
}

#[derive(Clone)]
pub struct FileCache {
    store: Arc<dyn KeyValueStore>,
}

impl FileCache {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Cache living in the session's cookie medium.
    #[must_use]
    pub fn for_session(session: &SessionStore) -> Self {
        Self::new(session.cookies().clone())
    }

    #[must_use]
    pub fn key(field: &str) -> String {
        format!("{CACHE_KEY_PREFIX}{field}")
    }

    /// # Errors
    /// Returns `AppError::Serialization` or `AppError::Storage`.
    pub fn save(&self, field: &str, file: &UploadedFile) -> Result<(), AppError> {
        let cached = CachedFile {
            name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            data: Base64::encode_string(&file.bytes),
        };
        let raw = serde_json::to_string(&cached)
            .map_err(|err| AppError::Serialization(format!("Failed to encode cached file: {err}")))?;
        self.store.set(&Self::key(field), &raw)
    }

    /// Cached file for `field`. Unreadable entries are dropped.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the medium cannot be accessed.
    pub fn load(&self, field: &str) -> Result<Option<UploadedFile>, AppError> {
        let key = Self::key(field);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(None);
        };

        let decoded = serde_json::from_str::<CachedFile>(&raw)
            .map_err(|err| err.to_string())
            .and_then(|cached| {
                Base64::decode_vec(&cached.data)
                    .map(|bytes| UploadedFile {
                        file_name: cached.name,
                        content_type: cached.content_type,
                        bytes,
                    })
                    .map_err(|err| err.to_string())
            });

        match decoded {
            Ok(file) => Ok(Some(file)),
            Err(err) => {
                warn!(field, "dropping unreadable cached file: {err}");
                self.store.remove(&key)?;
                Ok(None)
            }
        }
    }

    /// Every cached file belonging to `role`'s file fields.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the medium cannot be accessed.
    pub fn restore(&self, role: Role) -> Result<Vec<(&'static str, UploadedFile)>, AppError> {
        let mut restored = Vec::new();
        for spec in role.required_fields().iter().filter(|spec| spec.kind.is_file()) {
            if let Some(file) = self.load(spec.name)? {
                restored.push((spec.name, file));
            }
        }
        debug!(role = %role, count = restored.len(), "restored cached files");
        Ok(restored)
    }

    /// Removes every cached role-upgrade file, whatever role it was for.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the medium cannot be accessed.
    pub fn clear(&self) -> Result<(), AppError> {
        for key in self.store.keys()? {
            if key.starts_with(CACHE_KEY_PREFIX) {
                self.store.remove(&key)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ACCESS_TOKEN_KEY, MemoryStore};

    fn license() -> UploadedFile {
        UploadedFile {
            file_name: "license.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![0x25, 0x50, 0x44, 0x46, 0x00, 0xff],
        }
    }

    #[test]
    fn saves_base64_json_under_prefixed_key() -> Result<(), AppError> {
        let store = Arc::new(MemoryStore::new());
        let cache = FileCache::new(store.clone());
        cache.save("license_document", &license())?;

        let raw = store.get("role_upgrade.license_document")?.unwrap_or_default();
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|err| AppError::Parse(err.to_string()))?;
        assert_eq!(value["name"], "license.pdf");
        assert_eq!(value["data"], "JVBERgD/");
        Ok(())
    }

    #[test]
    fn restore_returns_only_role_files() -> Result<(), AppError> {
        let cache = FileCache::new(Arc::new(MemoryStore::new()));
        cache.save("license_document", &license())?;
        cache.save("authorization_letter", &license())?;

        let restored = cache.restore(Role::Driver)?;
        assert_eq!(restored, vec![("license_document", license())]);
        Ok(())
    }

    #[test]
    fn corrupt_entries_are_dropped() -> Result<(), AppError> {
        let store = Arc::new(MemoryStore::new());
        store.set("role_upgrade.selfie", "{\"name\":\"a\",\"content_type\":\"b\",\"data\":\"***\"}")?;
        let cache = FileCache::new(store.clone());

        assert_eq!(cache.load("selfie")?, None);
        assert_eq!(store.get("role_upgrade.selfie")?, None);
        Ok(())
    }

    #[test]
    fn clear_leaves_other_keys() -> Result<(), AppError> {
        let session = SessionStore::in_memory();
        session.cookies().set(ACCESS_TOKEN_KEY, "token")?;
        let cache = FileCache::for_session(&session);
        cache.save("id_document", &license())?;
        cache.save("selfie", &license())?;

        cache.clear()?;
        assert_eq!(cache.load("id_document")?, None);
        assert_eq!(session.cookies().get(ACCESS_TOKEN_KEY)?, Some("token".to_string()));
        Ok(())
    }
}
