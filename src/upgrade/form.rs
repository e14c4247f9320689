//! The application being filled in: field values, validation and the
//! multipart submission.

use super::{FileCache, FieldKind, PollerConfig, Role, UpgradeError, VerificationPoller};
use crate::{
    api::{ApiClient, roles, types::RoleSubmissionReceipt},
    errors::AppError,
};
use reqwest::multipart::{Form, Part};
use std::{collections::BTreeMap, fmt, time::Duration};
use tracing::{info, instrument, warn};

/// Default delay between two verification status checks.
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 10;

#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadedFile {
    fn part(&self) -> Result<Part, AppError> {
        Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)
            .map_err(|err| {
                AppError::Serialization(format!(
                    "invalid content type `{}`: {err}",
                    self.content_type
                ))
            })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    File(UploadedFile),
}

impl FieldValue {
    fn is_present(&self) -> bool {
        match self {
            FieldValue::Text(text) => !text.trim().is_empty(),
            FieldValue::File(file) => !file.bytes.is_empty(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RoleUpgradeSubmission {
    role: Role,
    values: BTreeMap<&'static str, FieldValue>,
    submission_id: Option<String>,
    verified: bool,
    poll_interval: Duration,
}

impl RoleUpgradeSubmission {
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            values: BTreeMap::new(),
            submission_id: None,
            verified: false,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECONDS),
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.poll_interval = interval;
        }
        self
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn spec(&self, field: &str) -> Result<&'static super::FieldSpec, UpgradeError> {
        self.role
            .field(field)
            .ok_or_else(|| UpgradeError::UnknownField {
                role: self.role,
                field: field.to_string(),
            })
    }

    /// # Errors
    /// Returns `UnknownField` or `WrongKind` when `field` is not a text field
    /// of this role.
    pub fn set_text(&mut self, field: &str, value: impl Into<String>) -> Result<(), UpgradeError> {
        let spec = self.spec(field)?;
        if spec.kind != FieldKind::Text {
            return Err(UpgradeError::WrongKind {
                field: field.to_string(),
                expected: spec.kind,
            });
        }
        self.values.insert(spec.name, FieldValue::Text(value.into()));
        Ok(())
    }

    /// Sets a document or selfie. With a cache the file is also persisted so
    /// it can be restored later; a failing cache write is logged and ignored.
    ///
    /// # Errors
    /// Returns `UnknownField` or `WrongKind` when `field` is not a file field
    /// of this role.
    pub fn set_file(
        &mut self,
        field: &str,
        file: UploadedFile,
        cache: Option<&FileCache>,
    ) -> Result<(), UpgradeError> {
        let spec = self.spec(field)?;
        if !spec.kind.is_file() {
            return Err(UpgradeError::WrongKind {
                field: field.to_string(),
                expected: spec.kind,
            });
        }
        if let Some(cache) = cache
            && let Err(err) = cache.save(spec.name, &file)
        {
            warn!(field = spec.name, "failed to cache selected file: {err}");
        }
        self.values.insert(spec.name, FieldValue::File(file));
        Ok(())
    }

    /// Fills file fields that are still empty from the cache.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the cache cannot be read.
    pub fn restore_files(&mut self, cache: &FileCache) -> Result<usize, UpgradeError> {
        let mut restored = 0;
        for (field, file) in cache.restore(self.role)? {
            if !self.values.get(field).is_some_and(FieldValue::is_present) {
                self.values.insert(field, FieldValue::File(file));
                restored += 1;
            }
        }
        Ok(restored)
    }

    #[must_use]
    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Required fields still empty, in form order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.role
            .required_fields()
            .iter()
            .filter(|spec| !self.values.get(spec.name).is_some_and(FieldValue::is_present))
            .map(|spec| spec.name)
            .collect()
    }

    /// # Errors
    /// Returns `MissingField` naming the first required field without a value.
    pub fn validate(&self) -> Result<(), UpgradeError> {
        match self.missing_fields().first().copied() {
            Some(field) => Err(UpgradeError::MissingField {
                role: self.role,
                field,
            }),
            None => Ok(()),
        }
    }

    /// Multipart body: one part per field plus the role itself.
    ///
    /// # Errors
    /// Returns `AppError::Serialization` for an invalid content type.
    pub fn to_form(&self) -> Result<Form, AppError> {
        let mut form = Form::new().text("role", self.role.as_str());
        for spec in self.role.required_fields() {
            form = match self.values.get(spec.name) {
                Some(FieldValue::Text(text)) => form.text(spec.name, text.trim().to_string()),
                Some(FieldValue::File(file)) => form.part(spec.name, file.part()?),
                None => form,
            };
        }
        Ok(form)
    }

    /// Validates and sends the application. Nothing goes over the wire when a
    /// required field is missing. On success the cached files are dropped.
    ///
    /// # Errors
    /// Returns `MissingField` before any request, otherwise the API error.
    #[instrument(skip_all, fields(role = %self.role))]
    pub async fn submit(
        &mut self,
        client: &ApiClient,
        cache: Option<&FileCache>,
    ) -> Result<RoleSubmissionReceipt, UpgradeError> {
        self.validate()?;

        let receipt = roles::submit(client, self.role.as_str(), || self.to_form()).await?;
        info!(submission_id = %receipt.submission_id, "role upgrade submitted");

        self.submission_id = Some(receipt.submission_id.clone());
        self.verified = false;
        if let Some(cache) = cache
            && let Err(err) = cache.clear()
        {
            warn!("failed to clear cached files: {err}");
        }
        Ok(receipt)
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submission_id.is_some()
    }

    #[must_use]
    pub fn submission_id(&self) -> Option<&str> {
        self.submission_id.as_deref()
    }

    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn mark_verified(&mut self) {
        self.verified = true;
    }

    /// Starts polling the verification status of the sent application.
    ///
    /// # Errors
    /// Returns `NotSubmitted` before a successful [`submit`](Self::submit).
    pub fn start_polling(&self, client: &ApiClient) -> Result<VerificationPoller, UpgradeError> {
        let submission_id = self.submission_id.clone().ok_or(UpgradeError::NotSubmitted)?;
        Ok(VerificationPoller::start(
            client.clone(),
            submission_id,
            PollerConfig::new().with_interval(self.poll_interval),
        ))
    }
}
