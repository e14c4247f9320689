//! Role-upgrade flow: pick a role, fill its required fields (documents,
//! selfie, free text), submit them as one multipart request, then poll the
//! verification status until the submission is verified or rejected.
//!
//! Selected files are cached in the cookie medium so an interrupted form can
//! be restored, and camera streams opened for the selfie are always stopped
//! when the capture scope ends.

pub mod cache;
pub mod camera;
pub mod form;
pub mod poller;
pub mod roles;

pub use cache::FileCache;
pub use camera::{CameraSession, ImageFileDevice, MediaDevice, MediaStream, MediaTrack};
pub use form::{DEFAULT_POLL_INTERVAL_SECONDS, FieldValue, RoleUpgradeSubmission, UploadedFile};
pub use poller::{PollState, PollerConfig, StatusSource, VerificationPoller};
pub use roles::{FieldKind, FieldSpec, Role};

use crate::errors::AppError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpgradeError {
    #[error("{role} application is missing required field `{field}`")]
    MissingField { role: Role, field: &'static str },
    #[error("unknown role `{0}`")]
    UnknownRole(String),
    #[error("field `{field}` is not part of the {role} application")]
    UnknownField { role: Role, field: String },
    #[error("field `{field}` expects a {expected:?} value")]
    WrongKind { field: String, expected: FieldKind },
    #[error("camera error: {0}")]
    Camera(String),
    #[error("submission has not been sent yet")]
    NotSubmitted,
    #[error(transparent)]
    Api(#[from] AppError),
}
