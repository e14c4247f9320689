//! Role-upgrade endpoints: multipart application and verification status.

use super::{
    ApiClient,
    types::{RoleSubmissionReceipt, VerificationStatus},
};
use crate::errors::AppError;
use reqwest::multipart::Form;

pub const ROLES_PATH: &str = "/api/roles/";

#[must_use]
pub fn apply_path(role: &str) -> String {
    format!("{ROLES_PATH}{role}/apply/")
}

#[must_use]
pub fn status_path(submission_id: &str) -> String {
    format!("{ROLES_PATH}status/{submission_id}/")
}

/// # Errors
/// Returns form encoding, network, HTTP or parse errors.
pub async fn submit<F>(
    client: &ApiClient,
    role: &str,
    build_form: F,
) -> Result<RoleSubmissionReceipt, AppError>
where
    F: Fn() -> Result<Form, AppError>,
{
    client.post_multipart(&apply_path(role), build_form).await
}

/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn status(client: &ApiClient, submission_id: &str) -> Result<VerificationStatus, AppError> {
    client.get_json(&status_path(submission_id)).await
}
