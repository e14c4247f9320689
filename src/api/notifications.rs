//! Notification endpoints.

use super::{
    ApiClient,
    types::{ListResponse, Notification},
};
use crate::errors::AppError;

pub const NOTIFICATIONS_PATH: &str = "/api/notifications/";
pub const READ_ALL_PATH: &str = "/api/notifications/read-all/";

/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn fetch(client: &ApiClient) -> Result<Vec<Notification>, AppError> {
    client
        .get_json::<ListResponse<Notification>>(NOTIFICATIONS_PATH)
        .await
        .map(ListResponse::into_items)
}

/// # Errors
/// Returns network or HTTP errors.
pub async fn mark_read(client: &ApiClient, id: &str) -> Result<(), AppError> {
    client
        .post_empty(&format!("{NOTIFICATIONS_PATH}{id}/read/"))
        .await
}

/// # Errors
/// Returns network or HTTP errors.
pub async fn mark_all_read(client: &ApiClient) -> Result<(), AppError> {
    client.post_empty(READ_ALL_PATH).await
}
