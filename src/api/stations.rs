//! Station endpoints: CRUD, search, autosuggest and nearest-station lookup.

use super::{
    ApiClient,
    types::{ListResponse, Station, StationInput, StationSuggestion},
};
use crate::errors::AppError;
use reqwest::Method;

pub const STATIONS_PATH: &str = "/api/stations/";
pub const SEARCH_PATH: &str = "/api/stations/search/";
pub const AUTOSUGGEST_PATH: &str = "/api/stations/autosuggest/";
pub const NEAREST_PATH: &str = "/api/stations/nearest/";

fn station_path(id: &str) -> String {
    format!("{STATIONS_PATH}{}/", id.trim_matches('/'))
}

/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn list(client: &ApiClient) -> Result<Vec<Station>, AppError> {
    client
        .get_json::<ListResponse<Station>>(STATIONS_PATH)
        .await
        .map(ListResponse::into_items)
}

/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn get(client: &ApiClient, id: &str) -> Result<Station, AppError> {
    client.get_json(&station_path(id)).await
}

/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn create(client: &ApiClient, input: &StationInput) -> Result<Station, AppError> {
    client.post_json(STATIONS_PATH, input).await
}

/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn update(
    client: &ApiClient,
    id: &str,
    input: &StationInput,
) -> Result<Station, AppError> {
    client.send_json(Method::PUT, &station_path(id), input).await
}

/// # Errors
/// Returns network or HTTP errors.
pub async fn delete(client: &ApiClient, id: &str) -> Result<(), AppError> {
    client.delete(&station_path(id)).await
}

/// Full-text station search. An empty query returns no results without a
/// request.
///
/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn search(client: &ApiClient, query: &str) -> Result<Vec<Station>, AppError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    client
        .get_json_with_query::<ListResponse<Station>, _>(SEARCH_PATH, &[("q", query)])
        .await
        .map(ListResponse::into_items)
}

/// Name suggestions for the trip search inputs.
///
/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn autosuggest(
    client: &ApiClient,
    prefix: &str,
) -> Result<Vec<StationSuggestion>, AppError> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Ok(Vec::new());
    }
    client
        .get_json_with_query::<ListResponse<StationSuggestion>, _>(
            AUTOSUGGEST_PATH,
            &[("q", prefix)],
        )
        .await
        .map(ListResponse::into_items)
}

/// Stations around a coordinate, closest first as ordered by the API.
///
/// # Errors
/// Returns `AppError::Serialization` for out-of-range coordinates, otherwise
/// network, HTTP or parse errors.
pub async fn nearest(
    client: &ApiClient,
    latitude: f64,
    longitude: f64,
    radius_km: Option<f64>,
) -> Result<Vec<Station>, AppError> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::Serialization(format!(
            "coordinates out of range: {latitude},{longitude}"
        )));
    }

    let mut query = vec![("lat", latitude.to_string()), ("lng", longitude.to_string())];
    if let Some(radius) = radius_km {
        query.push(("radius", radius.to_string()));
    }
    client
        .get_json_with_query::<ListResponse<Station>, _>(NEAREST_PATH, &query)
        .await
        .map(ListResponse::into_items)
}
