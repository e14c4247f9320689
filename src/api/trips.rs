//! Trip search (fare lookup), trip moderation and contributions.

use super::{
    ApiClient,
    types::{
        ContributionReceipt, ContributionRequest, ListResponse, TripDecision, TripQuote,
        TripRejection, TripSearch,
    },
};
use crate::errors::AppError;
use serde_json::json;

pub const SEARCH_PATH: &str = "/api/trips/search/";
pub const TRIPS_PATH: &str = "/api/trips/";
pub const CONTRIBUTIONS_PATH: &str = "/api/contributions/";

/// Looks up trips and fares between two stations.
///
/// # Errors
/// Returns `AppError::Serialization` when origin and destination are missing
/// or identical, otherwise network, HTTP or parse errors.
pub async fn search(client: &ApiClient, search: &TripSearch) -> Result<Vec<TripQuote>, AppError> {
    let origin = search.origin.trim();
    let destination = search.destination.trim();
    if origin.is_empty() || destination.is_empty() {
        return Err(AppError::Serialization(
            "origin and destination are required".to_string(),
        ));
    }
    if origin == destination {
        return Err(AppError::Serialization(
            "origin and destination must differ".to_string(),
        ));
    }

    client
        .get_json_with_query::<ListResponse<TripQuote>, _>(SEARCH_PATH, search)
        .await
        .map(ListResponse::into_items)
}

/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn approve(client: &ApiClient, trip_id: &str) -> Result<TripDecision, AppError> {
    client
        .post_json(&format!("{TRIPS_PATH}{trip_id}/approve/"), &json!({}))
        .await
}

/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn reject(
    client: &ApiClient,
    trip_id: &str,
    reason: &str,
) -> Result<TripDecision, AppError> {
    client
        .post_json(
            &format!("{TRIPS_PATH}{trip_id}/reject/"),
            &TripRejection {
                reason: reason.to_string(),
            },
        )
        .await
}

/// Submits a community contribution (new route, fare correction, ...).
///
/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn contribute(
    client: &ApiClient,
    request: &ContributionRequest,
) -> Result<ContributionReceipt, AppError> {
    client.post_json(CONTRIBUTIONS_PATH, request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ClientConfig, session::SessionStore};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> Result<ApiClient, AppError> {
        ApiClient::connect(ClientConfig::new(server.uri()), SessionStore::in_memory())
    }

    #[tokio::test]
    async fn search_rejects_same_origin_and_destination() -> Result<(), AppError> {
        let server = MockServer::start().await;
        let result = search(
            &client(&server)?,
            &TripSearch {
                origin: "1".to_string(),
                destination: " 1 ".to_string(),
                departure: None,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Serialization(_))));
        Ok(())
    }

    #[tokio::test]
    async fn search_returns_quotes() -> Result<(), AppError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH_PATH))
            .and(query_param("origin", "1"))
            .and(query_param("destination", "9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 77,
                "origin": 1,
                "destination": 9,
                "fare": "80.00",
                "currency": "KES",
                "duration_minutes": 35
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let quotes = search(
            &client(&server)?,
            &TripSearch {
                origin: "1".to_string(),
                destination: "9".to_string(),
                departure: None,
            },
        )
        .await?;
        assert_eq!(quotes[0].fare, "80.00");
        assert_eq!(quotes[0].duration_minutes, Some(35));
        Ok(())
    }

    #[tokio::test]
    async fn reject_sends_reason() -> Result<(), AppError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/trips/5/reject/"))
            .and(body_json(json!({ "reason": "duplicate" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": 5, "status": "rejected" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let decision = reject(&client(&server)?, "5", "duplicate").await?;
        assert_eq!(decision.status, "rejected");
        Ok(())
    }
}
