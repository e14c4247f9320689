//! Wallet endpoints: balance, creation, deposits, preloading and history.

use super::{
    ApiClient,
    types::{DepositRequest, ListResponse, PreloadRequest, Transaction, WalletBalance},
};
use crate::errors::AppError;
use serde_json::json;

pub const BALANCE_PATH: &str = "/api/wallet/balance/";
pub const CREATE_PATH: &str = "/api/wallet/create/";
pub const DEPOSIT_PATH: &str = "/api/wallet/deposit/";
pub const PRELOAD_PATH: &str = "/api/wallet/preload/";
pub const TRANSACTIONS_PATH: &str = "/api/wallet/transactions/";

/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn balance(client: &ApiClient) -> Result<WalletBalance, AppError> {
    client.get_json(BALANCE_PATH).await
}

/// Creates the wallet for the signed-in user. Creating twice is rejected by
/// the API with 400.
///
/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn create(client: &ApiClient) -> Result<WalletBalance, AppError> {
    client.post_json(CREATE_PATH, &json!({})).await
}

/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn deposit(
    client: &ApiClient,
    amount: &str,
    reference: Option<&str>,
) -> Result<WalletBalance, AppError> {
    client
        .post_json(
            DEPOSIT_PATH,
            &DepositRequest {
                amount: amount.to_string(),
                reference: reference.map(ToString::to_string),
            },
        )
        .await
}

/// Moves funds onto the travel card balance.
///
/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn preload(client: &ApiClient, amount: &str) -> Result<WalletBalance, AppError> {
    client
        .post_json(
            PRELOAD_PATH,
            &PreloadRequest {
                amount: amount.to_string(),
            },
        )
        .await
}

/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn transactions(client: &ApiClient) -> Result<Vec<Transaction>, AppError> {
    client
        .get_json::<ListResponse<Transaction>>(TRANSACTIONS_PATH)
        .await
        .map(ListResponse::into_items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ClientConfig, session::SessionStore};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn deposit_posts_amount_and_reference() -> Result<(), AppError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(DEPOSIT_PATH))
            .and(body_json(json!({ "amount": "250.00", "reference": "MPESA-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "balance": "750.00",
                "currency": "KES"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::connect(ClientConfig::new(server.uri()), SessionStore::in_memory())?;
        let balance = deposit(&client, "250.00", Some("MPESA-1")).await?;
        assert_eq!(balance.balance, "750.00");
        Ok(())
    }

    #[tokio::test]
    async fn transactions_unwraps_pagination() -> Result<(), AppError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TRANSACTIONS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 2,
                "next": null,
                "results": [
                    { "id": 1, "type": "deposit", "amount": "100.00" },
                    { "id": 2, "type": "fare", "amount": -40, "status": "completed" }
                ]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::connect(ClientConfig::new(server.uri()), SessionStore::in_memory())?;
        let items = transactions(&client).await?;
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].kind, "fare");
        assert_eq!(items[1].amount, "-40");
        Ok(())
    }
}
