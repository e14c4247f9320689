//! Request and response types for the commuter REST API.
//!
//! Every payload crossing the client boundary is decoded into one of these
//! types; unknown fields are ignored, missing required fields are a parse
//! error. Identifiers and money amounts arrive as either JSON numbers or
//! strings depending on the endpoint, so both are accepted and kept as text.
//! Token-bearing types redact their `Debug` output.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(value) => value,
        Raw::Int(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
    })
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "string_or_number")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(value)| value))
}

/// Access/refresh pair returned by login and refresh.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    #[serde(alias = "access_token")]
    pub access: String,
    #[serde(default, alias = "refresh_token")]
    pub refresh: Option<String>,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TokenPair")
            .field("access", &"[REDACTED]")
            .field("refresh", &self.refresh.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, alias = "name")]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "access_token")]
    pub access: String,
    #[serde(default, alias = "refresh_token")]
    pub refresh: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

impl LoginResponse {
    #[must_use]
    pub fn tokens(&self) -> TokenPair {
        TokenPair {
            access: self.access.clone(),
            refresh: self.refresh.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct RegisterRequest<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    pub password: &'a str,
}

#[derive(Serialize)]
pub struct VerifyTokenRequest<'a> {
    pub token: &'a str,
}

#[derive(Serialize)]
pub struct RefreshTokenRequest<'a> {
    pub refresh: &'a str,
}

/// A list endpoint answers either with a bare array or a paginated envelope.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paged {
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
    },
    Plain(Vec<T>),
}

impl<T> ListResponse<T> {
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListResponse::Paged { results, .. } | ListResponse::Plain(results) => results,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WalletBalance {
    #[serde(deserialize_with = "string_or_number")]
    pub balance: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub wallet_id: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DepositRequest {
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PreloadRequest {
    pub amount: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Transaction {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type", alias = "transaction_type", default)]
    pub kind: String,
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Station {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub distance_km: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StationInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StationSuggestion {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TripSearch {
    pub origin: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TripQuote {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub origin: String,
    #[serde(deserialize_with = "string_or_number")]
    pub destination: String,
    #[serde(deserialize_with = "string_or_number")]
    pub fare: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TripRejection {
    pub reason: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct TripDecision {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub status: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ContributionRequest {
    pub kind: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ContributionReceipt {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub message: String,
    #[serde(default, alias = "is_read")]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct RoleSubmissionReceipt {
    #[serde(alias = "id", deserialize_with = "string_or_number")]
    pub submission_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    Pending,
    Verified,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl VerificationState {
    /// Verified and rejected submissions never change again.
    #[must_use]
    pub fn is_final(self) -> bool {
        matches!(self, VerificationState::Verified | VerificationState::Rejected)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct VerificationStatus {
    pub status: VerificationState,
    #[serde(default)]
    pub message: Option<String>,
}
