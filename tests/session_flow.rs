use anyhow::{Context, Result, ensure};
use axum::{
    body::Body,
    http::{
        Request, StatusCode,
        header::{COOKIE, LOCATION, SET_COOKIE},
    },
};
use base64ct::{Base64UrlUnpadded, Encoding};
use commuter::{
    api::{auth, wallet},
    auth::AuthState,
    cli::actions::ApiArgs,
    gateway,
    guard::{GuardConfig, GuardState},
    session::{ACCESS_TOKEN_KEY, EMAIL_KEY, REFRESH_TOKEN_KEY},
};
use secrecy::SecretString;
use serde_json::json;
use std::{
    path::PathBuf,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;
use ulid::Ulid;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token(label: &str, ttl_seconds: u64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs());
    let header = Base64UrlUnpadded::encode_string(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = json!({ "exp": now + ttl_seconds, "jti": label });
    let payload = Base64UrlUnpadded::encode_string(claims.to_string().as_bytes());
    format!("{header}.{payload}.signature")
}

fn temp_dir(name: &str) -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("commuter-{name}-{}", Ulid::new()));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn api_args(server: &MockServer, state_dir: &PathBuf) -> ApiArgs {
    ApiArgs {
        api_base_url: server.uri(),
        request_timeout_seconds: 5,
        state_dir: state_dir.clone(),
    }
}

#[tokio::test]
async fn session_survives_between_runs_until_logout() -> Result<()> {
    let server = MockServer::start().await;
    let state_dir = temp_dir("session")?;
    let access = token("a1", 3_600);

    Mock::given(method("POST"))
        .and(path(auth::LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": access,
            "refresh": "r1",
            "user": { "id": 1, "full_name": "Ada Rider", "email": "ada@example.com" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(auth::PROFILE_PATH))
        .and(header("authorization", format!("Bearer {access}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "full_name": "Ada Rider", "email": "ada@example.com"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(wallet::BALANCE_PATH))
        .and(header("authorization", format!("Bearer {access}").as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "balance": "12.50", "currency": "KES" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(auth::LOGOUT_PATH))
        .and(body_json(json!({ "refresh": "r1" })))
        .respond_with(ResponseTemplate::new(205))
        .expect(1)
        .mount(&server)
        .await;

    // first run: login
    let first = AuthState::new(api_args(&server, &state_dir).client()?);
    first
        .login(
            "ada@example.com",
            &SecretString::from("pw".to_string()),
            true,
        )
        .await?;

    // second run: the session is read back from disk
    let client = api_args(&server, &state_dir).client()?;
    let second = AuthState::new(client.clone());
    let snapshot = second.hydrate().await?;
    ensure!(snapshot.is_authenticated(), "session was not restored");
    let balance = wallet::balance(&client).await?;
    ensure!(balance.balance == "12.50", "unexpected balance {balance:?}");

    second.logout().await?;

    let third = api_args(&server, &state_dir).session_store();
    for medium in [third.cookies(), third.persistent()] {
        ensure!(medium.get(ACCESS_TOKEN_KEY)?.is_none(), "access token survived logout");
        ensure!(medium.get(REFRESH_TOKEN_KEY)?.is_none(), "refresh token survived logout");
    }
    ensure!(
        third.persistent().get(EMAIL_KEY)?.as_deref() == Some("ada@example.com"),
        "remembered email was dropped"
    );

    std::fs::remove_dir_all(&state_dir).context("cleanup")?;
    Ok(())
}

#[tokio::test]
async fn gateway_refreshes_rejected_cookie_and_redirects_without_one() -> Result<()> {
    let server = MockServer::start().await;
    let static_dir = temp_dir("static")?;
    std::fs::write(static_dir.join("index.html"), "<h1>wallet</h1>")?;
    let fresh = token("fresh", 900);

    Mock::given(method("POST"))
        .and(path(auth::VERIFY_PATH))
        .and(body_json(json!({ "token": "stale" })))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(auth::REFRESH_PATH))
        .and(body_json(json!({ "refresh": "r1" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access": fresh, "refresh": "r2" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = api_args(&server, &static_dir).client()?;
    let guard = GuardState::new(GuardConfig::new().with_verify_tokens(true))
        .with_verifier(Arc::new(client.token_endpoints()));
    let app = gateway::router(guard, Some(&static_dir));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/wallet")
                .header(COOKIE, "access_token=stale; refresh_token=r1")
                .body(Body::empty())?,
        )
        .await?;
    ensure!(response.status() == StatusCode::OK, "got {}", response.status());
    let set_cookies: Vec<String> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok().map(ToString::to_string))
        .collect();
    ensure!(
        set_cookies
            .iter()
            .any(|cookie| cookie.starts_with(&format!("access_token={fresh};"))),
        "missing refreshed access cookie: {set_cookies:?}"
    );
    ensure!(
        set_cookies.iter().any(|cookie| cookie.starts_with("refresh_token=r2;")),
        "missing refreshed refresh cookie: {set_cookies:?}"
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/trips/history?page=2")
                .body(Body::empty())?,
        )
        .await?;
    ensure!(response.status() == StatusCode::TEMPORARY_REDIRECT);
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    ensure!(
        location == "/login?redirect=%2Ftrips%2Fhistory%3Fpage%3D2",
        "unexpected location {location}"
    );

    std::fs::remove_dir_all(&static_dir).context("cleanup")?;
    Ok(())
}

#[tokio::test]
async fn gateway_redirects_when_verify_answers_forbidden() -> Result<()> {
    let server = MockServer::start().await;
    let static_dir = temp_dir("forbidden")?;
    std::fs::write(static_dir.join("index.html"), "<h1>wallet</h1>")?;

    Mock::given(method("POST"))
        .and(path(auth::VERIFY_PATH))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_args(&server, &static_dir).client()?;
    let guard = GuardState::new(GuardConfig::new().with_verify_tokens(true))
        .with_verifier(Arc::new(client.token_endpoints()));

    let response = gateway::router(guard, Some(&static_dir))
        .oneshot(
            Request::builder()
                .uri("/wallet")
                .header(COOKIE, "access_token=revoked")
                .body(Body::empty())?,
        )
        .await?;
    ensure!(
        response.status() == StatusCode::TEMPORARY_REDIRECT,
        "got {}",
        response.status()
    );

    std::fs::remove_dir_all(&static_dir).context("cleanup")?;
    Ok(())
}
