//! Cookie header helpers for the guard.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue},
};

/// Value of cookie `name` from the request headers. Empty values count as
/// absent.
#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next()?.trim();
            let val = parts.next()?.trim();
            (key == name && !val.is_empty()).then(|| val.to_string())
        })
        .next()
}

/// `Set-Cookie` value for a token the web app reads on the client, so no
/// `HttpOnly`.
///
/// # Errors
/// Returns `InvalidHeaderValue` if `value` contains characters not allowed in
/// a header.
pub fn token_cookie(
    name: &str,
    value: &str,
    max_age_seconds: u64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; SameSite=Lax; Max-Age={max_age_seconds}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// # Errors
/// Returns `InvalidHeaderValue` if `name` is not a valid header token.
pub fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}=; Path=/; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Rewrites the request `Cookie` header so downstream handlers see `updates`
/// instead of the old values. Other cookies are kept in order.
///
/// # Errors
/// Returns `InvalidHeaderValue` if an updated value is not header-safe.
pub fn replace_cookies(
    headers: &mut HeaderMap,
    updates: &[(&str, &str)],
) -> Result<(), InvalidHeaderValue> {
    let mut pairs: Vec<(String, String)> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            Some((key.trim().to_string(), val.trim().to_string()))
        })
        .collect();

    for (name, value) in updates {
        match pairs.iter_mut().find(|(key, _)| key == name) {
            Some(pair) => pair.1 = (*value).to_string(),
            None => pairs.push(((*name).to_string(), (*value).to_string())),
        }
    }

    let joined = pairs
        .iter()
        .map(|(key, val)| format!("{key}={val}"))
        .collect::<Vec<_>>()
        .join("; ");
    headers.remove(COOKIE);
    headers.insert(COOKIE, HeaderValue::from_str(&joined)?);
    Ok(())
}
