//! Conversions between HTTP requests/responses and the auth [`Exchange`].

use std::collections::HashMap;

use axum::extract::Query;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use authgate_auth::Exchange;

/// Builds an exchange from request headers and query string.
pub fn exchange_from_parts(parts: &Parts) -> Exchange {
    let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(q)| q)
        .unwrap_or_default();
    Exchange::new(parts.headers.clone()).with_query(query)
}

/// Appends headers queued by the core (`Set-Cookie`) to a response.
pub fn with_headers(headers: HeaderMap, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    for (name, value) in headers.iter() {
        response.headers_mut().append(name, value.clone());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::SET_COOKIE;
    use axum::http::{HeaderValue, Request, StatusCode};

    #[test]
    fn test_query_is_copied() {
        let (parts, _) = Request::builder()
            .uri("/api/login?login-token=abc&x=")
            .body(())
            .unwrap()
            .into_parts();
        let exchange = exchange_from_parts(&parts);
        assert_eq!(exchange.query_value("login-token"), Some("abc"));
        assert_eq!(exchange.query_value("x"), None);
    }

    #[test]
    fn test_set_cookies_are_appended() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));

        let response = with_headers(headers, StatusCode::OK);
        assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 2);
    }
}
