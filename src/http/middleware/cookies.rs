//! Cookie parsing.
//!
//! Best effort: malformed pairs are skipped, never rejected.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use cookie::Cookie;

/// Cookies sent with the request, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies(Vec<(String, String)>);

impl Cookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let pairs = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| {
                Cookie::split_parse(value)
                    .filter_map(Result::ok)
                    .map(|c| (c.name().to_string(), c.value().to_string()))
                    .collect::<Vec<_>>()
            })
            .collect();
        Cookies(pairs)
    }

    /// Value of the first cookie named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub async fn cookie_middleware(mut req: Request, next: Next) -> Response {
    let cookies = Cookies::from_headers(req.headers());
    req.extensions_mut().insert(cookies);
    next.run(req).await
}

impl<S> FromRequestParts<S> for Cookies
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Cookies>()
            .cloned()
            .unwrap_or_else(|| Cookies::from_headers(&parts.headers)))
    }
}
