//! # Request Extractors
//!
//! - [`SessionToken`] - the anonymous session cookie, issued on first contact
//! - [`JsonOrForm`] - a request body that may be JSON or form-encoded
//!
//! ```text
//! Cookie: storefront_session=3f0c...      ──► SessionToken { issued: false }
//! (no cookie / unreadable cookie)         ──► SessionToken { issued: true }
//!                                               └─► Set-Cookie on the response
//! ```

use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use axum::Form;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Session Cookie
// =============================================================================

/// The caller's session token.
///
/// Returned as part of a response so a freshly issued token reaches the
/// browser as `Set-Cookie`.
#[derive(Debug, Clone)]
pub struct SessionToken {
    token: String,
    issued: bool,
    cookie_name: String,
    max_age_secs: u64,
}

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// Whether the token was created for this request.
    pub fn is_new(&self) -> bool {
        self.issued
    }

    fn set_cookie_header(&self) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name, self.token, self.max_age_secs
        )
    }
}

/// Finds a cookie value by name across all `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

impl FromRequestParts<AppState> for SessionToken {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = &state.config.session;

        // Only well-formed tokens are honoured
        let existing = cookie_value(&parts.headers, &session.cookie_name)
            .and_then(|value| Uuid::parse_str(value).ok());

        let (token, issued) = match existing {
            Some(id) => (id.to_string(), false),
            None => {
                let id = Uuid::new_v4();
                debug!(session = %id, "Issuing new session token");
                (id.to_string(), true)
            }
        };

        Ok(SessionToken {
            token,
            issued,
            cookie_name: session.cookie_name.clone(),
            max_age_secs: session.ttl_secs,
        })
    }
}

impl IntoResponseParts for SessionToken {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if self.issued {
            if let Ok(value) = HeaderValue::from_str(&self.set_cookie_header()) {
                res.headers_mut().append(SET_COOKIE, value);
            }
        }
        Ok(res)
    }
}

// =============================================================================
// JSON or Form Body
// =============================================================================

/// A body accepted as `application/x-www-form-urlencoded` or JSON.
///
/// Anything that is not form-encoded is parsed as JSON. An empty body parses
/// as `{}`, so request types with all-optional fields accept bodiless posts.
#[derive(Debug, Clone)]
pub struct JsonOrForm<T>(pub T);

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(req.headers()) {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::validation(e.body_text()))?;
            return Ok(JsonOrForm(value));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;

        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };

        serde_json::from_slice(body)
            .map(JsonOrForm)
            .map_err(|e| ApiError::validation(format!("Invalid JSON body: {e}")))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
