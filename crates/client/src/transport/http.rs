// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated HTTP client for the murmur API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::credential::{self, CredentialStore};
use crate::error::ClientError;
use crate::model::{Category, Message, Server, UserProfile};
use crate::transport::paths;

/// Request header carrying the anti-forgery token.
const CSRF_REQUEST_HEADER: &str = "X-CSRFToken";
/// Response header the server uses to rotate the anti-forgery token.
const CSRF_RESPONSE_HEADER: &str = "x-csrftoken";

/// Whether a request runs on the authenticated or the public path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Bearer + CSRF attach, one-shot refresh-and-retry on 401.
    Authenticated,
    /// Cookies only; a 401 is surfaced as-is.
    Public,
}

/// Filters for the server directory listing.
#[derive(Debug, Clone, Default)]
pub struct ServerFilter {
    pub category: Option<String>,
    pub by_serverid: Option<u64>,
}

impl ServerFilter {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(category) = &self.category {
            query.push(("category", category.clone()));
        }
        if let Some(id) = self.by_serverid {
            query.push(("by_serverid", id.to_string()));
        }
        query
    }
}

/// HTTP client wrapper for the murmur API.
///
/// Attaches credentials from the injected [`CredentialStore`], harvests
/// rotated tokens from responses, and owns the 401 refresh-and-retry
/// policy: at most one refresh-triggered retry per original request.
pub struct AuthHttpClient {
    base_url: String,
    http: reqwest::Client,
    store: Arc<CredentialStore>,
}

impl AuthHttpClient {
    pub fn new(base_url: String, store: Arc<CredentialStore>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { base_url: base_url.trim_end_matches('/').to_owned(), http, store }
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_credentials(&self, mut req: RequestBuilder, mode: Mode) -> RequestBuilder {
        if mode == Mode::Authenticated {
            if let Some(token) = self.store.access_token() {
                req = req.bearer_auth(token);
            }
            if let Some(csrf) = self.store.csrf_token() {
                req = req.header(CSRF_REQUEST_HEADER, csrf);
            }
        }
        if let Some(cookies) = self.store.cookie_header() {
            req = req.header(reqwest::header::COOKIE, cookies);
        }
        req
    }

    /// Issue a request and decode the JSON body.
    ///
    /// On the authenticated path a 401 triggers one token refresh followed
    /// by one retry of the original request with the fresh bearer; a second
    /// 401, or a refresh failure, clears all credentials and surfaces the
    /// original error. The retry flag is per original request, so a given
    /// request can never trigger more than one refresh cycle.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(&'static str, String)],
        mode: Mode,
    ) -> Result<Value, ClientError> {
        let mut retried = false;
        loop {
            let mut req = self.http.request(method.clone(), self.url(path));
            if !query.is_empty() {
                req = req.query(query);
            }
            if let Some(body) = body {
                req = req.json(body);
            }
            let resp = self.apply_credentials(req, mode).send().await?;

            if resp.status() == StatusCode::UNAUTHORIZED && mode == Mode::Authenticated {
                let original = read_error(resp).await;
                if retried {
                    self.store.clear_auth();
                    return Err(original);
                }
                retried = true;
                if let Err(refresh_err) = self.token_refresh().await {
                    tracing::debug!(err = %refresh_err, "token refresh failed");
                    self.store.clear_auth();
                    return Err(original);
                }
                continue;
            }

            return self.read_response(path, resp).await;
        }
    }

    /// Decode a response, harvesting rotated credentials on success.
    async fn read_response(&self, path: &str, resp: Response) -> Result<Value, ClientError> {
        let csrf = resp
            .headers()
            .get(CSRF_RESPONSE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let status = resp.status();

        if !status.is_success() {
            return Err(read_error(resp).await);
        }

        if let Some(csrf) = csrf {
            self.store.set(credential::CSRF_TOKEN, csrf, None);
        }

        let bytes = resp.bytes().await?;
        let value: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))?
        };

        self.harvest_tokens(&value);
        if path == paths::LOGOUT {
            self.store.clear_auth();
        }
        Ok(value)
    }

    /// Pull rotated tokens out of a response body into the store, with the
    /// documented expiries.
    pub(crate) fn harvest_tokens(&self, value: &Value) {
        if let Some(token) = value.get("access_token").and_then(Value::as_str) {
            self.store.store_access_token(token.to_owned());
        }
        if let Some(token) = value.get("refresh_token").and_then(Value::as_str) {
            self.store.store_refresh_token(token.to_owned());
        }
    }

    /// Authenticated request with a JSON body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        self.dispatch(method, path, body, &[], Mode::Authenticated).await
    }

    /// Public (cookie-only) request. No bearer, no refresh-and-retry.
    pub async fn request_public(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        self.dispatch(method, path, body, &[], Mode::Public).await
    }

    // -- Typed operations -----------------------------------------------

    /// `POST /login/` — obtains the token pair.
    pub async fn login(&self, email: &str, password: &str) -> Result<Value, ClientError> {
        let body = serde_json::json!({ "email": email, "password": password });
        self.dispatch(Method::POST, paths::LOGIN, Some(&body), &[], Mode::Authenticated).await
    }

    /// `POST /logout/` — the response harvest clears the credential group.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.dispatch(Method::POST, paths::LOGOUT, None, &[], Mode::Authenticated).await?;
        Ok(())
    }

    /// `GET /validate-session/` — fetch the current user.
    pub async fn validate_session(&self) -> Result<UserProfile, ClientError> {
        let value = self
            .dispatch(Method::GET, paths::VALIDATE_SESSION, None, &[], Mode::Authenticated)
            .await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// `POST /token-refresh/` — cookie-authenticated, never retried.
    ///
    /// Issued directly rather than through [`Self::dispatch`] so the 401
    /// path can never recurse into another refresh. The new access token is
    /// harvested into the store; callers re-read the store rather than this
    /// return value.
    pub async fn token_refresh(&self) -> Result<(), ClientError> {
        let req = self
            .http
            .post(self.url(paths::TOKEN_REFRESH))
            .json(&Value::Object(serde_json::Map::new()));
        let resp = self.apply_credentials(req, Mode::Public).send().await?;
        if !resp.status().is_success() {
            return Err(read_error(resp).await);
        }
        let bytes = resp.bytes().await?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))?;
        if value.get("access_token").and_then(Value::as_str).is_none() {
            return Err(ClientError::Decode("refresh response missing access_token".to_owned()));
        }
        self.harvest_tokens(&value);
        Ok(())
    }

    /// `POST /register/` — create an account. Field-keyed validation errors
    /// come back as `Status { message }`.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Value, ClientError> {
        let body = serde_json::json!({
            "email": email,
            "username": username,
            "password": password,
        });
        self.dispatch(Method::POST, paths::REGISTER, Some(&body), &[], Mode::Public).await
    }

    /// `GET /server/select/` — server directory, optionally filtered.
    pub async fn servers(&self, filter: &ServerFilter) -> Result<Vec<Server>, ClientError> {
        let value = self
            .dispatch(Method::GET, paths::SERVER_SELECT, None, &filter.query(), Mode::Public)
            .await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// `GET /server/category/` — category directory.
    pub async fn server_categories(&self) -> Result<Vec<Category>, ClientError> {
        let value =
            self.dispatch(Method::GET, paths::SERVER_CATEGORY, None, &[], Mode::Public).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// `GET /messages/?channel_id=` — channel history, oldest first.
    pub async fn channel_messages(&self, channel_id: u64) -> Result<Vec<Message>, ClientError> {
        let query = [("channel_id", channel_id.to_string())];
        let value = self.dispatch(Method::GET, paths::MESSAGES, None, &query, Mode::Public).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Consume an error response into the matching [`ClientError`].
async fn read_error(resp: Response) -> ClientError {
    let status = resp.status();
    let bytes = resp.bytes().await.unwrap_or_default();
    error_from_body(status, &bytes)
}

/// Build the error for a non-success status from the (possibly non-JSON,
/// possibly empty) response body.
fn error_from_body(status: StatusCode, bytes: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<Value>(bytes).ok().and_then(|v| server_message(&v));
    if status == StatusCode::UNAUTHORIZED {
        ClientError::Unauthorized { message }
    } else {
        ClientError::Status { status: status.as_u16(), message }
    }
}

/// Server-provided error text. `error` and `detail` carry whole-request
/// messages; validation failures come back field-keyed
/// (`{"email": ["taken"]}`) and surface as `field: message`.
fn server_message(value: &Value) -> Option<String> {
    if let Some(message) =
        value.get("error").or_else(|| value.get("detail")).and_then(Value::as_str)
    {
        return Some(message.to_owned());
    }
    let fields = value.as_object()?;
    fields.iter().find_map(|(field, errors)| {
        let first = match errors {
            Value::String(s) => s.as_str(),
            Value::Array(items) => items.first()?.as_str()?,
            _ => return None,
        };
        Some(format!("{field}: {first}"))
    })
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod http_tests;
