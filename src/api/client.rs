//! Blocking client for the mould-tracking backend.

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::api::error::ApiError;
use crate::api::form::MultipartForm;
use crate::api::resource::{HISTORY_LIMIT, Resource};
use crate::http_client;
use crate::listing::normalize_envelope;
use crate::models::{RegisterRequest, TokenResponse, UserInfo};
use crate::session::{Session, SessionStore};

const MAX_RESPONSE_BYTES: usize = 32 * 1024 * 1024;
const MAX_ERROR_BYTES: usize = 64 * 1024;
/// Cap for file downloads unless the caller picks another.
pub const DEFAULT_DOWNLOAD_LIMIT: usize = 50 * 1024 * 1024;

/// Query parameters for list requests. Filtering, sorting and paging happen
/// client side; only these reach the server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl ListQuery {
    /// The limit the collection's views normally ask for.
    pub fn for_resource(resource: Resource) -> Self {
        Self {
            limit: resource.default_limit(),
            search: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = (!search.trim().is_empty()).then_some(search);
        self
    }
}

/// Request body for create/update calls.
#[derive(Clone, Debug)]
pub enum Body {
    Form(MultipartForm),
    Json(Value),
}

pub struct ApiClient {
    base: Url,
    store: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, store: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = Url::parse(&normalized)
            .map_err(|err| ApiError::InvalidUrl(format!("{base_url}: {err}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "{base_url}: expected http or https"
            )));
        }
        Ok(Self { base, store })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn session(&self) -> Option<Session> {
        self.store.get()
    }

    /// Resolve `path` against the API base; absolute http(s) URLs pass through.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        let path = path.trim();
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).map_err(|err| ApiError::InvalidUrl(format!("{path}: {err}")));
        }
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::InvalidUrl(format!("{path}: {err}")))
    }

    /// Exchange credentials for a token, fetch the profile and store the
    /// session. A failed profile lookup is logged and login still succeeds.
    pub fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let url = self.url("auth/token")?;
        let response = http_client::agent()
            .request_url("POST", &url)
            .set("Accept", "application/json")
            .send_form(&[("username", username), ("password", password)])
            .map_err(map_ureq_error)?;
        let token: TokenResponse = decode_json(&read_body(response)?)?;
        if token.access_token.trim().is_empty() {
            return Err(ApiError::Json("Empty access_token in login response".into()));
        }

        let mut session = Session::new(token.access_token);
        session.username = Some(username.to_string());
        match self.fetch_user(&session.token, username) {
            Ok(user) => {
                session.role = user.role;
                session.user_id = user.id;
                if let Some(name) = user.username {
                    session.username = Some(name);
                }
            }
            Err(err) => tracing::warn!("Profile lookup for {username} failed: {err}"),
        }
        self.store.set(session.clone())?;
        tracing::info!("Logged in as {username}");
        Ok(session)
    }

    /// Profile of `username` using the stored session.
    pub fn whoami(&self, username: &str) -> Result<UserInfo, ApiError> {
        let token = self.store.token().ok_or(ApiError::Unauthorized)?;
        self.fetch_user(&token, username)
    }

    fn fetch_user(&self, token: &str, username: &str) -> Result<UserInfo, ApiError> {
        let path = format!(
            "auth/{}",
            url::form_urlencoded::byte_serialize(username.as_bytes()).collect::<String>()
        );
        let url = self.url(&path)?;
        let response = http_client::agent()
            .request_url("GET", &url)
            .set("Accept", "application/json")
            .set("Authorization", &format!("Bearer {}", token.trim()))
            .call()
            .map_err(map_ureq_error)?;
        decode_json(&read_body(response)?)
    }

    pub fn register(&self, username: &str, password: &str) -> Result<Value, ApiError> {
        let request = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.send_json("POST", "auth/", &request, false)
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.store.clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Rows of a collection, unwrapped from whatever envelope the server used.
    pub fn list(&self, resource: Resource, query: &ListQuery) -> Result<Vec<Value>, ApiError> {
        self.get_rows(resource.collection_path(), query)
    }

    /// Audit log entries of one record.
    pub fn history(&self, resource: Resource, id: &str) -> Result<Vec<Value>, ApiError> {
        let path = resource.history_path(id).ok_or_else(|| {
            ApiError::BadRequest(format!("{resource} records have no history"))
        })?;
        self.get_rows(&path, &ListQuery::default().with_limit(Some(HISTORY_LIMIT)))
    }

    pub fn get_item(&self, resource: Resource, id: &str) -> Result<Value, ApiError> {
        self.get_json(&resource.item_path(id), &ListQuery::default())
    }

    pub fn create(&self, resource: Resource, body: &Body) -> Result<Value, ApiError> {
        self.send_body("POST", resource.create_path(), body)
    }

    pub fn update(&self, resource: Resource, id: &str, body: &Body) -> Result<Value, ApiError> {
        self.send_body("PUT", &resource.item_path(id), body)
    }

    pub fn delete(&self, resource: Resource, id: &str) -> Result<(), ApiError> {
        let url = self.url(&resource.item_path(id))?;
        let response = self
            .authorized("DELETE", &url)?
            .call()
            .map_err(map_ureq_error)?;
        read_body(response)?;
        tracing::info!("Deleted {resource} {id}");
        Ok(())
    }

    /// Stream a stored file (photo, attachment) into `writer`, refusing
    /// bodies over `max_bytes`. Returns the number of bytes written.
    pub fn download(
        &self,
        path: &str,
        writer: &mut impl Write,
        max_bytes: usize,
    ) -> Result<u64, ApiError> {
        let url = self.url(path)?;
        let response = self
            .authorized("GET", &url)?
            .call()
            .map_err(map_ureq_error)?;
        http_client::copy_response_to_writer(response, writer, max_bytes)
            .map_err(|err| ApiError::Transport(err.to_string()))
    }

    pub(crate) fn get_rows(&self, path: &str, query: &ListQuery) -> Result<Vec<Value>, ApiError> {
        Ok(normalize_envelope(self.get_json(path, query)?))
    }

    pub(crate) fn get_json(&self, path: &str, query: &ListQuery) -> Result<Value, ApiError> {
        let mut url = self.url(path)?;
        if query.limit.is_some() || query.search.is_some() {
            let mut pairs = url.query_pairs_mut();
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(search) = &query.search {
                pairs.append_pair("search", search);
            }
        }
        let response = self
            .authorized("GET", &url)?
            .set("Accept", "application/json")
            .call()
            .map_err(map_ureq_error)?;
        decode_json(&read_body(response)?)
    }

    pub(crate) fn send_json<T: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: &T,
        authorized: bool,
    ) -> Result<R, ApiError> {
        let url = self.url(path)?;
        let request = if authorized {
            self.authorized(method, &url)?
        } else {
            http_client::agent().request_url(method, &url)
        };
        let response = request
            .set("Accept", "application/json")
            .send_json(body)
            .map_err(map_ureq_error)?;
        decode_optional_json(&read_body(response)?)
    }

    /// POST with no body, for action endpoints.
    pub(crate) fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path)?;
        let response = self
            .authorized("POST", &url)?
            .call()
            .map_err(map_ureq_error)?;
        read_body(response)?;
        Ok(())
    }

    fn send_body(&self, method: &str, path: &str, body: &Body) -> Result<Value, ApiError> {
        match body {
            Body::Json(value) => self.send_json(method, path, value, true),
            Body::Form(form) => {
                let url = self.url(path)?;
                let (content_type, bytes) = form.encode();
                let response = self
                    .authorized(method, &url)?
                    .set("Accept", "application/json")
                    .set("Content-Type", &content_type)
                    .send_bytes(&bytes)
                    .map_err(map_ureq_error)?;
                decode_optional_json(&read_body(response)?)
            }
        }
    }

    /// Request carrying the stored bearer token. Without a session the call
    /// fails before touching the network.
    fn authorized(&self, method: &str, url: &Url) -> Result<ureq::Request, ApiError> {
        let token = self.store.token().ok_or(ApiError::Unauthorized)?;
        Ok(http_client::agent()
            .request_url(method, url)
            .set("Authorization", &format!("Bearer {}", token.trim())))
    }
}

pub(crate) fn map_ureq_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = http_client::read_response_text(response, MAX_ERROR_BYTES)
                .unwrap_or_default();
            ApiError::from_status(code, &body)
        }
        ureq::Error::Transport(err) => ApiError::Transport(err.to_string()),
    }
}

fn read_body(response: ureq::Response) -> Result<String, ApiError> {
    http_client::read_response_text(response, MAX_RESPONSE_BYTES)
        .map_err(|err| ApiError::Transport(err.to_string()))
}

fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body.trim()).map_err(|err| ApiError::Json(err.to_string()))
}

/// Like [`decode_json`], treating an empty body as JSON `null`.
fn decode_optional_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    if body.trim().is_empty() {
        return serde_json::from_value(Value::Null).map_err(|err| ApiError::Json(err.to_string()));
    }
    decode_json(body)
}
