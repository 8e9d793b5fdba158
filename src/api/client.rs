use super::wire::{
    into_articles, into_categories, ArticleDto, ErrorBody, PasswordReset, PriorityUpdate,
    TitleUpdate, UserDto,
};
use crate::config::Config;
use crate::error::OperationError;
use crate::model::{Article, Category};
use crate::util::{format_iso_date, is_loopback, validate_base_url, UrlValidationError};
use chrono::NaiveDate;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_RESPONSE_SIZE: usize = 1024 * 1024; // 1MB

/// Errors building an [`ApiClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    BaseUrl(#[from] UrlValidationError),
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Redirect policy: at most 3 hops, no loops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }
        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev == url) {
            return attempt.error("Redirect loop detected");
        }
        tracing::debug!(to = %url, hop = attempt.previous().len() + 1, "Following redirect");
        attempt.follow()
    })
}

/// Typed access to every backend endpoint.
///
/// Cheap to clone: the underlying `reqwest::Client` shares its connection pool.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<Arc<SecretString>>,
    timeout: Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = validate_base_url(base_url)?;

        if token.is_some() && base_url.scheme() == "http" && !is_loopback(&base_url) {
            tracing::warn!(
                base_url = %base_url,
                "Bearer token will be sent over plain HTTP"
            );
        }

        let http = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: token.map(Arc::new),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(
            &config.base_url,
            config.api_token(),
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ------------------------------------------------------------------------
    // Listing endpoints
    // ------------------------------------------------------------------------

    /// `GET /search_articles_by_date/{user_id}?fecha=YYYY-MM-DD`
    pub async fn articles_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Article>, OperationError> {
        let mut url = self.endpoint(&["search_articles_by_date", user_id])?;
        url.query_pairs_mut()
            .append_pair("fecha", &format_iso_date(date));
        let dtos: Option<Vec<ArticleDto>> = self.get_json(url).await?;
        Ok(into_articles(dtos))
    }

    /// `GET /articles/category/{category_id}`
    pub async fn articles_by_category(
        &self,
        category_id: &str,
    ) -> Result<Vec<Article>, OperationError> {
        let url = self.endpoint(&["articles", "category", category_id])?;
        let dtos: Option<Vec<ArticleDto>> = self.get_json(url).await?;
        Ok(into_articles(dtos))
    }

    /// `GET /articles/priority?id_usuario={user_id}`
    pub async fn priority_articles(&self, user_id: &str) -> Result<Vec<Article>, OperationError> {
        let mut url = self.endpoint(&["articles", "priority"])?;
        url.query_pairs_mut().append_pair("id_usuario", user_id);
        let dtos: Option<Vec<ArticleDto>> = self.get_json(url).await?;
        Ok(into_articles(dtos))
    }

    /// `GET /user/{user_id}`, keeping only its `categories`.
    pub async fn user_categories(&self, user_id: &str) -> Result<Vec<Category>, OperationError> {
        let url = self.endpoint(&["user", user_id])?;
        let user: Option<UserDto> = self.get_json(url).await?;
        Ok(into_categories(user.unwrap_or_default().categories))
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// `PUT /articles/{id}` with `{ "titulo": .. }`
    pub async fn update_title(&self, article_id: &str, title: &str) -> Result<(), OperationError> {
        let url = self.endpoint(&["articles", article_id])?;
        let request = self.json_request(Method::PUT, url, &TitleUpdate { titulo: title })?;
        self.send(self.authorize(request)).await.map(drop)
    }

    /// `PUT /articles/{id}/priority` with `{ "prioridad": bool }`
    pub async fn update_priority(
        &self,
        article_id: &str,
        prioritized: bool,
    ) -> Result<(), OperationError> {
        let url = self.endpoint(&["articles", article_id, "priority"])?;
        let body = PriorityUpdate {
            prioridad: prioritized,
        };
        let request = self.json_request(Method::PUT, url, &body)?;
        self.send(self.authorize(request)).await.map(drop)
    }

    /// `DELETE /articles/{id}`
    pub async fn delete_article(&self, article_id: &str) -> Result<(), OperationError> {
        let url = self.endpoint(&["articles", article_id])?;
        self.send(self.http.delete(url)).await.map(drop)
    }

    /// `POST /forgot-password` with `{ "correo_electronico": .. }`.
    ///
    /// The server mails reset instructions; nothing comes back but success.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), OperationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(OperationError::precondition(
                "Please enter a valid email address",
            ));
        }
        let url = self.endpoint(&["forgot-password"])?;
        let body = PasswordReset {
            correo_electronico: email,
        };
        let request = self.json_request(Method::POST, url, &body)?;
        self.send(request).await.map(drop)
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    /// Base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, OperationError> {
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(OperationError::precondition("Identifier must not be empty"));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| OperationError::precondition("Base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    fn json_request<B: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<RequestBuilder, OperationError> {
        Ok(self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, OperationError> {
        let bytes = self.send(self.http.get(url)).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_slice(b"null")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send, check the status, and read the body under the size cap.
    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, OperationError> {
        let request = request.build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        tracing::debug!(%method, url = %url, "Sending request");

        let response = tokio::time::timeout(self.timeout, self.http.execute(request))
            .await
            .map_err(|_| OperationError::Timeout(self.timeout.as_secs()))??;

        let status = response.status();
        if !status.is_success() {
            // Best effort: the body is only used for the message.
            let message = read_limited_bytes(response, MAX_RESPONSE_SIZE)
                .await
                .ok()
                .and_then(|bytes| serde_json::from_slice::<ErrorBody>(&bytes).ok())
                .and_then(ErrorBody::into_message);
            tracing::debug!(%method, url = %url, status = status.as_u16(), "Request rejected");
            return Err(OperationError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        read_limited_bytes(response, MAX_RESPONSE_SIZE).await
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, OperationError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(OperationError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(OperationError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
