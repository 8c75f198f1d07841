//! Authenticated request client
//!
//! Every call gets a bearer token from the [`TokenRefresher`]. A 401 triggers
//! one forced refresh and one replay; a second 401 ends in
//! `CoreError::Unauthenticated` plus a `LoginRequired` event. Other error
//! statuses and transport failures surface as-is, without retry.

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::event::{SessionEvent, SessionEvents};
use crate::refresher::TokenRefresher;
use crate::token_store::TokenStore;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AuthenticatedClient {
    refresher: Arc<TokenRefresher>,
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl AuthenticatedClient {
    pub fn new(
        refresher: Arc<TokenRefresher>,
        transport: Arc<dyn Transport>,
        config: ClientConfig,
    ) -> Self {
        Self {
            refresher,
            transport,
            config,
        }
    }

    /// Wire up store, transport and refresher from configuration
    pub fn from_config(config: ClientConfig) -> Result<Self, CoreError> {
        config.validate()?;

        let store = match &config.session_path {
            Some(path) => TokenStore::open(path)?,
            None => TokenStore::in_memory(),
        };
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.request_timeout)?);
        Ok(Self::with_transport(config, Arc::new(store), transport))
    }

    /// Same as [`from_config`](Self::from_config) with caller-supplied parts
    pub fn with_transport(
        config: ClientConfig,
        store: Arc<TokenStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let refresher = Arc::new(TokenRefresher::new(
            store,
            transport.clone(),
            &config,
            SessionEvents::default(),
        ));
        Self::new(refresher, transport, config)
    }

    pub fn refresher(&self) -> &Arc<TokenRefresher> {
        &self.refresher
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send an authorized request, replaying once after a 401
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse, CoreError> {
        let Some(token) = self.refresher.get_valid_access_token().await else {
            return Err(self.login_required(path, "no valid session"));
        };

        let url = self.config.endpoint(path);
        let response = self.send(method, &url, &body, &token).await?;
        if !response.is_unauthorized() {
            return check_status(response);
        }

        warn!(%method, path, "Request unauthorized, forcing token refresh");
        let Some(token) = self.refresher.force_refresh(&token).await else {
            return Err(self.login_required(path, "session could not be refreshed"));
        };

        let retried = self.send(method, &url, &body, &token).await?;
        if retried.is_unauthorized() {
            return Err(self.login_required(path, "request rejected after token refresh"));
        }
        check_status(retried)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CoreError> {
        let response = self.request(Method::Get, path, None).await?;
        decode(path, &response)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, CoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::Post, path, Some(encode(path, body)?))
            .await?;
        decode(path, &response)
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, CoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::Put, path, Some(encode(path, body)?))
            .await?;
        decode(path, &response)
    }

    /// DELETE; success bodies are often empty or plain text and are ignored
    pub async fn delete(&self, path: &str) -> Result<(), CoreError> {
        let response = self.request(Method::Delete, path, None).await?;
        if serde_json::from_str::<serde_json::Value>(&response.body).is_err() {
            debug!(path, "Non-JSON response for successful delete");
        }
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: &Option<serde_json::Value>,
        token: &str,
    ) -> Result<ApiResponse, CoreError> {
        let mut request = ApiRequest::new(method, url).with_bearer(token);
        if let Some(body) = body {
            request = request.with_body(body.clone());
        }
        self.transport.send(request).await
    }

    fn login_required(&self, path: &str, reason: &str) -> CoreError {
        warn!(path, reason, "Login required");
        self.refresher.events().publish(SessionEvent::LoginRequired {
            path: path.to_string(),
        });
        CoreError::unauthenticated(reason)
    }
}

fn check_status(response: ApiResponse) -> Result<ApiResponse, CoreError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(CoreError::RequestFailed {
            status: response.status,
            body: response.body,
        })
    }
}

fn encode<B: Serialize + ?Sized>(path: &str, body: &B) -> Result<serde_json::Value, CoreError> {
    serde_json::to_value(body).map_err(|source| CoreError::Decode {
        context: format!("request body for {path}"),
        source,
    })
}

fn decode<T: DeserializeOwned>(path: &str, response: &ApiResponse) -> Result<T, CoreError> {
    serde_json::from_str(&response.body).map_err(|source| CoreError::Decode {
        context: path.to_string(),
        source,
    })
}
