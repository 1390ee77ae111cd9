//! Authenticated HTTP client builder.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{IntoUrl, RequestBuilder};

use crate::api_key::ProviderAuth;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Deadline for a whole request, response body included.
    pub timeout: Duration,
    /// Deadline for establishing a connection.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("provider-auth/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client that applies provider authentication to every request it builds.
///
/// Cloning is cheap: the connection pool and the authenticator are shared.
#[derive(Clone)]
pub struct AuthenticatedClient {
    client: reqwest::Client,
    auth: Option<Arc<dyn ProviderAuth>>,
}

impl AuthenticatedClient {
    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.authenticate(self.client.get(url))
    }

    pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.authenticate(self.client.post(url))
    }

    pub fn head<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.authenticate(self.client.head(url))
    }

    /// The underlying client, without authentication.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(auth) => auth.authenticate(request),
            None => request,
        }
    }
}

/// Builder for creating authenticated HTTP clients.
///
/// Provides a fluent API for constructing HTTP clients with:
/// - Authentication (API keys, bearer tokens)
/// - Request and connect deadlines
/// - A descriptive user agent
pub struct AuthenticatedClientBuilder {
    config: HttpClientConfig,
    auth: Option<Arc<dyn ProviderAuth>>,
}

impl AuthenticatedClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
            auth: None,
        }
    }

    /// Set the authentication provider.
    pub fn with_auth(mut self, auth: Box<dyn ProviderAuth>) -> Self {
        self.auth = Some(Arc::from(auth));
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.config.connect_timeout = connect_timeout;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    /// Build the configured HTTP client.
    pub fn build(self) -> Result<AuthenticatedClient, reqwest::Error> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(self.config.timeout)
            .connect_timeout(self.config.connect_timeout)
            .user_agent(self.config.user_agent)
            .build()?;

        Ok(AuthenticatedClient {
            client,
            auth: self.auth,
        })
    }
}

impl Default for AuthenticatedClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
