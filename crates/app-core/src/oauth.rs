//! A thin OAuth 2.0 authorization-code transport over the `oauth2` crate.
//!
//! It exposes the three things a provider adapter needs: the authorization
//! URL to send the browser to, the code-for-token exchange, and an HTTP
//! client that authenticates with the issued access token.

use std::fmt;

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use reqwest::{Client, ClientBuilder, redirect};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(#[from] oauth2::url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("OAuth token exchange failed: {0}")]
    TokenExchange(String),
}

/// Client registration and provider endpoints for one OAuth 2.0 provider.
#[derive(Clone, Default, Deserialize)]
pub struct OAuth2Options {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    #[serde(default)]
    pub auth_url: String,
    #[serde(default)]
    pub token_url: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl OAuth2Options {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>, redirect_url: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            ..Self::default()
        }
    }

    pub fn with_endpoints(mut self, auth_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Debug for OAuth2Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Options")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_url", &self.redirect_url)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Tokens issued by a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// An HTTP client that sends `Authorization: Bearer <access token>`.
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    http: Client,
    access_token: String,
}

impl AuthorizedClient {
    pub fn new(http: Client, access_token: impl Into<String>) -> Self {
        Self { http, access_token: access_token.into() }
    }

    pub async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Response, reqwest::Error> {
        self.http.get(url).query(query).bearer_auth(&self.access_token).send().await
    }
}

#[async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait OAuthTransport: Send + Sync {
    /// Builds the provider authorization URL carrying the given `state`.
    fn auth_code_url(&self, state: &str) -> String;

    /// Exchanges an authorization code for tokens at the token endpoint.
    async fn exchange(&self, code: &str) -> Result<OAuthToken, OAuthError>;

    /// Issues a client authenticated with the token's access token.
    fn client(&self, token: &OAuthToken) -> AuthorizedClient;
}

type ConfiguredClient = BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[derive(Debug, Clone)]
pub struct OAuth2Transport {
    client: ConfiguredClient,
    scopes: Vec<Scope>,
    http: Client,
}

impl OAuth2Transport {
    /// Validates every configured URL up front.
    pub fn new(opts: &OAuth2Options) -> Result<Self, OAuthError> {
        let client = BasicClient::new(ClientId::new(opts.client_id.clone()))
            .set_client_secret(ClientSecret::new(opts.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(opts.auth_url.clone())?)
            .set_token_uri(TokenUrl::new(opts.token_url.clone())?)
            .set_redirect_uri(RedirectUrl::new(opts.redirect_url.clone())?)
            .set_auth_type(AuthType::RequestBody);

        // Token endpoints must not be followed through redirects.
        let http = ClientBuilder::new().redirect(redirect::Policy::none()).build().map_err(|e| {
            tracing::error!("Failed to build HTTP client: {:?}", e);
            OAuthError::HttpClient(e)
        })?;

        let scopes = opts.scopes.iter().cloned().map(Scope::new).collect();

        Ok(Self { client, scopes, http })
    }
}

#[async_trait]
impl OAuthTransport for OAuth2Transport {
    fn auth_code_url(&self, state: &str) -> String {
        let state = CsrfToken::new(state.to_string());
        let (url, _) = self.client.authorize_url(|| state).add_scopes(self.scopes.iter().cloned()).url();

        url.to_string()
    }

    async fn exchange(&self, code: &str) -> Result<OAuthToken, OAuthError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| {
                let error_msg = match &e {
                    oauth2::RequestTokenError::ServerResponse(err) => match err.error_description() {
                        Some(description) => format!("{}: {}", err.error(), description),
                        None => err.error().to_string(),
                    },
                    oauth2::RequestTokenError::Parse(_, body) => match std::str::from_utf8(body) {
                        Ok(body_str) => format!("Parse error. Response body: {body_str}"),
                        Err(_) => "Parse error with non-UTF8 response".to_string(),
                    },
                    _ => format!("Token exchange error: {e:?}"),
                };
                tracing::error!("OAuth token exchange failed: {}", error_msg);
                OAuthError::TokenExchange(error_msg)
            })?;

        Ok(OAuthToken {
            access_token: token.access_token().secret().to_string(),
            refresh_token: token.refresh_token().map(|t| t.secret().to_string()),
        })
    }

    fn client(&self, token: &OAuthToken) -> AuthorizedClient {
        AuthorizedClient::new(self.http.clone(), token.access_token.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn options(server_uri: &str) -> OAuth2Options {
        OAuth2Options::new("client_id", "client_secret", "https://example.com/auth/callback")
            .with_endpoints(format!("{server_uri}/dialog/oauth"), format!("{server_uri}/oauth/access_token"))
    }

    #[test]
    fn test_invalid_redirect_url() {
        let opts = OAuth2Options::new("client_id", "client_secret", "invalid_url")
            .with_endpoints("https://example.com/auth", "https://example.com/token");

        let transport = OAuth2Transport::new(&opts);

        assert!(transport.is_err());
        assert!(matches!(transport.unwrap_err(), OAuthError::InvalidUrl(_)));
    }

    #[test]
    fn test_missing_endpoints() {
        let opts = OAuth2Options::new("client_id", "client_secret", "https://example.com/callback");

        assert!(matches!(OAuth2Transport::new(&opts).unwrap_err(), OAuthError::InvalidUrl(_)));
    }

    #[test]
    fn test_auth_code_url() {
        let opts = options("https://provider.test").with_scopes(["email", "public_profile"]);
        let transport = OAuth2Transport::new(&opts).unwrap();

        let url = transport.auth_code_url("");

        assert!(url.starts_with("https://provider.test/dialog/oauth?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client_id"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fexample.com%2Fauth%2Fcallback"));
        assert!(url.contains("scope=email+public_profile"));
        assert!(url.contains("state="));
        assert!(!url.contains("client_secret"));
    }

    #[test]
    fn test_auth_code_url_is_stable() {
        let transport = OAuth2Transport::new(&options("https://provider.test")).unwrap();

        assert_eq!(transport.auth_code_url(""), transport.auth_code_url(""));
    }

    #[test]
    fn test_options_debug_redacts_secret() {
        let opts = OAuth2Options::new("app-123", "s3cr3t", "https://example.com/auth/callback");

        let debug = format!("{opts:?}");

        assert!(debug.contains("app-123"));
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_exchange_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .and(body_string_contains("code=the_code"))
            .and(body_string_contains("client_secret=client_secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "A",
                "refresh_token": "R",
                "token_type": "bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = OAuth2Transport::new(&options(&server.uri())).unwrap();

        let token = transport.exchange("the_code").await.unwrap();

        assert_eq!(token, OAuthToken { access_token: "A".to_string(), refresh_token: Some("R".to_string()) });
    }

    #[tokio::test]
    async fn test_exchange_without_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "A", "token_type": "bearer"})),
            )
            .mount(&server)
            .await;

        let transport = OAuth2Transport::new(&options(&server.uri())).unwrap();

        let token = transport.exchange("the_code").await.unwrap();

        assert_eq!(token.access_token, "A");
        assert!(token.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_exchange_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "This authorization code has expired."
            })))
            .mount(&server)
            .await;

        let transport = OAuth2Transport::new(&options(&server.uri())).unwrap();

        let err = transport.exchange("expired").await.unwrap_err();

        match err {
            OAuthError::TokenExchange(msg) => assert!(msg.contains("invalid_grant")),
            other => panic!("Expected OAuthError::TokenExchange, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exchange_unparseable_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("access_token=A&expires=3600"))
            .mount(&server)
            .await;

        let transport = OAuth2Transport::new(&options(&server.uri())).unwrap();

        assert!(matches!(transport.exchange("code").await.unwrap_err(), OAuthError::TokenExchange(_)));
    }

    #[tokio::test]
    async fn test_authorized_client_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("authorization", "Bearer A"))
            .and(query_param("fields", "id"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = OAuth2Transport::new(&options(&server.uri())).unwrap();
        let client = transport.client(&OAuthToken { access_token: "A".to_string(), refresh_token: None });

        let response = client.get(&format!("{}/me", server.uri()), &[("fields", "id")]).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "ok");
    }
}
