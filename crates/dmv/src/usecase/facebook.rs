use std::sync::Arc;

use app_core::oauth::{OAuth2Options, OAuth2Transport, OAuthError, OAuthTransport};
use async_trait::async_trait;
use reqwest::Url;

use crate::domain::entity::facebook::{AuthResult, TokenResult};
use crate::domain::error::AuthError;
use crate::domain::inout::callback::CallbackInput;
use crate::outbound::graph::GraphClient;

pub const FACEBOOK_AUTH_URL: &str = "https://www.facebook.com/dialog/oauth";
pub const FACEBOOK_TOKEN_URL: &str = "https://graph.facebook.com/oauth/access_token";

/// Path component of the redirect URL, or an empty string when it does not
/// parse. Request paths are never empty, so an empty callback path means every
/// request takes the redirect branch.
pub fn callback_path(redirect_url: &str) -> String {
    Url::parse(redirect_url).map(|url| url.path().to_string()).unwrap_or_default()
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait FacebookUseCase: Send + Sync {
    /// Path of the redirect URL; requests on it are callbacks.
    fn callback_path(&self) -> String;

    /// Facebook login dialog URL. The `state` parameter is always empty.
    fn authorize_url(&self) -> String;

    /// Completes the login for a callback request. Never fails as a whole:
    /// a failing step is recorded in [`AuthResult::errors`].
    async fn callback(&self, input: CallbackInput) -> AuthResult;
}

#[derive(Clone)]
pub struct FacebookService {
    transport: Arc<dyn OAuthTransport>,
    graph: GraphClient,
    callback_path: String,
}

impl FacebookService {
    pub fn new(transport: Arc<dyn OAuthTransport>, graph: GraphClient, redirect_url: &str) -> Self {
        Self { transport, graph, callback_path: callback_path(redirect_url) }
    }

    /// Builds the service from client options, filling in Facebook's
    /// authorization and token endpoints where the options leave them empty.
    pub fn from_options(mut options: OAuth2Options, graph: GraphClient) -> Result<Self, OAuthError> {
        if options.auth_url.is_empty() {
            options.auth_url = FACEBOOK_AUTH_URL.to_string();
        }
        if options.token_url.is_empty() {
            options.token_url = FACEBOOK_TOKEN_URL.to_string();
        }

        let transport = OAuth2Transport::new(&options)?;
        tracing::info!(
            redirect_url = %options.redirect_url,
            profile_url = %graph.profile_url(),
            "Facebook login configured"
        );

        Ok(Self::new(Arc::new(transport), graph, &options.redirect_url))
    }

    async fn complete(&self, input: CallbackInput, result: &mut AuthResult) -> Result<(), AuthError> {
        if let Some(error) = input.error {
            return Err(AuthError::Denied { error, description: input.error_description.unwrap_or_default() });
        }

        let code = input.code.filter(|code| !code.is_empty()).ok_or(AuthError::MissingCode)?;

        let token = self.transport.exchange(&code).await.map_err(AuthError::TokenExchange)?;
        result.token = Some(TokenResult::from(&token));

        let client = self.transport.client(&token);
        result.profile = Some(self.graph.fetch_profile(&client).await?);

        Ok(())
    }
}

#[async_trait]
impl FacebookUseCase for FacebookService {
    fn callback_path(&self) -> String {
        self.callback_path.clone()
    }

    fn authorize_url(&self) -> String {
        self.transport.auth_code_url("")
    }

    async fn callback(&self, input: CallbackInput) -> AuthResult {
        let mut result = AuthResult::default();

        match self.complete(input, &mut result).await {
            Ok(()) => tracing::info!(
                facebook_id = result.profile.as_ref().map(|p| p.id.as_str()).unwrap_or_default(),
                "Facebook login completed"
            ),
            Err(err) => {
                tracing::warn!(error = %err, "Facebook login failed");
                result.errors.push(err);
            },
        }

        result
    }
}
