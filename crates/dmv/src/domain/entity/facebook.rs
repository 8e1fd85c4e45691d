use app_core::oauth::OAuthToken;
use serde::Deserialize;

use crate::domain::error::AuthError;

/// A user's Facebook profile as returned by the Graph API `/me` endpoint.
///
/// Facebook omits fields the user has not shared or the app has no
/// permission for; those decode to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FacebookProfile {
    pub id: String,
    pub username: String,
    pub name: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub gender: String,
    pub link: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenResult {
    pub access_token: String,
    /// Empty when the provider issued no refresh token.
    pub refresh_token: String,
}

impl From<&OAuthToken> for TokenResult {
    fn from(token: &OAuthToken) -> Self {
        Self { access_token: token.access_token.clone(), refresh_token: token.refresh_token.clone().unwrap_or_default() }
    }
}

/// Outcome of one callback request.
///
/// When `errors` is non-empty the flow did not complete and `token` and
/// `profile` hold whatever was filled in before the failing step.
#[derive(Debug, Default)]
pub struct AuthResult {
    pub errors: Vec<AuthError>,
    pub token: Option<TokenResult>,
    pub profile: Option<FacebookProfile>,
}

impl AuthResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// The profile, only when the whole flow succeeded.
    pub fn verified_profile(&self) -> Option<&FacebookProfile> {
        self.profile.as_ref().filter(|_| self.is_success())
    }
}
