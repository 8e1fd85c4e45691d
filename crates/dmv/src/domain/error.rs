use app_core::oauth::OAuthError;
use thiserror::Error;

/// A failed step of the Facebook callback flow.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Facebook login was denied: {error} ({description})")]
    Denied { error: String, description: String },

    #[error("Missing authorization code")]
    MissingCode,

    #[error("Token exchange failed: {0}")]
    TokenExchange(#[source] OAuthError),

    #[error("Failed to fetch Facebook profile: {0}")]
    ProfileFetch(#[source] reqwest::Error),

    #[error("Failed to read Facebook profile response: {0}")]
    ProfileRead(#[source] reqwest::Error),

    #[error("Failed to decode Facebook profile: {0}")]
    ProfileDecode(#[source] serde_json::Error),
}

/// A login or callback path the router cannot mount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Route path must start with `/`: {0:?}")]
    NotAbsolute(String),

    #[error("Route path contains a capture or wildcard: {0:?}")]
    Pattern(String),
}
