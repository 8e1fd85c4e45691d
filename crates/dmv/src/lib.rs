//! Facebook OAuth2.0 login for axum applications.
//!
//! Install [`auth_facebook`] on two routes: the login route, which redirects
//! the browser to the Facebook login dialog, and the route matching the path
//! of the configured redirect URL. On the latter the authorization code is
//! exchanged for tokens, the user's profile is fetched from the Graph API,
//! and the outcome is handed to the next handler as a [`FacebookLogin`].
//!
//! ```no_run
//! use app_core::oauth::OAuth2Options;
//! use axum::http::StatusCode;
//! use axum::response::{IntoResponse, Redirect};
//!
//! async fn on_callback(login: dmv::FacebookLogin) -> impl IntoResponse {
//!     let Some(profile) = login.verified_profile() else {
//!         return (StatusCode::INTERNAL_SERVER_ERROR, "OAuth failure").into_response();
//!     };
//!     // Find or create the user by `profile.id` here.
//!     Redirect::to("/").into_response()
//! }
//!
//! # fn build() -> Result<axum::Router, Box<dyn std::error::Error>> {
//! let state = dmv::new(dmv::Dependency {
//!     options: OAuth2Options::new("oauth_id", "oauth_secret", "http://localhost:8080/auth/callback/facebook"),
//!     profile_url: None,
//! })?;
//! let app = dmv::create_router(state, "/auth/facebook", on_callback)?;
//! # Ok(app)
//! # }
//! ```
//!
//! Persisting users is left to the application.

mod domain;
mod inbound;
mod outbound;
mod usecase;

use std::sync::Arc;

use app_core::oauth::{OAuth2Options, OAuthError};
pub use domain::entity::facebook::{AuthResult, FacebookProfile, TokenResult};
pub use domain::error::{AuthError, RouteError};
pub use domain::inout::callback::CallbackInput;
pub use inbound::extractor::FacebookLogin;
pub use inbound::middleware::auth_facebook;
pub use inbound::router::create_router;
pub use inbound::state::FacebookState;
pub use outbound::graph::{FACEBOOK_PROFILE_URL, GraphClient};
pub use usecase::facebook::{FACEBOOK_AUTH_URL, FACEBOOK_TOKEN_URL, FacebookService, FacebookUseCase, callback_path};

pub struct Dependency {
    pub options: OAuth2Options,
    /// Overrides [`FACEBOOK_PROFILE_URL`].
    pub profile_url: Option<String>,
}

/// Builds the middleware state. Fails when any configured URL is malformed.
pub fn new(dep: Dependency) -> Result<FacebookState, OAuthError> {
    let graph = dep.profile_url.map(GraphClient::new).unwrap_or_default();
    let facebook = FacebookService::from_options(dep.options, graph)?;

    Ok(FacebookState::new(Arc::new(facebook)))
}
