use axum::handler::Handler;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Router, middleware};

use crate::domain::error::RouteError;
use crate::inbound::middleware::auth_facebook;
use crate::inbound::state::FacebookState;

/// Mounts the login route at `login_path` and `on_callback` at the redirect
/// URL's path, both behind [`auth_facebook`]. `on_callback` reads the outcome
/// through [`FacebookLogin`](crate::FacebookLogin).
///
/// No callback route is mounted when the redirect URL has no usable path.
/// When both paths are the same, that path serves `on_callback`.
pub fn create_router<H, T>(state: FacebookState, login_path: &str, on_callback: H) -> Result<Router, RouteError>
where
    H: Handler<T, ()>,
    T: 'static,
{
    let callback_path = state.facebook.callback_path();
    let login_path = literal_path(login_path)?;

    let router = if callback_path.is_empty() {
        Router::new().route(login_path, get(login))
    } else if callback_path == login_path {
        Router::new().route(login_path, get(on_callback.clone()).post(on_callback))
    } else {
        Router::new()
            .route(login_path, get(login))
            .route(literal_path(&callback_path)?, get(on_callback.clone()).post(on_callback))
    };

    Ok(router.route_layer(middleware::from_fn_with_state(state, auth_facebook)))
}

/// Rejects paths axum would read as a pattern (or panic on).
fn literal_path(path: &str) -> Result<&str, RouteError> {
    if !path.starts_with('/') {
        return Err(RouteError::NotAbsolute(path.to_string()));
    }

    let pattern = path.contains(['{', '}'])
        || path.split('/').any(|segment| segment.starts_with(':') || segment.starts_with('*'));
    if pattern {
        return Err(RouteError::Pattern(path.to_string()));
    }

    Ok(path)
}

// The middleware answers the login route with a redirect before this runs.
async fn login() -> StatusCode {
    StatusCode::NOT_FOUND
}
