use std::sync::Arc;

use axum::Form;
use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Query, Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::domain::inout::callback::CallbackInput;
use crate::inbound::state::FacebookState;

const MAX_FORM_BYTES: usize = 64 * 1024;
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Facebook login middleware, installed with
/// `axum::middleware::from_fn_with_state` on both the login route and the
/// callback route.
///
/// Any path other than the redirect URL's path is answered with `302 Found`
/// to the Facebook login dialog. On the callback path the login is completed
/// and an `Arc<AuthResult>` is attached to the request before the next handler
/// runs, whether the login succeeded or not. Read it with
/// [`FacebookLogin`](crate::FacebookLogin).
pub async fn auth_facebook(State(state): State<FacebookState>, req: Request, next: Next) -> Response {
    if req.uri().path() != state.facebook.callback_path() {
        tracing::info!(path = %req.uri().path(), "Redirecting to Facebook login dialog");
        return found(state.facebook.authorize_url());
    }

    let (mut req, input) = callback_input(req).await;
    let result = state.facebook.callback(input).await;
    req.extensions_mut().insert(Arc::new(result));

    next.run(req).await
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Reads the callback parameters from the query string and, for form posts,
/// from the body. The body is buffered and put back for the next handler.
async fn callback_input(req: Request) -> (Request, CallbackInput) {
    let query = match Query::<Vec<(String, String)>>::try_from_uri(req.uri()) {
        Ok(Query(pairs)) => CallbackInput::from_pairs(pairs),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to decode callback query string");
            CallbackInput::default()
        },
    };

    if !is_form_post(&req) {
        return (req, query);
    }

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_FORM_BYTES).await.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "Failed to read callback form body");
        Bytes::new()
    });
    let form = CallbackInput::from_pairs(form_pairs(bytes.clone()).await);

    (Request::from_parts(parts, Body::from(bytes)), query.merge(form))
}

async fn form_pairs(bytes: Bytes) -> Vec<(String, String)> {
    let mut req = Request::new(Body::from(bytes));
    *req.method_mut() = Method::POST;
    req.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));

    match Form::<Vec<(String, String)>>::from_request(req, &()).await {
        Ok(Form(pairs)) => pairs,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to decode callback form body");
            Vec::new()
        },
    }
}

fn is_form_post(req: &Request) -> bool {
    req.method() == Method::POST
        && req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE))
}
