use std::ops::Deref;
use std::sync::Arc;

use app_core::error::AppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::entity::facebook::AuthResult;

/// The [`AuthResult`] attached by [`auth_facebook`](crate::auth_facebook) on
/// the callback route.
#[derive(Debug, Clone)]
pub struct FacebookLogin(pub Arc<AuthResult>);

impl Deref for FacebookLogin {
    type Target = AuthResult;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for FacebookLogin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<AuthResult>>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Facebook login required.".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;

    use super::*;

    #[tokio::test]
    async fn test_extracts_attached_result() {
        let mut request = Request::builder().uri("/auth/callback/facebook").body(Body::empty()).unwrap();
        request.extensions_mut().insert(Arc::new(AuthResult::default()));
        let (mut parts, _) = request.into_parts();

        let login = FacebookLogin::from_request_parts(&mut parts, &()).await.unwrap();

        assert!(login.is_success());
        assert!(login.token.is_none());
    }

    #[tokio::test]
    async fn test_rejects_without_result() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (mut parts, _) = request.into_parts();

        let result = FacebookLogin::from_request_parts(&mut parts, &()).await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
