use app_core::oauth::AuthorizedClient;

use crate::domain::entity::facebook::FacebookProfile;
use crate::domain::error::AuthError;

pub const FACEBOOK_PROFILE_URL: &str = "https://graph.facebook.com/me";

/// Graph API returns only `id` and `name` unless fields are listed explicitly.
/// `username` is no longer served and requesting it fails the whole call.
const PROFILE_FIELDS: &str = "id,name,first_name,middle_name,last_name,gender,link,email";

/// Client for the Facebook Graph API profile endpoint.
#[derive(Debug, Clone)]
pub struct GraphClient {
    profile_url: String,
}

impl GraphClient {
    pub fn new(profile_url: impl Into<String>) -> Self {
        Self { profile_url: profile_url.into() }
    }

    pub fn profile_url(&self) -> &str {
        &self.profile_url
    }

    /// Fetches and decodes the profile of the user the client is authorized for.
    ///
    /// The response is dropped, releasing its connection, on every return path.
    pub async fn fetch_profile(&self, client: &AuthorizedClient) -> Result<FacebookProfile, AuthError> {
        let response = client
            .get(&self.profile_url, &[("fields", PROFILE_FIELDS)])
            .await
            .and_then(|response| response.error_for_status())
            .map_err(AuthError::ProfileFetch)?;

        let body = response.bytes().await.map_err(AuthError::ProfileRead)?;

        serde_json::from_slice(&body).map_err(AuthError::ProfileDecode)
    }
}

impl Default for GraphClient {
    fn default() -> Self {
        Self::new(FACEBOOK_PROFILE_URL)
    }
}
