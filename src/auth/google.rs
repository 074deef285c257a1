//! Google sign-in using the OAuth 2.0 authorization code flow with PKCE.
//!
//! [`GoogleOAuth::authorize_url`] builds the consent-screen URL and records the
//! CSRF state together with its PKCE verifier in `oauth_states`.
//! [`GoogleOAuth::exchange_code`] redeems that state exactly once, trades the
//! code for an access token, and reads the profile from Google's userinfo
//! endpoint. Turning the profile into a local account is left to
//! [`super::federated::upsert_from_provider`].

use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};

use super::federated::FederatedProfile;
use crate::config::GoogleConfig;
use crate::db::OAuthStateRepository;
use crate::error::AppError;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Response body of the userinfo endpoint.
#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleUser {
    fn into_profile(self) -> FederatedProfile {
        let display_name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or(self.email.as_deref())
            .unwrap_or("Google user")
            .to_string();

        FederatedProfile {
            provider_id: self.id,
            display_name,
            email: self.email,
            picture: self.picture,
        }
    }
}

/// OAuth client with auth and token endpoints set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

pub struct GoogleOAuth {
    client: ConfiguredClient,
    http: reqwest::Client,
}

impl GoogleOAuth {
    pub fn new(config: &GoogleConfig) -> Result<Self, AppError> {
        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(AUTH_URL.to_string()).map_err(|e| AppError::Config(e.to_string()))?,
            )
            .set_token_uri(
                TokenUrl::new(TOKEN_URL.to_string()).map_err(|e| AppError::Config(e.to_string()))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(config.callback_url.clone())
                    .map_err(|e| AppError::Config(format!("Invalid GOOGLE_CALLBACK_URL: {}", e)))?,
            );

        // Following redirects during the token exchange would open an SSRF hole.
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, http })
    }

    /// Build the consent-screen URL and remember its state for the callback.
    pub async fn authorize_url(&self, pool: &Pool<Sqlite>) -> Result<String, AppError> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        OAuthStateRepository::create(pool, csrf_state.secret(), pkce_verifier.secret()).await?;

        Ok(auth_url.to_string())
    }

    /// Redeem the callback's code for the signed-in user's profile.
    pub async fn exchange_code(
        &self,
        pool: &Pool<Sqlite>,
        code: &str,
        state: &str,
    ) -> Result<FederatedProfile, AppError> {
        let pkce_verifier = OAuthStateRepository::consume(pool, state)
            .await?
            .ok_or_else(|| AppError::OAuth("Invalid or expired OAuth state".to_string()))?;

        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(&self.http)
            .await
            .map_err(|e| AppError::OAuth(format!("Token exchange failed: {}", e)))?;

        let google_user: GoogleUser = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| AppError::OAuth(format!("Userinfo request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::OAuth(format!("Invalid userinfo response: {}", e)))?;

        Ok(google_user.into_profile())
    }
}
