/// Google OAuth 2.0 authorization-code flow with PKCE
use crate::config::{Config, OAuthConfig};
use crate::error::AppError;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OAuthError {
    /// The provider rejected the code or the request
    #[error("OAuth request rejected: {0}")]
    Rejected(String),

    #[error("OAuth transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl From<OAuthError> for AppError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::Rejected(detail) => {
                tracing::warn!(detail = %detail, "Google rejected OAuth request");
                AppError::validation("Invalid OAuth request")
            }
            OAuthError::Transport(e) => AppError::Upstream(e.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// `userinfo` payload (v1 endpoint)
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUser {
    pub id: String,
    pub name: String,
}

#[derive(Clone)]
pub struct GoogleOAuthClient {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    authorize_url: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleOAuthClient {
    pub fn new(oauth: &OAuthConfig, redirect_uri: String) -> Self {
        Self {
            client: Client::new(),
            client_id: oauth.google_client_id.clone(),
            client_secret: oauth.google_client_secret.clone(),
            redirect_uri,
            authorize_url: oauth.authorize_url.clone(),
            token_url: oauth.token_url.clone(),
            userinfo_url: oauth.userinfo_url.clone(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.oauth, config.google_redirect_uri())
    }

    /// Consent-screen URL for the given state and PKCE challenge
    pub fn authorization_url(&self, state: &str, code_challenge: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
            self.authorize_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode("openid profile"),
            urlencoding::encode(state),
            urlencoding::encode(code_challenge),
        )
    }

    /// Trade the authorization code for an access token and read the profile.
    pub async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<GoogleUser, OAuthError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code_verifier", code_verifier),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::Rejected(format!("token endpoint {}: {}", status, body)));
        }
        let token: TokenResponse = response.json().await?;

        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::Rejected(format!(
                "userinfo endpoint {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
