#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use bon::Builder;
use reqwest::{Client, Url};
use tracing::debug;

use super::{AuthError, TokenInfo, TokenResponse};

/// Talks to an OAuth 2 authorization server on behalf of one client id.
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct OAuthClient {
    /// HTTP client used for token requests.
    http:          Client,
    /// Page the user is sent to for consent.
    authorize_url: String,
    /// Token endpoint.
    token_url:     String,
    /// Registered client id.
    client_id:     String,
    /// Client secret, for confidential clients.
    client_secret: Option<String>,
    /// Requested scope.
    scope:         Option<String>,
}

impl OAuthClient {
    /// Registered client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Fails when the client id, or a configured secret, is blank.
    pub fn require_client_properties(&self) -> Result<(), AuthError> {
        let blank_secret = self
            .client_secret
            .as_deref()
            .is_some_and(|s| s.trim().is_empty());
        if self.client_id.trim().is_empty() || blank_secret {
            return Err(AuthError::MissingClientProperties);
        }
        Ok(())
    }

    /// Consent page URL that redirects back to `redirect_uri` with a code.
    pub fn authorization_url(&self, redirect_uri: &str) -> Result<String, AuthError> {
        self.require_client_properties()?;
        let mut params = vec![
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(scope) = &self.scope {
            params.push(("scope", scope.as_str()));
        }
        let url = Url::parse_with_params(&self.authorize_url, &params)
            .map_err(|e| AuthError::Unknown(e.into()))?;
        Ok(url.to_string())
    }

    /// Exchanges an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenInfo, AuthError> {
        self.request_tokens(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    /// Trades a refresh token for fresh tokens.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenInfo, AuthError> {
        self.request_tokens(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .await
    }

    /// Posts a token grant and converts the reply.
    async fn request_tokens(&self, grant: &[(&str, &str)]) -> Result<TokenInfo, AuthError> {
        self.require_client_properties()?;

        let mut form: Vec<(&str, &str)> = grant.to_vec();
        form.push(("client_id", &self.client_id));
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret));
        }

        debug!("Requesting tokens from {}", self.token_url);
        let response = self.http.post(&self.token_url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body:   response.text().await.unwrap_or_default(),
            });
        }
        let tokens: TokenResponse = response.json().await?;
        Ok(tokens.into())
    }
}
