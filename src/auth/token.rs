#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Seconds before expiry at which a token is already treated as stale.
pub const EXPIRY_MARGIN_SECS: i64 = 600;

/// OAuth tokens as kept in settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Bearer token sent with requests.
    #[serde(default)]
    pub access_token:  String,
    /// Token used to obtain a new access token.
    #[serde(default)]
    pub refresh_token: String,
    /// Absolute expiry time, Unix seconds.
    #[serde(default = "never_valid")]
    pub expires_in:    i64,
}

/// Expiry of a token that was never issued.
fn never_valid() -> i64 {
    -1
}

impl TokenInfo {
    /// Whether the token stays valid for at least ten more minutes.
    pub fn is_up_to_date(&self) -> bool {
        self.is_up_to_date_at(Utc::now().timestamp())
    }

    /// [`TokenInfo::is_up_to_date`] evaluated at Unix time `now`.
    pub fn is_up_to_date_at(&self, now: i64) -> bool {
        now < self.expires_in - EXPIRY_MARGIN_SECS
    }

    /// Builds stored tokens from a token endpoint reply received at `now`.
    pub fn from_response(response: TokenResponse, now: i64) -> Self {
        Self {
            access_token:  response.access_token,
            refresh_token: response.refresh_token.unwrap_or_default(),
            expires_in:    now + response.expires_in,
        }
    }
}

/// Body of a token endpoint reply; `expires_in` is relative to the reply.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token.
    pub access_token:  String,
    /// Refresh token, absent for some grants.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    pub expires_in:    i64,
}

impl From<TokenResponse> for TokenInfo {
    fn from(response: TokenResponse) -> Self {
        Self::from_response(response, Utc::now().timestamp())
    }
}
