use serde::{Deserialize, Serialize};

use super::token::TokenInfo;

/// A logged-in user of an OAuth platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthAccount<U> {
    /// Current tokens.
    pub token_info: TokenInfo,
    /// Platform-specific profile.
    pub user_info:  U,
}

impl<U> OAuthAccount<U> {
    /// An account for `user_info` holding `token_info`.
    pub fn new(user_info: U, token_info: TokenInfo) -> Self {
        Self {
            token_info,
            user_info,
        }
    }

    /// Replaces the tokens after a refresh.
    pub fn update_tokens(&mut self, token_info: TokenInfo) {
        self.token_info = token_info;
    }

    /// Whether the access token can be used without refreshing.
    pub fn is_token_up_to_date(&self) -> bool {
        self.token_info.is_up_to_date()
    }
}
