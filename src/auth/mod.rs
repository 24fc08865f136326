#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! OAuth plumbing shared by the remote platforms.

/// Logged-in accounts.
pub mod account;
/// Authorization-code and refresh grants.
pub mod client;
/// Local listener receiving the authorization redirect.
pub mod server;
/// Stored tokens.
pub mod token;

pub use account::OAuthAccount;
pub use client::OAuthClient;
pub use server::{AuthorizationCode, RedirectServer, authorize};
pub use token::{TokenInfo, TokenResponse};

/// Failures of the OAuth flow.
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    /// The client id or secret is blank.
    #[error("Client properties are not provided")]
    MissingClientProperties,
    /// No account is logged in.
    #[error("Login required")]
    LoginRequired,
    /// None of the redirect ports could be bound.
    #[error("No ports available")]
    NoPortsAvailable,
    /// The authorization server rejected the request.
    #[error("token request failed with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body:   String,
    },
    /// The redirect arrived without a code.
    #[error("authorization was denied: {0}")]
    Denied(String),
    /// Transport failure.
    #[error("Connection failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Any other failure.
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}
