#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! CheckiO OAuth connectors, one per mission platform.

use std::{fmt, sync::Arc};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::{
    auth::{
        AuthError, OAuthAccount, OAuthClient, RedirectServer,
        server::{REDIRECT_HOST, REDIRECT_PORTS},
    },
    config::{ClientCredentials, ConfigHandle},
    constants::{CHECKIO_OAUTH_PATH, CHECKIO_OAUTH_URL},
};

/// A CheckiO mission platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckiOPlatform {
    /// Python missions.
    Py,
    /// JavaScript missions.
    Js,
}

impl CheckiOPlatform {
    /// Display name, e.g. `Py CheckiO`.
    pub fn name(&self) -> &'static str {
        match self {
            CheckiOPlatform::Py => "Py CheckiO",
            CheckiOPlatform::Js => "JS CheckiO",
        }
    }

    /// Mission API host.
    pub fn api_host(&self) -> &'static str {
        match self {
            CheckiOPlatform::Py => "https://py.checkio.org",
            CheckiOPlatform::Js => "https://js.checkio.org",
        }
    }

    /// Redirect path of the platform's OAuth client.
    pub fn service_path(&self) -> String {
        let suffix = match self {
            CheckiOPlatform::Py => "py",
            CheckiOPlatform::Js => "js",
        };
        format!("{CHECKIO_OAUTH_PATH}/{suffix}")
    }
}

impl fmt::Display for CheckiOPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A CheckiO user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckiOUserInfo {
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// User id.
    #[serde(default)]
    pub uid:      u64,
}

/// A logged-in CheckiO user.
pub type CheckiOAccount = OAuthAccount<CheckiOUserInfo>;

/// OAuth connector of one CheckiO platform.
#[derive(Clone)]
pub struct CheckiOConnector {
    /// Platform served.
    platform:  CheckiOPlatform,
    /// Shared HTTP client.
    http:      Client,
    /// OAuth server URL without a trailing slash.
    oauth_url: String,
    /// OAuth client of the platform.
    oauth:     OAuthClient,
    /// Logged-in account, if any.
    account:   Arc<Mutex<Option<CheckiOAccount>>>,
}

impl CheckiOConnector {
    /// A connector for `platform` against the OAuth server at `oauth_url`.
    pub fn new(
        http: Client,
        oauth_url: &str,
        platform: CheckiOPlatform,
        credentials: &ClientCredentials,
    ) -> Self {
        let oauth_url = oauth_url.trim_end_matches('/').to_string();
        let oauth = OAuthClient::builder()
            .http(http.clone())
            .authorize_url(format!("{oauth_url}/"))
            .token_url(format!("{oauth_url}/oauth/token/"))
            .client_id(credentials.client_id())
            .client_secret(credentials.client_secret())
            .build();
        Self {
            platform,
            http,
            oauth_url,
            oauth,
            account: Arc::new(Mutex::new(None)),
        }
    }

    /// A connector configured from the environment.
    pub fn from_config(config: &ConfigHandle, platform: CheckiOPlatform) -> Self {
        let credentials = match platform {
            CheckiOPlatform::Py => config.checkio_py(),
            CheckiOPlatform::Js => config.checkio_js(),
        };
        Self::new(config.http_client(), CHECKIO_OAUTH_URL, platform, credentials)
    }

    /// The same connector acting on behalf of `account`.
    pub fn with_account(self, account: Option<CheckiOAccount>) -> Self {
        Self {
            account: Arc::new(Mutex::new(account)),
            ..self
        }
    }

    /// Platform served.
    pub fn platform(&self) -> CheckiOPlatform {
        self.platform
    }

    /// Current account.
    pub async fn account(&self) -> Option<CheckiOAccount> {
        self.account.lock().await.clone()
    }

    /// Access token of the logged-in user, refreshed when stale.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let mut guard = self.account.lock().await;
        let account = guard.as_mut().ok_or(AuthError::LoginRequired)?;
        if !account.is_token_up_to_date() {
            let tokens = self.oauth.refresh(&account.token_info.refresh_token).await?;
            account.update_tokens(tokens);
        }
        Ok(account.token_info.access_token.clone())
    }

    /// Redirect URI on `port`; only the registered ports are accepted.
    pub fn redirect_uri(&self, port: u16) -> Result<String, AuthError> {
        if !REDIRECT_PORTS.contains(&port) {
            return Err(AuthError::NoPortsAvailable);
        }
        Ok(format!("{REDIRECT_HOST}:{port}{}", self.platform.service_path()))
    }

    /// Consent page URL for `redirect_uri`.
    pub fn authorization_url(&self, redirect_uri: &str) -> Result<String, AuthError> {
        self.oauth.authorization_url(redirect_uri)
    }

    /// Profile of the user `access_token` belongs to.
    pub async fn user_info(&self, access_token: &str) -> Result<CheckiOUserInfo, AuthError> {
        let response = self
            .http
            .get(format!("{}/oauth/information/", self.oauth_url))
            .query(&[("access_token", access_token)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body:   response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }

    /// Handles the code the redirect delivered.
    ///
    /// Returns `None` on success, or the message to show on the redirect page.
    pub async fn handle_code(&self, code: &str, redirect_uri: &str) -> Option<String> {
        let mut account = self.account.lock().await;
        if account.is_some() {
            return Some("You're logged in already".to_string());
        }

        let login = async {
            let tokens = self.oauth.exchange_code(code, redirect_uri).await?;
            let user = self.user_info(&tokens.access_token).await?;
            Ok::<_, AuthError>(CheckiOAccount::new(user, tokens))
        };
        match login.await {
            Ok(logged_in) => {
                info!("Logged in to {} as {}", self.platform, logged_in.user_info.username);
                *account = Some(logged_in);
                None
            }
            Err(AuthError::Http(_)) => Some("Connection failed".to_string()),
            Err(AuthError::MissingClientProperties) => {
                error!("{}", AuthError::MissingClientProperties);
                Some(AuthError::MissingClientProperties.to_string())
            }
            Err(_) => Some("Couldn't get user info".to_string()),
        }
    }

    /// Logs in through the browser.
    pub async fn login_interactively(&self) -> Result<CheckiOAccount, AuthError> {
        self.oauth.require_client_properties()?;
        let server = RedirectServer::start(&self.platform.service_path()).await?;
        let redirect_uri = self.redirect_uri(server.port())?;
        info!("Open {} in a browser to log in", self.authorization_url(&redirect_uri)?);
        let code = server.wait_for_code().await?;

        if let Some(message) = self.handle_code(&code, &redirect_uri).await {
            if let Some(account) = self.account().await {
                info!("{message}");
                return Ok(account);
            }
            return Err(AuthError::Denied(message));
        }
        self.account()
            .await
            .ok_or_else(|| AuthError::Denied("login did not complete".into()))
    }
}
