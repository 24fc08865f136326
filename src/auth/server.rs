#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::HashMap, ops::RangeInclusive};

use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use tokio::{
    net::TcpListener,
    sync::{mpsc, oneshot},
};
use tracing::{debug, info, warn};

use super::{AuthError, OAuthClient};

/// Ports OAuth clients are registered to redirect to.
pub const REDIRECT_PORTS: RangeInclusive<u16> = 63342..=63362;

/// Address the redirect listener binds to.
const REDIRECT_ADDR: &str = "127.0.0.1";

/// Host part of redirect URIs, the address the listener binds to.
pub const REDIRECT_HOST: &str = "http://127.0.0.1";

/// What the redirect carried: a code, or the error the server reported.
type Outcome = Result<String, String>;

/// A local HTTP listener that receives the OAuth redirect.
pub struct RedirectServer {
    /// Bound port.
    port:         u16,
    /// Path the redirect is expected on.
    service_path: String,
    /// Codes forwarded by the handler.
    codes:        mpsc::Receiver<Outcome>,
    /// Stops the listener gracefully.
    shutdown:     Option<oneshot::Sender<()>>,
}

impl RedirectServer {
    /// Listens on the first free port of [`REDIRECT_PORTS`].
    pub async fn start(service_path: &str) -> Result<Self, AuthError> {
        Self::start_in(REDIRECT_PORTS, service_path).await
    }

    /// Listens on the first free port of `ports`.
    pub async fn start_in(ports: RangeInclusive<u16>, service_path: &str) -> Result<Self, AuthError> {
        let mut bound = None;
        for port in ports {
            match TcpListener::bind((REDIRECT_ADDR, port)).await {
                Ok(listener) => {
                    bound = Some((port, listener));
                    break;
                }
                Err(e) => debug!("Port {port} is taken: {e}"),
            }
        }
        let (port, listener) = bound.ok_or(AuthError::NoPortsAvailable)?;

        let (code_tx, codes) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let router = Router::new()
            .route(service_path, get(receive_code))
            .with_state(code_tx);

        tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await;
            if let Err(e) = served {
                warn!("Redirect server stopped: {e}");
            }
        });

        Ok(Self {
            port,
            service_path: service_path.to_string(),
            codes,
            shutdown: Some(shutdown_tx),
        })
    }

    /// Bound port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// URI to register as the OAuth redirect.
    pub fn redirect_uri(&self) -> String {
        format!("{REDIRECT_HOST}:{}{}", self.port, self.service_path)
    }

    /// Waits for the redirect and returns its code, then stops listening.
    pub async fn wait_for_code(mut self) -> Result<String, AuthError> {
        let outcome = self.codes.recv().await;
        self.stop();
        match outcome {
            Some(Ok(code)) => Ok(code),
            Some(Err(error)) => Err(AuthError::Denied(error)),
            None => Err(AuthError::Denied("redirect server closed".into())),
        }
    }

    /// Stops listening.
    fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.send(()).ok();
        }
    }
}

impl Drop for RedirectServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Code received by the redirect, with the URI it was sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    /// Authorization code.
    pub code:         String,
    /// Redirect URI the code is bound to.
    pub redirect_uri: String,
}

/// Runs the browser consent flow of `oauth` and waits for the code.
///
/// The consent URL is logged for the user to open.
pub async fn authorize(oauth: &OAuthClient, service_path: &str) -> Result<AuthorizationCode, AuthError> {
    oauth.require_client_properties()?;
    let server = RedirectServer::start(service_path).await?;
    let redirect_uri = server.redirect_uri();
    let url = oauth.authorization_url(&redirect_uri)?;
    info!("Open {url} in a browser to log in");
    let code = server.wait_for_code().await?;
    Ok(AuthorizationCode { code, redirect_uri })
}

/// Forwards `?code=` (or `?error=`) to the waiting caller.
async fn receive_code(
    State(codes): State<mpsc::Sender<Outcome>>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<&'static str> {
    let outcome = match (params.get("code"), params.get("error")) {
        (Some(code), _) => Ok(code.clone()),
        (None, Some(error)) => Err(error.clone()),
        (None, None) => Err("no code in redirect".to_string()),
    };
    let page = if outcome.is_ok() {
        "<html><body>Authorization succeeded. You can close this page.</body></html>"
    } else {
        "<html><body>Authorization failed. Please try again.</body></html>"
    };
    if codes.try_send(outcome).is_err() {
        debug!("Ignoring a repeated redirect");
    }
    Html(page)
}
