//! Social login: authorize URL, PKCE code exchange, session tracking and the
//! OAuth callback decision.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use rand::distr::Alphanumeric;
use rand::Rng;
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::client::SupabaseClient;
use crate::error::SupabaseError;

/// Client-side bound on a login round trip, independent of the HTTP timeout.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(20);

/// Delay before leaving the callback page after a failed login.
pub const ERROR_REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Where the callback sends users once it is done.
pub const HOME_PATH: &str = "/map";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Backend(#[from] SupabaseError),

    #[error("login timed out after {}s", .0.as_secs())]
    LoginTimeout(Duration),
}

/// Social login providers enabled for the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Kakao,
}

impl Provider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Kakao => "kakao",
        }
    }

    /// Scopes requested by default. Only the nickname is needed.
    #[must_use]
    pub fn default_scopes(self) -> &'static str {
        match self {
            Provider::Kakao => "profile_nickname",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub token_type: String,
    pub user: AuthUser,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("user", &self.user)
            .finish()
    }
}

/// A started sign-in: send the user to `url`, keep `code_verifier` for the
/// exchange after the redirect back.
#[derive(Debug, Clone)]
pub struct SignInRequest {
    pub url: Url,
    pub code_verifier: String,
}

#[derive(Serialize)]
struct PkceExchange<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

impl SupabaseClient {
    /// Builds the provider authorize URL for a PKCE sign-in.
    ///
    /// Uses the `plain` challenge method, so the verifier doubles as challenge.
    #[must_use]
    pub fn start_sign_in(
        &self,
        provider: Provider,
        redirect_to: &str,
        scopes: Option<&str>,
    ) -> SignInRequest {
        let code_verifier = generate_code_verifier();
        let mut url = self.endpoint("auth/v1/authorize");
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to)
            .append_pair("scopes", scopes.unwrap_or(provider.default_scopes()))
            .append_pair("code_challenge", &code_verifier)
            .append_pair("code_challenge_method", "plain");
        tracing::info!(provider = provider.as_str(), redirect_to, "sign-in started");
        SignInRequest { url, code_verifier }
    }

    /// Exchanges an OAuth `code` for a session, bounded by [`LOGIN_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::LoginTimeout`] if the exchange takes longer than
    /// the login timeout, or [`AuthError::Backend`] if the backend rejects it.
    pub async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<Session, AuthError> {
        self.exchange_code_with_timeout(code, code_verifier, LOGIN_TIMEOUT)
            .await
    }

    /// [`Self::exchange_code_for_session`] with an explicit bound.
    ///
    /// # Errors
    ///
    /// See [`Self::exchange_code_for_session`].
    pub async fn exchange_code_with_timeout(
        &self,
        code: &str,
        code_verifier: &str,
        limit: Duration,
    ) -> Result<Session, AuthError> {
        let mut url = self.endpoint("auth/v1/token");
        url.query_pairs_mut().append_pair("grant_type", "pkce");
        let body = PkceExchange {
            auth_code: code,
            code_verifier,
        };

        let exchange = async {
            let response = self.request(Method::POST, url).json(&body).send().await?;
            let response = Self::check(response).await?;
            Self::decode::<Session>(response, "pkce token exchange").await
        };

        match tokio::time::timeout(limit, exchange).await {
            Ok(result) => {
                let session = result?;
                tracing::info!(user_id = %session.user.id, "session established");
                Ok(session)
            }
            Err(_) => {
                tracing::warn!(timeout_secs = limit.as_secs(), "code exchange timed out");
                Err(AuthError::LoginTimeout(limit))
            }
        }
    }

    /// Returns the user behind `access_token`, or `None` if the token is no
    /// longer accepted.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError`] for failures other than 401/403.
    pub async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, SupabaseError> {
        let url = self.endpoint("auth/v1/user");
        let response = self
            .with_access_token(access_token)
            .request(Method::GET, url)
            .send()
            .await?;
        match Self::check(response).await {
            Ok(response) => Ok(Some(Self::decode(response, "auth user").await?)),
            Err(SupabaseError::Api {
                status: 401 | 403, ..
            }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Revokes the session behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError`] if the backend rejects the logout.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let url = self.endpoint("auth/v1/logout");
        let response = self
            .with_access_token(access_token)
            .request(Method::POST, url)
            .send()
            .await?;
        Self::check(response).await?;
        tracing::info!("signed out");
        Ok(())
    }
}

/// Holds the current session and notifies subscribers when it changes.
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: watch::Sender<Option<Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    #[must_use]
    pub fn get_session(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Replaces the session; subscribers are only woken on an actual change.
    pub fn set_session(&self, session: Option<Session>) {
        self.tx.send_if_modified(|current| {
            if *current == session {
                return false;
            }
            *current = session;
            true
        });
    }

    /// Receiver that observes every sign-in and sign-out.
    #[must_use]
    pub fn on_auth_state_change(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

/// Query parameters the provider appends to the redirect back.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Where to send the user after the callback, and after how long.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackOutcome {
    pub redirect_to: String,
    pub delay: Duration,
    /// Message to show while waiting; `None` on success or silent redirects.
    pub error: Option<String>,
}

fn error_redirect(message: &str) -> CallbackOutcome {
    CallbackOutcome {
        redirect_to: format!(
            "{HOME_PATH}?error={}",
            utf8_percent_encode(message, NON_ALPHANUMERIC)
        ),
        delay: ERROR_REDIRECT_DELAY,
        error: Some(message.to_owned()),
    }
}

/// Handles the OAuth redirect back: exchanges the code and records the session.
///
/// Provider errors and failed exchanges redirect home with the error after a
/// short delay; a missing code (direct visit) redirects home immediately.
pub async fn handle_callback(
    client: &SupabaseClient,
    sessions: &SessionStore,
    params: &CallbackParams,
    code_verifier: &str,
) -> CallbackOutcome {
    if let Some(error) = params.error.as_deref() {
        tracing::warn!(error, description = ?params.error_description, "OAuth provider error");
        let mut outcome = error_redirect(error);
        outcome.error = Some(params.error_description.clone().unwrap_or_else(|| error.to_owned()));
        return outcome;
    }

    let Some(code) = params.code.as_deref() else {
        return CallbackOutcome {
            redirect_to: HOME_PATH.to_owned(),
            delay: Duration::ZERO,
            error: None,
        };
    };

    match client.exchange_code_for_session(code, code_verifier).await {
        Ok(session) => {
            sessions.set_session(Some(session));
            CallbackOutcome {
                redirect_to: HOME_PATH.to_owned(),
                delay: Duration::ZERO,
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "session exchange failed");
            error_redirect(&e.to_string())
        }
    }
}
