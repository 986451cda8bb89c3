use std::sync::Arc;

use tokio::process::Command;
use tokio::sync::watch;

use crate::config::{Config, ENV_CLIENT_ID};
use crate::error::{AppError, Result};

pub const ENV_ACCESS_TOKEN: &str = "KB_REVIEW_ACCESS_TOKEN";

struct Inner {
    client_id: String,
    token_command: Option<String>,
    static_token: Option<String>,
    token: watch::Sender<Option<String>>,
    signed_in: watch::Sender<bool>,
}

/// Holds the bearer token used for sheet requests.
///
/// Tokens are issued elsewhere (an env var or an external command such as
/// `gcloud auth print-access-token`); this type only fetches, holds and drops
/// them, and tells subscribers when the signed-in state changes. Clones share
/// the same state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    pub fn new(client_id: String, token_command: Option<String>) -> Self {
        Self::with_static_token(client_id, token_command, None)
    }

    /// `static_token` takes priority over `token_command` when present.
    pub fn with_static_token(
        client_id: String,
        token_command: Option<String>,
        static_token: Option<String>,
    ) -> Self {
        let (token, _) = watch::channel(None);
        let (signed_in, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                client_id,
                token_command,
                static_token: static_token.filter(|t| !t.trim().is_empty()),
                token,
                signed_in,
            }),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client_id = config.require_client_id()?.to_string();
        Ok(Self::with_static_token(
            client_id,
            config.token_command.clone(),
            std::env::var(ENV_ACCESS_TOKEN).ok(),
        ))
    }

    #[cfg(test)]
    pub fn signed_in(token: &str) -> Self {
        let session = Self::new("test-client".into(), None);
        session.inner.token.send_replace(Some(token.to_string()));
        session.inner.signed_in.send_replace(true);
        session
    }

    pub fn is_signed_in(&self) -> bool {
        self.inner.token.borrow().is_some()
    }

    /// Receives `true`/`false` on every sign-in, failed sign-in and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.signed_in.subscribe()
    }

    pub fn access_token(&self) -> Result<String> {
        self.inner
            .token
            .borrow()
            .clone()
            .ok_or_else(|| AppError::Auth("not signed in".to_string()))
    }

    pub async fn sign_in(&self) -> Result<()> {
        match self.acquire_token().await {
            Ok(token) => {
                self.inner.token.send_replace(Some(token));
                self.inner.signed_in.send_replace(true);
                tracing::info!("Signed in");
                Ok(())
            }
            Err(e) => {
                self.inner.token.send_replace(None);
                self.inner.signed_in.send_replace(false);
                tracing::warn!("Sign-in failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn sign_out(&self) {
        self.inner.token.send_replace(None);
        self.inner.signed_in.send_replace(false);
        tracing::info!("Signed out");
    }

    async fn acquire_token(&self) -> Result<String> {
        if let Some(token) = &self.inner.static_token {
            return Ok(token.trim().to_string());
        }

        let Some(command) = &self.inner.token_command else {
            return Err(AppError::Auth(format!(
                "no token source: export {ENV_ACCESS_TOKEN} or set token_command in {}",
                Config::config_path().display()
            )));
        };

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .env(ENV_CLIENT_ID, &self.inner.client_id)
            .output()
            .await
            .map_err(|e| AppError::Auth(format!("failed to run token_command: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Auth(format!(
                "token_command exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(AppError::Auth("token_command printed no token".to_string()));
        }
        Ok(token)
    }
}
