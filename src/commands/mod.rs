mod auth;
mod document;

pub use auth::{login, logout, register, status};
pub use document::{get, put};

use pantry::{SessionContext, SessionEvent};

use crate::config::{ConfigError, SavedSession};
use std::path::Path;

/// Signs `ctx` in with the token remembered from an earlier run, if any.
///
/// A remembered token the server rejects is forgotten.
pub async fn restore(
    ctx: &SessionContext,
    session_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(token) = SavedSession::load(session_path)?.token else {
        return Ok(());
    };

    match ctx.sign_in(&token).await {
        Ok(_) => Ok(()),
        Err(pantry::SessionError::Client(e)) if e.is_unauthorized() => {
            SavedSession::default().save(session_path)?;
            Err(
                "Saved token is no longer valid. Run `pantry login <token>` or `pantry register`."
                    .into(),
            )
        }
        Err(e) => Err(e.into()),
    }
}

/// Writes the outcome of the last session transition to disk.
pub fn persist(events: &[SessionEvent], session_path: &Path) -> Result<(), ConfigError> {
    match events.last() {
        Some(SessionEvent::SignedIn { token, .. }) => SavedSession {
            token: Some(token.clone()),
        }
        .save(session_path),
        Some(SessionEvent::SignedOut) => SavedSession::default().save(session_path),
        None => Ok(()),
    }
}
