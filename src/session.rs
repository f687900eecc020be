//! Explicit session context for API clients.
//!
//! A [`SessionContext`] owns the signed-in token instead of keeping it in a
//! global. Every transition between signed in and signed out is published to
//! subscribers as a [`SessionEvent`], so a UI can react without polling.

use chrono::{DateTime, Utc};
use futures::Stream;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use crate::client::{ClientError, PantryClient};
use crate::models::Category;
use crate::token::{fingerprint, normalize_token};

/// Buffered events per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 16;

/// Current authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    SignedOut,
    SignedIn {
        token: String,
        created_at: DateTime<Utc>,
    },
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        match self {
            Session::SignedIn { token, .. } => Some(token),
            Session::SignedOut => None,
        }
    }
}

/// A change in authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn {
        token: String,
        created_at: DateTime<Utc>,
    },
    SignedOut,
}

/// Errors from session operations.
#[derive(Debug)]
pub enum SessionError {
    /// The operation needs a signed-in session.
    NotSignedIn,
    /// API call failed.
    Client(ClientError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::NotSignedIn => write!(f, "Not signed in. Run `pantry login <token>`."),
            SessionError::Client(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Client(e) => Some(e),
            SessionError::NotSignedIn => None,
        }
    }
}

impl From<ClientError> for SessionError {
    fn from(e: ClientError) -> Self {
        SessionError::Client(e)
    }
}

pub struct SessionContext {
    client: PantryClient,
    state: RwLock<Session>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionContext {
    pub fn new(client: PantryClient) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            state: RwLock::new(Session::SignedOut),
            events,
        }
    }

    pub async fn current(&self) -> Session {
        self.state.read().await.clone()
    }

    /// Stream of future state changes. Events sent before subscribing are
    /// not replayed; read [`current`](Self::current) for the starting state.
    pub fn subscribe(&self) -> impl Stream<Item = SessionEvent> + Send + 'static {
        let rx = self.events.subscribe();
        futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((event, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Session subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
    }

    /// Creates a new account and signs in to it.
    pub async fn register(&self) -> Result<Session, SessionError> {
        let token = self.client.register().await?;
        self.sign_in(&token).await
    }

    /// Validates the token with the server and switches to it.
    pub async fn sign_in(&self, token: &str) -> Result<Session, SessionError> {
        let login = self.client.login(&normalize_token(token)).await?;

        let session = Session::SignedIn {
            token: login.token.clone(),
            created_at: login.created_at,
        };
        *self.state.write().await = session.clone();

        tracing::debug!(account = %fingerprint(&login.token), "Signed in");
        self.publish(SessionEvent::SignedIn {
            token: login.token,
            created_at: login.created_at,
        });
        Ok(session)
    }

    /// Forgets the token. Signing out while signed out emits nothing.
    pub async fn sign_out(&self) {
        let previous = std::mem::replace(&mut *self.state.write().await, Session::SignedOut);
        if previous != Session::SignedOut {
            tracing::debug!("Signed out");
            self.publish(SessionEvent::SignedOut);
        }
    }

    pub async fn load(&self, category: Category) -> Result<Value, SessionError> {
        let token = self.require_token().await?;
        let result = self.client.get_document(category, &token).await;
        self.handle_rejection(result).await
    }

    pub async fn save(&self, category: Category, data: &Value) -> Result<(), SessionError> {
        let token = self.require_token().await?;
        let result = self.client.put_document(category, &token, data).await;
        self.handle_rejection(result).await
    }

    async fn require_token(&self) -> Result<String, SessionError> {
        self.state
            .read()
            .await
            .token()
            .map(str::to_string)
            .ok_or(SessionError::NotSignedIn)
    }

    /// A token the server no longer accepts ends the session.
    async fn handle_rejection<T>(&self, result: Result<T, ClientError>) -> Result<T, SessionError> {
        match result {
            Err(e) if e.is_unauthorized() => {
                self.sign_out().await;
                Err(e.into())
            }
            other => Ok(other?),
        }
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("base_url", &self.client.base_url())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use futures::StreamExt;
    use serde_json::json;

    async fn context() -> SessionContext {
        SessionContext::new(PantryClient::new(spawn_server().await))
    }

    #[tokio::test]
    async fn test_starts_signed_out() {
        let ctx = context().await;

        assert_eq!(ctx.current().await, Session::SignedOut);
        assert!(matches!(
            ctx.load(Category::Recipes).await,
            Err(SessionError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn test_register_signs_in_and_emits_event() {
        let ctx = context().await;
        let mut events = Box::pin(ctx.subscribe());

        let session = ctx.register().await.unwrap();
        let token = session.token().unwrap().to_string();

        match events.next().await.unwrap() {
            SessionEvent::SignedIn { token: t, .. } => assert_eq!(t, token),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(ctx.current().await, session);
    }

    #[tokio::test]
    async fn test_sign_in_normalizes_token() {
        let url = spawn_server().await;
        let token = PantryClient::new(url.clone()).register().await.unwrap();
        let ctx = SessionContext::new(PantryClient::new(url));

        let session = ctx.sign_in(&token.to_lowercase()).await.unwrap();

        assert_eq!(session.token(), Some(token.as_str()));
    }

    #[tokio::test]
    async fn test_sign_in_unknown_token_stays_signed_out() {
        let ctx = context().await;

        let err = ctx.sign_in("KITCH-AB23CD").await.unwrap_err();

        assert!(matches!(err, SessionError::Client(ref e) if e.is_unauthorized()));
        assert_eq!(ctx.current().await, Session::SignedOut);
    }

    #[tokio::test]
    async fn test_sign_out_emits_once() {
        let ctx = context().await;
        ctx.register().await.unwrap();
        let mut events = Box::pin(ctx.subscribe());

        ctx.sign_out().await;
        ctx.sign_out().await;
        drop(ctx);

        let received: Vec<SessionEvent> = events.collect().await;
        assert_eq!(received, vec![SessionEvent::SignedOut]);
    }

    #[tokio::test]
    async fn test_load_and_save_through_session() {
        let ctx = context().await;
        ctx.register().await.unwrap();

        assert_eq!(ctx.load(Category::Shopping).await.unwrap(), json!([]));

        ctx.save(Category::Shopping, &json!(["milk", "eggs"]))
            .await
            .unwrap();

        assert_eq!(
            ctx.load(Category::Shopping).await.unwrap(),
            json!(["milk", "eggs"])
        );
    }

    #[tokio::test]
    async fn test_rejected_token_ends_session() {
        let server_a = spawn_server().await;
        let server_b = spawn_server().await;

        // Sign in against one server, then point a second context at another
        // server that has never seen the token.
        let ctx_a = SessionContext::new(PantryClient::new(server_a));
        let session = ctx_a.register().await.unwrap();

        let ctx_b = SessionContext::new(PantryClient::new(server_b));
        *ctx_b.state.write().await = session;
        let mut events = Box::pin(ctx_b.subscribe());

        let err = ctx_b.load(Category::Recipes).await.unwrap_err();

        assert!(matches!(err, SessionError::Client(ref e) if e.is_unauthorized()));
        assert_eq!(ctx_b.current().await, Session::SignedOut);
        assert_eq!(events.next().await, Some(SessionEvent::SignedOut));
    }
}
