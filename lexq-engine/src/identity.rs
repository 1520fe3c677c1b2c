//! Identity provider abstraction
//!
//! The engine subscribes once at startup and receives identity changes as a
//! push stream. When it observes `SignedOut` it asks the provider for an
//! anonymous session; a failure there puts the session into offline mode.

use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::IdentityError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    SignedIn { uid: String, is_anonymous: bool },
    SignedOut,
}

/// The identity the engine currently acts for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub is_anonymous: bool,
}

impl Identity {
    /// Known users get remote load/save; anonymous ones stay local
    pub fn is_known(&self) -> bool {
        !self.is_anonymous
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register the engine's subscription; called once at startup
    fn subscribe(&self) -> mpsc::UnboundedReceiver<IdentityEvent>;

    /// Request an anonymous session; success is reported on the event stream
    async fn sign_in_anonymously(&self) -> Result<(), IdentityError>;
}

/// Identity provider driven by the host process
///
/// Starts from a fixed user (or signed out) and lets the host emit further
/// changes. Anonymous sign-in mints a random uid unless disabled.
pub struct LocalIdentityProvider {
    initial: IdentityEvent,
    allow_anonymous: bool,
    subscriber: Mutex<Option<mpsc::UnboundedSender<IdentityEvent>>>,
}

impl LocalIdentityProvider {
    /// Provider that immediately reports `uid` as a signed-in user
    pub fn signed_in(uid: &str) -> Self {
        Self::with_initial(IdentityEvent::SignedIn {
            uid: uid.to_string(),
            is_anonymous: false,
        })
    }

    /// Provider that starts signed out
    pub fn signed_out() -> Self {
        Self::with_initial(IdentityEvent::SignedOut)
    }

    fn with_initial(initial: IdentityEvent) -> Self {
        Self {
            initial,
            allow_anonymous: true,
            subscriber: Mutex::new(None),
        }
    }

    /// Make anonymous sign-in fail (no network / restricted environment)
    pub fn without_anonymous(mut self) -> Self {
        self.allow_anonymous = false;
        self
    }

    /// Push an identity change to the subscriber
    pub fn emit(&self, event: IdentityEvent) {
        if let Ok(guard) = self.subscriber.lock() {
            if let Some(tx) = guard.as_ref() {
                let _ = tx.send(event);
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<IdentityEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(self.initial.clone());
        if let Ok(mut guard) = self.subscriber.lock() {
            *guard = Some(tx);
        }
        rx
    }

    async fn sign_in_anonymously(&self) -> Result<(), IdentityError> {
        if !self.allow_anonymous {
            return Err(IdentityError::AnonymousSignInFailed(
                "anonymous sign-in disabled".to_string(),
            ));
        }

        let uid = Uuid::new_v4().to_string();
        info!(%uid, "Anonymous session created");
        self.emit(IdentityEvent::SignedIn {
            uid,
            is_anonymous: true,
        });
        debug!("Anonymous sign-in event queued");
        Ok(())
    }
}
