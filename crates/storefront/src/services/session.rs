//! Identity signal shared across requests.
//!
//! Each credential gets one `watch` channel that starts at
//! [`AuthState::Pending`] and receives exactly one terminal state from a
//! single verification task. Concurrent requests carrying the same credential
//! subscribe to the same channel instead of verifying again.
//!
//! A verification that fails without an answer from the provider (network
//! error, provider down) resolves to `Unauthenticated` for whoever is
//! waiting, and the next observation of that credential starts over.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use meadowlark_core::AuthState;
use moka::Entry;
use moka::future::Cache;
use moka::ops::compute::Op;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::identity::{Identity, IdentityClient, IdentityError};

/// How long a resolved credential is reused before it is verified again.
const SIGNAL_TTL: Duration = Duration::from_secs(300);

/// Upper bound on tracked credentials.
const MAX_SIGNALS: u64 = 10_000;

/// Something that can turn a credential into an identity.
pub trait CredentialVerifier: Send + Sync + 'static {
    /// Verify `credential`.
    fn verify(
        &self,
        credential: &str,
    ) -> impl Future<Output = Result<Identity, IdentityError>> + Send;
}

impl CredentialVerifier for IdentityClient {
    async fn verify(&self, credential: &str) -> Result<Identity, IdentityError> {
        self.verify_token(credential).await
    }
}

#[derive(Debug, Clone)]
struct Signal {
    state: AuthState<Identity>,
    /// Resolved without an answer from the verifier; retry on next use.
    transient: bool,
}

impl Signal {
    const fn pending() -> Self {
        Self {
            state: AuthState::Pending,
            transient: false,
        }
    }
}

/// A subscription to one credential's auth state.
#[derive(Debug, Clone)]
pub struct AuthSignal {
    rx: watch::Receiver<Signal>,
}

impl AuthSignal {
    /// The state right now, without waiting.
    #[must_use]
    pub fn current(&self) -> AuthState<Identity> {
        self.rx.borrow().state.clone()
    }

    /// Wait up to `wait` for a terminal state.
    ///
    /// Returns `Pending` if the verification is still in flight when the
    /// wait runs out.
    pub async fn settle(mut self, wait: Duration) -> AuthState<Identity> {
        let outcome = tokio::time::timeout(
            wait,
            self.rx.wait_for(|signal| signal.state.is_resolved()),
        )
        .await
        .map(|resolved| resolved.map(|signal| signal.state.clone()));

        match outcome {
            Ok(Ok(state)) => state,
            // Verification task ended without sending
            Ok(Err(_)) => AuthState::Unauthenticated,
            Err(_) => AuthState::Pending,
        }
    }
}

/// Shared per-credential identity resolution.
pub struct SessionResolver<V = IdentityClient> {
    inner: Arc<ResolverInner<V>>,
}

struct ResolverInner<V> {
    verifier: V,
    signals: Cache<String, watch::Receiver<Signal>>,
    wait: Duration,
}

impl<V> Clone for SessionResolver<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: CredentialVerifier> SessionResolver<V> {
    /// Create a resolver; handlers wait at most `wait` for a verification.
    #[must_use]
    pub fn new(verifier: V, wait: Duration) -> Self {
        let signals = Cache::builder()
            .max_capacity(MAX_SIGNALS)
            .time_to_live(SIGNAL_TTL)
            .build();

        Self {
            inner: Arc::new(ResolverInner {
                verifier,
                signals,
                wait,
            }),
        }
    }

    /// The underlying verifier, for callers that need a direct answer.
    #[must_use]
    pub fn verifier(&self) -> &V {
        &self.inner.verifier
    }

    /// How long handlers wait for a verification before showing a placeholder.
    #[must_use]
    pub fn wait(&self) -> Duration {
        self.inner.wait
    }

    /// Subscribe to the auth state for `credential`.
    ///
    /// The first observer of a credential starts its verification; later
    /// observers share it.
    pub async fn observe(&self, credential: &str) -> AuthSignal {
        let rx = self.signal(credential).await;
        if rx.borrow().transient {
            return AuthSignal {
                rx: self.retry(credential, &rx).await,
            };
        }
        AuthSignal { rx }
    }

    /// Resolve the visitor's state, waiting at most the configured time.
    ///
    /// No credential means `Unauthenticated` without asking the verifier.
    pub async fn resolve(&self, credential: Option<&str>) -> AuthState<Identity> {
        match credential {
            Some(credential) => self.observe(credential).await.settle(self.inner.wait).await,
            None => AuthState::Unauthenticated,
        }
    }

    /// Replace the transient signal `stale` with a fresh verification.
    ///
    /// Runs under the cache's per-key lock: when another observer already
    /// replaced `stale`, its channel is shared instead of starting a second
    /// verification.
    async fn retry(
        &self,
        credential: &str,
        stale: &watch::Receiver<Signal>,
    ) -> watch::Receiver<Signal> {
        let inner = Arc::clone(&self.inner);
        let key = credential.to_string();
        let result = self
            .inner
            .signals
            .entry(key.clone())
            .and_compute_with(|current| {
                let replaced = current
                    .map(Entry::into_value)
                    .is_some_and(|rx| !rx.same_channel(stale));
                let op = if replaced {
                    Op::Nop
                } else {
                    let (tx, rx) = watch::channel(Signal::pending());
                    tokio::spawn(verify(inner, key, tx));
                    Op::Put(rx)
                };
                std::future::ready(op)
            })
            .await;

        match result.into_entry() {
            Some(entry) => entry.into_value(),
            None => self.signal(credential).await,
        }
    }

    async fn signal(&self, credential: &str) -> watch::Receiver<Signal> {
        let inner = Arc::clone(&self.inner);
        let key = credential.to_string();
        self.inner
            .signals
            .get_with(key.clone(), async move {
                let (tx, rx) = watch::channel(Signal::pending());
                tokio::spawn(verify(inner, key, tx));
                rx
            })
            .await
    }
}

async fn verify<V: CredentialVerifier>(
    inner: Arc<ResolverInner<V>>,
    credential: String,
    tx: watch::Sender<Signal>,
) {
    let signal = match inner.verifier.verify(&credential).await {
        Ok(identity) => {
            debug!(uid = %identity.uid, "Identity resolved");
            Signal {
                state: AuthState::Authenticated(identity),
                transient: false,
            }
        }
        Err(e) if e.is_rejection() => {
            debug!("Identity credential rejected");
            Signal {
                state: AuthState::Unauthenticated,
                transient: false,
            }
        }
        Err(e) => {
            warn!(error = %e, "Identity verification failed, will retry on next request");
            Signal {
                state: AuthState::Unauthenticated,
                transient: true,
            }
        }
    };
    tx.send_replace(signal);
}
