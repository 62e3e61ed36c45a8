//! Account route gating.
//!
//! Every account page request is answered by a pure decision over two
//! inputs: the route's classification (public or private) and the state of
//! the identity check for the visitor ([`AuthState`]). The storefront turns the
//! resulting [`GateDecision`] into a response; nothing here touches HTTP.
//!
//! | Route   | `Pending` | `Unauthenticated` | `Authenticated` |
//! |---------|-----------|-------------------|-----------------|
//! | public  | render    | render            | render          |
//! | private | loading   | redirect to login | protected + breadcrumbs |

pub mod breadcrumbs;

use serde::{Deserialize, Serialize};

pub use breadcrumbs::{Breadcrumb, breadcrumbs};

/// Default login entry point for the account area.
pub const DEFAULT_LOGIN_PATH: &str = "/account/login";

/// Default allow-list of account paths reachable without signing in.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &["/account/login", "/account/register"];

/// Result of resolving a visitor's identity.
///
/// `Pending` is the initial state; it moves to one of the two terminal states
/// exactly once per credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "identity", rename_all = "snake_case")]
pub enum AuthState<T> {
    /// Identity resolution is still in flight.
    Pending,
    /// Identity resolved and present.
    Authenticated(T),
    /// Identity resolved and absent (or rejected).
    Unauthenticated,
}

impl<T> AuthState<T> {
    /// Whether the state is terminal.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// The resolved identity, if authenticated.
    #[must_use]
    pub const fn identity(&self) -> Option<&T> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Pending | Self::Unauthenticated => None,
        }
    }
}

/// Static classification of an account route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable without authentication.
    Public,
    /// Requires an authenticated identity.
    Private,
}

/// What to do with an account page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Public route: render as-is.
    Render,
    /// Private route, identity still resolving: show a neutral placeholder.
    Loading,
    /// Private route, no identity: send the visitor to the login page.
    Redirect {
        /// Login entry point.
        to: String,
    },
    /// Private route, identity present: render with a breadcrumb trail.
    Protected {
        /// Trail computed from the request path.
        breadcrumbs: Vec<Breadcrumb>,
    },
}

/// Route classification and login target for the account area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountGate {
    login_path: String,
    public_paths: Vec<String>,
}

impl Default for AccountGate {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_PATH, DEFAULT_PUBLIC_PATHS.iter().copied())
    }
}

impl AccountGate {
    /// Create a gate with a login path and the allow-listed public paths.
    #[must_use]
    pub fn new<I, S>(login_path: impl Into<String>, public_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            login_path: login_path.into(),
            public_paths: public_paths
                .into_iter()
                .map(|p| {
                    let p: String = p.into();
                    normalize(&p).to_owned()
                })
                .collect(),
        }
    }

    /// The login entry point unauthenticated visitors are sent to.
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Classify a request path. Trailing slashes are ignored.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        let path = normalize(path);
        if self.public_paths.iter().any(|p| p == path) {
            RouteClass::Public
        } else {
            RouteClass::Private
        }
    }

    /// Decide how to answer a request for `path` given the visitor's state.
    #[must_use]
    pub fn decide<T>(&self, path: &str, state: &AuthState<T>) -> GateDecision {
        match (self.classify(path), state) {
            (RouteClass::Public, _) => GateDecision::Render,
            (RouteClass::Private, AuthState::Pending) => GateDecision::Loading,
            (RouteClass::Private, AuthState::Unauthenticated) => GateDecision::Redirect {
                to: self.login_path.clone(),
            },
            (RouteClass::Private, AuthState::Authenticated(_)) => GateDecision::Protected {
                breadcrumbs: breadcrumbs(path),
            },
        }
    }
}

/// One observation of the gate: the decision plus the redirect to issue now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateStep {
    /// Decision for the observed state.
    pub decision: GateDecision,
    /// Redirect target to navigate to, present only on the observation that
    /// first reached the redirect decision.
    pub redirect: Option<String>,
}

/// Consumer of a stream of auth states for one page.
///
/// Re-observing an unauthenticated state does not re-issue the redirect; it
/// fires once per transition into `Unauthenticated`.
#[derive(Debug, Clone, Default)]
pub struct GateObserver {
    gate: AccountGate,
    redirected: bool,
}

impl GateObserver {
    /// Observe states through `gate`.
    #[must_use]
    pub const fn new(gate: AccountGate) -> Self {
        Self {
            gate,
            redirected: false,
        }
    }

    /// Feed the current state for `path`.
    pub fn observe<T>(&mut self, path: &str, state: &AuthState<T>) -> GateStep {
        let decision = self.gate.decide(path, state);
        let redirect = match &decision {
            GateDecision::Redirect { to } if !self.redirected => {
                self.redirected = true;
                Some(to.clone())
            }
            GateDecision::Redirect { .. } => None,
            _ => {
                self.redirected = false;
                None
            }
        };
        GateStep { decision, redirect }
    }
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}
