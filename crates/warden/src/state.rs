use serde::{Deserialize, Serialize};

/// The façade's session state.
///
/// ```text
/// Anonymous ──login / restore──→ Authenticated
///     ↑                               │
///     ├──logout / timeout / forced────┤
///     │                               ↓ suspended or unreachable
///     └──────delayed redirect──── Suspended
/// ```
///
/// `Suspended` is transient: the session is already gone, and the
/// state resolves to `Anonymous` when the delayed redirect fires (or
/// earlier, if anything forces a logout first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthState {
    Anonymous,
    Authenticated,
    Suspended,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::Authenticated => write!(f, "Authenticated"),
            Self::Suspended => write!(f, "Suspended"),
        }
    }
}
