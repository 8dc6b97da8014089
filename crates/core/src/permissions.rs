//! Authorization decisions.
//!
//! Pure and side-effect free: the trust boundary is the storage provider's
//! access policy, so this evaluator only decides what the UI should offer
//! and what the facade should attempt.

use crate::config::WikiConfig;
use crate::principal::{Principal, Role};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Actions a caller can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
    Upload,
    Delete,
    Admin,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Upload => "upload",
            Self::Delete => "delete",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decide whether the given principal may perform the action.
///
/// `None` is an unauthenticated visitor and is treated exactly like a
/// principal with [`Role::Guest`]: read-only, and only when
/// `allow_guest_access` is set. Regular users get read/write/upload but not
/// delete; admins get everything.
pub fn check_permission(principal: Option<&Principal>, action: Action, config: &WikiConfig) -> bool {
    let role = principal.map(|p| p.role).unwrap_or(Role::Guest);
    match role {
        Role::Admin => true,
        Role::Regular => matches!(action, Action::Read | Action::Write | Action::Upload),
        Role::Guest => matches!(action, Action::Read) && config.allow_guest_access,
    }
}
