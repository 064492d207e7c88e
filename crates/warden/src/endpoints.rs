//! Backend endpoint paths and the credential exclusion list.

use serde::{Deserialize, Serialize};

/// Paths of the account endpoints, relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub login: String,
    pub register: String,
    pub forgot_password: String,
    pub reset_password: String,
    pub update_password: String,
    pub profile: String,
    pub update_profile: String,
    pub status: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/login".into(),
            register: "/register".into(),
            forgot_password: "/password/send-token".into(),
            reset_password: "/password/reset".into(),
            update_password: "/password/update".into(),
            profile: "/user".into(),
            update_profile: "/user/update".into(),
            status: "/status".into(),
        }
    }
}

impl Endpoints {
    /// Endpoints that are called without credentials.
    pub fn excluded(&self) -> [&str; 5] {
        [
            self.login.as_str(),
            self.register.as_str(),
            self.forgot_password.as_str(),
            self.reset_password.as_str(),
            self.status.as_str(),
        ]
    }

    /// Returns `true` if `endpoint` (a path or full URL, without query)
    /// ends with one of the excluded paths on a segment boundary.
    ///
    /// `/api/v1/login` matches `/login`; `/blogin` and `/login/history`
    /// do not.
    pub fn is_excluded(&self, endpoint: &str) -> bool {
        let endpoint = endpoint.trim_end_matches('/');
        self.excluded().into_iter().any(|excluded| {
            let excluded = excluded.trim_matches('/');
            !excluded.is_empty()
                && (endpoint == excluded
                    || endpoint
                        .strip_suffix(excluded)
                        .is_some_and(|prefix| prefix.ends_with('/')))
        })
    }
}
