//! Account records exchanged with the backend.
//!
//! The session layer only cares about a handful of user fields (who the
//! user is, whether they are an administrator, what to display). Every
//! other field the backend sends is kept in [`User::extra`] so nothing
//! is lost when the record is persisted and read back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A decoded user profile.
///
/// `#[serde(flatten)]` on `extra` collects every unknown key, so a
/// round trip through storage preserves fields this crate doesn't model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Role name as sent by the backend (`"admin"`, `"user"`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Explicit administrator flag, for backends that send one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Returns `true` if the role is `admin` (any case) or the
    /// `is_admin` flag is set.
    pub fn is_admin(&self) -> bool {
        self.is_admin.unwrap_or(false)
            || self
                .role
                .as_deref()
                .is_some_and(|r| r.eq_ignore_ascii_case("admin"))
    }

    /// A name suitable for display: `name`, then `first last`, then email.
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return Some(full);
        }
        self.email.clone()
    }

    /// Converts the record to a JSON value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if a field in `extra` can't be
    /// serialized (not possible for values that came from JSON).
    pub fn to_value(&self) -> Result<Value, ProtocolError> {
        serde_json::to_value(self).map_err(ProtocolError::Encode)
    }

    /// Builds a record from a JSON value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if `value` is not an object or
    /// a known field has the wrong type.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        serde_json::from_value(value).map_err(ProtocolError::Decode)
    }

    /// Shallow merge: every top-level key in `patch` overwrites the
    /// same key in this record.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidPayload`] if `patch` is not a
    /// JSON object, or a decode error if the merged record is invalid.
    pub fn merged(&self, patch: &Value) -> Result<Self, ProtocolError> {
        let Value::Object(patch) = patch else {
            return Err(ProtocolError::InvalidPayload(
                "user patch must be a JSON object".into(),
            ));
        };
        let mut current = match self.to_value()? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            current.insert(key.clone(), value.clone());
        }
        Self::from_value(Value::Object(current))
    }
}

// ---------------------------------------------------------------------------
// Credentials / AuthPayload
// ---------------------------------------------------------------------------

/// Login form input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// The part of a login response the session layer keeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

/// The `{ success, message, data }` wrapper many endpoints reply with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl AuthPayload {
    /// Reads a login response body.
    ///
    /// Accepts both `{ "token": .., "user": .. }` and the wrapped form
    /// `{ "success": true, "data": { "token": .., "user": .. } }`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidPayload`] when neither shape
    /// carries a token and a user.
    pub fn from_body(body: &Value) -> Result<Self, ProtocolError> {
        if let Ok(payload) = serde_json::from_value::<AuthPayload>(body.clone()) {
            return Ok(payload);
        }
        match serde_json::from_value::<ApiEnvelope<AuthPayload>>(body.clone()) {
            Ok(ApiEnvelope {
                data: Some(payload),
                ..
            }) => Ok(payload),
            _ => Err(ProtocolError::InvalidPayload(
                "login response carries no token/user".into(),
            )),
        }
    }
}

/// Reads a user record from a profile response: either the user object
/// itself, `{ "user": .. }`, or `{ "data": .. }` / `{ "data": { "user": .. } }`.
///
/// Returns `None` when the body doesn't look like a user record.
pub fn user_from_body(body: &Value) -> Option<User> {
    let Value::Object(map) = body else {
        return None;
    };
    let candidate = map
        .get("user")
        .or_else(|| map.get("data").and_then(|d| d.get("user").or(Some(d))))
        .unwrap_or(body);
    match candidate {
        Value::Object(fields) if fields.contains_key("id") || fields.contains_key("email") => {
            User::from_value(candidate.clone()).ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_admin_reads_role_case_insensitively() {
        let user = User {
            role: Some("ADMIN".into()),
            ..User::default()
        };
        assert!(user.is_admin());
    }

    #[test]
    fn test_is_admin_reads_flag() {
        let user = User {
            role: Some("user".into()),
            is_admin: Some(true),
            ..User::default()
        };
        assert!(user.is_admin());
        assert!(!User::default().is_admin());
    }

    #[test]
    fn test_display_name_prefers_name_then_parts_then_email() {
        let mut user = User {
            email: Some("a@b.c".into()),
            ..User::default()
        };
        assert_eq!(user.display_name().as_deref(), Some("a@b.c"));

        user.first_name = Some("Zoé".into());
        user.last_name = Some("Martin".into());
        assert_eq!(user.display_name().as_deref(), Some("Zoé Martin"));

        user.name = Some("zoe.m".into());
        assert_eq!(user.display_name().as_deref(), Some("zoe.m"));
    }

    #[test]
    fn test_extra_fields_survive_round_trip() {
        let value = json!({ "id": 7, "email": "a@b.c", "plan": "gold" });

        let user = User::from_value(value.clone()).unwrap();

        assert_eq!(user.extra.get("plan"), Some(&json!("gold")));
        assert_eq!(user.to_value().unwrap(), value);
    }

    #[test]
    fn test_merged_overwrites_top_level_keys() {
        let user = User::from_value(json!({ "id": 1, "name": "old", "plan": "free" })).unwrap();

        let merged = user.merged(&json!({ "name": "new", "city": "Lyon" })).unwrap();

        assert_eq!(merged.name.as_deref(), Some("new"));
        assert_eq!(merged.id, Some(json!(1)));
        assert_eq!(merged.extra.get("plan"), Some(&json!("free")));
        assert_eq!(merged.extra.get("city"), Some(&json!("Lyon")));
    }

    #[test]
    fn test_merged_non_object_patch_returns_error() {
        let result = User::default().merged(&json!([1, 2]));

        assert!(matches!(result, Err(ProtocolError::InvalidPayload(_))));
    }

    #[test]
    fn test_auth_payload_reads_flat_and_wrapped_shapes() {
        let flat = json!({ "token": "a.b.c", "user": { "id": 1 } });
        let wrapped = json!({ "success": true, "message": "ok", "data": { "token": "a.b.c", "user": { "id": 1 } } });

        assert_eq!(AuthPayload::from_body(&flat).unwrap().token, "a.b.c");
        assert_eq!(AuthPayload::from_body(&wrapped).unwrap().token, "a.b.c");
    }

    #[test]
    fn test_auth_payload_without_token_returns_invalid_payload() {
        let body = json!({ "success": true, "data": { "user": { "id": 1 } } });

        assert!(matches!(
            AuthPayload::from_body(&body),
            Err(ProtocolError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_user_from_body_reads_nested_shapes() {
        let direct = json!({ "id": 1, "email": "a@b.c" });
        let keyed = json!({ "user": { "id": 2 } });
        let data = json!({ "success": true, "data": { "id": 3 } });
        let data_user = json!({ "data": { "user": { "id": 4 } } });

        assert_eq!(user_from_body(&direct).unwrap().id, Some(json!(1)));
        assert_eq!(user_from_body(&keyed).unwrap().id, Some(json!(2)));
        assert_eq!(user_from_body(&data).unwrap().id, Some(json!(3)));
        assert_eq!(user_from_body(&data_user).unwrap().id, Some(json!(4)));
        assert!(user_from_body(&json!({ "success": true })).is_none());
    }
}
