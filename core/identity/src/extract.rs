//! Normalization of identity ids out of backend auth responses.
//!
//! Auth backends nest the user object at different depths depending on the
//! call and on whether a session was issued. All lookups go through
//! [`extract_identity_id`] so call sites never probe response shapes.

use serde_json::Value;

use resilink_common::IdentityId;

/// Locations tried in order. The first non-empty string id wins.
const ID_PATHS: &[&[&str]] = &[
    &["user", "id"],
    &["data", "user", "id"],
    &["data", "session", "user", "id"],
    &["session", "user", "id"],
    &["id"],
];

/// Extract the identity id from an auth response.
///
/// Returns `None` when no location holds a non-empty string id, for example
/// a sign-up response that is waiting on email confirmation.
pub fn extract_identity_id(response: &Value) -> Option<IdentityId> {
    ID_PATHS.iter().find_map(|path| {
        path.iter()
            .try_fold(response, |node, key| node.get(key))
            .and_then(Value::as_str)
            .and_then(|id| IdentityId::new(id).ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_top_level_user() {
        let response = json!({ "access_token": "t", "user": { "id": "u-1" } });
        assert_eq!(extract_identity_id(&response).unwrap().as_str(), "u-1");
    }

    #[test]
    fn test_data_wrapped_user() {
        let response = json!({ "data": { "user": { "id": "u-2" }, "session": null } });
        assert_eq!(extract_identity_id(&response).unwrap().as_str(), "u-2");
    }

    #[test]
    fn test_session_user_when_user_null() {
        let response = json!({ "data": { "user": null, "session": { "user": { "id": "u-3" } } } });
        assert_eq!(extract_identity_id(&response).unwrap().as_str(), "u-3");
    }

    #[test]
    fn test_bare_user_object() {
        let response = json!({ "id": "u-4", "email": "a@b.c" });
        assert_eq!(extract_identity_id(&response).unwrap().as_str(), "u-4");
    }

    #[test]
    fn test_user_preferred_over_bare_id() {
        let response = json!({ "id": "outer", "user": { "id": "inner" } });
        assert_eq!(extract_identity_id(&response).unwrap().as_str(), "inner");
    }

    #[test]
    fn test_absent_or_unusable() {
        assert!(extract_identity_id(&json!(null)).is_none());
        assert!(extract_identity_id(&json!({ "user": null, "session": null })).is_none());
        assert!(extract_identity_id(&json!({ "user": { "id": "" } })).is_none());
        assert!(extract_identity_id(&json!({ "user": { "id": 42 } })).is_none());
    }

    proptest! {
        #[test]
        fn prop_any_nesting_yields_same_id(id in "[a-f0-9-]{1,36}", depth in 0usize..4) {
            let user = json!({ "id": id.clone() });
            let response = match depth {
                0 => json!({ "user": user }),
                1 => json!({ "data": { "user": user } }),
                2 => json!({ "data": { "session": { "user": user } } }),
                _ => user,
            };
            prop_assert_eq!(extract_identity_id(&response).map(|i| i.as_str().to_string()), Some(id));
        }
    }
}
