//! JSON body editing shared by the entrypoint and raw auction carriers.
//!
//! Keys are dot-separated paths into the JSON document. Updates create
//! missing intermediate objects; deletes of missing keys are reported as
//! [`MutationError::KeyNotFound`] so the caller can surface a warning.

use super::MutationError;
use serde_json::{Map, Value};

/// Sets `path` to `value` in the JSON `body`, returning the new body bytes.
///
/// An empty body is treated as an empty object.
pub(crate) fn set_key(body: &[u8], path: &str, value: &Value) -> Result<Vec<u8>, MutationError> {
    let mut doc = parse(body)?;
    set_path(&mut doc, &segments(path), value.clone());
    serialize(&doc)
}

/// Removes `path` from the JSON `body`, returning the new body bytes.
pub(crate) fn delete_key(body: &[u8], path: &str) -> Result<Vec<u8>, MutationError> {
    let mut doc = parse(body)?;
    delete_path(&mut doc, &segments(path))?;
    serialize(&doc)
}

fn parse(body: &[u8]) -> Result<Value, MutationError> {
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body)
        .map_err(|_| MutationError::InvalidBody("body is not valid JSON".to_string()))
}

fn serialize(doc: &Value) -> Result<Vec<u8>, MutationError> {
    serde_json::to_vec(doc).map_err(|e| MutationError::InvalidValue(e.to_string()))
}

fn segments(path: &str) -> Vec<&str> {
    path.split('.').collect()
}

fn set_path(doc: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *doc = value;
        return;
    };

    // A non-object intermediate is replaced by an object.
    if !doc.is_object() {
        *doc = Value::Object(Map::new());
    }
    if let Value::Object(map) = doc {
        if rest.is_empty() {
            map.insert((*head).to_string(), value);
        } else {
            let child = map.entry((*head).to_string()).or_insert(Value::Null);
            set_path(child, rest, value);
        }
    }
}

fn delete_path(doc: &mut Value, segments: &[&str]) -> Result<(), MutationError> {
    let Some((head, rest)) = segments.split_first() else {
        return Err(MutationError::KeyNotFound);
    };
    let Value::Object(map) = doc else {
        return Err(MutationError::KeyNotFound);
    };

    if rest.is_empty() {
        map.remove(*head)
            .map(|_| ())
            .ok_or(MutationError::KeyNotFound)
    } else {
        let child = map.get_mut(*head).ok_or(MutationError::KeyNotFound)?;
        delete_path(child, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_value(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[test]
    fn test_set_top_level_key() {
        let body = br#"{"name": "John"}"#;
        let updated = set_key(body, "foo", &json!("bar")).unwrap();
        assert_eq!(as_value(&updated), json!({"name": "John", "foo": "bar"}));
    }

    #[test]
    fn test_set_overwrites_existing_key() {
        let body = br#"{"foo": 1}"#;
        let updated = set_key(body, "foo", &json!(2)).unwrap();
        assert_eq!(as_value(&updated), json!({"foo": 2}));
    }

    #[test]
    fn test_set_nested_key_creates_intermediates() {
        let updated = set_key(b"{}", "ext.prebid.debug", &json!(true)).unwrap();
        assert_eq!(
            as_value(&updated),
            json!({"ext": {"prebid": {"debug": true}}})
        );
    }

    #[test]
    fn test_set_on_empty_body() {
        let updated = set_key(b"", "foo", &json!("bar")).unwrap();
        assert_eq!(as_value(&updated), json!({"foo": "bar"}));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let body = br#"{"ext": 7}"#;
        let updated = set_key(body, "ext.debug", &json!(true)).unwrap();
        assert_eq!(as_value(&updated), json!({"ext": {"debug": true}}));
    }

    #[test]
    fn test_delete_top_level_key() {
        let body = br#"{"name": "John", "last_name": "Doe"}"#;
        let updated = delete_key(body, "name").unwrap();
        assert_eq!(as_value(&updated), json!({"last_name": "Doe"}));
    }

    #[test]
    fn test_delete_nested_key() {
        let body = br#"{"user": {"id": "u1", "yob": 2000}}"#;
        let updated = delete_key(body, "user.yob").unwrap();
        assert_eq!(as_value(&updated), json!({"user": {"id": "u1"}}));
    }

    #[test]
    fn test_delete_missing_key_is_reported() {
        let err = delete_key(br#"{"name": "John"}"#, "foo").unwrap_err();
        assert_eq!(err, MutationError::KeyNotFound);

        let err = delete_key(br#"{"user": {}}"#, "user.yob").unwrap_err();
        assert_eq!(err, MutationError::KeyNotFound);
    }

    #[test]
    fn test_invalid_body_is_reported() {
        let err = set_key(b"not json", "foo", &json!(1)).unwrap_err();
        assert_eq!(
            err,
            MutationError::InvalidBody("body is not valid JSON".to_string())
        );
    }
}
