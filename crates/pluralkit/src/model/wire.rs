//! Conversions between the per-version JSON shapes and the flat shape the
//! models are (de)serialized with.
//!
//! API v2 nests privacy settings under a `privacy` object and API v1 calls
//! the system time zone `tz`. Internally every model uses flat keys and
//! `timezone`.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{ApiVersion, ValidationError};

pub(crate) const PRIVACY_KEYS: &[&str] = &[
    "visibility",
    "name_privacy",
    "description_privacy",
    "birthday_privacy",
    "pronoun_privacy",
    "avatar_privacy",
    "banner_privacy",
    "metadata_privacy",
    "member_list_privacy",
    "group_list_privacy",
    "front_privacy",
    "front_history_privacy",
    "icon_privacy",
    "list_privacy",
];

const LENGTH_LIMITS: &[(&str, usize)] = &[
    ("name", 100),
    ("display_name", 100),
    ("pronouns", 100),
    ("description", 1000),
    ("tag", 79),
    ("avatar_url", 256),
    ("webhook_avatar_url", 256),
    ("banner", 256),
    ("icon", 256),
];

pub(crate) fn canonical<M: Serialize + ?Sized>(model: &M) -> Map<String, Value> {
    match serde_json::to_value(model) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Rewrites a response body (recursively) into the flat shape.
pub(crate) fn normalize(value: Value, version: ApiVersion) -> Value {
    match value {
        Value::Object(map) => Value::Object(normalize_object(map, version)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| normalize(item, version))
                .collect(),
        ),
        other => other,
    }
}

fn normalize_object(map: Map<String, Value>, version: ApiVersion) -> Map<String, Value> {
    let mut out = Map::with_capacity(map.len());
    let mut privacy = None;

    for (key, value) in map {
        match (version, key.as_str()) {
            (ApiVersion::V2, "privacy") => privacy = Some(value),
            (ApiVersion::V1, "tz") => {
                out.insert("timezone".to_string(), value);
            }
            _ => {
                out.insert(key, normalize(value, version));
            }
        }
    }

    // `"privacy": null` means the fields were hidden from us
    if let Some(Value::Object(fields)) = privacy {
        for (key, value) in fields {
            out.entry(key).or_insert(value);
        }
    }

    out
}

/// Shapes a flat payload for `version`.
pub(crate) fn denormalize(mut map: Map<String, Value>, version: ApiVersion) -> Value {
    match version {
        ApiVersion::V1 => {
            if let Some(tz) = map.remove("timezone") {
                map.insert("tz".to_string(), tz);
            }
        }
        ApiVersion::V2 => {
            let mut privacy = Map::new();
            for key in PRIVACY_KEYS {
                if let Some(value) = map.remove(*key) {
                    privacy.insert(key.to_string(), value);
                }
            }
            if !privacy.is_empty() {
                map.insert("privacy".to_string(), Value::Object(privacy));
            }
        }
    }

    Value::Object(map)
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Builds a patch of the `patchable` keys that differ between `synced` and
/// `current`.
///
/// Keys that are unset on both sides are left out. A key that was set and is
/// now unset is sent as `null`, except for privacy keys: those are only unset
/// when their value is unknown, which is never written.
pub(crate) fn diff(
    synced: &Map<String, Value>,
    current: &Map<String, Value>,
    patchable: &[&'static str],
) -> Result<Map<String, Value>, ValidationError> {
    let mut patch = Map::new();

    for &key in patchable {
        let now = current.get(key);
        let before = synced.get(key);

        if now.is_none() && PRIVACY_KEYS.contains(&key) {
            continue;
        }
        if (is_blank(now) && is_blank(before)) || now == before {
            continue;
        }

        let value = now.cloned().unwrap_or(Value::Null);
        check_field(key, &value)?;
        patch.insert(key.to_string(), value);
    }

    Ok(patch)
}

fn check_field(key: &'static str, value: &Value) -> Result<(), ValidationError> {
    if let Value::String(s) = value {
        if let Some(&(_, max)) = LENGTH_LIMITS.iter().find(|(field, _)| *field == key) {
            let len = s.chars().count();
            if len > max {
                return Err(ValidationError::TooLong { field: key, max, len });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_normalize_v2_privacy() {
        let raw = json!({
            "id": "abcde",
            "privacy": { "visibility": "private", "name_privacy": null },
            "members": [{ "id": "fghij", "privacy": null }],
        });

        let flat = normalize(raw, ApiVersion::V2);
        assert_eq!(flat["visibility"], "private");
        assert!(flat["name_privacy"].is_null());
        assert!(flat.get("privacy").is_none());
        assert!(flat["members"][0].get("privacy").is_none());
    }

    #[test]
    fn test_normalize_v1_timezone() {
        let flat = normalize(json!({ "id": "abcde", "tz": "Europe/Paris" }), ApiVersion::V1);
        assert_eq!(flat["timezone"], "Europe/Paris");
        assert!(flat.get("tz").is_none());
    }

    #[test]
    fn test_denormalize() {
        let flat = object(json!({ "name": "a", "visibility": "public", "timezone": "UTC" }));

        let v2 = denormalize(flat.clone(), ApiVersion::V2);
        assert_eq!(v2, json!({ "name": "a", "timezone": "UTC", "privacy": { "visibility": "public" } }));

        let v1 = denormalize(flat, ApiVersion::V1);
        assert_eq!(v1, json!({ "name": "a", "visibility": "public", "tz": "UTC" }));
    }

    #[test]
    fn test_diff_only_changed() {
        let synced = object(json!({ "name": "a", "pronouns": "they/them", "proxy_tags": [] }));
        let current = object(json!({ "name": "b", "pronouns": "they/them", "proxy_tags": [] }));

        let patch = diff(&synced, &current, &["name", "pronouns", "proxy_tags"]).unwrap();
        assert_eq!(Value::Object(patch), json!({ "name": "b" }));
    }

    #[test]
    fn test_diff_clearing_and_unknown_privacy() {
        let synced = object(json!({ "pronouns": "she/her", "visibility": "public" }));
        let current = object(json!({ "pronouns": null }));

        let patch = diff(&synced, &current, &["pronouns", "visibility"]).unwrap();
        assert_eq!(Value::Object(patch), json!({ "pronouns": null }));
    }

    #[test]
    fn test_diff_limits() {
        let current = object(json!({ "tag": "x".repeat(80) }));
        assert_eq!(
            diff(&Map::new(), &current, &["tag"]),
            Err(ValidationError::TooLong { field: "tag", max: 79, len: 80 })
        );

        let current = object(json!({ "description": "ę".repeat(1000) }));
        assert!(diff(&Map::new(), &current, &["description"]).is_ok());
    }
}
