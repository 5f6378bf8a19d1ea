//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::Value;

use berth_core::Keypair;

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a valid reverse-domain package id.
pub fn package_id() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}(\\.[a-z0-9]{1,8}){1,3}".prop_map(String::from)
}

/// Generate a plain `major.minor.patch` version.
pub fn semver_version() -> impl Strategy<Value = String> {
    (0u64..20, 0u64..20, 0u64..20).prop_map(|(major, minor, patch)| {
        format!("{major}.{minor}.{patch}")
    })
}

/// Generate a version that may carry a prerelease tag.
pub fn semver_version_with_prerelease() -> impl Strategy<Value = String> {
    (semver_version(), prop::option::of("(alpha|beta|rc)\\.[1-9]")).prop_map(
        |(version, prerelease)| match prerelease {
            Some(tag) => format!("{version}-{tag}"),
            None => version,
        },
    )
}

/// Generate a versioned interface tag `<name>@<major>`.
pub fn interface_tag() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9]{0,6}(\\.[a-z0-9]{1,6}){0,2}", 1u32..10)
        .prop_map(|(name, major)| format!("{name}@{major}"))
}

/// Generate an object key that is neither `signature` nor `_`-prefixed.
fn json_key() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9]{0,8}".prop_filter("reserved key", |k| k.as_str() != "signature")
}

/// Generate an arbitrary JSON document (bounded depth and width).
pub fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 _.\\-]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map(json_key(), inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Generate a JSON document that is an object at the top level.
pub fn json_object() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(json_key(), json_value(), 0..6)
        .prop_map(|map| Value::Object(map.into_iter().collect()))
}
