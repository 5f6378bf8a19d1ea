//! Property tests for canonicalization, signing, and version ordering.

use proptest::prelude::*;
use serde_json::Value;

use berth_core::{
    canonicalize_value, cmp_versions_desc, parse_version, sort_versions_desc, verify_entity,
    Signature, SignaturePolicy,
};
use berth_testkit::generators;
use berth_testkit::ManifestBuilder;

/// Re-serialize a document with object keys in reverse order, arrays
/// untouched. Parsing the result yields a document deep-equal to the
/// original up to key order.
fn write_reversed(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.reverse();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).unwrap());
                out.push(':');
                write_reversed(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_reversed(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&serde_json::to_string(other).unwrap()),
    }
}

proptest! {
    #[test]
    fn canonicalization_is_deterministic(value in generators::json_value()) {
        prop_assert_eq!(canonicalize_value(&value), canonicalize_value(&value));
    }

    #[test]
    fn canonicalization_ignores_key_order(value in generators::json_object()) {
        let mut reversed_text = String::new();
        write_reversed(&value, &mut reversed_text);
        let reparsed: Value = serde_json::from_str(&reversed_text).unwrap();
        prop_assert_eq!(canonicalize_value(&value), canonicalize_value(&reparsed));
    }

    #[test]
    fn canonicalization_ignores_signature_and_transport_fields(
        value in generators::json_object(),
        extra in generators::json_value(),
    ) {
        let mut decorated = value.clone();
        let obj = decorated.as_object_mut().unwrap();
        obj.insert("signature".to_string(), extra.clone());
        obj.insert("_payload".to_string(), extra);
        obj.insert("_overwrite".to_string(), Value::Bool(true));
        prop_assert_eq!(canonicalize_value(&value), canonicalize_value(&decorated));
    }

    #[test]
    fn canonical_output_is_valid_json(value in generators::json_value()) {
        let bytes = canonicalize_value(&value);
        let reparsed: Result<Value, _> = serde_json::from_slice(&bytes);
        prop_assert!(reparsed.is_ok());
    }

    #[test]
    fn sign_then_verify_roundtrip(
        keypair in generators::keypair(),
        id in generators::package_id(),
        version in generators::semver_version(),
        tags in prop::collection::vec(generators::interface_tag(), 0..4),
    ) {
        let tag_refs: Vec<&str> = tags.iter().map(String::as_str).collect();
        let entity = ManifestBuilder::new(&id, &version)
            .provides(&tag_refs)
            .sign(&keypair);
        prop_assert!(verify_entity(&entity, SignaturePolicy::REQUIRE_SIGNED).is_ok());
    }

    #[test]
    fn flipped_signature_bit_fails(
        keypair in generators::keypair(),
        id in generators::package_id(),
        version in generators::semver_version(),
        byte_index in 0usize..64,
        mask in 1u8..=255,
    ) {
        let entity = ManifestBuilder::new(&id, &version).sign(&keypair);
        let berth_core::Entity::Manifest(mut manifest) = entity else {
            unreachable!("builder produces manifests");
        };
        let block = manifest.signature.as_mut().unwrap();
        let mut sig = Signature::from_wire(&block.sig).unwrap();
        sig.0[byte_index] ^= mask;
        block.sig = sig.to_wire();

        let tampered = berth_core::Entity::Manifest(manifest);
        prop_assert!(verify_entity(&tampered, SignaturePolicy::REQUIRE_SIGNED).is_err());
    }

    #[test]
    fn mutated_payload_fails_verification(
        keypair in generators::keypair(),
        id in generators::package_id(),
        version in generators::semver_version(),
    ) {
        let entity = ManifestBuilder::new(&id, &version).sign(&keypair);
        let berth_core::Entity::Manifest(mut manifest) = entity else {
            unreachable!("builder produces manifests");
        };
        manifest.name.push('!');

        let tampered = berth_core::Entity::Manifest(manifest);
        prop_assert!(verify_entity(&tampered, SignaturePolicy::REQUIRE_SIGNED).is_err());
    }

    #[test]
    fn version_sort_is_descending(
        versions in prop::collection::vec(generators::semver_version_with_prerelease(), 0..12),
    ) {
        let mut sorted = versions.clone();
        sort_versions_desc(&mut sorted);

        // Same multiset.
        let mut lhs = versions.clone();
        let mut rhs = sorted.clone();
        lhs.sort();
        rhs.sort();
        prop_assert_eq!(lhs, rhs);

        // Pairwise non-increasing by semver precedence.
        for pair in sorted.windows(2) {
            let a = parse_version(&pair[0]).unwrap();
            let b = parse_version(&pair[1]).unwrap();
            prop_assert!(a >= b);
        }
    }

    #[test]
    fn version_comparator_is_total(
        a in generators::semver_version_with_prerelease(),
        b in generators::semver_version_with_prerelease(),
    ) {
        let forward = cmp_versions_desc(&a, &b);
        let backward = cmp_versions_desc(&b, &a);
        prop_assert_eq!(forward, backward.reverse());
    }
}
