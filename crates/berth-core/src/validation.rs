//! Entity validation: structural checks that must pass before any write.
//!
//! A structurally invalid entity must never reach the store, so every
//! rule here runs before the atomic claim and index fan-out.

use crate::error::ValidationError;
use crate::manifest::{Bundle, Entity, Manifest, MAX_DEPENDENCIES, MAX_INTERFACES};
use crate::types::{DigestRef, InterfaceTag, PackageId};
use crate::version::{parse_range, parse_version};

/// Validate an entity's full structure.
pub fn validate_entity(entity: &Entity) -> Result<(), ValidationError> {
    match entity {
        Entity::Manifest(m) => validate_manifest(m),
        Entity::Bundle(b) => validate_bundle(b),
    }
}

/// Validate a v1 manifest.
pub fn validate_manifest(m: &Manifest) -> Result<(), ValidationError> {
    // 1. Package id grammar
    PackageId::parse(&m.id)?;

    // 2. Version must be valid semver
    parse_version(&m.version).map_err(|_| ValidationError::InvalidVersion(m.version.clone()))?;

    // 3. Display name
    if m.name.trim().is_empty() {
        return Err(ValidationError::StructuralError("empty name".into()));
    }

    // 4. Artifact digest format and uri scheme
    DigestRef::parse(&m.artifact.digest)?;
    validate_artifact_uri(&m.artifact.uri)?;

    // 5. Interface tag lists: bounded, each entry `<name>@<int>`
    validate_tag_list(&m.provides)?;
    validate_tag_list(&m.requires)?;

    // 6. Dependencies: bounded, valid ids, parseable ranges
    if m.dependencies.len() > MAX_DEPENDENCIES {
        return Err(ValidationError::TooManyDependencies {
            max: MAX_DEPENDENCIES,
        });
    }
    for dep in &m.dependencies {
        PackageId::parse(&dep.id)?;
        parse_range(&dep.range).map_err(|_| ValidationError::InvalidRange {
            id: dep.id.clone(),
            range: dep.range.clone(),
        })?;
    }

    // 7. Signature block shape, when present
    if let Some(block) = &m.signature {
        validate_signature_block(&block.alg, &block.pubkey, &block.sig)?;
    }

    Ok(())
}

/// Validate a v2 bundle.
pub fn validate_bundle(b: &Bundle) -> Result<(), ValidationError> {
    // 1. Package id grammar
    PackageId::parse(&b.package)?;

    // 2. appVersion must be valid semver
    parse_version(&b.app_version)
        .map_err(|_| ValidationError::InvalidVersion(b.app_version.clone()))?;

    // 3. Metadata name
    if b.metadata.name.trim().is_empty() {
        return Err(ValidationError::StructuralError("empty metadata.name".into()));
    }

    // 4. Interfaces: bounded lists of non-empty strings
    if let Some(interfaces) = &b.interfaces {
        if let Some(exports) = &interfaces.exports {
            validate_interface_names(exports)?;
        }
        if let Some(uses) = &interfaces.uses {
            validate_interface_names(uses)?;
        }
    }

    // 5. Wasm reference: non-empty path, digest-format hash
    if b.wasm.path.trim().is_empty() {
        return Err(ValidationError::StructuralError("empty wasm.path".into()));
    }
    DigestRef::parse(&b.wasm.hash)?;

    // 6. Owners, when declared, are non-empty public-key strings
    if let Some(owners) = &b.owners {
        if owners.iter().any(|key| key.trim().is_empty()) {
            return Err(ValidationError::StructuralError(
                "owners entries must be non-empty".into(),
            ));
        }
    }

    // 7. Signature block shape, when present
    if let Some(block) = &b.signature {
        validate_signature_block(&block.alg, &block.pubkey, &block.sig)?;
    }

    Ok(())
}

fn validate_tag_list(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_INTERFACES {
        return Err(ValidationError::TooManyInterfaces {
            max: MAX_INTERFACES,
        });
    }
    for tag in tags {
        InterfaceTag::parse(tag)?;
    }
    Ok(())
}

fn validate_interface_names(names: &[String]) -> Result<(), ValidationError> {
    if names.len() > MAX_INTERFACES {
        return Err(ValidationError::TooManyInterfaces {
            max: MAX_INTERFACES,
        });
    }
    if let Some(bad) = names.iter().find(|name| name.is_empty()) {
        return Err(ValidationError::InvalidInterfaceTag(bad.clone()));
    }
    Ok(())
}

fn validate_artifact_uri(uri: &str) -> Result<(), ValidationError> {
    if uri.starts_with("https://") || uri.starts_with("ipfs://") {
        Ok(())
    } else {
        Err(ValidationError::InvalidUri(uri.to_string()))
    }
}

fn validate_signature_block(alg: &str, pubkey: &str, sig: &str) -> Result<(), ValidationError> {
    if alg.trim().is_empty() || pubkey.trim().is_empty() || sig.trim().is_empty() {
        return Err(ValidationError::StructuralError(
            "incomplete signature block".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Artifact, Dependency, Interfaces};

    fn base_manifest() -> Manifest {
        Manifest {
            id: "com.example.app".into(),
            name: "Example App".into(),
            version: "1.0.0".into(),
            chains: vec!["mainnet".into()],
            artifact: Artifact {
                kind: "wasm".into(),
                target: "wasm32-wasi".into(),
                digest: format!("sha256:{}", "0".repeat(64)),
                uri: "https://artifacts.example.com/app.wasm".into(),
            },
            provides: vec!["x.y@1".into()],
            requires: vec![],
            dependencies: vec![],
            signature: None,
        }
    }

    fn base_bundle() -> Bundle {
        Bundle {
            package: "org.acme.widget".into(),
            app_version: "2.1.0".into(),
            metadata: crate::manifest::BundleMetadata {
                name: "Widget".into(),
                description: "A widget".into(),
                author: None,
            },
            interfaces: Some(Interfaces {
                exports: Some(vec!["draw@1".into()]),
                uses: None,
            }),
            wasm: crate::manifest::WasmRef {
                path: "widget.wasm".into(),
                hash: format!("sha256:{}", "a".repeat(64)),
                size: 1024,
            },
            abi: None,
            migrations: vec![],
            links: None,
            owners: None,
            signature: None,
        }
    }

    #[test]
    fn test_valid_manifest() {
        assert!(validate_manifest(&base_manifest()).is_ok());
    }

    #[test]
    fn test_manifest_bad_version() {
        let mut m = base_manifest();
        m.version = "not-semver".into();
        assert!(matches!(
            validate_manifest(&m),
            Err(ValidationError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_manifest_bad_digest() {
        let mut m = base_manifest();
        m.artifact.digest = "sha256:short".into();
        assert!(matches!(
            validate_manifest(&m),
            Err(ValidationError::InvalidDigest(_))
        ));
    }

    #[test]
    fn test_manifest_bad_uri_scheme() {
        let mut m = base_manifest();
        m.artifact.uri = "ftp://example.com/app.wasm".into();
        assert!(matches!(
            validate_manifest(&m),
            Err(ValidationError::InvalidUri(_))
        ));
    }

    #[test]
    fn test_manifest_too_many_provides() {
        let mut m = base_manifest();
        m.provides = (0..17).map(|i| format!("iface.n{i}@1")).collect();
        assert!(matches!(
            validate_manifest(&m),
            Err(ValidationError::TooManyInterfaces { max: 16 })
        ));
    }

    #[test]
    fn test_manifest_too_many_dependencies() {
        let mut m = base_manifest();
        m.dependencies = (0..33)
            .map(|i| Dependency {
                id: format!("com.example.dep{i}"),
                range: "^1.0.0".into(),
            })
            .collect();
        assert!(matches!(
            validate_manifest(&m),
            Err(ValidationError::TooManyDependencies { max: 32 })
        ));
    }

    #[test]
    fn test_manifest_bad_range() {
        let mut m = base_manifest();
        m.dependencies = vec![Dependency {
            id: "com.example.lib".into(),
            range: "not a range".into(),
        }];
        assert!(matches!(
            validate_manifest(&m),
            Err(ValidationError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_valid_bundle() {
        assert!(validate_bundle(&base_bundle()).is_ok());
    }

    #[test]
    fn test_bundle_empty_interface_entry() {
        let mut b = base_bundle();
        b.interfaces = Some(Interfaces {
            exports: Some(vec!["".into()]),
            uses: None,
        });
        assert!(matches!(
            validate_bundle(&b),
            Err(ValidationError::InvalidInterfaceTag(_))
        ));
    }

    #[test]
    fn test_bundle_empty_owner() {
        let mut b = base_bundle();
        b.owners = Some(vec!["good-key".into(), " ".into()]);
        assert!(validate_bundle(&b).is_err());
    }

    #[test]
    fn test_bundle_bad_hash() {
        let mut b = base_bundle();
        b.wasm.hash = "md5:abcd".into();
        assert!(matches!(
            validate_bundle(&b),
            Err(ValidationError::InvalidDigest(_))
        ));
    }
}
