//! Published entity schemas: Manifest (v1) and Bundle (v2).
//!
//! An entity is immutable once published. A new version is a new entity;
//! there is no update or delete path.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::EntityKey;

/// Maximum entries in each of `provides`/`requires`/`exports`/`uses`.
pub const MAX_INTERFACES: usize = 16;

/// Maximum entries in a manifest's `dependencies` list.
pub const MAX_DEPENDENCIES: usize = 32;

/// A v1 manifest describing one published WASM artifact.
///
/// Unknown top-level fields are rejected; transport-only `_`-prefixed
/// fields must be stripped before parsing (see [`crate::canonical`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Reverse-domain package identifier.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Semantic version of this release.
    pub version: String,
    /// Chains this artifact targets.
    #[serde(default)]
    pub chains: Vec<String>,
    pub artifact: Artifact,
    /// Interface tags this entity implements, `<name>@<major>`.
    #[serde(default)]
    pub provides: Vec<String>,
    /// Interface tags this entity consumes, `<name>@<major>`.
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureBlock>,
}

/// Pointer to the artifact bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Artifact {
    #[serde(rename = "type")]
    pub kind: String,
    pub target: String,
    /// `sha256:` + 64 hex chars.
    pub digest: String,
    /// `https://` or `ipfs://` location.
    pub uri: String,
}

/// One entry in a manifest's dependency list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    /// Semver range, e.g. `^1.0.0`.
    pub range: String,
}

/// A detached signature over the entity's canonical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBlock {
    /// Signature algorithm; only `ed25519` is accepted.
    pub alg: String,
    /// Public key, base64url without padding.
    pub pubkey: String,
    /// Signature bytes, base64url without padding.
    pub sig: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<String>,
}

/// A v2 bundle: manifest-equivalent metadata plus wasm/abi/migrations
/// and optional ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    /// Reverse-domain package identifier.
    pub package: String,
    #[serde(rename = "appVersion")]
    pub app_version: String,
    pub metadata: BundleMetadata,
    /// Exported/consumed interface names. Each member must be an array of
    /// non-empty strings when present, or absent/null.
    #[serde(default)]
    pub interfaces: Option<Interfaces>,
    pub wasm: WasmRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<serde_json::Value>,
    #[serde(default)]
    pub migrations: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<serde_json::Value>,
    /// Public keys allowed to write to this key after the claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owners: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interfaces {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasmRef {
    pub path: String,
    /// `sha256:` + 64 hex chars.
    pub hash: String,
    pub size: u64,
}

/// Which schema an entity arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVersion {
    V1,
    V2,
}

/// A published entity in either schema, with uniform accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entity {
    Bundle(Bundle),
    Manifest(Manifest),
}

impl Entity {
    /// Parse raw JSON bytes into an entity.
    ///
    /// Transport-only `_`-prefixed fields are tolerated and discarded.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ValidationError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| ValidationError::StructuralError(e.to_string()))?;
        Self::from_value(crate::canonical::strip_transport_fields(&value))
    }

    /// Parse a JSON value into an entity, dispatching on the schema
    /// discriminator (`package` for v2, `id` for v1).
    pub fn from_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ValidationError::StructuralError("expected a JSON object".into()))?;

        if obj.contains_key("package") {
            let bundle: Bundle = serde_json::from_value(value)
                .map_err(|e| ValidationError::StructuralError(e.to_string()))?;
            Ok(Entity::Bundle(bundle))
        } else if obj.contains_key("id") {
            let manifest: Manifest = serde_json::from_value(value)
                .map_err(|e| ValidationError::StructuralError(e.to_string()))?;
            Ok(Entity::Manifest(manifest))
        } else {
            Err(ValidationError::StructuralError(
                "missing schema discriminator (`id` or `package`)".into(),
            ))
        }
    }

    pub fn schema_version(&self) -> SchemaVersion {
        match self {
            Entity::Manifest(_) => SchemaVersion::V1,
            Entity::Bundle(_) => SchemaVersion::V2,
        }
    }

    /// The package identifier, whichever schema carries it.
    pub fn id(&self) -> &str {
        match self {
            Entity::Manifest(m) => &m.id,
            Entity::Bundle(b) => &b.package,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Entity::Manifest(m) => &m.version,
            Entity::Bundle(b) => &b.app_version,
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.id(), self.version())
    }

    pub fn display_name(&self) -> &str {
        match self {
            Entity::Manifest(m) => &m.name,
            Entity::Bundle(b) => &b.metadata.name,
        }
    }

    /// Interface tags this entity offers (`provides` / `exports`).
    pub fn provides(&self) -> &[String] {
        match self {
            Entity::Manifest(m) => &m.provides,
            Entity::Bundle(b) => b
                .interfaces
                .as_ref()
                .and_then(|i| i.exports.as_deref())
                .unwrap_or(&[]),
        }
    }

    /// Interface tags this entity consumes (`requires` / `uses`).
    pub fn requires(&self) -> &[String] {
        match self {
            Entity::Manifest(m) => &m.requires,
            Entity::Bundle(b) => b
                .interfaces
                .as_ref()
                .and_then(|i| i.uses.as_deref())
                .unwrap_or(&[]),
        }
    }

    /// Declared dependencies; bundles are leaves in the dependency graph.
    pub fn dependencies(&self) -> &[Dependency] {
        match self {
            Entity::Manifest(m) => &m.dependencies,
            Entity::Bundle(_) => &[],
        }
    }

    pub fn signature(&self) -> Option<&SignatureBlock> {
        match self {
            Entity::Manifest(m) => m.signature.as_ref(),
            Entity::Bundle(b) => b.signature.as_ref(),
        }
    }

    pub fn owners(&self) -> Option<&[String]> {
        match self {
            Entity::Manifest(_) => None,
            Entity::Bundle(b) => b.owners.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_json() -> serde_json::Value {
        serde_json::json!({
            "id": "com.example.app",
            "name": "Example App",
            "version": "1.0.0",
            "chains": ["mainnet"],
            "artifact": {
                "type": "wasm",
                "target": "wasm32-wasi",
                "digest": format!("sha256:{}", "0".repeat(64)),
                "uri": "https://artifacts.example.com/app.wasm"
            },
            "provides": ["x.y@1"],
            "requires": [],
            "dependencies": [{"id": "com.example.lib", "range": "^1.0.0"}]
        })
    }

    #[test]
    fn test_manifest_dispatch() {
        let entity = Entity::from_value(manifest_json()).unwrap();
        assert_eq!(entity.schema_version(), SchemaVersion::V1);
        assert_eq!(entity.id(), "com.example.app");
        assert_eq!(entity.version(), "1.0.0");
        assert_eq!(entity.provides(), ["x.y@1".to_string()]);
        assert_eq!(entity.dependencies().len(), 1);
    }

    #[test]
    fn test_manifest_rejects_unknown_fields() {
        let mut value = manifest_json();
        value["surprise"] = serde_json::json!(true);
        assert!(Entity::from_value(value).is_err());
    }

    #[test]
    fn test_manifest_tolerates_transport_fields() {
        let payload = serde_json::to_vec(&serde_json::json!({
            "id": "com.example.app",
            "name": "Example App",
            "version": "1.0.0",
            "artifact": {
                "type": "wasm",
                "target": "wasm32-wasi",
                "digest": format!("sha256:{}", "0".repeat(64)),
                "uri": "https://artifacts.example.com/app.wasm"
            },
            "_payload": "aGVsbG8=",
            "_overwrite": false
        }))
        .unwrap();
        let entity = Entity::from_json(&payload).unwrap();
        assert_eq!(entity.id(), "com.example.app");
    }

    #[test]
    fn test_bundle_dispatch() {
        let value = serde_json::json!({
            "package": "org.acme.widget",
            "appVersion": "2.1.0",
            "metadata": {"name": "Widget", "description": "A widget"},
            "interfaces": {"exports": ["draw@1"], "uses": null},
            "wasm": {"path": "widget.wasm", "hash": format!("sha256:{}", "a".repeat(64)), "size": 1024}
        });
        let entity = Entity::from_value(value).unwrap();
        assert_eq!(entity.schema_version(), SchemaVersion::V2);
        assert_eq!(entity.id(), "org.acme.widget");
        assert_eq!(entity.provides(), ["draw@1".to_string()]);
        assert!(entity.requires().is_empty());
        assert!(entity.dependencies().is_empty());
    }

    #[test]
    fn test_bundle_rejects_non_array_interfaces() {
        let value = serde_json::json!({
            "package": "org.acme.widget",
            "appVersion": "2.1.0",
            "metadata": {"name": "Widget", "description": "A widget"},
            "interfaces": {"exports": "draw@1"},
            "wasm": {"path": "widget.wasm", "hash": format!("sha256:{}", "a".repeat(64)), "size": 1024}
        });
        assert!(Entity::from_value(value).is_err());
    }

    #[test]
    fn test_missing_discriminator() {
        let value = serde_json::json!({"name": "nothing else"});
        assert!(Entity::from_value(value).is_err());
    }
}
