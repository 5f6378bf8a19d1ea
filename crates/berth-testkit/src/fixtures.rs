//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a registry over the
//! in-memory backing plus entity builders with valid defaults.

use berth::{MemoryBacking, Registry, RegistryConfig};
use berth_core::{
    sign_entity, Artifact, Bundle, BundleMetadata, Dependency, Entity, Interfaces, Keypair,
    Manifest, WasmRef,
};

/// A test fixture with a keypair and an in-memory registry.
pub struct TestFixture {
    pub keypair: Keypair,
    pub registry: Registry<MemoryBacking>,
}

impl TestFixture {
    /// Create a new fixture with a random keypair and default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create with an explicit registry config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            keypair: Keypair::generate(),
            registry: Registry::new(MemoryBacking::new(), config),
        }
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            keypair: Keypair::from_seed(&seed),
            registry: Registry::new(MemoryBacking::new(), RegistryConfig::default()),
        }
    }

    /// Get the keypair's public key in wire form.
    pub fn public_key_wire(&self) -> String {
        self.keypair.public_key().to_wire()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A placeholder artifact digest (64 zero nibbles).
pub fn zero_digest() -> String {
    format!("sha256:{}", "0".repeat(64))
}

/// Builder for v1 manifests with valid defaults.
#[derive(Clone)]
pub struct ManifestBuilder {
    manifest: Manifest,
}

impl ManifestBuilder {
    pub fn new(id: &str, version: &str) -> Self {
        Self {
            manifest: Manifest {
                id: id.to_string(),
                name: format!("{id} display"),
                version: version.to_string(),
                chains: vec!["mainnet".to_string()],
                artifact: Artifact {
                    kind: "wasm".to_string(),
                    target: "wasm32-wasi".to_string(),
                    digest: zero_digest(),
                    uri: format!("https://artifacts.example.com/{id}/{version}.wasm"),
                },
                provides: vec![],
                requires: vec![],
                dependencies: vec![],
                signature: None,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.manifest.name = name.to_string();
        self
    }

    pub fn provides(mut self, tags: &[&str]) -> Self {
        self.manifest.provides = tags.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn requires(mut self, tags: &[&str]) -> Self {
        self.manifest.requires = tags.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn depends_on(mut self, id: &str, range: &str) -> Self {
        self.manifest.dependencies.push(Dependency {
            id: id.to_string(),
            range: range.to_string(),
        });
        self
    }

    pub fn build(self) -> Entity {
        Entity::Manifest(self.manifest)
    }

    /// Build and attach a signature over the canonical bytes.
    pub fn sign(mut self, keypair: &Keypair) -> Entity {
        let unsigned = Entity::Manifest(self.manifest.clone());
        let block = sign_entity(&unsigned, keypair).expect("manifest is serializable");
        self.manifest.signature = Some(block);
        Entity::Manifest(self.manifest)
    }
}

/// Builder for v2 bundles with valid defaults.
#[derive(Clone)]
pub struct BundleBuilder {
    bundle: Bundle,
}

impl BundleBuilder {
    pub fn new(package: &str, version: &str) -> Self {
        Self {
            bundle: Bundle {
                package: package.to_string(),
                app_version: version.to_string(),
                metadata: BundleMetadata {
                    name: format!("{package} display"),
                    description: "test bundle".to_string(),
                    author: None,
                },
                interfaces: None,
                wasm: WasmRef {
                    path: "app.wasm".to_string(),
                    hash: zero_digest(),
                    size: 1024,
                },
                abi: None,
                migrations: vec![],
                links: None,
                owners: None,
                signature: None,
            },
        }
    }

    pub fn exports(mut self, tags: &[&str]) -> Self {
        let interfaces = self.bundle.interfaces.get_or_insert_with(Interfaces::default);
        interfaces.exports = Some(tags.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn uses(mut self, tags: &[&str]) -> Self {
        let interfaces = self.bundle.interfaces.get_or_insert_with(Interfaces::default);
        interfaces.uses = Some(tags.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn owners(mut self, keys: &[&str]) -> Self {
        self.bundle.owners = Some(keys.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn build(self) -> Entity {
        Entity::Bundle(self.bundle)
    }

    /// Build and attach a signature over the canonical bytes.
    pub fn sign(mut self, keypair: &Keypair) -> Entity {
        let unsigned = Entity::Bundle(self.bundle.clone());
        let block = sign_entity(&unsigned, keypair).expect("bundle is serializable");
        self.bundle.signature = Some(block);
        Entity::Bundle(self.bundle)
    }
}
