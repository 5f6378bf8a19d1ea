//! Configuration for the Registry.

use berth_core::SignaturePolicy;
use berth_resolver::ResolverConfig;

/// Registry-wide knobs, injected at construction.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Policy for v1 manifests that arrive without a signature block.
    /// A present signature must always verify.
    pub manifest_signatures: SignaturePolicy,
    /// Policy for v2 bundles that arrive without a signature block.
    pub bundle_signatures: SignaturePolicy,
    /// Maximum accepted publish payload, in bytes. Enforced before any
    /// parsing or cryptographic work.
    pub max_payload_bytes: usize,
    /// Resolver bounds and policy.
    pub resolver: ResolverConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            manifest_signatures: SignaturePolicy::ALLOW_UNSIGNED,
            bundle_signatures: SignaturePolicy::ALLOW_UNSIGNED,
            max_payload_bytes: 1024 * 1024,
            resolver: ResolverConfig::default(),
        }
    }
}
