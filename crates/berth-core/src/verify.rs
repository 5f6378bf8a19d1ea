//! Signature verification and the write-ownership predicate.

use std::collections::BTreeSet;

use crate::canonical::signing_digest;
use crate::crypto::{Keypair, PublicKey, Sha256Hash, Signature};
use crate::error::CoreError;
use crate::manifest::{Entity, SignatureBlock};

/// Policy for entities that arrive without a signature block.
///
/// A signature that *is* present must always verify, regardless of
/// policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignaturePolicy {
    pub allow_unsigned: bool,
}

impl SignaturePolicy {
    pub const REQUIRE_SIGNED: Self = Self {
        allow_unsigned: false,
    };
    pub const ALLOW_UNSIGNED: Self = Self {
        allow_unsigned: true,
    };
}

/// Verify a signature block against a precomputed signing digest.
///
/// Steps: algorithm check (only `ed25519`, case-insensitive), wire
/// decode of key (32 bytes) and signature (64 bytes), Ed25519
/// verification over the digest. No side effects.
pub fn verify_block(block: &SignatureBlock, digest: &Sha256Hash) -> Result<(), CoreError> {
    if !block.alg.eq_ignore_ascii_case("ed25519") {
        return Err(CoreError::UnsupportedAlgorithm(block.alg.clone()));
    }
    let key = PublicKey::from_wire(&block.pubkey)?;
    let sig = Signature::from_wire(&block.sig)?;
    key.verify(digest.as_bytes(), &sig)
}

/// Verify an entity under the given policy.
///
/// Unsigned entities pass only when the policy allows them; signed
/// entities are verified over SHA-256 of their canonical bytes.
pub fn verify_entity(entity: &Entity, policy: SignaturePolicy) -> Result<(), CoreError> {
    match entity.signature() {
        Some(block) => verify_block(block, &signing_digest(entity)?),
        None if policy.allow_unsigned => Ok(()),
        None => Err(CoreError::InvalidSignature),
    }
}

/// Sign an entity, producing a detachable signature block.
///
/// The signed message is SHA-256 of the canonical bytes, so any
/// signature already attached to the entity does not affect the result.
pub fn sign_entity(entity: &Entity, keypair: &Keypair) -> Result<SignatureBlock, CoreError> {
    let digest = signing_digest(entity)?;
    let sig = keypair.sign(digest.as_bytes());
    Ok(SignatureBlock {
        alg: "ed25519".to_string(),
        pubkey: keypair.public_key().to_wire(),
        sig: sig.to_wire(),
        signed_at: None,
    })
}

/// Who may perform a non-creating write to an already-claimed key.
///
/// First-time claims are first-come-first-serve and never consult this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerPolicy {
    /// No ownership constraint is declared.
    Open,
    /// Only the listed public keys may write.
    RestrictedTo(BTreeSet<String>),
}

impl OwnerPolicy {
    /// Derive the policy declared by an existing entity: a non-empty
    /// `owners` list wins; otherwise the key embedded in the original
    /// signature; otherwise open.
    pub fn of(entity: &Entity) -> Self {
        if let Some(owners) = entity.owners() {
            if !owners.is_empty() {
                return Self::RestrictedTo(owners.iter().map(|k| normalize_key(k)).collect());
            }
        }
        match entity.signature() {
            Some(block) => {
                Self::RestrictedTo(std::iter::once(normalize_key(&block.pubkey)).collect())
            }
            None => Self::Open,
        }
    }

    pub fn allows(&self, public_key: &str) -> bool {
        match self {
            Self::Open => true,
            Self::RestrictedTo(keys) => keys.contains(&normalize_key(public_key)),
        }
    }
}

/// The ownership predicate consulted before a non-creating write.
pub fn is_allowed_owner(existing: &Entity, incoming_key: &str) -> bool {
    OwnerPolicy::of(existing).allows(incoming_key)
}

/// Keys may arrive in either base64 alphabet; compare their decoded form.
fn normalize_key(key: &str) -> String {
    match PublicKey::from_wire(key) {
        Ok(pk) => pk.to_wire(),
        Err(_) => key.trim().to_string(),
    }
}
