//! Registry host classification.
//!
//! A resolved host maps to exactly one [`RegistryKind`], which decides
//! which metadata source answers path and version queries: the curated
//! public-module store covers `Mcr` and `PublicBicepRegistry`; a
//! `GenericAcr` host is addressable but not enumerable by content.

use crate::completion::aliases::MCR_REGISTRY;
use crate::types::RegistryKind;

/// Classify a registry host.
///
/// `public_host` is the host the effective `public` alias resolves to
/// (normally `mcr.microsoft.com`, different when the user overrides the
/// alias). The literal MCR host wins over the public-alias host when the
/// two coincide.
pub fn classify_registry(host: &str, public_host: &str) -> RegistryKind {
    if host == MCR_REGISTRY {
        RegistryKind::Mcr
    } else if host == public_host {
        RegistryKind::PublicBicepRegistry
    } else {
        RegistryKind::GenericAcr
    }
}

/// Whether the curated public-module metadata source answers for hosts of
/// this kind.
pub fn serves_curated_metadata(kind: RegistryKind) -> bool {
    match kind {
        RegistryKind::Mcr | RegistryKind::PublicBicepRegistry => true,
        RegistryKind::GenericAcr => false,
    }
}

/// The classification value posted with telemetry.
pub fn telemetry_registry_type(kind: RegistryKind) -> &'static str {
    match kind {
        RegistryKind::Mcr | RegistryKind::PublicBicepRegistry => "MCR",
        RegistryKind::GenericAcr => "ACR",
    }
}
