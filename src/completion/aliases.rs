//! Module alias resolution.
//!
//! Aliases are named shortcuts defined in configuration: a `br` alias
//! resolves to a registry host plus an optional module path prefix, a `ts`
//! alias to a subscription/resource-group pair. The `br` scheme always has
//! an implicit `public` alias pointing at the public registry; a
//! user-defined alias of the same name replaces it in place (it stays
//! first in the listing and is never duplicated).

use crate::config::{BicepConfig, RegistryAlias, TemplateSpecAlias};

/// Name of the implicit `br` alias.
pub const PUBLIC_ALIAS: &str = "public";

/// The fixed public artifact registry host.
pub const MCR_REGISTRY: &str = "mcr.microsoft.com";

/// Root repository path under which curated modules live on the public
/// registry (`mcr.microsoft.com/bicep/<module path>`).
pub const MCR_MODULE_ROOT: &str = "bicep";

fn builtin_public_alias() -> RegistryAlias {
    RegistryAlias {
        registry: MCR_REGISTRY.to_string(),
        module_path: Some(MCR_MODULE_ROOT.to_string()),
    }
}

/// The effective, ordered `br` alias listing: `public` first (built-in or
/// user override), then the remaining user aliases in name order.
pub fn effective_registry_aliases(config: &BicepConfig) -> Vec<(String, RegistryAlias)> {
    let user = &config.module_aliases.br;
    let public = user
        .get(PUBLIC_ALIAS)
        .cloned()
        .unwrap_or_else(builtin_public_alias);

    let mut aliases = vec![(PUBLIC_ALIAS.to_string(), public)];
    aliases.extend(
        user.iter()
            .filter(|(name, _)| name.as_str() != PUBLIC_ALIAS)
            .map(|(name, alias)| (name.clone(), alias.clone())),
    );
    aliases
}

/// Resolve one `br` alias by name, including the implicit `public`.
///
/// An unknown name is "no resolution", not an error: the segment simply
/// produces no candidates.
pub fn resolve_registry_alias(config: &BicepConfig, name: &str) -> Option<RegistryAlias> {
    if let Some(alias) = config.module_aliases.br.get(name) {
        return Some(alias.clone());
    }
    (name == PUBLIC_ALIAS).then(builtin_public_alias)
}

/// The host the effective `public` alias resolves to — the
/// `PublicBicepRegistry` classification target.
pub fn public_registry_host(config: &BicepConfig) -> String {
    resolve_registry_alias(config, PUBLIC_ALIAS)
        .map(|alias| alias.registry)
        .unwrap_or_else(|| MCR_REGISTRY.to_string())
}

/// The `ts` alias listing in name order. Template specs have no built-in
/// alias.
pub fn template_spec_aliases(config: &BicepConfig) -> Vec<(String, TemplateSpecAlias)> {
    config
        .module_aliases
        .ts
        .iter()
        .map(|(name, alias)| (name.clone(), alias.clone()))
        .collect()
}
