//! Candidate aggregation.
//!
//! [`CompletionEngine`] is the completion entry point: it lexes the
//! literal, dispatches on the segment under the cursor, queries the right
//! sources in a fixed precedence order, and returns one flat, ordered
//! candidate list.
//!
//! Ordering is deterministic: synchronous candidates (fixed snippets,
//! configuration-derived entries, curated metadata) are produced first,
//! and the asynchronous discovery stream — consulted only for registry
//! completions, and only when enabled — is appended strictly afterwards,
//! pulled one host at a time with a cancellation check before every pull.
//! A cancelled request aborts as a whole; an unavailable source merely
//! drops its own contribution.
//!
//! Everything the engine touches arrives through its constructor. There is
//! no ambient state, and nothing survives a request.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::completion::aliases::{self, MCR_MODULE_ROOT, MCR_REGISTRY, PUBLIC_ALIAS};
use crate::completion::builder::{RawCandidate, build_candidate};
use crate::completion::reference::parse_module_reference;
use crate::completion::registry::{
    classify_registry, serves_curated_metadata, telemetry_registry_type,
};
use crate::config::BicepConfig;
use crate::sources::{
    ModuleMetadataSource, RegistryDiscovery, SourceError, TelemetryEvent, TelemetrySink,
};
use crate::types::{
    CandidateKind, CompletionCandidate, CompletionError, ParsedModuleReference, ReferenceScheme,
    ReferenceSegment, RegistryKind,
};

/// The fixed scheme-level snippets, offered (prefix-filtered) while the
/// cursor is still before any scheme delimiter.
const SCHEME_SNIPPETS: &[(&str, &str)] = &[
    ("br/public:", "Public Bicep registry"),
    ("br:", "Bicep registry"),
    ("ts/:", "Template spec (alias)"),
    ("ts:", "Template spec"),
];

/// A resolved OCI registry target: where a `br:`/`br/` reference points,
/// and the typed prefix candidates are rebuilt from.
struct OciTarget {
    host: String,
    /// Module path prefix of the alias in play (alias form only).
    module_path: Option<String>,
    /// `br/<alias>:` or `br:<host>/`.
    reference_prefix: String,
    aliased: bool,
}

/// One completion invocation's view of the world.
///
/// Constructed fresh per request from the effective configuration and the
/// collaborator ports; holds no state of its own.
pub struct CompletionEngine<'a> {
    config: &'a BicepConfig,
    metadata: &'a dyn ModuleMetadataSource,
    discovery: &'a dyn RegistryDiscovery,
    telemetry: &'a dyn TelemetrySink,
}

impl<'a> CompletionEngine<'a> {
    pub fn new(
        config: &'a BicepConfig,
        metadata: &'a dyn ModuleMetadataSource,
        discovery: &'a dyn RegistryDiscovery,
        telemetry: &'a dyn TelemetrySink,
    ) -> Self {
        CompletionEngine {
            config,
            metadata,
            discovery,
            telemetry,
        }
    }

    /// Produce the ordered candidate list for a cursor position inside a
    /// module reference literal.
    ///
    /// Returns an empty list for everything that isn't completable — a
    /// cursor outside the quotes, an ill-formed prefix, an unknown alias,
    /// an unavailable source. The only error is [`CompletionError::Cancelled`],
    /// raised when `cancel` fires or a source reports cancellation; no
    /// candidate list is returned in that case.
    pub async fn completions(
        &self,
        literal: &str,
        cursor: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<CompletionCandidate>, CompletionError> {
        let Some(parsed) = parse_module_reference(literal, cursor) else {
            return Ok(Vec::new());
        };
        if !parsed.well_formed {
            tracing::debug!(literal, "ill-formed module reference; no candidates");
            return Ok(Vec::new());
        }

        let mut raw = Vec::new();
        let mut registry_kind = None;

        match parsed.active_segment {
            ReferenceSegment::Scheme => self.scheme_candidates(&literal[1..cursor], &mut raw),
            ReferenceSegment::Alias => self.alias_candidates(&parsed, &mut raw),
            ReferenceSegment::Registry => {
                if parsed.scheme == Some(ReferenceScheme::BicepRegistry) {
                    let typed_host = parsed
                        .alias_or_registry
                        .as_ref()
                        .map(|t| t.text.as_str())
                        .unwrap_or_default();
                    registry_kind = Some(classify_registry(
                        typed_host,
                        &aliases::public_registry_host(self.config),
                    ));
                    self.registry_candidates(&mut raw, cancel).await?;
                }
            }
            ReferenceSegment::Path => registry_kind = self.path_candidates(&parsed, &mut raw)?,
            ReferenceSegment::Tag => registry_kind = self.version_candidates(&parsed, &mut raw)?,
        }

        let candidates: Vec<CompletionCandidate> = raw
            .into_iter()
            .map(|candidate| build_candidate(candidate, parsed.replacement))
            .collect();

        // One event per request that produced registry-or-deeper results.
        if let Some(kind) = registry_kind
            && !candidates.is_empty()
        {
            self.telemetry
                .post(TelemetryEvent::module_registry_path_completion(
                    telemetry_registry_type(kind),
                ));
        }

        Ok(candidates)
    }

    /// The 4 fixed scheme snippets, narrowed to those the typed text is a
    /// prefix of.
    fn scheme_candidates(&self, typed: &str, raw: &mut Vec<RawCandidate>) {
        for (snippet, detail) in SCHEME_SNIPPETS {
            if snippet.starts_with(typed) {
                let mut candidate =
                    RawCandidate::new(*snippet, CandidateKind::Reference, *snippet);
                candidate.description = Some((*detail).to_string());
                raw.push(candidate);
            }
        }
    }

    /// The alias listing for the active scheme, `public` first for `br`.
    fn alias_candidates(&self, parsed: &ParsedModuleReference, raw: &mut Vec<RawCandidate>) {
        match parsed.scheme {
            Some(ReferenceScheme::BicepRegistry) => {
                for (name, _) in aliases::effective_registry_aliases(self.config) {
                    raw.push(RawCandidate::new(
                        name.clone(),
                        CandidateKind::Snippet,
                        format!("br/{name}:"),
                    ));
                }
            }
            Some(ReferenceScheme::TemplateSpec) => {
                for (name, _) in aliases::template_spec_aliases(self.config) {
                    raw.push(RawCandidate::new(
                        name.clone(),
                        CandidateKind::Snippet,
                        format!("ts/{name}:"),
                    ));
                }
            }
            None => {}
        }
    }

    /// Registry host completions after `br:`, in fixed precedence order:
    /// the MCR entry, the deduplicated configured hosts, then — only when
    /// the discovery setting is on — whatever the discovery stream yields.
    async fn registry_candidates(
        &self,
        raw: &mut Vec<RawCandidate>,
        cancel: &CancellationToken,
    ) -> Result<(), CompletionError> {
        raw.push(RawCandidate::new(
            format!("{MCR_REGISTRY}/{MCR_MODULE_ROOT}"),
            CandidateKind::Snippet,
            format!("br:{MCR_REGISTRY}/{MCR_MODULE_ROOT}/"),
        ));

        let mut hosts: Vec<&str> = self
            .config
            .module_aliases
            .br
            .values()
            .map(|alias| alias.registry.as_str())
            .filter(|host| *host != MCR_REGISTRY)
            .collect();
        hosts.sort_unstable();
        hosts.dedup();
        for host in hosts {
            raw.push(registry_host_candidate(host));
        }

        if !self.config.completions.get_all_azure_container_registries {
            return Ok(());
        }

        let mut stream = self
            .discovery
            .discover(&self.config.cloud.current_profile, cancel.clone());
        loop {
            if cancel.is_cancelled() {
                return Err(CompletionError::Cancelled);
            }
            match stream.next().await {
                Some(Ok(host)) => raw.push(registry_host_candidate(&host)),
                Some(Err(SourceError::Cancelled)) => return Err(CompletionError::Cancelled),
                Some(Err(SourceError::Unavailable(reason))) => {
                    tracing::warn!(%reason, "registry discovery unavailable; keeping candidates gathered so far");
                    break;
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Path completions after a resolved registry or alias prefix.
    fn path_candidates(
        &self,
        parsed: &ParsedModuleReference,
        raw: &mut Vec<RawCandidate>,
    ) -> Result<Option<RegistryKind>, CompletionError> {
        if parsed.scheme != Some(ReferenceScheme::BicepRegistry) {
            return Ok(None);
        }
        let Some(target) = self.resolve_oci_target(parsed) else {
            return Ok(None);
        };
        let kind = classify_registry(&target.host, &aliases::public_registry_host(self.config));

        if serves_curated_metadata(kind) {
            let modules = match self.metadata.list_modules() {
                Ok(modules) => modules,
                Err(SourceError::Cancelled) => return Err(CompletionError::Cancelled),
                Err(SourceError::Unavailable(reason)) => {
                    tracing::warn!(%reason, "module metadata unavailable; skipping path candidates");
                    return Ok(Some(kind));
                }
            };

            let prefix = self.curated_prefix(&target, kind);
            for module in modules {
                let full_path = format!("{MCR_MODULE_ROOT}/{}", module.path);
                let label = match &prefix {
                    Some(prefix) => match full_path.strip_prefix(&format!("{prefix}/")) {
                        Some(rest) if !rest.is_empty() => rest.to_string(),
                        _ => continue,
                    },
                    None => full_path.clone(),
                };
                // The alias form appends the prefix-relative path; the
                // registry form spells out the full repository path.
                let appended = if target.aliased { &label } else { &full_path };
                let mut candidate = RawCandidate::new(
                    label.clone(),
                    CandidateKind::Snippet,
                    format!("{}{}:", target.reference_prefix, appended),
                );
                candidate.description = module.description;
                candidate.docs_url = module.docs_url;
                raw.push(candidate);
            }
        } else {
            // Arbitrary registries are not enumerable by content; the only
            // path candidates are module path prefixes other aliases have
            // configured for the same host.
            let mut prefixes: Vec<&str> = self
                .config
                .module_aliases
                .br
                .values()
                .filter(|alias| alias.registry == target.host)
                .filter_map(|alias| alias.module_path.as_deref())
                .collect();
            prefixes.sort_unstable();
            prefixes.dedup();
            for prefix in prefixes {
                raw.push(RawCandidate::new(
                    prefix,
                    CandidateKind::Reference,
                    format!("{}{}:", target.reference_prefix, prefix),
                ));
            }
        }

        Ok(Some(kind))
    }

    /// Version completions after a resolved module path — terminal
    /// candidates spelling out the complete reference.
    fn version_candidates(
        &self,
        parsed: &ParsedModuleReference,
        raw: &mut Vec<RawCandidate>,
    ) -> Result<Option<RegistryKind>, CompletionError> {
        if parsed.scheme != Some(ReferenceScheme::BicepRegistry) {
            return Ok(None);
        }
        let Some(target) = self.resolve_oci_target(parsed) else {
            return Ok(None);
        };
        let kind = classify_registry(&target.host, &aliases::public_registry_host(self.config));
        if !serves_curated_metadata(kind) {
            return Ok(Some(kind));
        }

        let typed_path = parsed
            .path
            .as_ref()
            .map(|t| t.text.as_str())
            .unwrap_or_default();
        let full_path = if target.aliased {
            match &target.module_path {
                Some(prefix) => format!("{prefix}/{typed_path}"),
                None => typed_path.to_string(),
            }
        } else {
            typed_path.to_string()
        };

        // Curated modules are addressed relative to the public module root.
        let Some(module_key) = full_path.strip_prefix(&format!("{MCR_MODULE_ROOT}/")) else {
            return Ok(Some(kind));
        };
        if module_key.is_empty() {
            return Ok(Some(kind));
        }

        let versions = match self.metadata.list_versions(module_key) {
            Ok(versions) => versions,
            Err(SourceError::Cancelled) => return Err(CompletionError::Cancelled),
            Err(SourceError::Unavailable(reason)) => {
                tracing::warn!(%reason, "module metadata unavailable; skipping version candidates");
                return Ok(Some(kind));
            }
        };

        for (index, version) in versions.into_iter().enumerate() {
            let mut candidate = RawCandidate::new(
                version.version.clone(),
                CandidateKind::Reference,
                format!("{}{}:{}", target.reference_prefix, typed_path, version.version),
            );
            candidate.terminal = true;
            candidate.description = version.description;
            candidate.docs_url = version.docs_url;
            candidate.sort_key = Some(format!("{index:04}"));
            raw.push(candidate);
        }

        Ok(Some(kind))
    }

    /// Resolve the typed alias/registry into a concrete target. `None`
    /// means an unknown alias or an empty host — no candidates, no fault.
    fn resolve_oci_target(&self, parsed: &ParsedModuleReference) -> Option<OciTarget> {
        let token = parsed.alias_or_registry.as_ref()?;
        if parsed.aliased {
            let alias = aliases::resolve_registry_alias(self.config, &token.text)?;
            Some(OciTarget {
                host: alias.registry,
                module_path: alias.module_path,
                reference_prefix: format!("br/{}:", token.text),
                aliased: true,
            })
        } else {
            if token.text.is_empty() {
                return None;
            }
            Some(OciTarget {
                host: token.text.clone(),
                module_path: None,
                reference_prefix: format!("br:{}/", token.text),
                aliased: false,
            })
        }
    }

    /// The module path prefix that narrows curated listings for a target.
    ///
    /// The alias form uses the alias's own prefix. The registry form has
    /// none typed, so MCR falls back to the implicit module root and an
    /// overridden public host to the override's prefix.
    fn curated_prefix(&self, target: &OciTarget, kind: RegistryKind) -> Option<String> {
        if target.aliased {
            return target.module_path.clone();
        }
        match kind {
            RegistryKind::Mcr => Some(MCR_MODULE_ROOT.to_string()),
            RegistryKind::PublicBicepRegistry => {
                aliases::resolve_registry_alias(self.config, PUBLIC_ALIAS)
                    .and_then(|alias| alias.module_path)
            }
            RegistryKind::GenericAcr => None,
        }
    }
}

fn registry_host_candidate(host: &str) -> RawCandidate {
    RawCandidate::new(host, CandidateKind::Snippet, format!("br:{host}/"))
}
