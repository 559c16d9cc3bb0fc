//! Data types used throughout the BicepMod LSP server.
//!
//! This module contains all the "model" structs and enums that represent a
//! lexed module reference (scheme, segments, spans) as well as the
//! completion-facing types (`CompletionCandidate`, `RegistryKind`,
//! metadata entries supplied by the curated module store).

use thiserror::Error;

/// The reference scheme introducing a module reference literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceScheme {
    /// `br:` / `br/` — an OCI registry reference.
    BicepRegistry,
    /// `ts:` / `ts/` — a template spec reference.
    TemplateSpec,
}

impl ReferenceScheme {
    /// The keyword as it appears in source text (`"br"` or `"ts"`).
    pub fn keyword(self) -> &'static str {
        match self {
            ReferenceScheme::BicepRegistry => "br",
            ReferenceScheme::TemplateSpec => "ts",
        }
    }
}

/// Which part of the reference the cursor is editing.
///
/// Determined by the lexer from the cursor offset; a cursor sitting exactly
/// on a segment boundary belongs to the segment *following* the boundary,
/// matching typing-forward semantics (the text to the left of the cursor
/// decides the context).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSegment {
    /// Before any scheme delimiter (`br`, `ts`, or nothing yet).
    Scheme,
    /// The alias name after `br/` or `ts/`, before the first `:`.
    Alias,
    /// The registry host after `br:` (or the first part after `ts:`).
    Registry,
    /// The repository path after the registry/alias.
    Path,
    /// The tag or version after the path's `:`.
    Tag,
}

/// A half-open `[start, end)` byte span within the reference literal.
///
/// Offsets are relative to the start of the literal text, i.e. offset 0 is
/// the opening quote itself. Reference literals are ASCII in practice, so
/// byte offsets and character offsets coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSpan {
    pub start: usize,
    pub end: usize,
}

impl ReferenceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        ReferenceSpan { start, end }
    }

    /// Whether a cursor offset falls on this segment. Both endpoints are
    /// included: a cursor at `end` still edits this segment (the delimiter
    /// that follows has not been crossed).
    pub fn contains_cursor(&self, cursor: usize) -> bool {
        self.start <= cursor && cursor <= self.end
    }
}

/// A lexed segment: its raw text plus where it sits in the literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceToken {
    pub text: String,
    pub span: ReferenceSpan,
}

/// A structurally lexed, possibly partial, module reference literal.
///
/// Produced by [`crate::completion::reference::parse_module_reference`].
/// All segments are optional because the user may still be mid-typing; the
/// literal may also lack its closing quote entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedModuleReference {
    /// The scheme, once a full `br`/`ts` marker has been typed.
    pub scheme: Option<ReferenceScheme>,
    /// Whether the scheme was written in alias form (`br/`, `ts/`) rather
    /// than registry form (`br:`, `ts:`).
    pub aliased: bool,
    /// Alias name (alias form) or registry host (registry form).
    pub alias_or_registry: Option<ReferenceToken>,
    /// Repository path segment, if the user has typed past the host/alias.
    pub path: Option<ReferenceToken>,
    /// Tag/version segment. Only the first two colons after the scheme
    /// marker are structural; any later `:` stays part of the tag text.
    pub tag: Option<ReferenceToken>,
    /// The segment the cursor is editing.
    pub active_segment: ReferenceSegment,
    /// `false` for degenerate shapes like `br:/` (scheme colon followed by
    /// `/` with no host) — these yield no candidates, never an error.
    pub well_formed: bool,
    /// `[just past the opening quote, closing quote or end of text)` — the
    /// span a completion overwrites. Never includes the quote characters.
    pub replacement: ReferenceSpan,
}

/// Classification of a resolved registry host.
///
/// The set is closed and every dispatch on it matches exhaustively; adding
/// a kind must be a compile error everywhere it is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    /// The fixed public artifact registry host, `mcr.microsoft.com`.
    Mcr,
    /// Whatever host the effective `public` alias resolves to.
    PublicBicepRegistry,
    /// Any other container registry. Addressable, but not enumerable by
    /// content, so the curated metadata source never answers for it.
    GenericAcr,
}

/// One module known to the curated public-module metadata source.
///
/// `path` is relative to the public registry's module root (e.g.
/// `app/dapr-containerapp` lives at `mcr.microsoft.com/bicep/app/...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMetadataEntry {
    pub path: String,
    pub description: Option<String>,
    pub docs_url: Option<String>,
}

/// One published version of a curated module, most relevant first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMetadataEntry {
    pub version: String,
    pub description: Option<String>,
    pub docs_url: Option<String>,
}

/// Completion item kind, mirrored onto the protocol kind by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Reference,
    Snippet,
}

/// A rendering-ready completion candidate.
///
/// `insertion_template` contains at most one `$0` cursor placeholder;
/// terminal candidates (a complete reference needing no further input)
/// carry none. `replacement` spans the literal's contents between the
/// quotes, so applying a candidate never duplicates a quote character or
/// strands text behind the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    pub label: String,
    pub kind: CandidateKind,
    pub insertion_template: String,
    pub detail: Option<String>,
    /// Markdown `[View Documentation](<url>)` link, when the source
    /// supplied a docs URL.
    pub documentation: Option<String>,
    /// When set, outranks alphabetic ordering by label. Used for version
    /// candidates (`"0000"`, `"0001"`, …) so a renderer's alphabetic
    /// fallback cannot reorder them.
    pub sort_key: Option<String>,
    pub replacement: ReferenceSpan,
}

impl CompletionCandidate {
    /// Whether this candidate completes the reference (no `$0` placeholder
    /// left to fill).
    pub fn is_terminal(&self) -> bool {
        !self.insertion_template.contains("$0")
    }
}

/// The only failure a completion request surfaces.
///
/// Every other condition — cursor outside a reference literal, malformed
/// prefix, unknown alias, an unavailable collaborator — degrades to an
/// empty or partial candidate list instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("module reference completion was cancelled")]
    Cancelled,
}
