//! Completion candidate building.
//!
//! The aggregator produces [`RawCandidate`]s — just the new reference
//! text plus metadata. This module projects them into rendering-ready
//! [`CompletionCandidate`]s (placeholder handling, documentation link,
//! replacement span) and, for the LSP layer, into protocol
//! `CompletionItem`s positioned on the document line.

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Documentation, InsertTextFormat,
    MarkupContent, MarkupKind, Position, Range, TextEdit,
};

use crate::types::{CandidateKind, CompletionCandidate, ReferenceSpan};

/// The single cursor placeholder carried by non-terminal candidates, in
/// LSP snippet syntax.
pub const CURSOR_PLACEHOLDER: &str = "$0";

/// A candidate as assembled by the aggregator, before projection.
#[derive(Debug, Clone)]
pub(crate) struct RawCandidate {
    pub label: String,
    pub kind: CandidateKind,
    /// The new contents between the quotes, without any placeholder.
    pub reference_text: String,
    /// Terminal candidates are complete references; no placeholder is
    /// appended and no further input is expected.
    pub terminal: bool,
    pub description: Option<String>,
    pub docs_url: Option<String>,
    pub sort_key: Option<String>,
}

impl RawCandidate {
    pub(crate) fn new(label: impl Into<String>, kind: CandidateKind, reference_text: impl Into<String>) -> Self {
        RawCandidate {
            label: label.into(),
            kind,
            reference_text: reference_text.into(),
            terminal: false,
            description: None,
            docs_url: None,
            sort_key: None,
        }
    }
}

/// Project a raw candidate into its rendering-ready form.
pub(crate) fn build_candidate(raw: RawCandidate, replacement: ReferenceSpan) -> CompletionCandidate {
    let insertion_template = if raw.terminal {
        raw.reference_text
    } else {
        format!("{}{}", raw.reference_text, CURSOR_PLACEHOLDER)
    };

    CompletionCandidate {
        label: raw.label,
        kind: raw.kind,
        insertion_template,
        detail: raw.description,
        documentation: raw
            .docs_url
            .map(|url| format!("[View Documentation]({url})")),
        sort_key: raw.sort_key,
        replacement,
    }
}

/// Map a candidate onto a protocol `CompletionItem`.
///
/// `line` is the document line the literal sits on and `literal_start` the
/// column of its opening quote; candidate spans are relative to that quote
/// and get translated onto the line here.
pub fn to_completion_item(
    candidate: &CompletionCandidate,
    line: u32,
    literal_start: u32,
) -> CompletionItem {
    let kind = match candidate.kind {
        CandidateKind::Reference => CompletionItemKind::REFERENCE,
        CandidateKind::Snippet => CompletionItemKind::SNIPPET,
    };

    let range = Range {
        start: Position {
            line,
            character: literal_start + candidate.replacement.start as u32,
        },
        end: Position {
            line,
            character: literal_start + candidate.replacement.end as u32,
        },
    };

    CompletionItem {
        label: candidate.label.clone(),
        kind: Some(kind),
        detail: candidate.detail.clone(),
        documentation: candidate.documentation.clone().map(|value| {
            Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            })
        }),
        sort_text: candidate.sort_key.clone(),
        insert_text_format: (!candidate.is_terminal()).then_some(InsertTextFormat::SNIPPET),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit {
            range,
            new_text: candidate.insertion_template.clone(),
        })),
        ..CompletionItem::default()
    }
}
