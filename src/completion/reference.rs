//! Module reference lexing.
//!
//! This module turns the raw text of a (possibly unterminated) quoted
//! module reference literal plus a cursor offset into a
//! [`ParsedModuleReference`]: which scheme was used, the segment texts and
//! spans, and which segment the cursor is editing.
//!
//! The grammar being completed:
//!
//! ```text
//! 'br:<registry>/<path>:<tag>'      registry form
//! 'br/<alias>:<path>:<tag>'         alias form
//! 'ts:<subscription>/<...>'         template spec, registry form
//! 'ts/<alias>:<name>:<version>'     template spec, alias form
//! ```
//!
//! Only the first two `:` characters after the scheme marker are
//! structural; any later colon is part of the tag text. In the registry
//! form the host ends at the first `/`.

use crate::types::{
    ParsedModuleReference, ReferenceScheme, ReferenceSegment, ReferenceSpan, ReferenceToken,
};

/// Length of a full scheme marker (`br/`, `br:`, `ts/`, `ts:`).
const SCHEME_MARKER_LEN: usize = 3;

fn token(text: &str, start: usize) -> Option<ReferenceToken> {
    Some(ReferenceToken {
        text: text.to_string(),
        span: ReferenceSpan::new(start, start + text.len()),
    })
}

/// Lex a module reference literal around a cursor offset.
///
/// `literal` is the raw literal text including its opening quote (and the
/// closing quote when the user has typed one); `cursor` is a byte offset
/// into `literal`. Returns `None` when the cursor is not strictly inside
/// the quotes or the text is not a quoted literal at all — the
/// not-applicable case, which produces no candidates.
pub fn parse_module_reference(literal: &str, cursor: usize) -> Option<ParsedModuleReference> {
    if !literal.starts_with('\'') {
        return None;
    }

    // Everything up to the closing quote, or to end of text while the
    // literal is still unterminated.
    let content_end = match literal[1..].find('\'') {
        Some(i) => 1 + i,
        None => literal.len(),
    };
    if cursor < 1 || cursor > content_end {
        return None;
    }

    let content = &literal[1..content_end];
    let replacement = ReferenceSpan::new(1, content_end);

    let (scheme, aliased) = if content.starts_with("br/") {
        (Some(ReferenceScheme::BicepRegistry), true)
    } else if content.starts_with("br:") {
        (Some(ReferenceScheme::BicepRegistry), false)
    } else if content.starts_with("ts/") {
        (Some(ReferenceScheme::TemplateSpec), true)
    } else if content.starts_with("ts:") {
        (Some(ReferenceScheme::TemplateSpec), false)
    } else {
        (None, false)
    };

    // No full scheme marker yet: the whole content is the scheme segment.
    let Some(scheme) = scheme else {
        return Some(ParsedModuleReference {
            scheme: None,
            aliased: false,
            alias_or_registry: None,
            path: None,
            tag: None,
            active_segment: ReferenceSegment::Scheme,
            well_formed: true,
            replacement,
        });
    };

    let rest = &content[SCHEME_MARKER_LEN..];
    let base = 1 + SCHEME_MARKER_LEN;

    let mut alias_or_registry = None;
    let mut path = None;
    let mut tag = None;
    let mut well_formed = true;

    if aliased {
        // br/<alias>:<path>:<tag> — two structural colons at most.
        match rest.find(':') {
            None => alias_or_registry = token(rest, base),
            Some(c1) => {
                alias_or_registry = token(&rest[..c1], base);
                let after = &rest[c1 + 1..];
                let after_base = base + c1 + 1;
                match after.find(':') {
                    None => path = token(after, after_base),
                    Some(c2) => {
                        path = token(&after[..c2], after_base);
                        tag = token(&after[c2 + 1..], after_base + c2 + 1);
                    }
                }
            }
        }
    } else if rest.starts_with('/') {
        // `br:/...` — a scheme colon with no host in front of the slash.
        well_formed = false;
    } else {
        // br:<registry>/<path>:<tag> — host ends at the first slash.
        match rest.find('/') {
            None => alias_or_registry = token(rest, base),
            Some(s) => {
                alias_or_registry = token(&rest[..s], base);
                let after = &rest[s + 1..];
                let after_base = base + s + 1;
                match after.find(':') {
                    None => path = token(after, after_base),
                    Some(c) => {
                        path = token(&after[..c], after_base);
                        tag = token(&after[c + 1..], after_base + c + 1);
                    }
                }
            }
        }
    }

    // The scheme keyword itself spans [1, 3); a cursor at offset 3 still
    // edits the scheme (only the text left of the cursor counts).
    let scheme_span = ReferenceSpan::new(1, SCHEME_MARKER_LEN);
    let active_segment = if scheme_span.contains_cursor(cursor) {
        ReferenceSegment::Scheme
    } else if contains(&alias_or_registry, cursor) {
        if aliased {
            ReferenceSegment::Alias
        } else {
            ReferenceSegment::Registry
        }
    } else if contains(&path, cursor) {
        ReferenceSegment::Path
    } else if contains(&tag, cursor) {
        ReferenceSegment::Tag
    } else {
        // Only reachable for ill-formed text where no tokens were lexed.
        ReferenceSegment::Registry
    };

    Some(ParsedModuleReference {
        scheme: Some(scheme),
        aliased,
        alias_or_registry,
        path,
        tag,
        active_segment,
        well_formed,
        replacement,
    })
}

fn contains(token: &Option<ReferenceToken>, cursor: usize) -> bool {
    token.as_ref().is_some_and(|t| t.span.contains_cursor(cursor))
}

/// Locate the quoted argument of a `module`/`using` declaration on a line.
///
/// Returns the literal text (opening quote through closing quote, or end
/// of line while unterminated) and the column of the opening quote, or
/// `None` when the line is not a module/using declaration or carries no
/// string literal yet. The full compiler owns real syntax analysis; this
/// is the minimal extraction the completion boundary needs.
pub fn find_reference_literal(line: &str) -> Option<(&str, usize)> {
    let trimmed = line.trim_start();
    if !(trimmed.starts_with("module ") || trimmed.starts_with("using ")) {
        return None;
    }

    let quote = line.find('\'')?;
    let rest = &line[quote + 1..];
    let end = match rest.find('\'') {
        Some(i) => quote + 1 + i + 1,
        None => line.len(),
    };
    Some((&line[quote..end], quote))
}
