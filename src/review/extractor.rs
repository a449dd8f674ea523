//! Parser for raw reviewer payloads from the generative backend.
//!
//! Reviewers are asked to answer with a single JSON object of the form:
//!
//! ```json
//! {
//!   "comments": [
//!     {"text_excerpt": "quoted span of the document", "comment": "feedback"}
//!   ]
//! }
//! ```
//!
//! What actually comes back is free text: the object may be wrapped in
//! commentary or markdown fences, carry trailing commas, or stop short of
//! its closing braces. Extraction strips fences, locates the first
//! brace-balanced span, parses strictly, and on failure makes one
//! structural repair pass before giving up. No field is trusted to exist;
//! elements missing either field are dropped rather than failing the
//! payload.

use crate::errors::ExtractionError;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// A structurally validated unit of feedback, not yet anchored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackItem {
    /// The document span the reviewer claims to be commenting on.
    pub excerpt: String,
    /// The feedback text itself.
    pub comment_text: String,
}

/// Extract feedback items from one raw payload.
///
/// Never panics on malformed input; unrecoverable payloads return an
/// [`ExtractionError`] so the caller can log the payload and move on to
/// the next reviewer. An empty `comments` list is a valid, empty result.
pub fn extract(raw: &str) -> Result<Vec<FeedbackItem>, ExtractionError> {
    let stripped = strip_code_fences(raw);

    // A truncated payload may never close its braces; fall back to
    // everything from the first brace and let the repair pass close it.
    let span = match extract_json_object(&stripped) {
        Some(span) => span,
        None => match stripped.find('{') {
            Some(start) => stripped[start..].to_string(),
            None => {
                return Err(ExtractionError::NoStructuredSpan {
                    preview: ExtractionError::preview_of(raw),
                });
            }
        },
    };

    let value = parse_with_repair(&span).map_err(|message| {
        tracing::warn!(%message, payload = %raw, "reviewer payload unparseable");
        ExtractionError::Unparseable {
            message,
            preview: ExtractionError::preview_of(raw),
        }
    })?;

    let comments = value
        .get("comments")
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractionError::MissingCommentsList {
            preview: ExtractionError::preview_of(raw),
        })?;

    let mut items = Vec::with_capacity(comments.len());
    for element in comments {
        let excerpt = element.get("text_excerpt").and_then(Value::as_str);
        let comment_text = element.get("comment").and_then(Value::as_str);
        match (excerpt, comment_text) {
            (Some(excerpt), Some(comment_text)) => items.push(FeedbackItem {
                excerpt: excerpt.to_string(),
                comment_text: comment_text.to_string(),
            }),
            _ => {
                tracing::debug!(?element, "feedback element missing a field, dropped");
            }
        }
    }

    Ok(items)
}

/// Drop markdown fence lines (```json, ```) the backend wraps JSON in.
fn strip_code_fences(raw: &str) -> String {
    if !raw.contains("```") {
        return raw.to_string();
    }
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Find the first brace-balanced `{...}` span, ignoring braces inside
/// string literals. The payload format guarantees at most one object, so
/// a greedy scan from the first `{` is sufficient.
fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Strict parse, then one repair-and-reparse attempt.
fn parse_with_repair(span: &str) -> Result<Value, String> {
    match serde_json::from_str(span) {
        Ok(value) => Ok(value),
        Err(first) => {
            let repaired = repair_json(span);
            serde_json::from_str(&repaired).map_err(|second| {
                format!("strict parse: {first}; after repair: {second}")
            })
        }
    }
}

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("trailing-comma pattern"));

/// Best-effort structural repair: strip trailing commas, close an
/// unterminated string, and append missing closing braces/brackets.
/// Deliberately does not try to fix unescaped interior quotes.
fn repair_json(span: &str) -> String {
    let mut repaired = TRAILING_COMMA.replace_all(span, "$1").into_owned();

    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for ch in repaired.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(&ch) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    if in_string {
        repaired.push('"');
    }
    while let Some(closer) = stack.pop() {
        repaired.push(closer);
    }
    repaired
}
