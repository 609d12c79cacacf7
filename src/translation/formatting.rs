/*!
 * Cleanup of provider output before it is written into a document.
 *
 * Chat models like to wrap answers in code fences or quotes, or to prefix
 * them with "Translation:". Those wrappers are removed only when the
 * source text did not carry them itself.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// A whole answer wrapped in a fenced code block
static CODE_FENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```$").unwrap());

/// A leading label such as "Translation:" or "Translated text:"
static LABEL_PREFIX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(translation|translated text)\s*:\s*").unwrap());

const QUOTE_PAIRS: &[(char, char)] = &[('"', '"'), ('\'', '\''), ('“', '”'), ('«', '»'), ('「', '」')];

/// Strip wrappers the provider added around `response`
pub fn sanitize_response(original: &str, response: &str) -> String {
    let mut text = response.trim().to_string();
    let source = original.trim();

    if !source.starts_with("```") {
        if let Some(caps) = CODE_FENCE_REGEX.captures(&text) {
            text = caps.get(1).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
        }
    }

    if !LABEL_PREFIX_REGEX.is_match(source) {
        text = LABEL_PREFIX_REGEX.replace(&text, "").into_owned();
    }

    for &(open, close) in QUOTE_PAIRS {
        let source_quoted = source.starts_with(open) && source.ends_with(close);
        if !source_quoted && text.chars().count() >= 2 && text.starts_with(open) && text.ends_with(close) {
            let inner = &text[open.len_utf8()..text.len() - close.len_utf8()];
            // Only a single quoted span, not two quoted phrases side by side
            if !inner.contains(close) {
                text = inner.trim().to_string();
            }
            break;
        }
    }

    text
}

/// Re-apply the original's leading and trailing whitespace around `translated`
///
/// Run boundaries in word-processor files often sit on spaces ("Hello " +
/// "world"); providers trim them, which would glue words together.
pub fn restore_margins(original: &str, translated: &str) -> String {
    let leading = &original[..original.len() - original.trim_start().len()];
    let trailing = &original[original.trim_end().len()..];
    if original.trim().is_empty() {
        return translated.to_string();
    }
    format!("{}{}{}", leading, translated.trim(), trailing)
}
