//! Recovery of a JSON object from free-form model output.
//!
//! Models wrap JSON in fenced code blocks, prepend prose, leave trailing
//! commas, or use single quotes. Recovery tries, in order: the first fenced
//! code block, the first brace-delimited substring, and finally a tolerant
//! repair pass over that substring. Total failure is not an error here; the
//! caller degrades to the fully-null record.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde_json::Value;

static FENCED_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.+?)```").unwrap());

static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());

static BARE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").unwrap());

fn first_fenced_block(response: &str) -> Option<&str> {
    FENCED_BLOCK_RE
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The outermost brace-delimited substring, if any.
fn first_brace_substring(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end > start {
        Some(&response[start..=end])
    } else {
        None
    }
}

/// Best-effort repair of almost-JSON: strip leading non-brace garbage,
/// normalize single quotes, quote bare object keys, drop trailing commas.
fn repair(raw: &str) -> String {
    let stripped = match raw.find('{') {
        Some(start) => &raw[start..],
        None => raw,
    };
    let requoted = stripped.replace('\'', "\"");
    let keyed = BARE_KEY_RE.replace_all(&requoted, "$1\"$2\":");
    TRAILING_COMMA_RE.replace_all(&keyed, "$1").into_owned()
}

/// Extracts a JSON value from a model response, or nothing if every strategy
/// fails.
pub fn recover_json(response: &str) -> Option<Value> {
    if let Some(block) = first_fenced_block(response) {
        if let Ok(value) = serde_json::from_str(block) {
            return Some(value);
        }
    }

    let candidate = first_brace_substring(response)?;
    if let Ok(value) = serde_json::from_str(candidate) {
        return Some(value);
    }

    debug!("direct JSON parse failed, attempting repair");
    serde_json::from_str(&repair(candidate)).ok()
}
