//! Lenient JSON decoding of model output.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::{Result, WayfarerError};

/// Decode JSON from model output, repairing the usual damage: code fences,
/// surrounding prose, trailing commas, single quotes, unquoted keys and
/// missing closing brackets.
pub fn decode_json(raw: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return Ok(value);
    }

    let unfenced = strip_code_fences(raw);
    let candidate = extract_json(&unfenced).unwrap_or_else(|| unfenced.trim().to_string());
    if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
        return Ok(value);
    }

    let repaired = repair_json(&candidate);
    serde_json::from_str::<Value>(&repaired).map_err(|e| {
        WayfarerError::MalformedOracleOutput(format!("{} (after repair: {})", e, preview(&repaired)))
    })
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(80).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn strip_code_fences(input: &str) -> String {
    static CODE_FENCE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"```(?:json|JSON)?\s*\n?([\s\S]*?)\n?```").unwrap());

    CODE_FENCE_RE
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| input.to_string())
}

/// First balanced object or array in the text. An unbalanced tail is
/// returned as-is so the repair pass can close it.
fn extract_json(input: &str) -> Option<String> {
    let start = input.find(['{', '['])?;
    let substring = &input[start..];
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in substring.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(substring[..=i].to_string());
                }
            }
            _ => {}
        }
    }

    Some(substring.to_string())
}

fn repair_json(input: &str) -> String {
    static TRAILING_COMMA_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r",(\s*[}\]])").unwrap());
    static UNQUOTED_KEY_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").unwrap());

    let mut result = fix_quotes(input);
    result = UNQUOTED_KEY_RE.replace_all(&result, r#"$1"$2":"#).to_string();

    // Close what the model left open, innermost first.
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escape_next = false;
    for c in result.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => stack.push('}'),
            '[' if !in_string => stack.push(']'),
            '}' | ']' if !in_string => {
                stack.pop();
            }
            _ => {}
        }
    }
    if in_string {
        result.push('"');
    }
    while let Some(close) = stack.pop() {
        result.push(close);
    }

    TRAILING_COMMA_RE.replace_all(&result, "$1").to_string()
}

/// Single-quoted strings become double-quoted; apostrophes inside
/// double-quoted strings are left alone.
fn fix_quotes(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut in_double = false;
    let mut in_single = false;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            result.push(c);
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_double || in_single => {
                result.push(c);
                escape_next = true;
            }
            '"' if in_single => result.push_str("\\\""),
            '"' => {
                in_double = !in_double;
                result.push(c);
            }
            '\'' if !in_double => {
                in_single = !in_single;
                result.push('"');
            }
            _ => result.push(c),
        }
    }
    result
}
