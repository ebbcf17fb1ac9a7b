//! Decoding of JSON objects that may still be arriving.
//!
//! Streaming models emit a JSON object a few characters at a time. Presentation
//! code wants to show a field's text while it is being written, so these
//! helpers read a string field out of an unterminated object.

use std::str::Chars;

use serde::de::DeserializeOwned;

use crate::SessionError;

/// Decoded value of the string field `field` in `text`, as far as it has been
/// received. Returns `None` until the opening quote of the value has arrived.
/// An escape sequence cut off at the end of `text` is dropped.
pub fn extract_string_field(text: &str, field: &str) -> Option<String> {
    let key = format!("\"{field}\"");
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find(&key) {
        let key_start = search_from + offset;
        let after_key = key_start + key.len();
        search_from = after_key;

        if text[..key_start].ends_with('\\') {
            continue;
        }

        let rest = text[after_key..].trim_start();
        let Some(rest) = rest.strip_prefix(':') else {
            continue;
        };
        let rest = rest.trim_start();
        let Some(value) = rest.strip_prefix('"') else {
            continue;
        };
        return Some(decode_string_prefix(value));
    }

    None
}

fn decode_string_prefix(value: &str) -> String {
    let mut decoded = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => break,
            '\\' => {
                let Some(escape) = chars.next() else {
                    break;
                };
                match escape {
                    'n' => decoded.push('\n'),
                    't' => decoded.push('\t'),
                    'r' => decoded.push('\r'),
                    'b' => decoded.push('\u{8}'),
                    'f' => decoded.push('\u{c}'),
                    'u' => match unicode_escape(&mut chars) {
                        UnicodeEscape::CutOff => break,
                        UnicodeEscape::Invalid => decoded.push(char::REPLACEMENT_CHARACTER),
                        UnicodeEscape::Code(high @ 0xD800..=0xDBFF) => {
                            // The low half may not have arrived yet.
                            if "\\u".starts_with(chars.as_str()) {
                                break;
                            }
                            let mut lookahead = chars.clone();
                            if chars.as_str().starts_with("\\u") {
                                lookahead.nth(1);
                                match unicode_escape(&mut lookahead) {
                                    UnicodeEscape::CutOff => break,
                                    UnicodeEscape::Code(low @ 0xDC00..=0xDFFF) => {
                                        let combined =
                                            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                                        decoded.push(
                                            char::from_u32(combined)
                                                .unwrap_or(char::REPLACEMENT_CHARACTER),
                                        );
                                        chars = lookahead;
                                        continue;
                                    }
                                    _ => {}
                                }
                            }
                            decoded.push(char::REPLACEMENT_CHARACTER);
                        }
                        UnicodeEscape::Code(code) => decoded
                            .push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)),
                    },
                    other => decoded.push(other),
                }
            }
            other => decoded.push(other),
        }
    }

    decoded
}

enum UnicodeEscape {
    CutOff,
    Invalid,
    Code(u32),
}

/// Reads the four hex digits after `\u`.
fn unicode_escape(chars: &mut Chars<'_>) -> UnicodeEscape {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.chars().count() < 4 {
        return UnicodeEscape::CutOff;
    }
    match u32::from_str_radix(&hex, 16) {
        Ok(code) => UnicodeEscape::Code(code),
        Err(_) => UnicodeEscape::Invalid,
    }
}

/// The outermost `{ ... }` span of `text`, skipping any prose around it.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Decodes a complete response into `T`.
pub fn decode_object<T: DeserializeOwned>(text: &str) -> Result<T, SessionError> {
    let object = extract_json_object(text).ok_or_else(|| {
        SessionError::Decode(format!(
            "response did not contain a JSON object: {}",
            truncate_for_log(text, 200)
        ))
    })?;
    serde_json::from_str(object).map_err(|e| SessionError::Decode(e.to_string()))
}

pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={char_count}]"));
    preview
}

#[cfg(test)]
#[path = "tests/partial_tests.rs"]
mod tests;
