//! Escape-aware scanner for the `result` value's byte range.
//!
//! Response bodies may be large, and fields before `result` may hold
//! arbitrary text; nothing here depends on a full JSON parse. The scanner
//! anchors on the *first* `"result"` key, then walks the value with string
//! and backslash-escape state so bracket characters inside strings are
//! ignored.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ExtractError;

static RESULT_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""result"\s*:"#).expect("result key pattern must compile"));

/// Extract the exact textual span of the `result` value.
///
/// Bracketed values scan to the matching delimiter of the same pair,
/// quoted values to the closing unescaped quote (both inclusive), bare
/// primitives to the next `,`/`}`/`]` or end of input (trimmed).
pub fn extract_result(body: &str) -> Result<&str, ExtractError> {
    let key = RESULT_KEY_RE
        .find(body)
        .ok_or(ExtractError::MissingResultField)?;

    let bytes = body.as_bytes();
    let mut i = key.end();
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if i >= bytes.len() {
        return Err(ExtractError::EmptyResultField);
    }

    match bytes[i] {
        open @ (b'[' | b'{') => {
            let close = if open == b'[' { b']' } else { b'}' };
            let start = i;
            let mut depth = 0usize;
            let mut in_string = false;
            let mut escape = false;

            while i < bytes.len() {
                let ch = bytes[i];
                if in_string {
                    if escape {
                        escape = false;
                    } else if ch == b'\\' {
                        escape = true;
                    } else if ch == b'"' {
                        in_string = false;
                    }
                } else if ch == b'"' {
                    in_string = true;
                } else if ch == open {
                    depth += 1;
                } else if ch == close {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(&body[start..=i]);
                    }
                }
                i += 1;
            }
            Err(ExtractError::UnterminatedValue)
        }
        b'"' => {
            let start = i;
            let mut escape = false;
            i += 1;
            while i < bytes.len() {
                let ch = bytes[i];
                if escape {
                    escape = false;
                } else if ch == b'\\' {
                    escape = true;
                } else if ch == b'"' {
                    return Ok(&body[start..=i]);
                }
                i += 1;
            }
            Err(ExtractError::UnterminatedString)
        }
        _ => {
            let start = i;
            while i < bytes.len() && !matches!(bytes[i], b',' | b'}' | b']') {
                i += 1;
            }
            Ok(body[start..i].trim())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earlier_fields_with_brackets_do_not_confuse_the_scan() {
        let body = r#"{"other": [1,"a}",2], "result": {"x": [1,2,[3,4]]}}"#;
        assert_eq!(extract_result(body).unwrap(), r#"{"x": [1,2,[3,4]]}"#);
    }

    #[test]
    fn nested_arrays_scan_to_the_matching_bracket() {
        let body = r#"{"result": [[1,2],[3,4]], "elapsed": 0.02}"#;
        assert_eq!(extract_result(body).unwrap(), "[[1,2],[3,4]]");
    }

    #[test]
    fn string_values_honor_escapes() {
        let body = r#"{"result": "he said \"hi\", then left", "next": 1}"#;
        assert_eq!(extract_result(body).unwrap(), r#""he said \"hi\", then left""#);
    }

    #[test]
    fn brackets_inside_strings_are_ignored() {
        let body = r#"{"result": ["a]b", "c[d"]}"#;
        assert_eq!(extract_result(body).unwrap(), r#"["a]b", "c[d"]"#);
    }

    #[test]
    fn bare_primitives_trim_to_the_delimiter() {
        assert_eq!(extract_result(r#"{"result": 42.5}"#).unwrap(), "42.5");
        assert_eq!(extract_result(r#"{"result": null , "z": 1}"#).unwrap(), "null");
        assert_eq!(extract_result(r#""result": 7"#).unwrap(), "7");
    }

    #[test]
    fn first_result_key_wins() {
        let body = r#"{"result": 1, "inner": {"result": 2}}"#;
        assert_eq!(extract_result(body).unwrap(), "1");
    }

    #[test]
    fn failure_modes_are_distinct() {
        assert_eq!(
            extract_result(r#"{"outcome": 1}"#),
            Err(ExtractError::MissingResultField)
        );
        assert_eq!(extract_result(r#"{"result":"#), Err(ExtractError::EmptyResultField));
        assert_eq!(
            extract_result(r#"{"result": [1,2"#),
            Err(ExtractError::UnterminatedValue)
        );
        assert_eq!(
            extract_result(r#"{"result": "abc"#),
            Err(ExtractError::UnterminatedString)
        );
        assert_ne!(
            ExtractError::MissingResultField.to_string(),
            ExtractError::UnterminatedValue.to_string()
        );
    }
}
