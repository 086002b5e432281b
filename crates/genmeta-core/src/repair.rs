// File: crates/genmeta-core/src/repair.rs

//! Structured-data repair and decode.
//!
//! Some graph producers serialize a missing float as the bare token `NaN`,
//! which is not valid JSON. [`repair_json`] is a compatibility shim for
//! exactly that defect: it rewrites `NaN` tokens outside string literals to
//! `null` and touches nothing else.

use crate::text::MetadataMap;
use serde_json::Value;
use std::borrow::Cow;

/// Keywords that may carry the UI workflow graph, in lookup order.
pub const WORKFLOW_KEYWORDS: [&str; 4] = ["workflow", "Workflow", "comfy", "ComfyUI"];

/// Keywords that may carry the execution prompt graph, in lookup order.
pub const PROMPT_KEYWORDS: [&str; 4] = ["prompt", "Prompt", "parameters", "Parameters"];

const NAN: &[u8] = b"NaN";
const NULL: &str = "null";

/// Rewrites every bare `NaN` token to `null`.
///
/// Idempotent. Returns the input unchanged (borrowed) when there is nothing
/// to repair.
pub fn repair_json(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let mut out = String::new();
    let mut copied_up_to = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            i += 1;
            continue;
        }

        if b == b'"' {
            in_string = true;
        } else if bytes[i..].starts_with(NAN)
            && !is_word_byte(i.checked_sub(1).map(|p| bytes[p]))
            && !is_word_byte(bytes.get(i + NAN.len()).copied())
        {
            out.push_str(&text[copied_up_to..i]);
            out.push_str(NULL);
            i += NAN.len();
            copied_up_to = i;
            continue;
        }
        i += 1;
    }

    if copied_up_to == 0 {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[copied_up_to..]);
    Cow::Owned(out)
}

fn is_word_byte(b: Option<u8>) -> bool {
    matches!(b, Some(b) if b.is_ascii_alphanumeric() || b == b'_')
}

/// Repairs then decodes `text`, accepting only an object or array root.
pub fn decode_structured(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(&repair_json(text)) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        Ok(_) => {
            log::debug!("structured payload is a scalar, ignoring");
            None
        }
        Err(e) => {
            log::debug!("structured payload failed to decode: {e}");
            None
        }
    }
}

/// Decodes the first keyword of `keywords` that is present and decodes.
///
/// A candidate that fails to decode falls through to the next one; `None`
/// means the whole group is absent.
pub fn decode_group(map: &MetadataMap, keywords: &[&str]) -> Option<Value> {
    keywords.iter().find_map(|&keyword| {
        let text = map.get(keyword)?;
        let value = decode_structured(text);
        if value.is_none() {
            log::debug!("`{keyword}` text chunk is not a usable graph, trying next candidate");
        }
        value
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repairs_nan_after_colon() {
        assert_eq!(repair_json(r#"{"a": NaN, "b":NaN}"#), r#"{"a": null, "b":null}"#);
    }

    #[test]
    fn repairs_bare_nan_in_arrays() {
        assert_eq!(repair_json("[NaN,1,NaN]"), "[null,1,null]");
        assert_eq!(repair_json("NaN"), "null");
    }

    #[test]
    fn leaves_strings_alone() {
        let text = r#"{"text": "NaN is not a number", "q": "say \"NaN\""}"#;
        assert!(matches!(repair_json(text), Cow::Borrowed(_)));
    }

    #[test]
    fn leaves_longer_identifiers_alone() {
        assert_eq!(repair_json("[NaNa, xNaN, NaN_]"), "[NaNa, xNaN, NaN_]");
    }

    #[test]
    fn untouched_input_is_borrowed() {
        let text = r#"{"1": {"inputs": {"cfg": 7}}}"#;
        assert!(matches!(repair_json(text), Cow::Borrowed(_)));
    }

    #[test]
    fn repair_is_idempotent() {
        for text in [
            r#"{"a": NaN, "s": "NaN", "l": [NaN, 2]}"#,
            "[NaN]",
            r#"{"nested": {"x": NaN}}"#,
            "plain text",
        ] {
            let once = repair_json(text).into_owned();
            let twice = repair_json(&once).into_owned();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn repaired_decode_matches_null_substitution() {
        let cases = [
            (r#"{"a": NaN, "b": "NaN"}"#, json!({"a": null, "b": "NaN"})),
            (
                r#"{"1": {"inputs": {"denoise": NaN, "cfg": 7.5}}}"#,
                json!({"1": {"inputs": {"denoise": null, "cfg": 7.5}}}),
            ),
            ("[1, NaN, [NaN]]", json!([1, null, [null]])),
        ];
        for (text, expected) in cases {
            assert_eq!(decode_structured(text), Some(expected));
        }
    }

    #[test]
    fn only_objects_and_arrays_decode() {
        assert!(decode_structured("42").is_none());
        assert!(decode_structured("\"text\"").is_none());
        assert!(decode_structured("NaN").is_none());
        assert!(decode_structured("a cat, Steps: 20").is_none());
        assert!(decode_structured("{}").is_some());
        assert!(decode_structured("[]").is_some());
    }

    #[test]
    fn group_falls_through_failed_candidates() {
        let mut map = MetadataMap::new();
        map.insert("prompt".into(), "not json".into());
        map.insert("parameters".into(), r#"{"1": {"class_type": "KSampler"}}"#.into());

        let value = decode_group(&map, &PROMPT_KEYWORDS).unwrap();
        assert_eq!(value["1"]["class_type"], "KSampler");
    }

    #[test]
    fn group_prefers_earlier_keywords() {
        let mut map = MetadataMap::new();
        map.insert("ComfyUI".into(), r#"{"nodes": [1]}"#.into());
        map.insert("workflow".into(), r#"{"nodes": [0]}"#.into());

        let value = decode_group(&map, &WORKFLOW_KEYWORDS).unwrap();
        assert_eq!(value, json!({"nodes": [0]}));
    }

    #[test]
    fn exhausted_group_is_absent() {
        let mut map = MetadataMap::new();
        map.insert("Prompt".into(), "{broken".into());
        map.insert("unrelated".into(), "{}".into());
        assert!(decode_group(&map, &PROMPT_KEYWORDS).is_none());
        assert!(decode_group(&MetadataMap::new(), &WORKFLOW_KEYWORDS).is_none());
    }
}
