// File: crates/genmeta-core/src/export.rs

//! The two export actions offered on an extracted record: "copy all" and
//! "download workflow".

use crate::{ExtractedMetadata, Field, MetadataError};
use std::path::Path;

/// Plain-text rendering of every field, one `Label: value` line each.
/// Unresolved fields show their sentinel.
pub fn copy_all_text(metadata: &ExtractedMetadata) -> String {
    Field::ALL
        .iter()
        .map(|&field| format!("{}: {}", field.label(), metadata.get(field)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The embedded workflow, pretty-printed with its original key order.
pub fn workflow_json(metadata: &ExtractedMetadata) -> Result<String, MetadataError> {
    let workflow = metadata
        .workflow_raw
        .as_ref()
        .ok_or(MetadataError::NoWorkflow)?;
    Ok(serde_json::to_string_pretty(workflow)?)
}

/// Download name for an image's workflow: `<stem>_workflow.json`.
pub fn workflow_file_name(image_path: &str) -> String {
    let stem = Path::new(image_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");
    format!("{stem}_workflow.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract_metadata;
    use crate::test_support::{PngBuilder, png_with_text};
    use serde_json::Value;

    #[test]
    fn copy_all_lists_every_field_in_order() {
        let prompt = r#"{"1":{"class_type":"KSampler","inputs":{"steps":20,"cfg":7,"sampler_name":"euler","seed":12345}}}"#;
        let meta = extract_metadata(&png_with_text("prompt", prompt), "a.png");

        assert_eq!(
            copy_all_text(&meta),
            "Checkpoint: Unknown\n\
             Positive Prompt: No prompt found\n\
             Negative Prompt: No negative prompt found\n\
             Steps: 20\n\
             CFG Scale: 7\n\
             Sampler: euler\n\
             Seed: 12345"
        );
    }

    #[test]
    fn workflow_round_trips_verbatim() {
        // keys deliberately out of alphabetical order
        let raw = r#"{"last_node_id":2,"nodes":[{"type":"Note","widgets_values":["hi"],"id":1}],"links":[],"version":0.4}"#;
        let meta = extract_metadata(&png_with_text("workflow", raw), "b.png");

        let exported = workflow_json(&meta).unwrap();
        let reparsed: Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(reparsed.to_string(), raw);
    }

    #[test]
    fn workflow_keeps_full_precision_floats() {
        let raw = r#"{"nodes":[{"type":"KSampler","pos":[1827.8861143719582,1963.0735022306658],"widgets_values":[1,20,7.000000000000001,"euler",0.30000000000000004]}],"extra":{"ds":{"scale":0.8264462809917354,"offset":[-1234.5678901234567,98.76543210987654]}}}"#;
        let meta = extract_metadata(&png_with_text("workflow", raw), "d.png");

        let exported = workflow_json(&meta).unwrap();
        let reparsed: Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(reparsed.to_string(), raw);
        assert!(exported.contains("1827.8861143719582"));
        assert_eq!(meta.get(Field::CfgScale), "7.000000000000001");
    }

    #[test]
    fn no_workflow_is_an_error() {
        let meta = extract_metadata(&PngBuilder::new().build(), "c.png");
        assert!(matches!(workflow_json(&meta), Err(MetadataError::NoWorkflow)));
    }

    #[test]
    fn file_names() {
        assert_eq!(workflow_file_name("out/ComfyUI_00042_.png"), "ComfyUI_00042__workflow.json");
        assert_eq!(workflow_file_name("image.png"), "image_workflow.json");
        assert_eq!(workflow_file_name(""), "image_workflow.json");
    }
}
