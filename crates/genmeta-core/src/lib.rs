// crates/genmeta-core/src/lib.rs

pub mod chunk;
pub mod export;
pub mod fields;
pub mod graph;
pub mod interpret;
pub mod repair;
pub mod text;

#[cfg(test)]
mod test_support;

use chunk::has_png_signature;
use fields::ResolvedFields;
use graph::{PromptGraph, WorkflowGraph};
use interpret::GraphPass;
use repair::{PROMPT_KEYWORDS, WORKFLOW_KEYWORDS, decode_group};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use fields::{Field, Rank};

/// A universal error type for the collaborator-facing operations.
///
/// Extraction itself never fails; these cover the checked entry point and
/// the export helpers.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("No workflow is embedded in this image")]
    NoWorkflow,

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The result of one extraction call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedMetadata {
    #[serde(flatten)]
    pub fields: ResolvedFields,
    /// The decoded workflow graph exactly as embedded, for re-export.
    pub workflow_raw: Option<Value>,
    /// Copied verbatim from the caller.
    pub image_path: String,
}

impl ExtractedMetadata {
    /// Whether the image carried anything this engine understands.
    pub fn has_generation_data(&self) -> bool {
        !self.fields.is_empty() || self.workflow_raw.is_some()
    }

    /// Shorthand for `self.fields.get(field)`.
    pub fn get(&self, field: Field) -> &str {
        self.fields.get(field)
    }
}

/// Extracts generation parameters from the bytes of a PNG file.
///
/// Never fails: an image without usable metadata yields a record whose
/// fields all hold their sentinels. The PNG signature is not checked; see
/// [`extract_png`] for the checked variant.
pub fn extract_metadata(file_bytes: &[u8], image_path: impl Into<String>) -> ExtractedMetadata {
    let map = text::read_metadata_map(file_bytes);
    let prompt = decode_group(&map, &PROMPT_KEYWORDS);
    let workflow_raw = decode_group(&map, &WORKFLOW_KEYWORDS);

    let mut fields = ResolvedFields::default();

    // Prompt graph first; the workflow graph only fills what is still unset.
    if let Some(graph) = prompt.as_ref().and_then(PromptGraph::from_value) {
        graph.resolve_into(&mut fields);
    }
    if let Some(graph) = workflow_raw.as_ref().and_then(WorkflowGraph::from_value) {
        graph.resolve_into(&mut fields);
    }

    let metadata = ExtractedMetadata {
        fields,
        workflow_raw,
        image_path: image_path.into(),
    };
    log::debug!(
        "extracted {} ({} text chunks, workflow: {})",
        metadata.image_path,
        map.len(),
        metadata.workflow_raw.is_some()
    );
    metadata
}

/// Like [`extract_metadata`], but rejects input that is not a PNG.
pub fn extract_png(
    file_bytes: &[u8],
    image_path: impl Into<String>,
) -> Result<ExtractedMetadata, MetadataError> {
    if !has_png_signature(file_bytes) {
        return Err(MetadataError::UnsupportedFileType(
            "Not a valid PNG file.".to_string(),
        ));
    }
    Ok(extract_metadata(file_bytes, image_path))
}
