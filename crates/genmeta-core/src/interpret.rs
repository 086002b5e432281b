// File: crates/genmeta-core/src/interpret.rs

//! Resolves canonical generation fields from the two graph shapes.
//!
//! The prompt graph is read by input name and runs first. The workflow graph
//! is read positionally and only fills what the prompt graph left at its
//! sentinel.

use crate::fields::{Field, Rank, ResolvedFields};
use crate::graph::{PromptGraph, PromptNode, WorkflowGraph};
use serde_json::Value;

/// Lower-cased substrings that mark a text encoder as the negative prompt.
pub const NEGATIVE_MARKERS: [&str; 8] = [
    "bad anatomy",
    "unfinished",
    "censored",
    "weird anatomy",
    "negative",
    "embedding:",
    "worst quality",
    "low quality",
];

/// Values of the editor-only widget that follows a seed widget.
const SEED_CONTROL_VALUES: [&str; 4] = ["fixed", "increment", "decrement", "randomize"];

/// Keys searched on a node that a seed input points at.
const SEED_TARGET_KEYS: [&str; 3] = ["seed", "noise_seed", "value"];
/// Keys searched on a node that any other input points at.
const VALUE_TARGET_KEYS: [&str; 1] = ["value"];

/// One interpreter pass over a decoded graph.
pub trait GraphPass {
    /// Writes whatever this graph can tell about the fields into `fields`,
    /// honoring the precedence guards.
    fn resolve_into(&self, fields: &mut ResolvedFields);
}

/// The node types the interpreter knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    CheckpointLoader,
    PromptManager,
    KSampler,
    KSamplerAdvanced,
    SamplerCustom,
    SamplerCustomAdvanced,
    CfgGuider,
    BasicScheduler,
    KSamplerSelect,
    NoiseSource,
    TextEncode,
    Unknown,
}

impl NodeKind {
    pub fn from_class_type(class_type: &str) -> Self {
        match class_type {
            "CheckpointLoaderSimple" | "UNETLoader" | "DualCLIPLoader" => Self::CheckpointLoader,
            "PromptManager" | "PromptManagerText" => Self::PromptManager,
            "KSampler" => Self::KSampler,
            "KSamplerAdvanced" => Self::KSamplerAdvanced,
            "SamplerCustom" => Self::SamplerCustom,
            "SamplerCustomAdvanced" => Self::SamplerCustomAdvanced,
            "CFGGuider" => Self::CfgGuider,
            "BasicScheduler" => Self::BasicScheduler,
            "KSamplerSelect" => Self::KSamplerSelect,
            "RandomNoise" | "SeedHistory" => Self::NoiseSource,
            "CLIPTextEncode" => Self::TextEncode,
            _ => Self::Unknown,
        }
    }

    /// Named inputs read from a prompt-graph node, per field, in lookup order.
    fn named_inputs(self) -> &'static [(Field, &'static [&'static str])] {
        use Field::*;
        match self {
            Self::CheckpointLoader => &[(Checkpoint, &["ckpt_name", "unet_name"])],
            Self::KSampler
            | Self::KSamplerAdvanced
            | Self::SamplerCustom
            | Self::SamplerCustomAdvanced => &[
                (Steps, &["steps"]),
                (CfgScale, &["cfg"]),
                (Sampler, &["sampler_name"]),
                (Seed, &["seed", "noise_seed"]),
            ],
            Self::CfgGuider => &[(CfgScale, &["cfg"])],
            Self::BasicScheduler => &[(Steps, &["steps"])],
            Self::KSamplerSelect => &[(Sampler, &["sampler_name"])],
            Self::NoiseSource => &[(Seed, &["noise_seed", "seed"])],
            // handled by dedicated rules
            Self::PromptManager | Self::TextEncode | Self::Unknown => &[],
        }
    }

    /// Where a workflow node keeps each parameter in `widgets_values`,
    /// counted after the seed-control widget has been removed.
    fn widget_layout(self, values: &[Value]) -> WidgetLayout {
        match self {
            Self::CheckpointLoader => WidgetLayout {
                checkpoint: Some(0),
                ..WidgetLayout::NONE
            },
            Self::PromptManager => WidgetLayout {
                positive_prompt: Some(0),
                ..WidgetLayout::NONE
            },
            // seed, steps, cfg, sampler_name, scheduler, denoise
            Self::KSampler => WidgetLayout::SAMPLER,
            // add_noise, noise_seed, steps, cfg, sampler_name, ...
            Self::KSamplerAdvanced if leads_with_add_noise(values) => WidgetLayout {
                min_len: 5,
                seed: Some(1),
                steps: Some(2),
                cfg: Some(3),
                sampler: Some(4),
                ..WidgetLayout::NONE
            },
            // add_noise, noise_seed, cfg
            Self::SamplerCustom if leads_with_add_noise(values) => WidgetLayout {
                min_len: 3,
                seed: Some(1),
                cfg: Some(2),
                ..WidgetLayout::NONE
            },
            Self::KSamplerAdvanced | Self::SamplerCustom => WidgetLayout::SAMPLER,
            Self::CfgGuider => WidgetLayout {
                cfg: Some(0),
                ..WidgetLayout::NONE
            },
            // scheduler, steps, denoise
            Self::BasicScheduler => WidgetLayout {
                steps: Some(1),
                ..WidgetLayout::NONE
            },
            Self::KSamplerSelect => WidgetLayout {
                sampler: Some(0),
                ..WidgetLayout::NONE
            },
            Self::NoiseSource => WidgetLayout {
                seed: Some(0),
                ..WidgetLayout::NONE
            },
            Self::SamplerCustomAdvanced | Self::TextEncode | Self::Unknown => WidgetLayout::NONE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct WidgetLayout {
    min_len: usize,
    checkpoint: Option<usize>,
    positive_prompt: Option<usize>,
    steps: Option<usize>,
    cfg: Option<usize>,
    sampler: Option<usize>,
    seed: Option<usize>,
}

impl WidgetLayout {
    const NONE: Self = Self {
        min_len: 0,
        checkpoint: None,
        positive_prompt: None,
        steps: None,
        cfg: None,
        sampler: None,
        seed: None,
    };

    const SAMPLER: Self = Self {
        min_len: 4,
        seed: Some(0),
        steps: Some(1),
        cfg: Some(2),
        sampler: Some(3),
        ..Self::NONE
    };

    fn entries(&self) -> [(Field, Option<usize>); 6] {
        [
            (Field::Checkpoint, self.checkpoint),
            (Field::PositivePrompt, self.positive_prompt),
            (Field::Steps, self.steps),
            (Field::CfgScale, self.cfg),
            (Field::Sampler, self.sampler),
            (Field::Seed, self.seed),
        ]
    }
}

/// Whether `text` reads like a negative prompt.
pub fn is_negative_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    NEGATIVE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Renders a scalar as display text. Empty strings, nulls and containers
/// do not count as values.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl PromptGraph {
    fn read(&self, node: &PromptNode, field: Field, names: &[&str]) -> Option<String> {
        let target_keys: &[&str] = if field == Field::Seed {
            &SEED_TARGET_KEYS
        } else {
            &VALUE_TARGET_KEYS
        };
        names
            .iter()
            .find_map(|name| self.resolve(node, name, target_keys).and_then(scalar_text))
    }
}

impl GraphPass for PromptGraph {
    fn resolve_into(&self, fields: &mut ResolvedFields) {
        for (id, node) in self.iter() {
            let kind = NodeKind::from_class_type(&node.class_type);
            match kind {
                NodeKind::PromptManager => {
                    if let Some(text) =
                        self.read(node, Field::PositivePrompt, &["text", "selected_prompt"])
                    {
                        fields.offer(Field::PositivePrompt, text, Rank::PromptManager);
                    }
                }
                NodeKind::TextEncode => {
                    if let Some(text) = self.read(node, Field::PositivePrompt, &["text"]) {
                        if is_negative_text(&text) {
                            fields.offer(Field::NegativePrompt, text, Rank::Prompt);
                        } else {
                            fields.fill(Field::PositivePrompt, text, Rank::Prompt);
                        }
                    }
                }
                NodeKind::Unknown => {}
                _ => {
                    for &(field, names) in kind.named_inputs() {
                        if let Some(value) = self.read(node, field, names) {
                            fields.offer(field, value, Rank::Prompt);
                        }
                    }
                }
            }
            log::trace!("prompt node {id} ({}) read as {kind:?}", node.class_type);
        }
    }
}

/// Whether the first widget is an `add_noise` toggle.
fn leads_with_add_noise(values: &[Value]) -> bool {
    match values.first() {
        Some(Value::String(s)) => s == "enable" || s == "disable",
        Some(Value::Bool(_)) => true,
        _ => false,
    }
}

/// Drops the seed-control widget that the editor stores right after a seed.
fn parameter_widgets(values: &[Value], seed_index: Option<usize>) -> Vec<&Value> {
    let mut widgets: Vec<&Value> = values.iter().collect();
    if let Some(control) = seed_index.map(|i| i + 1) {
        let is_control = widgets
            .get(control)
            .and_then(|v| v.as_str())
            .is_some_and(|s| SEED_CONTROL_VALUES.contains(&s));
        if is_control {
            widgets.remove(control);
        }
    }
    widgets
}

impl GraphPass for WorkflowGraph {
    fn resolve_into(&self, fields: &mut ResolvedFields) {
        for node in self.nodes() {
            let kind = NodeKind::from_class_type(&node.node_type);
            if kind == NodeKind::TextEncode {
                if let Some(text) = node.widgets_values.first().and_then(scalar_text) {
                    let field = if is_negative_text(&text) {
                        Field::NegativePrompt
                    } else {
                        Field::PositivePrompt
                    };
                    fields.fill(field, text, Rank::Workflow);
                }
                continue;
            }

            let layout = kind.widget_layout(&node.widgets_values);
            let widgets = parameter_widgets(&node.widgets_values, layout.seed);
            if widgets.len() < layout.min_len {
                continue;
            }
            for (field, index) in layout.entries() {
                let value = index.and_then(|i| widgets.get(i)).and_then(|v| scalar_text(v));
                if let Some(value) = value {
                    fields.fill(field, value, Rank::Workflow);
                }
            }
        }
    }
}
