// File: crates/genmeta-core/src/fields.rs

use serde::{Serialize, Serializer};
use std::fmt;

/// Placeholder for a scalar field that was never resolved.
pub const UNKNOWN: &str = "Unknown";
/// Placeholder for an unresolved positive prompt.
pub const NO_PROMPT: &str = "No prompt found";
/// Placeholder for an unresolved negative prompt.
pub const NO_NEGATIVE_PROMPT: &str = "No negative prompt found";

/// How strongly a rule claims the slot it fills. Later variants win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    /// The slot still holds its sentinel.
    Default,
    /// Filled positionally from the workflow graph.
    Workflow,
    /// Filled by name from the prompt graph.
    Prompt,
    /// Filled by a prompt-manager node; overrides every other source.
    PromptManager,
}

/// The canonical generation fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Checkpoint,
    PositivePrompt,
    NegativePrompt,
    Steps,
    CfgScale,
    Sampler,
    Seed,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Checkpoint,
        Field::PositivePrompt,
        Field::NegativePrompt,
        Field::Steps,
        Field::CfgScale,
        Field::Sampler,
        Field::Seed,
    ];

    /// Human readable label, as used by the "copy all" text.
    pub fn label(self) -> &'static str {
        match self {
            Field::Checkpoint => "Checkpoint",
            Field::PositivePrompt => "Positive Prompt",
            Field::NegativePrompt => "Negative Prompt",
            Field::Steps => "Steps",
            Field::CfgScale => "CFG Scale",
            Field::Sampler => "Sampler",
            Field::Seed => "Seed",
        }
    }

    pub fn sentinel(self) -> &'static str {
        match self {
            Field::PositivePrompt => NO_PROMPT,
            Field::NegativePrompt => NO_NEGATIVE_PROMPT,
            _ => UNKNOWN,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A field value together with the rank of the rule that set it.
///
/// A slot starts out holding its sentinel at [`Rank::Default`] and can only
/// move up: there is no way to put the sentinel back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    value: String,
    rank: Rank,
}

impl Slot {
    fn unresolved(field: Field) -> Self {
        Self {
            value: field.sentinel().to_owned(),
            rank: Rank::Default,
        }
    }

    /// The resolved value, or the sentinel.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn is_default(&self) -> bool {
        self.rank == Rank::Default
    }

    /// Sets the value if `rank` is at least as strong as the current one.
    fn offer(&mut self, value: String, rank: Rank) -> bool {
        if rank == Rank::Default || rank < self.rank {
            return false;
        }
        self.value = value;
        self.rank = rank;
        true
    }

    /// Sets the value only if the slot still holds its sentinel.
    fn fill(&mut self, value: String, rank: Rank) -> bool {
        if !self.is_default() {
            return false;
        }
        self.offer(value, rank)
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

/// The accumulator threaded through both interpreter passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFields {
    pub checkpoint: Slot,
    pub positive_prompt: Slot,
    pub negative_prompt: Slot,
    pub steps: Slot,
    pub cfg_scale: Slot,
    pub sampler: Slot,
    pub seed: Slot,
}

impl Default for ResolvedFields {
    fn default() -> Self {
        Self {
            checkpoint: Slot::unresolved(Field::Checkpoint),
            positive_prompt: Slot::unresolved(Field::PositivePrompt),
            negative_prompt: Slot::unresolved(Field::NegativePrompt),
            steps: Slot::unresolved(Field::Steps),
            cfg_scale: Slot::unresolved(Field::CfgScale),
            sampler: Slot::unresolved(Field::Sampler),
            seed: Slot::unresolved(Field::Seed),
        }
    }
}

impl ResolvedFields {
    pub fn slot(&self, field: Field) -> &Slot {
        match field {
            Field::Checkpoint => &self.checkpoint,
            Field::PositivePrompt => &self.positive_prompt,
            Field::NegativePrompt => &self.negative_prompt,
            Field::Steps => &self.steps,
            Field::CfgScale => &self.cfg_scale,
            Field::Sampler => &self.sampler,
            Field::Seed => &self.seed,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Slot {
        match field {
            Field::Checkpoint => &mut self.checkpoint,
            Field::PositivePrompt => &mut self.positive_prompt,
            Field::NegativePrompt => &mut self.negative_prompt,
            Field::Steps => &mut self.steps,
            Field::CfgScale => &mut self.cfg_scale,
            Field::Sampler => &mut self.sampler,
            Field::Seed => &mut self.seed,
        }
    }

    /// Shorthand for `self.slot(field).value()`.
    pub fn get(&self, field: Field) -> &str {
        self.slot(field).value()
    }

    /// Overwrites `field` unless it was set by a stronger rule.
    pub fn offer(&mut self, field: Field, value: impl Into<String>, rank: Rank) -> bool {
        self.slot_mut(field).offer(value.into(), rank)
    }

    /// Sets `field` only while it still holds its sentinel.
    pub fn fill(&mut self, field: Field, value: impl Into<String>, rank: Rank) -> bool {
        self.slot_mut(field).fill(value.into(), rank)
    }

    /// Whether nothing has been resolved at all.
    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|&f| self.slot(f).is_default())
    }
}
