// File: crates/genmeta-core/src/graph.rs

//! The two graph shapes a generation pipeline is stored in.
//!
//! A *prompt graph* maps node ids to `{ class_type, inputs }` and links nodes
//! through `[node_id, output_index]` pairs inside input values. A *workflow
//! graph* is the editor's view: an ordered node list whose parameters live
//! positionally in `widgets_values`.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// An input value: either a literal or an edge to another node's output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputValue<'a> {
    Literal(&'a Value),
    Reference { node_id: NodeId<'a>, output_index: u64 },
}

/// Node ids are strings in practice, but some producers emit bare integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeId<'a> {
    Str(&'a str),
    Num(u64),
}

impl NodeId<'_> {
    fn to_key(self) -> String {
        match self {
            NodeId::Str(s) => s.to_owned(),
            NodeId::Num(n) => n.to_string(),
        }
    }
}

impl<'a> InputValue<'a> {
    pub fn classify(value: &'a Value) -> Self {
        if let Some([id, index]) = value.as_array().map(Vec::as_slice) {
            let node_id = match id {
                Value::String(s) => Some(NodeId::Str(s)),
                Value::Number(n) => n.as_u64().map(NodeId::Num),
                _ => None,
            };
            if let (Some(node_id), Some(output_index)) = (node_id, index.as_u64()) {
                return InputValue::Reference {
                    node_id,
                    output_index,
                };
            }
        }
        InputValue::Literal(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptNode {
    pub class_type: String,
    pub inputs: Map<String, Value>,
}

impl PromptNode {
    fn from_value(value: &Value) -> Option<Self> {
        let class_type = value.get("class_type")?.as_str()?.to_owned();
        let inputs = match value.get("inputs") {
            Some(Value::Object(inputs)) => inputs.clone(),
            _ => Map::new(),
        };
        Some(Self { class_type, inputs })
    }

    pub fn input(&self, name: &str) -> Option<InputValue<'_>> {
        self.inputs.get(name).map(InputValue::classify)
    }
}

/// Execution-style graph: node id → node.
///
/// Iteration follows the order the producing runtime enumerates ids in:
/// integer ids ascending, then every other id in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptGraph {
    nodes: Vec<(String, PromptNode)>,
    index: HashMap<String, usize>,
}

impl PromptGraph {
    /// Builds the graph from a decoded object; nodes without a string
    /// `class_type` are dropped. Non-object roots yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut nodes: Vec<(String, PromptNode)> = object
            .iter()
            .filter_map(|(id, node)| {
                let parsed = PromptNode::from_value(node);
                if parsed.is_none() {
                    log::debug!("prompt graph node {id} has no class_type, ignoring");
                }
                Some((id.clone(), parsed?))
            })
            .collect();
        nodes.sort_by_key(|(id, _)| integer_id(id).map_or((1, 0), |n| (0, n)));

        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (id.clone(), i))
            .collect();
        Some(Self { nodes, index })
    }

    pub fn get(&self, id: &str) -> Option<&PromptNode> {
        self.index.get(id).map(|&i| &self.nodes[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PromptNode)> {
        self.nodes.iter().map(|(id, node)| (id.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up `name` on `node`, following at most one edge.
    ///
    /// For a reference, the target node's inputs are searched for `name`
    /// and then for each of `target_keys`. A reference that leads to another
    /// reference is not followed.
    pub fn resolve<'g>(
        &'g self,
        node: &'g PromptNode,
        name: &str,
        target_keys: &[&str],
    ) -> Option<&'g Value> {
        let node_id = match node.input(name)? {
            InputValue::Literal(value) => return Some(value),
            InputValue::Reference { node_id, .. } => node_id.to_key(),
        };
        let target = self.get(&node_id)?;
        let found = std::iter::once(name)
            .chain(target_keys.iter().copied())
            .find_map(|key| target.input(key))?;
        match found {
            InputValue::Literal(value) => Some(value),
            InputValue::Reference { .. } => {
                log::debug!("`{name}` resolves through node {node_id} to another edge, not following");
                None
            }
        }
    }
}

/// Canonical non-negative integer ids, the way an array index is recognized.
fn integer_id(id: &str) -> Option<u64> {
    if !id.bytes().all(|b| b.is_ascii_digit()) || (id.len() > 1 && id.starts_with('0')) {
        return None;
    }
    id.parse::<u32>().ok().filter(|&n| n != u32::MAX).map(u64::from)
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowNode {
    pub node_type: String,
    pub widgets_values: Vec<Value>,
}

impl WorkflowNode {
    fn from_value(value: &Value) -> Option<Self> {
        let node_type = value.get("type")?.as_str()?.to_owned();
        // Some custom nodes store their widgets as an object; those carry no
        // positional parameters.
        let widgets_values = match value.get("widgets_values") {
            Some(Value::Array(values)) => values.clone(),
            _ => Vec::new(),
        };
        Some(Self {
            node_type,
            widgets_values,
        })
    }
}

/// Editor-style graph: nodes in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowGraph {
    nodes: Vec<WorkflowNode>,
}

impl WorkflowGraph {
    /// Accepts either `{ "nodes": [...] }` or a bare node array.
    pub fn from_value(value: &Value) -> Option<Self> {
        let list = match value {
            Value::Array(list) => list,
            Value::Object(object) => object.get("nodes")?.as_array()?,
            _ => return None,
        };
        let nodes = list.iter().filter_map(WorkflowNode::from_value).collect();
        Some(Self { nodes })
    }

    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }
}
